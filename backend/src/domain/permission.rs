//! Permission names, effective permission sets and role-permission diffs.

use std::collections::BTreeSet;

use serde::Serialize;
use utoipa::ToSchema;

use super::PermissionId;

/// Named permissions checked by the HTTP surface.
pub mod names {
    pub const CREATE_TEST_GLUCOSA: &str = "create_test_glucosa";
    pub const VIEW_TEST_GLUCOSA: &str = "view_test_glucosa";
    pub const UPDATE_TEST_GLUCOSA: &str = "update_test_glucosa";
    pub const DELETE_TEST_GLUCOSA: &str = "delete_test_glucosa";
    pub const ASSIGN_PERMISSION: &str = "assign_permission";
    pub const VIEW_BRIDGING_GLUCOSE_TEST: &str = "view_bridging_glucose_test";
    pub const VIEW_DASHBOARD: &str = "view_dashboard";
    pub const CREATE_MAPPING_PATIENT: &str = "create_mapping_patient";
}

/// Type-level permission marker used by the `Authorized<P>` extractor.
pub trait RequiredPermission: 'static {
    /// Permission name looked up in the registry.
    const NAME: &'static str;
}

macro_rules! permission_marker {
    ($($(#[$meta:meta])* $marker:ident => $name:path;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $marker;

            impl RequiredPermission for $marker {
                const NAME: &'static str = $name;
            }
        )*
    };
}

permission_marker! {
    /// Create glucose tests.
    CreateTestGlucosa => names::CREATE_TEST_GLUCOSA;
    /// Read glucose tests and dashboards.
    ViewTestGlucosa => names::VIEW_TEST_GLUCOSA;
    /// Update, validate, report and synchronise glucose tests.
    UpdateTestGlucosa => names::UPDATE_TEST_GLUCOSA;
    /// Delete glucose tests.
    DeleteTestGlucosa => names::DELETE_TEST_GLUCOSA;
    /// Administer roles, permissions and user-role assignments.
    AssignPermission => names::ASSIGN_PERMISSION;
    /// Read the bridging mirror.
    ViewBridgingGlucoseTest => names::VIEW_BRIDGING_GLUCOSE_TEST;
}

/// The set of permission names a principal holds.
///
/// # Examples
/// ```
/// use glucose_backend::domain::EffectivePermissions;
///
/// let perms = EffectivePermissions::from_names(["view_test_glucosa"]);
/// assert!(perms.contains("view_test_glucosa"));
/// assert!(!perms.contains("delete_test_glucosa"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(transparent)]
pub struct EffectivePermissions(BTreeSet<String>);

impl EffectivePermissions {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Writes needed to move a role from its current permission set to a
/// desired one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionDiff {
    pub to_remove: Vec<PermissionId>,
    pub to_add: Vec<PermissionId>,
}

impl PermissionDiff {
    /// Compute removals and insertions; duplicates in either input collapse.
    ///
    /// # Examples
    /// ```
    /// use glucose_backend::domain::{PermissionDiff, PermissionId};
    ///
    /// let ids = |raw: &[i64]| raw.iter().copied().map(PermissionId::new).collect::<Vec<_>>();
    /// let diff = PermissionDiff::compute(&ids(&[1, 2]), &ids(&[2, 3]));
    /// assert_eq!(diff.to_remove, ids(&[1]));
    /// assert_eq!(diff.to_add, ids(&[3]));
    /// ```
    pub fn compute(current: &[PermissionId], desired: &[PermissionId]) -> Self {
        let current: BTreeSet<_> = current.iter().copied().collect();
        let desired: BTreeSet<_> = desired.iter().copied().collect();
        Self {
            to_remove: current.difference(&desired).copied().collect(),
            to_add: desired.difference(&current).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}
