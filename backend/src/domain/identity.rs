//! Identity primitives: user, role and permission identifiers and records.
//!
//! Identifiers are positive database keys wrapped in newtypes so that a role
//! id can never be passed where a user id is expected.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generate a transparent `i64` identifier newtype.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw database key.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Raw database key.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

define_id!(
    /// Primary key of a row in `users`.
    UserId
);
define_id!(
    /// Primary key of a row in `roles`.
    RoleId
);
define_id!(
    /// Primary key of a row in `permissions`.
    PermissionId
);
define_id!(
    /// Primary key of a row in `patients`.
    PatientId
);
define_id!(
    /// Primary key of a glucose test; shared by the canonical and bridging stores.
    GlucoseTestId
);

/// Stored user including the bcrypt password hash.
///
/// Never serialised: responses use [`UserProfile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl UserAccount {
    /// Public projection without the credential hash.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[schema(value_type = i64, example = 7)]
    pub id: UserId,
    #[schema(example = "Siti Rahma")]
    pub name: String,
    #[schema(example = "siti@example.com")]
    pub email: String,
}

/// Insert payload for a new user; the password is already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Role record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(value_type = i64)]
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
}

/// Permission record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[schema(value_type = i64)]
    pub id: PermissionId,
    pub name: String,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn ids_serialise_transparently() {
        let value = serde_json::to_value(UserId::new(42)).expect("serialise id");
        assert_eq!(value, serde_json::json!(42));
        let role: RoleId = serde_json::from_value(serde_json::json!(3)).expect("parse id");
        assert_eq!(role.get(), 3);
    }

    #[rstest]
    fn profile_omits_password_hash() {
        let account = UserAccount {
            id: UserId::new(1),
            name: "Ani".into(),
            email: "ani@example.com".into(),
            password_hash: "$2b$10$hash".into(),
        };
        let value = serde_json::to_value(account.profile()).expect("serialise profile");
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["email"], "ani@example.com");
    }
}
