//! Outcomes and failure shapes of the validate-then-mirror transition.
//!
//! A test moves from `Unvalidated` to `Validated` in the canonical store and
//! is then mirrored, keyed by id, into the bridging store. The two writes are
//! not atomic; the shapes here let callers tell a finished transition from a
//! duplicate or from a mirror that still has to be repaired.

use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::{Error, GlucoseTestDetail, GlucoseTestId};

/// Detail code attached to [`already_bridged`] errors.
pub const ALREADY_BRIDGED: &str = "already_bridged";
/// Detail code attached to [`mirror_pending`] errors.
pub const MIRROR_PENDING: &str = "mirror_pending";

/// Result of a successful `validate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    /// Validator recorded on the row; an earlier validator is kept.
    pub user_validation: String,
    /// `true` when this call performed the 0 → 1 flip.
    pub flipped: bool,
    pub test: GlucoseTestDetail,
}

/// Counters reported by a reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Validated canonical rows examined.
    pub scanned: u64,
    /// Missing mirror rows inserted by this sweep.
    pub repaired: u64,
    /// Rows already mirrored, including ones inserted concurrently.
    pub already_present: u64,
    /// Inserts that failed and remain pending.
    pub failed: u64,
}

/// Result of a full mirror rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Rows written to the bridging store.
    pub mirrored: u64,
}

/// The test is already mirrored; no second row was written.
pub fn already_bridged(id: GlucoseTestId) -> Error {
    Error::conflict("Glucose test already bridged").with_details(json!({
        "code": ALREADY_BRIDGED,
        "id": id.get(),
    }))
}

/// The canonical row is validated but its mirror insert failed.
pub fn mirror_pending(id: GlucoseTestId, user_validation: &str) -> Error {
    Error::service_unavailable("Validation recorded; bridging pending").with_details(json!({
        "code": MIRROR_PENDING,
        "id": id.get(),
        "userValidation": user_validation,
    }))
}
