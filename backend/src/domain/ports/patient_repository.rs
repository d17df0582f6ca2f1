//! Read-only port onto the foreign patients table.
use async_trait::async_trait;

use crate::domain::{Patient, PatientId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by patient lookup adapters.
    pub enum PatientRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "patient repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "patient repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// Fetch the patient's display fields.
    async fn find(&self, id: PatientId) -> Result<Option<Patient>, PatientRepositoryError>;
}
