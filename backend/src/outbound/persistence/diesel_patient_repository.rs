//! PostgreSQL-backed patient lookup.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PatientRepository, PatientRepositoryError};
use crate::domain::{Patient, PatientId};

use super::error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::PatientRow;
use super::pool::DbPool;
use super::schema::patients;

/// Diesel-backed implementation of the `PatientRepository` port.
#[derive(Clone)]
pub struct DieselPatientRepository {
    pool: DbPool,
}

impl DieselPatientRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PatientRepository for DieselPatientRepository {
    async fn find(&self, id: PatientId) -> Result<Option<Patient>, PatientRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_basic_pool_error(err, PatientRepositoryError::connection))?;
        let row: Option<PatientRow> = patients::table
            .find(id.get())
            .select(PatientRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| {
                map_basic_diesel_error(
                    &err,
                    PatientRepositoryError::query,
                    PatientRepositoryError::connection,
                )
            })?;
        Ok(row.map(Patient::from))
    }
}
