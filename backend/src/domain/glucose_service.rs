//! Glucose test writes, reads and dashboard projections.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use tracing::{info, warn};

use crate::domain::ports::{
    GlucoseTestCommand, GlucoseTestQuery, GlucoseTestRepository, GlucoseTestRepositoryError,
    PatientRepository, PatientRepositoryError,
};
use crate::domain::{
    DashboardSummary, Error, GlucoseInputError, GlucoseTest, GlucoseTestDetail,
    GlucoseTestFilter, GlucoseTestId, GlucoseTestInput, MonthlyCount, PatientId, monthly_buckets,
};

/// Implements the glucose test driving ports.
#[derive(Clone)]
pub struct GlucoseTestService<G, P> {
    tests: Arc<G>,
    patients: Arc<P>,
}

impl<G, P> GlucoseTestService<G, P> {
    /// `patients` resolves the `patient_id` on create and update.
    pub fn new(tests: Arc<G>, patients: Arc<P>) -> Self {
        Self { tests, patients }
    }
}

pub(crate) fn map_test_error(error: GlucoseTestRepositoryError) -> Error {
    match error {
        GlucoseTestRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("glucose test store unavailable: {message}"))
        }
        GlucoseTestRepositoryError::Query { message } => {
            Error::internal(format!("glucose test store error: {message}"))
        }
    }
}

fn map_patient_error(error: PatientRepositoryError) -> Error {
    match error {
        PatientRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("patient store unavailable: {message}"))
        }
        PatientRepositoryError::Query { message } => {
            Error::internal(format!("patient store error: {message}"))
        }
    }
}

pub(crate) fn input_error(error: GlucoseInputError) -> Error {
    Error::invalid_request(error.to_string())
}

fn test_not_found() -> Error {
    Error::not_found("Glucose test not found")
}

impl<G, P> GlucoseTestService<G, P>
where
    G: GlucoseTestRepository,
    P: PatientRepository,
{
    async fn require_patient(&self, patient: PatientId) -> Result<(), Error> {
        self.patients
            .find(patient)
            .await
            .map_err(map_patient_error)?
            .map(|_| ())
            .ok_or_else(|| Error::not_found("Patient not found"))
    }
}

#[async_trait]
impl<G, P> GlucoseTestCommand for GlucoseTestService<G, P>
where
    G: GlucoseTestRepository,
    P: PatientRepository,
{
    async fn create(&self, input: GlucoseTestInput) -> Result<GlucoseTest, Error> {
        let mut new = input.into_new().map_err(input_error)?;
        if let Some(patient) = new.patient_id {
            let known = self
                .patients
                .find(patient)
                .await
                .map_err(map_patient_error)?
                .is_some();
            if !known {
                warn!(patient_id = %patient, "unknown patient; storing test as unlinked");
                new.patient_id = None;
            }
        }
        let created = self.tests.insert(&new).await.map_err(map_test_error)?;
        info!(test_id = %created.id, "glucose test created");
        Ok(created)
    }

    async fn update(
        &self,
        id: GlucoseTestId,
        input: GlucoseTestInput,
    ) -> Result<GlucoseTest, Error> {
        let update = input.into_update().map_err(input_error)?;
        self.tests
            .update(id, &update)
            .await
            .map_err(map_test_error)?
            .ok_or_else(test_not_found)
    }

    async fn delete(&self, id: GlucoseTestId) -> Result<(), Error> {
        if self.tests.delete(id).await.map_err(map_test_error)? {
            info!(test_id = %id, "glucose test deleted");
            Ok(())
        } else {
            Err(test_not_found())
        }
    }

    async fn mark_reported(&self, id: GlucoseTestId) -> Result<(), Error> {
        if self.tests.mark_reported(id).await.map_err(map_test_error)? {
            Ok(())
        } else {
            Err(test_not_found())
        }
    }
}

#[async_trait]
impl<G, P> GlucoseTestQuery for GlucoseTestService<G, P>
where
    G: GlucoseTestRepository,
    P: PatientRepository,
{
    async fn list(
        &self,
        filter: &GlucoseTestFilter,
        page: PageRequest,
    ) -> Result<Page<GlucoseTestDetail>, Error> {
        let (items, total) = self
            .tests
            .list(filter, page)
            .await
            .map_err(map_test_error)?;
        Ok(Page::new(items, page, total))
    }

    async fn get(&self, id: GlucoseTestId) -> Result<GlucoseTestDetail, Error> {
        self.tests
            .find(id)
            .await
            .map_err(map_test_error)?
            .ok_or_else(|| Error::not_found("Test data not found"))
    }

    async fn by_patient(
        &self,
        patient: PatientId,
        page: PageRequest,
    ) -> Result<Page<GlucoseTest>, Error> {
        self.require_patient(patient).await?;
        let (items, total) = self
            .tests
            .list_by_patient(patient, Some(page))
            .await
            .map_err(map_test_error)?;
        Ok(Page::new(items, page, total))
    }

    async fn all_by_patient(&self, patient: PatientId) -> Result<Vec<GlucoseTest>, Error> {
        self.require_patient(patient).await?;
        let (items, _) = self
            .tests
            .list_by_patient(patient, None)
            .await
            .map_err(map_test_error)?;
        Ok(items)
    }

    async fn summary(&self) -> Result<DashboardSummary, Error> {
        self.tests.summary().await.map_err(map_test_error)
    }

    async fn monthly(&self, year: i32) -> Result<Vec<MonthlyCount>, Error> {
        let counts = self
            .tests
            .monthly_counts(year)
            .await
            .map_err(map_test_error)?;
        Ok(monthly_buckets(counts))
    }

    async fn latest_batch(&self) -> Result<Vec<GlucoseTestDetail>, Error> {
        self.tests
            .latest_unreported_batch()
            .await
            .map_err(map_test_error)
    }
}
