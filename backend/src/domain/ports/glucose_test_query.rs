//! Driving port for glucose test reads and dashboard projections.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{
    DashboardSummary, Error, GlucoseTest, GlucoseTestDetail, GlucoseTestFilter, GlucoseTestId,
    MonthlyCount, PatientId,
};

#[async_trait]
pub trait GlucoseTestQuery: Send + Sync {
    async fn list(
        &self,
        filter: &GlucoseTestFilter,
        page: PageRequest,
    ) -> Result<Page<GlucoseTestDetail>, Error>;

    async fn get(&self, id: GlucoseTestId) -> Result<GlucoseTestDetail, Error>;

    /// Paged tests for an existing patient.
    async fn by_patient(
        &self,
        patient: PatientId,
        page: PageRequest,
    ) -> Result<Page<GlucoseTest>, Error>;

    /// Every test for an existing patient.
    async fn all_by_patient(&self, patient: PatientId) -> Result<Vec<GlucoseTest>, Error>;

    async fn summary(&self) -> Result<DashboardSummary, Error>;

    /// Twelve buckets, January first.
    async fn monthly(&self, year: i32) -> Result<Vec<MonthlyCount>, Error>;

    async fn latest_batch(&self) -> Result<Vec<GlucoseTestDetail>, Error>;
}
