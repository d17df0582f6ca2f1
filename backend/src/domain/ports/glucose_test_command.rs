//! Driving port for glucose test writes other than validation.

use async_trait::async_trait;

use crate::domain::{Error, GlucoseTest, GlucoseTestId, GlucoseTestInput};

#[async_trait]
pub trait GlucoseTestCommand: Send + Sync {
    /// Validate and insert; an unknown patient is stored as unlinked.
    async fn create(&self, input: GlucoseTestInput) -> Result<GlucoseTest, Error>;

    async fn update(&self, id: GlucoseTestId, input: GlucoseTestInput)
    -> Result<GlucoseTest, Error>;

    async fn delete(&self, id: GlucoseTestId) -> Result<(), Error>;

    /// Mark the test as reported (`is_status = 1`).
    async fn mark_reported(&self, id: GlucoseTestId) -> Result<(), Error>;
}
