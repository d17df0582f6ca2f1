//! Driving port for partner reads of the bridging store.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{BridgingSnapshot, Error, GlucoseTestId};

#[async_trait]
pub trait BridgingQuery: Send + Sync {
    async fn list(&self, page: PageRequest) -> Result<Page<BridgingSnapshot>, Error>;

    async fn get(&self, id: GlucoseTestId) -> Result<BridgingSnapshot, Error>;
}
