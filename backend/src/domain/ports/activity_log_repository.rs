//! Port for persisting request activity entries.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by activity log sinks.
    pub enum ActivityLogError {
        /// Sink connection could not be established.
        Connection { message: String } => "activity log connection failed: {message}",
        /// Write failed.
        Write { message: String } => "activity log write failed: {message}",
    }
}

/// One audited request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRecord {
    pub user_id: Option<UserId>,
    pub name: Option<String>,
    pub method: String,
    pub endpoint: String,
    pub request_body: Option<Value>,
    pub ip_address: Option<String>,
    pub status_code: u16,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    async fn record(&self, entry: &ActivityRecord) -> Result<(), ActivityLogError>;
}
