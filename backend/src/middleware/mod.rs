//! Request middleware.
//!
//! Purpose: Define middleware components for request lifecycle concerns such as
//! tracing and activity logging.

pub mod activity_log;
pub mod trace;

pub use activity_log::{ActivityFile, ActivityLog, ActivitySink};
pub use trace::Trace;
