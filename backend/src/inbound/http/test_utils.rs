//! Test helpers for inbound HTTP components.

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::App;
use rstest::fixture;

pub use crate::test_support::TestHarness;

/// Fresh in-memory harness per test.
#[fixture]
pub fn harness() -> TestHarness {
    TestHarness::new()
}

/// App with the harness state and every route registered.
///
/// The returned app owns a clone of the state, so it does not borrow the
/// harness.
pub fn test_app(
    harness: &TestHarness,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    App::new()
        .app_data(harness.state())
        .configure(super::configure)
}
