//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

pub mod auth;
pub mod bridging;
pub mod context;
pub mod error;
pub mod health;
pub mod response;
pub mod role_permissions;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;

pub use error::ApiResult;

/// Register every route plus the extractor configs that render malformed
/// JSON, query strings and path segments as `400` envelopes.
///
/// Expects [`state::HttpState`] in app data; the health routes additionally
/// need [`health::HealthState`].
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .service(health::health)
        .service(health::ready)
        .service(health::live)
        .service(
            web::scope("/auth")
                .service(auth::register)
                .service(auth::login)
                .service(auth::verify_token)
                .service(auth::logout),
        )
        .service(
            web::scope("/api/role-permissions")
                .service(role_permissions::assign_permission)
                .service(role_permissions::remove_permission)
                .service(role_permissions::update_permission),
        )
        .service(
            web::scope("/api/users")
                .service(users::list_users)
                .service(users::assign_role)
                .service(users::update_role)
                .service(users::user_detail),
        )
        .service(web::scope("/api/test-glucosa").configure(glucose_tests::routes))
        .service(
            web::scope("/api/v1/bridging/glucose-test")
                .service(bridging::list_bridged)
                .service(bridging::get_bridged),
        );
}
