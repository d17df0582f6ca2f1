//! Server construction and middleware wiring.

mod config;
pub(crate) mod reconcile;
pub(crate) mod settings;
mod state_builders;

pub use config::ServerConfig;
pub use settings::AppSettings;

use state_builders::{build_activity_sink, build_health_state, build_http_state};

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::{Method, header};
use actix_web::{App, HttpServer, web};

use glucose_backend::domain::ports::ValidationCommand;
use glucose_backend::inbound::http::configure;
use glucose_backend::inbound::http::health::HealthState;
use glucose_backend::inbound::http::state::HttpState;
use glucose_backend::{ActivityLog, ActivitySink, Trace};
#[cfg(debug_assertions)]
use glucose_backend::doc::ApiDoc;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Seconds browsers may cache a CORS preflight response.
const CORS_MAX_AGE_SECS: usize = 3600;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    activity: Arc<ActivitySink>,
    allowed_origins: Arc<[String]>,
}

fn build_cors(allowed_origins: &[String]) -> Cors {
    let cors = allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| match origin.as_str() {
            "*" => cors.allow_any_origin(),
            _ => cors.allowed_origin(origin),
        });
    cors.allowed_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ])
    .allowed_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    .supports_credentials()
    .max_age(CORS_MAX_AGE_SECS)
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        activity,
        allowed_origins,
    } = deps;

    let activity_log = ActivityLog::new(activity, http_state.session.clone());

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(activity_log)
        .wrap(build_cors(&allowed_origins))
        .wrap(Trace)
        .configure(configure);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Running server plus the handles `main` needs after startup.
pub struct RunningServer {
    pub server: Server,
    pub health_state: web::Data<HealthState>,
    pub validation: Arc<dyn ValidationCommand>,
}

/// Construct an Actix HTTP server from the provided configuration.
///
/// # Parameters
/// - `config`: pre-built [`ServerConfig`] holding both database pools and
///   the session, CORS and activity-log settings.
///
/// # Returns
/// A [`RunningServer`] whose `server` must be awaited to drive the listener.
/// Readiness is marked once the socket is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(config: ServerConfig) -> std::io::Result<RunningServer> {
    let health_state = build_health_state(&config);
    let http_state = build_http_state(&config);
    let activity = build_activity_sink(&config);
    let validation = Arc::clone(&http_state.validation);
    let deps = AppDependencies {
        health_state: health_state.clone(),
        http_state,
        activity,
        allowed_origins: config.allowed_origins.clone().into(),
    };

    let server = HttpServer::new(move || build_app(deps.clone()))
        .bind(config.bind_addr)?
        .run();

    health_state.mark_ready();
    Ok(RunningServer {
        server,
        health_state,
        validation,
    })
}
