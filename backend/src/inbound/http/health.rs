//! Health endpoints: a dual-database check plus liveness and readiness
//! checks for orchestration and load balancers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use actix_web::{HttpResponse, get, http::header, web};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::ports::StoreHealthCheck;

/// Shared health state: readiness flags and the stores checked by `/health`.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    canonical: Arc<dyn StoreHealthCheck>,
    bridging: Arc<dyn StoreHealthCheck>,
    environment: String,
    started: Instant,
}

impl HealthState {
    /// Starts live but not ready.
    pub fn new(
        canonical: Arc<dyn StoreHealthCheck>,
        bridging: Arc<dyn StoreHealthCheck>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            canonical,
            bridging,
            environment: environment.into(),
            started: Instant::now(),
        }
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Fail liveness checks fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn flag_response(flag_ok: bool) -> HttpResponse {
        let mut response = if flag_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Connection status of one database.
#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseStatus {
    /// `connected` or `disconnected`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthReport {
    /// `OK` or `ERROR`.
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since the process started.
    pub uptime: f64,
    pub environment: String,
    pub version: &'static str,
    pub database: DatabaseStatus,
    pub bridging_database: DatabaseStatus,
}

async fn check(name: &str, store: &dyn StoreHealthCheck) -> DatabaseStatus {
    match store.ping().await {
        Ok(()) => DatabaseStatus {
            status: "connected",
            error: None,
        },
        Err(err) => {
            warn!(database = name, error = %err, "health check failed");
            DatabaseStatus {
                status: "disconnected",
                error: Some(err.to_string()),
            }
        }
    }
}

/// Run `SELECT 1` against both databases.
#[utoipa::path(
    get,
    path = "/health",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Both databases reachable", body = HealthReport),
        (status = 503, description = "A database is unreachable", body = HealthReport)
    )
)]
#[get("/health")]
pub async fn health(state: web::Data<HealthState>) -> HttpResponse {
    let (database, bridging_database) = futures_util::join!(
        check("canonical", state.canonical.as_ref()),
        check("bridging", state.bridging.as_ref()),
    );
    let healthy = database.error.is_none() && bridging_database.error.is_none();
    let report = HealthReport {
        status: if healthy { "OK" } else { "ERROR" },
        timestamp: Utc::now().to_rfc3339(),
        uptime: state.started.elapsed().as_secs_f64(),
        environment: state.environment.clone(),
        version: env!("CARGO_PKG_VERSION"),
        database,
        bridging_database,
    };
    let mut response = if healthy {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(report)
}

/// Readiness check. Return 200 once startup finished; 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::flag_response(state.is_ready())
}

/// Liveness check. Return 200 while the process is marked alive and 503 once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::flag_response(state.is_alive())
}
