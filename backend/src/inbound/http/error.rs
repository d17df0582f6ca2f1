//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while allowing Actix
//! handlers to turn domain failures into the JSON error envelope:
//!
//! ```text
//! {"status":"error","code":"not_found","message":"Glucose test not found","data":null,"traceId":"…"}
//! ```
//!
//! Internal errors are redacted. Outside production the redacted envelope
//! carries the original message under `data.cause`.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;
use utoipa::ToSchema;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

pub use crate::domain::ApiResult;

const INTERNAL_MESSAGE: &str = "Internal server error";

static EXPOSE_INTERNAL_CAUSES: AtomicBool = AtomicBool::new(false);

/// Include the cause of internal errors in the envelope `data`.
///
/// Off by default; the server enables it outside production.
pub fn expose_internal_causes(expose: bool) {
    EXPOSE_INTERNAL_CAUSES.store(expose, Ordering::Relaxed);
}

fn internal_causes_exposed() -> bool {
    EXPOSE_INTERNAL_CAUSES.load(Ordering::Relaxed)
}

/// Wire shape of every error response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    #[schema(example = "error")]
    status: &'static str,
    code: ErrorCode,
    #[schema(example = "Glucose test not found")]
    message: String,
    #[schema(value_type = Object)]
    data: Option<Value>,
    trace_id: Option<String>,
}

impl ErrorEnvelope {
    fn from_error(error: &Error, expose_cause: bool) -> Self {
        let (message, data) = if matches!(error.code(), ErrorCode::InternalError) {
            let data = expose_cause.then(|| {
                json!({
                    "cause": error.message(),
                    "details": error.details(),
                })
            });
            (INTERNAL_MESSAGE.to_owned(), data)
        } else {
            (error.message().to_owned(), error.details().cloned())
        };
        Self {
            status: "error",
            code: error.code(),
            message,
            data,
            trace_id: error.trace_id().map(str::to_owned),
        }
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self.code(), ErrorCode::InternalError) {
            error!(cause = self.message(), trace_id = self.trace_id(), "internal error");
        }
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }

        builder.json(ErrorEnvelope::from_error(self, internal_causes_exposed()))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        // Do not leak implementation details to clients.
        error!(error = %err, "actix error promoted to domain error");
        Error::internal(INTERNAL_MESSAGE)
    }
}

/// `JsonConfig` error handler rendering body errors in the error envelope.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("Invalid JSON body: {err}")).into()
}

/// `QueryConfig` error handler rendering query errors in the error envelope.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("Invalid query string: {err}")).into()
}

/// `PathConfig` error handler; malformed ids are reported as bad requests.
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("Invalid path parameter: {err}")).into()
}
