//! Success envelope shared by every JSON endpoint.
//!
//! ```text
//! {"status":"success","message":"Glucose test added successfully","data":{…}}
//! ```

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;

/// Wire shape of a successful response.
#[derive(Debug, Serialize)]
pub struct SuccessEnvelope<T> {
    status: &'static str,
    message: &'static str,
    data: T,
}

impl<T: Serialize> SuccessEnvelope<T> {
    /// Wrap `data` with a human-readable message.
    pub fn new(message: &'static str, data: T) -> Self {
        Self {
            status: "success",
            message,
            data,
        }
    }

    /// Render with the given status code.
    pub fn respond(self, status: StatusCode) -> HttpResponse {
        HttpResponse::build(status).json(self)
    }
}

/// `200 OK` carrying `data`.
pub fn ok<T: Serialize>(message: &'static str, data: T) -> HttpResponse {
    SuccessEnvelope::new(message, data).respond(StatusCode::OK)
}

/// `201 Created` carrying `data`.
pub fn created<T: Serialize>(message: &'static str, data: T) -> HttpResponse {
    SuccessEnvelope::new(message, data).respond(StatusCode::CREATED)
}

/// `200 OK` with `data: null`.
pub fn ok_message(message: &'static str) -> HttpResponse {
    ok(message, ())
}
