//! Registration, login and token introspection.
//!
//! ```text
//! POST /auth/register {"name":"Ani","email":"ani@example.com","password":"secret1"}
//! POST /auth/login {"email":"ani@example.com","password":"secret1"}
//! GET /auth/verify-token
//! POST /auth/logout
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::UserWithRole;
use crate::domain::{CredentialValidationError, Error, LoginCredentials, Registration, UserProfile};
use crate::inbound::http::ApiResult;
use crate::inbound::http::context::Authenticated;
use crate::inbound::http::error::ErrorEnvelope;
use crate::inbound::http::response::{created, ok, ok_message};
use crate::inbound::http::state::HttpState;

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// `data` of a successful login; the token is also set as a cookie.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserProfile,
    pub token: String,
}

fn credential_validation_error(err: CredentialValidationError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({ "field": err.field() }))
}

/// Register a user with the default role.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserWithRole),
        (status = 400, description = "Invalid name, email or password", body = ErrorEnvelope),
        (status = 409, description = "Email already registered", body = ErrorEnvelope),
        (status = 503, description = "Store unavailable", body = ErrorEnvelope)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let RegisterRequest {
        name,
        email,
        password,
    } = payload.into_inner();
    let registration = Registration::try_from_parts(&name, &email, &password)
        .map_err(credential_validation_error)?;
    let user = state.auth.register(&registration).await?;
    Ok(created("User registered successfully", user))
}

/// Exchange credentials for a session token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse,
            headers(("Set-Cookie" = String, description = "HTTP-only `token` cookie"))),
        (status = 400, description = "Invalid email or password format", body = ErrorEnvelope),
        (status = 401, description = "Invalid credentials", body = ErrorEnvelope),
        (status = 404, description = "User or role not found", body = ErrorEnvelope)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let LoginRequest { email, password } = payload.into_inner();
    let credentials =
        LoginCredentials::try_from_parts(&email, &password).map_err(credential_validation_error)?;
    let outcome = state.auth.login(&credentials).await?;
    let cookie = state.session.login_cookie(&outcome.token);
    let mut response = ok(
        "Login successful",
        LoginResponse {
            user: outcome.user.user,
            token: outcome.token,
        },
    );
    response
        .add_cookie(&cookie)
        .map_err(|err| Error::internal(format!("failed to set token cookie: {err}")))?;
    Ok(response)
}

/// Report the user behind the presented token.
#[utoipa::path(
    get,
    path = "/auth/verify-token",
    responses(
        (status = 200, description = "Token is valid", body = UserWithRole),
        (status = 401, description = "Token missing", body = ErrorEnvelope),
        (status = 403, description = "Invalid, expired or malformed token", body = ErrorEnvelope),
        (status = 404, description = "User not found", body = ErrorEnvelope)
    ),
    tags = ["auth"],
    operation_id = "verifyToken"
)]
#[get("/verify-token")]
pub async fn verify_token(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<HttpResponse> {
    let user = state.auth.current_user(auth.claims()).await?;
    Ok(ok("Token is valid", user))
}

/// Expire the `token` cookie.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Logout successful")),
    tags = ["auth"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let mut response = ok_message("Logout successful");
    response
        .add_cookie(&state.session.logout_cookie())
        .map_err(|err| Error::internal(format!("failed to clear token cookie: {err}")))?;
    Ok(response)
}
