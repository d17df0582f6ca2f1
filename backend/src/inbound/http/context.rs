//! Request extractors that authenticate callers and enforce permissions.
//!
//! Handlers declare what they need in their signature:
//!
//! ```text
//! async fn list(auth: Authorized<ViewTestGlucosa>, …)
//! ```
//!
//! The extractor resolves the token, verifies it, asks the
//! [`AuthorizationGate`](crate::domain::ports::AuthorizationGate) and hands
//! the handler a [`RequestContext`] by value. Failures short-circuit with
//! the error envelope before the handler body runs.

use std::marker::PhantomData;

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{CredentialError, Error, RequestContext, RequiredPermission, SessionClaims};

use super::session::session_token;
use super::state::HttpState;

const INVALID_STATIC_TOKEN: &str = "Unauthorized: Invalid static token.";

fn http_state(req: &HttpRequest) -> Result<web::Data<HttpState>, Error> {
    req.app_data::<web::Data<HttpState>>()
        .cloned()
        .ok_or_else(|| Error::internal("HTTP state is not registered"))
}

fn credential_error(error: CredentialError) -> Error {
    match error {
        CredentialError::Missing => Error::unauthorized(error.to_string()),
        CredentialError::Rejected(reason) => Error::forbidden(reason.to_string()),
    }
}

fn verify_session(req: &HttpRequest, state: &HttpState) -> Result<SessionClaims, Error> {
    let token = session_token(req).map_err(credential_error)?;
    state
        .session
        .tokens()
        .verify(&token)
        .map_err(|reason| credential_error(reason.into()))
}

fn authenticate(req: &HttpRequest, state: &HttpState) -> Result<RequestContext, Error> {
    verify_session(req, state).map(RequestContext::session)
}

/// A caller holding a valid session token; no permission is checked.
#[derive(Debug, Clone)]
pub struct Authenticated(SessionClaims);

impl Authenticated {
    pub fn claims(&self) -> &SessionClaims {
        &self.0
    }
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let state = http_state(&req)?;
            verify_session(&req, &state).map(Self)
        })
    }
}

/// A session caller whose role grants permission `P`.
#[derive(Debug, Clone)]
pub struct Authorized<P> {
    context: RequestContext,
    _permission: PhantomData<P>,
}

impl<P> Authorized<P> {
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn into_context(self) -> RequestContext {
        self.context
    }
}

impl<P: RequiredPermission> FromRequest for Authorized<P> {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let state = http_state(&req)?;
            let context = authenticate(&req, &state)?;
            state.gate.authorize(&context, P::NAME).await?;
            Ok(Self {
                context,
                _permission: PhantomData,
            })
        })
    }
}

/// A partner caller for the bridging surface: either the exact static
/// bearer token or a session token, in both cases holding permission `P`.
#[derive(Debug, Clone)]
pub struct PartnerAuthorized<P> {
    context: RequestContext,
    _permission: PhantomData<P>,
}

impl<P> PartnerAuthorized<P> {
    pub fn context(&self) -> &RequestContext {
        &self.context
    }
}

impl<P: RequiredPermission> FromRequest for PartnerAuthorized<P> {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let state = http_state(&req)?;
            let context = if state.session.is_static_bridging(&req) {
                RequestContext::static_bridging()
            } else {
                authenticate(&req, &state).map_err(|_| Error::unauthorized(INVALID_STATIC_TOKEN))?
            };
            state.gate.authorize(&context, P::NAME).await?;
            Ok(Self {
                context,
                _permission: PhantomData,
            })
        })
    }
}
