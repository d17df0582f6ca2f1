//! Signed session tokens.
//!
//! A session token is an HS256 JWT carrying a short, versioned claim set.
//! Verification checks the signature first, then the claim shape, then the
//! expiry against an injected [`Clock`], so each failure maps to exactly one
//! [`TokenError`] variant.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::TimeDelta;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};

use super::{Error, RoleId, UserId, UserProfile};

/// Current claim schema version.
pub const CLAIM_VERSION: u8 = 1;
/// Default lifetime of an issued token.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
/// Name of the cookie that may carry the token.
pub const TOKEN_COOKIE: &str = "token";

/// Claim set embedded in every session token.
///
/// Unknown keys are rejected so that tokens minted under a different schema
/// fail as [`TokenError::MalformedPayload`] rather than half-parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionClaims {
    /// Schema version; must equal [`CLAIM_VERSION`].
    pub v: u8,
    /// User id.
    pub sub: i64,
    /// Display name.
    pub nm: String,
    /// First two characters of the email.
    pub em: String,
    /// Role id at issue time.
    pub rid: i64,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
    /// Expires at, seconds since the epoch.
    pub exp: i64,
}

impl SessionClaims {
    /// Typed view of `sub`.
    pub fn user_id(&self) -> UserId {
        UserId::new(self.sub)
    }

    pub fn role_id(&self) -> RoleId {
        RoleId::new(self.rid)
    }

    pub fn name(&self) -> &str {
        self.nm.as_str()
    }
}

/// Reasons a presented token is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The signature does not verify or the token is not a JWT at all.
    #[error("Invalid token")]
    InvalidSignature,
    /// The signature verifies but `exp` is in the past.
    #[error("Token expired")]
    Expired,
    /// The signature verifies but the claims do not match the schema.
    #[error("Malformed token payload")]
    MalformedPayload,
}

/// Failure to authenticate a request from its credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// Neither the `Authorization` header nor the cookie carried a token.
    #[error("Token missing")]
    Missing,
    /// A token was present but rejected.
    #[error(transparent)]
    Rejected(#[from] TokenError),
}

/// First two characters of an email, as stored in the `em` claim.
pub fn email_fragment(email: &str) -> String {
    email.chars().take(2).collect()
}

/// Issues and verifies session tokens with a single shared secret.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use glucose_backend::domain::{RoleId, SessionTokens, UserId, UserProfile};
/// use mockable::DefaultClock;
///
/// let tokens = SessionTokens::new(b"secret", 3600, Arc::new(DefaultClock));
/// let profile = UserProfile { id: UserId::new(1), name: "Ani".into(), email: "ani@x.io".into() };
/// let token = tokens.issue(&profile, RoleId::new(2)).expect("token issued");
/// let claims = tokens.verify(&token).expect("token verifies");
/// assert_eq!(claims.em, "an");
/// ```
#[derive(Clone)]
pub struct SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl SessionTokens {
    /// Build an issuer/verifier for `secret` with the given lifetime.
    pub fn new(secret: &[u8], ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        let ttl_secs = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: TimeDelta::try_seconds(ttl_secs).unwrap_or(TimeDelta::MAX),
            clock,
        }
    }

    /// Token lifetime in whole seconds; used for the cookie max-age.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Sign a token for `user` holding `role`.
    pub fn issue(&self, user: &UserProfile, role: RoleId) -> Result<String, Error> {
        let now = self.clock.utc();
        let claims = SessionClaims {
            v: CLAIM_VERSION,
            sub: user.id.get(),
            nm: user.name.clone(),
            em: email_fragment(&user.email),
            rid: role.get(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.ttl)
                .map_or(i64::MAX, |expiry| expiry.timestamp()),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| Error::internal(format!("failed to sign session token: {err}")))
    }

    /// Verify signature, then claim shape, then expiry.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        let data = decode::<serde_json::Value>(token, &self.decoding, &validation).map_err(
            |err| match err.kind() {
                ErrorKind::Json(_) | ErrorKind::Utf8(_) => TokenError::MalformedPayload,
                _ => TokenError::InvalidSignature,
            },
        )?;

        let claims: SessionClaims =
            serde_json::from_value(data.claims).map_err(|_| TokenError::MalformedPayload)?;
        if claims.v != CLAIM_VERSION {
            return Err(TokenError::MalformedPayload);
        }

        if claims.exp <= self.clock.utc().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
