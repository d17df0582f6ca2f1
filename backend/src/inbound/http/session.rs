//! Token transport over HTTP.
//!
//! Keeps handlers free of header and cookie plumbing: locating the session
//! token on a request, shaping the login and logout cookies, and recognising
//! the partner's static bearer token.

use actix_web::HttpRequest;
use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::http::header;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::{CredentialError, SessionTokens, TOKEN_COOKIE};

const BEARER_PREFIX: &str = "Bearer ";

/// Length of the static token fingerprint in bytes before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// Find the session token: `Authorization: Bearer …` first, then the
/// `token` cookie.
///
/// # Examples
/// ```
/// use actix_web::test::TestRequest;
/// use glucose_backend::inbound::http::session::session_token;
///
/// let req = TestRequest::default()
///     .insert_header(("Authorization", "Bearer abc"))
///     .to_http_request();
/// assert_eq!(session_token(&req).unwrap(), "abc");
/// ```
pub fn session_token(req: &HttpRequest) -> Result<String, CredentialError> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Ok(token.to_owned());
    }
    req.cookie(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty())
        .ok_or(CredentialError::Missing)
}

/// The partner's static bearer token, kept only as a SHA-256 digest of the
/// full `Authorization` header value it must match.
#[derive(Clone)]
pub struct StaticBridgingToken {
    digest: [u8; 32],
}

impl StaticBridgingToken {
    /// Returns `None` when `raw` is blank, which disables static access.
    pub fn new(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let expected = Zeroizing::new(format!("{BEARER_PREFIX}{raw}"));
        Some(Self {
            digest: Sha256::digest(expected.as_bytes()).into(),
        })
    }

    /// Whether the raw `Authorization` header value is exactly
    /// `Bearer <token>`.
    pub fn matches(&self, authorization: &str) -> bool {
        let presented: [u8; 32] = Sha256::digest(authorization.as_bytes()).into();
        presented == self.digest
    }

    /// Short hex fingerprint for startup logs.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.digest[..FINGERPRINT_BYTES])
    }
}

impl std::fmt::Debug for StaticBridgingToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticBridgingToken")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Attributes applied to the `token` cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    /// Mark the cookie `Secure`.
    pub secure: bool,
}

impl CookiePolicy {
    fn build(self, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build(TOKEN_COOKIE, value)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(max_age)
            .finish()
    }
}

/// Session token issuance and transport settings shared by the extractors
/// and the auth handlers.
#[derive(Clone)]
pub struct SessionTransport {
    tokens: SessionTokens,
    static_token: Option<StaticBridgingToken>,
    cookie: CookiePolicy,
}

impl SessionTransport {
    pub fn new(
        tokens: SessionTokens,
        static_token: Option<StaticBridgingToken>,
        cookie: CookiePolicy,
    ) -> Self {
        Self {
            tokens,
            static_token,
            cookie,
        }
    }

    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    /// Whether the request's `Authorization` header carries the static token.
    pub fn is_static_bridging(&self, req: &HttpRequest) -> bool {
        let Some(expected) = &self.static_token else {
            return false;
        };
        req.headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| expected.matches(value))
    }

    /// HTTP-only cookie carrying a freshly issued token; lives as long as
    /// the token.
    pub fn login_cookie(&self, token: &str) -> Cookie<'static> {
        self.cookie
            .build(token.to_owned(), Duration::seconds(self.tokens.ttl_secs()))
    }

    /// Cookie that expires the `token` cookie immediately.
    pub fn logout_cookie(&self) -> Cookie<'static> {
        self.cookie.build(String::new(), Duration::ZERO)
    }
}
