//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::path::PathBuf;

use glucose_backend::domain::{DEFAULT_TOKEN_TTL_SECS, RoleId};
use glucose_backend::outbound::persistence::DbPool;
use zeroize::Zeroizing;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) canonical_pool: DbPool,
    pub(crate) bridging_pool: DbPool,
    pub(crate) secret: Zeroizing<Vec<u8>>,
    pub(crate) token_ttl_secs: u64,
    pub(crate) static_bridging_token: Option<String>,
    pub(crate) cookie_secure: bool,
    pub(crate) default_role: RoleId,
    pub(crate) allowed_origins: Vec<String>,
    pub(crate) environment: String,
    pub(crate) activity_log_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Construct a server configuration around both database pools.
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        canonical_pool: DbPool,
        bridging_pool: DbPool,
        secret: &[u8],
    ) -> Self {
        Self {
            bind_addr,
            canonical_pool,
            bridging_pool,
            secret: Zeroizing::new(secret.to_vec()),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            static_bridging_token: None,
            cookie_secure: true,
            default_role: RoleId::new(3),
            allowed_origins: Vec::new(),
            environment: "development".to_owned(),
            activity_log_path: None,
        }
    }

    /// Lifetime of issued session tokens.
    #[must_use]
    pub fn with_token_ttl(mut self, secs: u64) -> Self {
        self.token_ttl_secs = secs;
        self
    }

    /// Accept the partner's static token on the bridging routes.
    #[must_use]
    pub fn with_static_bridging_token(mut self, token: Option<String>) -> Self {
        self.static_bridging_token = token;
        self
    }

    /// Mark the `token` cookie `Secure`.
    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Role granted to self-registered users.
    #[must_use]
    pub fn with_default_role(mut self, role: RoleId) -> Self {
        self.default_role = role;
        self
    }

    /// Browser origins allowed by CORS.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// Deployment environment reported by `/health`.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Append activity records to a JSON-lines file as well as the database.
    #[must_use]
    pub fn with_activity_log_path(mut self, path: Option<PathBuf>) -> Self {
        self.activity_log_path = path;
        self
    }
}
