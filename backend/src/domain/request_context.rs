//! The authenticated principal behind a request.
//!
//! A [`RequestContext`] is produced by the inbound adapter once credentials
//! have been verified and is handed to handlers by value. Nothing downstream
//! reads identity from the raw request.

use super::{EffectivePermissions, RoleId, SessionClaims, UserId, permission::names};

/// User id reported for the partner static token.
pub const STATIC_BRIDGING_USER_ID: i64 = 11;
/// Role id reported for the partner static token.
pub const STATIC_BRIDGING_ROLE_ID: i64 = 5;
/// Display name reported for the partner static token.
pub const STATIC_BRIDGING_NAME: &str = "User Bridging Mitra Sehat";
/// Email reported for the partner static token.
pub const STATIC_BRIDGING_EMAIL: &str = "bridging@gmail.com";

/// Fixed permissions held by the partner static token.
pub fn static_bridging_permissions() -> EffectivePermissions {
    EffectivePermissions::from_names([
        names::VIEW_DASHBOARD,
        names::CREATE_MAPPING_PATIENT,
        names::VIEW_BRIDGING_GLUCOSE_TEST,
    ])
}

/// Who is making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// A user holding a verified session token.
    Session(SessionClaims),
    /// The partner system presenting the configured static token.
    StaticBridging,
}

/// Identity carried from the authentication extractor into a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    principal: Principal,
}

impl RequestContext {
    /// Context for a caller authenticated by a session token.
    pub fn session(claims: SessionClaims) -> Self {
        Self {
            principal: Principal::Session(claims),
        }
    }

    /// Context for the partner presenting the static bridging token.
    pub fn static_bridging() -> Self {
        Self {
            principal: Principal::StaticBridging,
        }
    }

    /// Who is making the request.
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Session user id, or the fixed id of the static principal.
    pub fn user_id(&self) -> UserId {
        match &self.principal {
            Principal::Session(claims) => claims.user_id(),
            Principal::StaticBridging => UserId::new(STATIC_BRIDGING_USER_ID),
        }
    }

    /// Role id from the token; not re-read from the registry.
    pub fn role_id(&self) -> RoleId {
        match &self.principal {
            Principal::Session(claims) => claims.role_id(),
            Principal::StaticBridging => RoleId::new(STATIC_BRIDGING_ROLE_ID),
        }
    }

    /// Display name used for audit fields such as `user_validation`.
    pub fn name(&self) -> &str {
        match &self.principal {
            Principal::Session(claims) => claims.name(),
            Principal::StaticBridging => STATIC_BRIDGING_NAME,
        }
    }
}
