//! User administration endpoints.
//!
//! ```text
//! GET /api/users
//! GET /api/users/7
//! POST /api/users/assign-role {"userId":7,"roleId":2}
//! PUT /api/users/update-assign-role {"userId":7,"roleId":3}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::permission::AssignPermission;
use crate::domain::ports::UserDetail;
use crate::domain::{Error, RoleId, UserId, UserProfile};
use crate::inbound::http::ApiResult;
use crate::inbound::http::context::Authorized;
use crate::inbound::http::error::ErrorEnvelope;
use crate::inbound::http::response::{ok, ok_message};
use crate::inbound::http::state::HttpState;

/// Request body for role assignment and update.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRoleRequest {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub role_id: Option<i64>,
}

impl UserRoleRequest {
    fn into_ids(self) -> Result<(UserId, RoleId), Error> {
        match (self.user_id, self.role_id) {
            (Some(user), Some(role)) => Ok((UserId::new(user), RoleId::new(role))),
            _ => Err(Error::invalid_request("User ID and Role ID are required")),
        }
    }
}

/// List every user.
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Users", body = [UserProfile]),
        (status = 403, description = "Caller lacks assign_permission", body = ErrorEnvelope)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("")]
pub async fn list_users(
    state: web::Data<HttpState>,
    _auth: Authorized<AssignPermission>,
) -> ApiResult<HttpResponse> {
    let users = state.users.list_users().await?;
    Ok(ok("Users retrieved successfully", users))
}

/// A user together with its roles and their permissions.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User detail", body = UserDetail),
        (status = 404, description = "User not found", body = ErrorEnvelope)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/{id}")]
pub async fn user_detail(
    state: web::Data<HttpState>,
    _auth: Authorized<AssignPermission>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let detail = state.users.user_detail(UserId::new(path.into_inner())).await?;
    Ok(ok("User details retrieved successfully", detail))
}

/// Give a user its single role, replacing any previous one.
#[utoipa::path(
    post,
    path = "/api/users/assign-role",
    request_body = UserRoleRequest,
    responses(
        (status = 200, description = "Role assigned"),
        (status = 400, description = "Missing user or role id", body = ErrorEnvelope),
        (status = 404, description = "User or role not found", body = ErrorEnvelope)
    ),
    tags = ["users"],
    operation_id = "assignRole"
)]
#[post("/assign-role")]
pub async fn assign_role(
    state: web::Data<HttpState>,
    _auth: Authorized<AssignPermission>,
    payload: web::Json<UserRoleRequest>,
) -> ApiResult<HttpResponse> {
    let (user, role) = payload.into_inner().into_ids()?;
    state.users.assign_role(user, role).await?;
    Ok(ok_message("Role assigned to user successfully"))
}

/// Change the role of a user that already has one.
#[utoipa::path(
    put,
    path = "/api/users/update-assign-role",
    request_body = UserRoleRequest,
    responses(
        (status = 200, description = "Role updated"),
        (status = 400, description = "Missing user or role id", body = ErrorEnvelope),
        (status = 404, description = "Role or assignment not found", body = ErrorEnvelope)
    ),
    tags = ["users"],
    operation_id = "updateRole"
)]
#[put("/update-assign-role")]
pub async fn update_role(
    state: web::Data<HttpState>,
    _auth: Authorized<AssignPermission>,
    payload: web::Json<UserRoleRequest>,
) -> ApiResult<HttpResponse> {
    let (user, role) = payload.into_inner().into_ids()?;
    state.users.update_role(user, role).await?;
    Ok(ok_message("Role updated successfully"))
}
