//! Role/permission administration endpoints.
//!
//! ```text
//! POST /api/role-permissions/assign-permission {"roleId":2,"permissionIds":[1,2]}
//! DELETE /api/role-permissions/remove-permission {"roleId":2,"permissionId":1}
//! PUT /api/role-permissions/update-permission {"roleId":2,"permissionIds":[2]}
//! ```

use actix_web::{HttpResponse, delete, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::permission::AssignPermission;
use crate::domain::ports::{AssignReport, RolePermissions};
use crate::domain::{Error, PermissionId, RoleId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::context::Authorized;
use crate::inbound::http::error::ErrorEnvelope;
use crate::inbound::http::response::{ok, ok_message};
use crate::inbound::http::state::HttpState;

/// Request body for assign and update.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissionsRequest {
    #[serde(default)]
    pub role_id: Option<i64>,
    #[serde(default)]
    pub permission_ids: Option<Vec<i64>>,
}

impl RolePermissionsRequest {
    fn into_parts(self, allow_empty: bool) -> Result<(RoleId, Vec<PermissionId>), Error> {
        let missing = || Error::invalid_request("Role ID and Permission IDs are required");
        let role = self.role_id.ok_or_else(missing)?;
        let permissions = self.permission_ids.ok_or_else(missing)?;
        if permissions.is_empty() && !allow_empty {
            return Err(missing());
        }
        Ok((
            RoleId::new(role),
            permissions.into_iter().map(PermissionId::new).collect(),
        ))
    }
}

/// Request body for `DELETE /remove-permission`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemovePermissionRequest {
    #[serde(default)]
    pub role_id: Option<i64>,
    #[serde(default)]
    pub permission_id: Option<i64>,
}

/// Grant permissions to a role; pairs already held are reported, not
/// rejected.
#[utoipa::path(
    post,
    path = "/api/role-permissions/assign-permission",
    request_body = RolePermissionsRequest,
    responses(
        (status = 200, description = "Permissions assigned", body = AssignReport),
        (status = 400, description = "Missing role or permission ids", body = ErrorEnvelope),
        (status = 403, description = "Caller lacks assign_permission", body = ErrorEnvelope),
        (status = 404, description = "Role or permission not found", body = ErrorEnvelope)
    ),
    tags = ["role-permissions"],
    operation_id = "assignPermissions"
)]
#[post("/assign-permission")]
pub async fn assign_permission(
    state: web::Data<HttpState>,
    _auth: Authorized<AssignPermission>,
    payload: web::Json<RolePermissionsRequest>,
) -> ApiResult<HttpResponse> {
    let (role, permissions) = payload.into_inner().into_parts(false)?;
    let report = state
        .role_permissions
        .assign_permissions(role, &permissions)
        .await?;
    Ok(ok("Permissions assigned to role successfully", report))
}

/// Revoke one permission from a role.
#[utoipa::path(
    delete,
    path = "/api/role-permissions/remove-permission",
    request_body = RemovePermissionRequest,
    responses(
        (status = 200, description = "Permission removed"),
        (status = 400, description = "Missing role or permission id", body = ErrorEnvelope),
        (status = 404, description = "Permission not found for role", body = ErrorEnvelope)
    ),
    tags = ["role-permissions"],
    operation_id = "removePermission"
)]
#[delete("/remove-permission")]
pub async fn remove_permission(
    state: web::Data<HttpState>,
    _auth: Authorized<AssignPermission>,
    payload: web::Json<RemovePermissionRequest>,
) -> ApiResult<HttpResponse> {
    let RemovePermissionRequest {
        role_id,
        permission_id,
    } = payload.into_inner();
    let (Some(role), Some(permission)) = (role_id, permission_id) else {
        return Err(Error::invalid_request("Role ID and Permission ID are required"));
    };
    state
        .role_permissions
        .remove_permission(RoleId::new(role), PermissionId::new(permission))
        .await?;
    Ok(ok_message("Permission removed from role successfully"))
}

/// Make a role hold exactly the given permissions.
#[utoipa::path(
    put,
    path = "/api/role-permissions/update-permission",
    request_body = RolePermissionsRequest,
    responses(
        (status = 200, description = "Permissions replaced", body = RolePermissions),
        (status = 400, description = "Missing role or permission ids", body = ErrorEnvelope),
        (status = 404, description = "Role not found", body = ErrorEnvelope)
    ),
    tags = ["role-permissions"],
    operation_id = "updatePermissions"
)]
#[put("/update-permission")]
pub async fn update_permission(
    state: web::Data<HttpState>,
    _auth: Authorized<AssignPermission>,
    payload: web::Json<RolePermissionsRequest>,
) -> ApiResult<HttpResponse> {
    let (role, permissions) = payload.into_inner().into_parts(true)?;
    let updated = state
        .role_permissions
        .replace_permissions(role, &permissions)
        .await?;
    Ok(ok("Permissions updated successfully", updated))
}
