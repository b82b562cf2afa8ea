/// Admin user management
///
/// - `GET /api/admin/users?role=&limit=&offset=`
/// - `PUT /api/admin/users/:id/role` `{ "role": "admin" | "client" }`
/// - `PUT /api/admin/users/:id/active` `{ "isActive": bool }`
///
/// Accounts are never deleted. An admin cannot demote or deactivate their
/// own account.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    response::ApiResponse,
    routes::resolve_limit,
};
use axum::extract::State;
use incorpo_shared::{
    auth::{authorization::require_admin, middleware::AuthContext},
    models::user::{PublicUser, User, UserRole},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub users: Vec<PublicUser>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActiveRequest {
    pub is_active: bool,
}

pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> ApiResult<ApiResponse<UserPage>> {
    require_admin(&auth)?;

    let role = query
        .role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| {
            r.parse::<UserRole>()
                .map_err(|message| ApiError::validation("role", message))
        })
        .transpose()?;
    let limit = resolve_limit(query.limit)?;
    let offset = query.offset.unwrap_or(0).max(0);

    let users = User::list(&state.db, role, limit, offset).await?;
    let total = User::count(&state.db, role).await?;

    Ok(ApiResponse::ok(UserPage {
        users: users.into_iter().map(PublicUser::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// Changes a user's role
///
/// # Errors
///
/// - `400 Bad Request`: Admin demoting themselves
/// - `404 Not Found`: Unknown user
pub async fn update_role(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateRoleRequest>,
) -> ApiResult<ApiResponse<PublicUser>> {
    require_admin(&auth)?;
    check_self_change(&auth, id, req.role == UserRole::Admin, "You cannot remove your own admin role")?;

    let user = User::set_role(&state.db, id, req.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = user.id, admin_id = auth.user_id, role = %user.role, "User role changed");

    Ok(ApiResponse::ok(user.into()))
}

/// Enables or disables an account
///
/// Disabled users keep their data but every authenticated request gets 403.
///
/// # Errors
///
/// - `400 Bad Request`: Admin deactivating themselves
/// - `404 Not Found`: Unknown user
pub async fn update_active(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateActiveRequest>,
) -> ApiResult<ApiResponse<PublicUser>> {
    require_admin(&auth)?;
    check_self_change(&auth, id, req.is_active, "You cannot deactivate your own account")?;

    let user = User::set_active(&state.db, id, req.is_active)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(
        user_id = user.id,
        admin_id = auth.user_id,
        is_active = user.is_active,
        "User activation changed"
    );

    Ok(ApiResponse::ok(user.into()))
}

/// Rejects a change to the caller's own account unless it keeps the status quo
fn check_self_change(auth: &AuthContext, target_id: i64, keeps_access: bool, message: &str) -> ApiResult<()> {
    if auth.user_id == target_id && !keeps_access {
        return Err(ApiError::BadRequest(message.to_string()));
    }
    Ok(())
}
