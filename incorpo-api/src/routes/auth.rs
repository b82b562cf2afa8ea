/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a client account
/// - `POST /api/auth/login` - Login and get tokens
/// - `POST /api/auth/refresh` - Exchange a refresh token for a new pair
/// - `GET /api/auth/me` - Current user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
    response::ApiResponse,
};
use axum::extract::State;
use incorpo_shared::{
    auth::{
        jwt::{self, TokenPair},
        middleware::AuthContext,
        password,
    },
    models::user::{CreateUser, PublicUser, User, UserRole},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Register request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"), length(max = 255))]
    pub email: String,

    /// Strength rules are checked separately
    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: String,

    #[validate(length(min = 2, max = 100, message = "Full name must be 2 to 100 characters"))]
    pub full_name: String,

    #[validate(length(max = 32, message = "Phone must be at most 32 characters"))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Tokens plus the user they were issued for
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: PublicUser,
    pub tokens: TokenPair,
}

/// Registers a new client
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already exists
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<ApiResponse<SessionResponse>> {
    req.validate()?;
    password::validate_password_strength(&req.password)
        .map_err(|message| ApiError::validation("password", message))?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email.trim().to_string(),
            password_hash,
            full_name: req.full_name.trim().to_string(),
            phone: req
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            role: UserRole::Client,
        },
    )
    .await?;

    let tokens = jwt::create_token_pair(user.id, user.role, state.jwt_secret())?;

    tracing::info!(user_id = user.id, "User registered");

    Ok(ApiResponse::created(SessionResponse {
        user: user.into(),
        tokens,
    })
    .with_message("Registration successful"))
}

/// Logs in with email and password
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Unknown email or wrong password
/// - `403 Forbidden`: Account disabled
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<ApiResponse<SessionResponse>> {
    req.validate()?;

    let Some(user) = User::find_by_email(&state.db, req.email.trim()).await? else {
        tracing::warn!("Login attempt for unknown email");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::warn!(user_id = user.id, "Login attempt with wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    if !user.is_active {
        tracing::warn!(user_id = user.id, "Login attempt on disabled account");
        return Err(ApiError::Forbidden("Account is disabled".to_string()));
    }

    User::update_last_login(&state.db, user.id).await?;
    let tokens = jwt::create_token_pair(user.id, user.role, state.jwt_secret())?;

    tracing::info!(user_id = user.id, role = %user.role, "User logged in");

    Ok(ApiResponse::ok(SessionResponse {
        user: user.into(),
        tokens,
    }))
}

/// Exchanges a refresh token for a new token pair
///
/// The role in the new tokens comes from the database, not the old token.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid, expired or non-refresh token
/// - `404 Not Found`: User no longer exists
/// - `403 Forbidden`: Account disabled
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<ApiResponse<TokenPair>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Forbidden("Account is disabled".to_string()));
    }

    let tokens = jwt::create_token_pair(user.id, user.role, state.jwt_secret())?;

    Ok(ApiResponse::ok(tokens))
}

/// Returns the authenticated user
pub async fn me(State(state): State<AppState>, auth: AuthContext) -> ApiResult<ApiResponse<PublicUser>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(user.into()))
}
