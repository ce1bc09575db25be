/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/login/` - Exchange username and password for tokens
/// - `POST /api/token/refresh/` - Exchange a refresh token for an access token
/// - `GET /api/me/` - The authenticated caller

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ErrorResponse, ValidationErrorDetail},
    extract::{check_present, trim_in_place, RequestBody, ValidatedJson},
    routes::users::UserResponse,
};
use axum::{extract::State, Json};
use projectmgr_shared::auth::{jwt, middleware::AuthContext, password};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,

    pub password: Option<String>,
}

impl RequestBody for LoginRequest {
    const NON_NULLABLE: &'static [&'static str] = &["password", "username"];

    fn normalize(&mut self) {
        trim_in_place(&mut self.username);
    }

    fn presence_errors(&self) -> Vec<ValidationErrorDetail> {
        let mut details = Vec::new();
        check_present(&mut details, "username", self.username.as_ref(), true);
        check_present(&mut details, "password", self.password.as_ref(), true);
        details
    }
}

/// Login response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Access token
    pub access_token: String,

    /// Refresh token
    pub refresh_token: String,

    /// Always `Bearer`
    pub token_type: String,

    pub user: UserResponse,
}

/// Refresh token request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

impl RequestBody for RefreshRequest {
    const NON_NULLABLE: &'static [&'static str] = &["refresh_token"];

    fn presence_errors(&self) -> Vec<ValidationErrorDetail> {
        let mut details = Vec::new();
        check_present(&mut details, "refresh_token", self.refresh_token.as_ref(), true);
        details
    }
}

/// Refresh token response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    /// New access token
    pub access_token: String,
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".to_string())
}

/// Login endpoint
///
/// Unknown usernames and wrong passwords get the same 401.
#[utoipa::path(
    post,
    path = "/api/login/",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Tokens issued", body = LoginResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (Some(username), Some(candidate)) = (req.username, req.password) else {
        return Err(invalid_credentials());
    };

    let user = state
        .store
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| {
            tracing::debug!(username = %username, "Login for unknown username");
            invalid_credentials()
        })?;

    if !password::verify_password(&candidate, &user.password_hash)? {
        tracing::debug!(user_id = user.id, "Login with wrong password");
        return Err(invalid_credentials());
    }

    let jwt_config = &state.config.jwt;
    let access_claims =
        jwt::Claims::with_expiration(user.id, jwt::TokenType::Access, jwt_config.access_ttl());
    let refresh_claims =
        jwt::Claims::with_expiration(user.id, jwt::TokenType::Refresh, jwt_config.refresh_ttl());

    let access_token = jwt::create_token(&access_claims, &jwt_config.secret)?;
    let refresh_token = jwt::create_token(&refresh_claims, &jwt_config.secret)?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        user: user.into(),
    }))
}

/// Token refresh endpoint
///
/// The token's user must still exist.
#[utoipa::path(
    post,
    path = "/api/token/refresh/",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse)
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let token = req.refresh_token.unwrap_or_default();
    let jwt_config = &state.config.jwt;

    let claims = jwt::validate_refresh_token(&token, &jwt_config.secret)?;

    if state.store.find_user_by_id(claims.sub).await?.is_none() {
        return Err(ApiError::Unauthorized("User not found".to_string()));
    }

    let access_token =
        jwt::refresh_access_token(&token, &jwt_config.secret, jwt_config.access_ttl())?;

    Ok(Json(RefreshResponse { access_token }))
}

/// The authenticated caller
#[utoipa::path(
    get,
    path = "/api/me/",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn me(auth: AuthContext) -> Json<UserResponse> {
    Json(auth.user.into())
}
