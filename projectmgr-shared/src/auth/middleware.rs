/// Identity resolution middleware for Axum
///
/// Every request passes through [`resolve_identity`] once. When the request
/// carries an `Authorization: Bearer <token>` header, the access token is
/// validated and the user row is loaded, and the result is stored in request
/// extensions as an [`AuthContext`]. Requests without the header continue
/// anonymously.
///
/// # Outcomes
///
/// - No `Authorization` header: anonymous, no extension inserted
/// - Header that isn't `Bearer <token>`: 400
/// - Invalid, expired or refresh token: 401
/// - Valid token for a user that no longer exists: 401
///
/// # Example
///
/// ```
/// use projectmgr_shared::auth::middleware::AuthContext;
///
/// async fn whoami(auth: AuthContext) -> String {
///     format!("Hello, {}!", auth.user.username)
/// }
///
/// async fn maybe(auth: Option<AuthContext>) -> &'static str {
///     if auth.is_some() { "signed in" } else { "anonymous" }
/// }
/// ```

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::jwt::{validate_access_token, JwtError};
use crate::models::user::User;
use crate::store::Store;

/// The authenticated caller, resolved once per request
///
/// Holds the persisted user row, so handlers never re-fetch it.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
}

impl AuthContext {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }
}

/// Error type for identity resolution
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No credentials on a route that requires them
    #[error("Authentication credentials were not provided.")]
    MissingCredentials,

    /// Authorization header is not `Bearer <token>`
    #[error("{0}")]
    InvalidFormat(String),

    /// Token failed validation
    #[error("{0}")]
    InvalidToken(String),

    /// Token subject doesn't exist anymore
    #[error("User not found")]
    UnknownUser,

    /// Storage failure while loading the user
    #[error("Failed to load user: {0}")]
    StoreError(String),
}

impl AuthError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AuthError::InvalidFormat(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AuthError::StoreError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            _ => (StatusCode::UNAUTHORIZED, "unauthorized"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match self {
            AuthError::StoreError(ref detail) => {
                tracing::error!("Identity resolution failed: {}", detail);
                "An internal error occurred".to_string()
            }
            ref other => other.to_string(),
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

/// Extracts the token from an `Authorization` header value
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(header_value: &str) -> Result<&str, AuthError> {
    let mut parts = header_value.split_whitespace();

    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        (Some(scheme), None, None) if scheme.eq_ignore_ascii_case("bearer") => Err(
            AuthError::InvalidFormat("Invalid Authorization header. No credentials provided.".into()),
        ),
        _ => Err(AuthError::InvalidFormat(
            "Expected Authorization header of the form 'Bearer <token>'".into(),
        )),
    }
}

/// Validates a bearer header value and loads the user it names
pub async fn authenticate(
    store: &dyn Store,
    header_value: &str,
    secret: &str,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(header_value)?;

    let claims = validate_access_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        JwtError::WrongTokenType { .. } => {
            AuthError::InvalidToken("Token is not an access token".to_string())
        }
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    let user = store
        .find_user_by_id(claims.sub)
        .await
        .map_err(|e| AuthError::StoreError(e.to_string()))?
        .ok_or(AuthError::UnknownUser)?;

    Ok(AuthContext::new(user))
}

/// Identity middleware body
///
/// Wire it with `axum::middleware::from_fn_with_state`, passing the store and
/// the JWT secret from application state.
pub async fn resolve_identity(
    store: &dyn Store,
    secret: &str,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header_value = match req.headers().get(header::AUTHORIZATION) {
        None => return Ok(next.run(req).await),
        Some(value) => value
            .to_str()
            .map_err(|_| AuthError::InvalidFormat("Authorization header is not valid ASCII".into()))?
            .to_string(),
    };

    let auth = authenticate(store, &header_value, secret).await.map_err(|e| {
        tracing::debug!(error = %e, "Rejected request credentials");
        e
    })?;

    tracing::debug!(user_id = auth.user_id(), "Resolved request identity");
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}
