/// User endpoints
///
/// - `POST /api/users/register/` and `POST /api/users/`: register
/// - `GET /api/users/`: paginated list, `?search=` over username and email,
///   `?ordering=` by `username` or `email`
/// - `GET|PUT|PATCH|DELETE /api/users/{username}/`: authenticated detail
///
/// Passwords are write-only: accepted on input, hashed with argon2id before
/// they reach the store, never rendered.

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    Json,
};
use projectmgr_shared::{
    auth::{middleware::AuthContext, password},
    models::{
        listing::{search_terms, OrderBy, UserFilter},
        user::{CreateUser, UpdateUser, User},
    },
    store::StoreError,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ErrorResponse, ValidationErrorDetail},
    extract::{check_present, trim_in_place, RequestBody, ValidatedJson},
    routes::pagination::{paginate, Page, PageParams},
};

/// Public user representation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// User write payload
///
/// Used as-is for registration and `PUT`, where every field is required.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UserInput {
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub username: Option<String>,

    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this field has no more than 254 characters.")
    )]
    pub email: Option<String>,

    /// Write-only, at least 8 characters
    #[validate(length(min = 8, message = "Ensure this field has at least 8 characters."))]
    pub password: Option<String>,
}

impl UserInput {
    fn presence(&self, required: bool) -> Vec<ValidationErrorDetail> {
        let mut details = Vec::new();
        check_present(&mut details, "username", self.username.as_ref(), required);
        check_present(&mut details, "email", self.email.as_ref(), required);
        check_present(&mut details, "password", self.password.as_ref(), required);
        details
    }

    /// Reports every given username or email already held by a user other than `exclude`
    async fn check_unique(&self, state: &AppState, exclude: Option<i64>) -> ApiResult<()> {
        let mut details = Vec::new();

        if let Some(username) = self.username.as_deref() {
            let taken = state.store.find_user_by_username(username).await?;
            if taken.is_some_and(|u| Some(u.id) != exclude) {
                details.push(duplicate("username"));
            }
        }
        if let Some(email) = self.email.as_deref() {
            let taken = state.store.find_user_by_email(email).await?;
            if taken.is_some_and(|u| Some(u.id) != exclude) {
                details.push(duplicate("email"));
            }
        }

        if details.is_empty() {
            Ok(())
        } else {
            details.sort_by(|a, b| a.field.cmp(&b.field));
            Err(ApiError::ValidationError(details))
        }
    }

    /// Hashes the password (if any) and builds the store update
    fn into_update(self) -> ApiResult<UpdateUser> {
        let password_hash = self
            .password
            .as_deref()
            .map(password::hash_password)
            .transpose()?;

        Ok(UpdateUser {
            username: self.username,
            email: self.email,
            password_hash,
        })
    }
}

fn duplicate(field: &'static str) -> ValidationErrorDetail {
    let message = StoreError::Duplicate {
        entity: "user",
        field,
    }
    .to_string();
    ValidationErrorDetail::new(field, message)
}

impl RequestBody for UserInput {
    const NON_NULLABLE: &'static [&'static str] = &["email", "password", "username"];

    fn normalize(&mut self) {
        trim_in_place(&mut self.username);
        trim_in_place(&mut self.email);
    }

    fn presence_errors(&self) -> Vec<ValidationErrorDetail> {
        self.presence(true)
    }
}

/// Partial user payload for `PATCH`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct UserPatch(pub UserInput);

impl Validate for UserPatch {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        self.0.validate()
    }
}

impl RequestBody for UserPatch {
    const NON_NULLABLE: &'static [&'static str] = UserInput::NON_NULLABLE;

    fn normalize(&mut self) {
        self.0.normalize();
    }

    fn presence_errors(&self) -> Vec<ValidationErrorDetail> {
        self.0.presence(false)
    }
}

/// Query parameters for the user list
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// 1-based page number
    pub page: Option<String>,

    /// Results per page
    pub page_size: Option<String>,

    /// Terms matched against username and email
    pub search: Option<String>,

    /// `username`, `email`, optionally prefixed with `-`
    pub ordering: Option<String>,
}

impl UserListQuery {
    fn filter(&self) -> UserFilter {
        UserFilter {
            search: self.search.as_deref().map(search_terms).unwrap_or_default(),
            ordering: self
                .ordering
                .as_deref()
                .map(OrderBy::parse_list)
                .unwrap_or_default(),
        }
    }
}

/// Paginated user list, as documented in OpenAPI
#[derive(Debug, Serialize, ToSchema)]
pub struct UserPage {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<UserResponse>,
}

async fn find_by_username(state: &AppState, username: &str) -> ApiResult<User> {
    state
        .store
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| ApiError::NotFound("Not found.".to_string()))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/users/register/",
    tag = "users",
    request_body = UserInput,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UserInput>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    input.check_unique(&state, None).await?;
    let update = input.into_update()?;

    // Presence was checked by the extractor
    let (Some(username), Some(email), Some(password_hash)) =
        (update.username, update.email, update.password_hash)
    else {
        return Err(ApiError::InternalError(
            "Validated registration is missing a field".to_string(),
        ));
    };

    let user = state
        .store
        .create_user(CreateUser {
            username,
            email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// List users
#[utoipa::path(
    get,
    path = "/api/users/",
    tag = "users",
    params(UserListQuery),
    responses(
        (status = 200, description = "One page of users", body = UserPage),
        (status = 404, description = "Invalid page", body = ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<Page<UserResponse>>> {
    let params = PageParams::parse(
        query.page.as_deref(),
        query.page_size.as_deref(),
        &state.config.pagination,
    )?;

    let listing = state.store.list_users(&query.filter(), params.request()).await?;

    Ok(Json(paginate(listing, params, &uri, UserResponse::from)?))
}

/// Retrieve a user by username
#[utoipa::path(
    get,
    path = "/api/users/{username}/",
    tag = "users",
    params(("username" = String, Path, description = "Username")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Unknown username", body = ErrorResponse)
    )
)]
pub async fn get_user(
    _auth: AuthContext,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let user = find_by_username(&state, &username).await?;
    Ok(Json(user.into()))
}

async fn apply_update(
    auth: &AuthContext,
    state: &AppState,
    username: &str,
    input: UserInput,
) -> ApiResult<UserResponse> {
    let target = find_by_username(state, username).await?;
    input.check_unique(state, Some(target.id)).await?;
    let update = input.into_update()?;

    let password_changed = update.password_hash.is_some();
    let user = state.store.update_user(target.id, update).await?;

    tracing::info!(
        actor_id = auth.user_id(),
        actor = %auth.username(),
        target_id = target.id,
        target = %target.username,
        password_changed,
        "User updated"
    );

    Ok(user.into())
}

/// Replace a user; every field is required
#[utoipa::path(
    put,
    path = "/api/users/{username}/",
    tag = "users",
    params(("username" = String, Path, description = "Username")),
    request_body = UserInput,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Unknown username", body = ErrorResponse)
    )
)]
pub async fn replace_user(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(username): Path<String>,
    ValidatedJson(input): ValidatedJson<UserInput>,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(apply_update(&auth, &state, &username, input).await?))
}

/// Partially update a user
#[utoipa::path(
    patch,
    path = "/api/users/{username}/",
    tag = "users",
    params(("username" = String, Path, description = "Username")),
    request_body = UserInput,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Unknown username", body = ErrorResponse)
    )
)]
pub async fn patch_user(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(username): Path<String>,
    ValidatedJson(UserPatch(input)): ValidatedJson<UserPatch>,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(apply_update(&auth, &state, &username, input).await?))
}

/// Delete a user and every project they own
#[utoipa::path(
    delete,
    path = "/api/users/{username}/",
    tag = "users",
    params(("username" = String, Path, description = "Username")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Unknown username", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<StatusCode> {
    let target = find_by_username(&state, &username).await?;
    state.store.delete_user(target.id).await?;

    tracing::info!(
        actor_id = auth.user_id(),
        actor = %auth.username(),
        target_id = target.id,
        target = %target.username,
        "User deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
