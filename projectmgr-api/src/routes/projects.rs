/// Project endpoints
///
/// - `GET /api/projects/`: public paginated list with `owner`, `title`,
///   `search` and `ordering`
/// - `POST /api/projects/`: authenticated create, the caller becomes owner
/// - `GET /api/projects/{id}/`: public retrieve
/// - `GET|PUT|PATCH|DELETE /api/projects/{id}/{username}/`: ownership-scoped
///   detail. Anything that doesn't resolve is a 404, forbidden or missing alike.

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{Method, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use projectmgr_shared::{
    auth::authorization::resolve_scoped_project,
    models::{
        listing::{search_terms, OrderBy, ProjectFilter},
        project::{CreateProject, ProjectWithOwner, UpdateProject, DEFAULT_PROJECT_TITLE},
    },
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ErrorResponse, ValidationErrorDetail},
    extract::{check_present, trim_in_place, Creator, RequestBody, ValidatedJson},
    routes::{
        pagination::{paginate, Page, PageParams},
        users::UserResponse,
    },
};

/// Project representation with its owner nested
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,

    /// Read-only; always the creator
    pub owner: UserResponse,
}

impl From<ProjectWithOwner> for ProjectResponse {
    fn from(project: ProjectWithOwner) -> Self {
        Self {
            id: project.id,
            title: project.title,
            description: project.description,
            created_at: project.created_at,
            owner: UserResponse {
                id: project.owner_id,
                username: project.owner_username,
                email: project.owner_email,
            },
        }
    }
}

/// Project write payload
///
/// Unknown keys, `owner` included, are ignored.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ProjectInput {
    /// Defaults to "Untitled Project" on create
    #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    pub title: Option<String>,

    pub description: Option<String>,
}

impl RequestBody for ProjectInput {
    const NON_NULLABLE: &'static [&'static str] = &["description", "title"];

    fn normalize(&mut self) {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.description);
    }

    fn presence_errors(&self) -> Vec<ValidationErrorDetail> {
        let mut details = Vec::new();
        check_present(&mut details, "title", self.title.as_ref(), false);
        details
    }
}

impl ProjectInput {
    fn into_update(self) -> UpdateProject {
        UpdateProject {
            title: self.title,
            description: self.description,
        }
    }
}

/// Query parameters for the project list
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProjectListQuery {
    /// Owner user id
    pub owner: Option<String>,

    /// Exact title
    pub title: Option<String>,

    /// Terms matched against the title
    pub search: Option<String>,

    /// `title`, `created_at`, optionally prefixed with `-`
    pub ordering: Option<String>,

    /// 1-based page number
    pub page: Option<String>,

    /// Results per page
    pub page_size: Option<String>,
}

/// Paginated project list, as documented in OpenAPI
#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectPage {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<ProjectResponse>,
}

fn invalid_owner() -> ApiError {
    ApiError::field(
        "owner",
        "Select a valid choice. That choice is not one of the available choices.",
    )
}

impl ProjectListQuery {
    async fn filter(&self, state: &AppState) -> ApiResult<ProjectFilter> {
        let owner_id = match self.owner.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let id = raw.parse::<i64>().map_err(|_| invalid_owner())?;
                if state.store.find_user_by_id(id).await?.is_none() {
                    return Err(invalid_owner());
                }
                Some(id)
            }
        };

        Ok(ProjectFilter {
            owner_id,
            title: self.title.clone().filter(|t| !t.is_empty()),
            search: self.search.as_deref().map(search_terms).unwrap_or_default(),
            ordering: self
                .ordering
                .as_deref()
                .map(OrderBy::parse_list)
                .unwrap_or_default(),
        })
    }
}

/// Ids that don't parse can't name a project
fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::NotFound("Not found.".to_string()))
}

/// List projects
#[utoipa::path(
    get,
    path = "/api/projects/",
    tag = "projects",
    params(ProjectListQuery),
    responses(
        (status = 200, description = "One page of projects", body = ProjectPage),
        (status = 400, description = "Invalid owner filter", body = ErrorResponse),
        (status = 404, description = "Invalid page", body = ErrorResponse)
    )
)]
pub async fn list_projects(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<ProjectListQuery>,
) -> ApiResult<Json<Page<ProjectResponse>>> {
    let filter = query.filter(&state).await?;
    let params = PageParams::parse(
        query.page.as_deref(),
        query.page_size.as_deref(),
        &state.config.pagination,
    )?;

    let listing = state.store.list_projects(&filter, params.request()).await?;

    Ok(Json(paginate(listing, params, &uri, ProjectResponse::from)?))
}

/// Create a project owned by the caller
#[utoipa::path(
    post,
    path = "/api/projects/",
    tag = "projects",
    request_body = ProjectInput,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn create_project(
    Creator(auth): Creator,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<ProjectInput>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let project = state
        .store
        .create_project(CreateProject {
            title: input
                .title
                .unwrap_or_else(|| DEFAULT_PROJECT_TITLE.to_string()),
            description: input.description.unwrap_or_default(),
            owner_id: auth.user_id(),
        })
        .await?;

    tracing::info!(
        project_id = project.id,
        owner_id = auth.user_id(),
        title = %project.title,
        "Project created"
    );

    Ok((StatusCode::CREATED, Json(project.into())))
}

/// Retrieve a project by id
#[utoipa::path(
    get,
    path = "/api/projects/{id}/",
    tag = "projects",
    params(("id" = i64, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project", body = ProjectResponse),
        (status = 404, description = "Unknown id", body = ErrorResponse)
    )
)]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProjectResponse>> {
    let id = parse_id(&id)?;
    let project = state
        .store
        .find_project(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Not found.".to_string()))?;

    Ok(Json(project.into()))
}

/// Retrieve a project through its owner's username
#[utoipa::path(
    get,
    path = "/api/projects/{id}/{username}/",
    tag = "projects",
    params(
        ("id" = i64, Path, description = "Project id"),
        ("username" = String, Path, description = "Owner username")
    ),
    responses(
        (status = 200, description = "Project", body = ProjectResponse),
        (status = 404, description = "Unknown id or owner mismatch", body = ErrorResponse)
    )
)]
pub async fn get_scoped_project(
    method: Method,
    State(state): State<AppState>,
    Path((id, username)): Path<(String, String)>,
) -> ApiResult<Json<ProjectResponse>> {
    let id = parse_id(&id)?;
    let project = resolve_scoped_project(state.store.as_ref(), &method, id, &username).await?;
    Ok(Json(project.into()))
}

async fn update_scoped(
    method: &Method,
    state: &AppState,
    id: &str,
    username: &str,
    input: ProjectInput,
) -> ApiResult<ProjectResponse> {
    let id = parse_id(id)?;
    let project = resolve_scoped_project(state.store.as_ref(), method, id, username).await?;

    let updated = state
        .store
        .update_project(project.id, input.into_update())
        .await?;

    tracing::info!(project_id = updated.id, owner = %updated.owner_username, "Project updated");

    Ok(updated.into())
}

/// Replace a project's title and description
#[utoipa::path(
    put,
    path = "/api/projects/{id}/{username}/",
    tag = "projects",
    params(
        ("id" = i64, Path, description = "Project id"),
        ("username" = String, Path, description = "Owner username")
    ),
    request_body = ProjectInput,
    responses(
        (status = 200, description = "Updated project", body = ProjectResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Unknown id or owner mismatch", body = ErrorResponse)
    )
)]
pub async fn replace_project(
    method: Method,
    State(state): State<AppState>,
    Path((id, username)): Path<(String, String)>,
    ValidatedJson(input): ValidatedJson<ProjectInput>,
) -> ApiResult<Json<ProjectResponse>> {
    Ok(Json(update_scoped(&method, &state, &id, &username, input).await?))
}

/// Partially update a project
#[utoipa::path(
    patch,
    path = "/api/projects/{id}/{username}/",
    tag = "projects",
    params(
        ("id" = i64, Path, description = "Project id"),
        ("username" = String, Path, description = "Owner username")
    ),
    request_body = ProjectInput,
    responses(
        (status = 200, description = "Updated project", body = ProjectResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Unknown id or owner mismatch", body = ErrorResponse)
    )
)]
pub async fn patch_project(
    method: Method,
    State(state): State<AppState>,
    Path((id, username)): Path<(String, String)>,
    ValidatedJson(input): ValidatedJson<ProjectInput>,
) -> ApiResult<Json<ProjectResponse>> {
    Ok(Json(update_scoped(&method, &state, &id, &username, input).await?))
}

/// Delete a project
#[utoipa::path(
    delete,
    path = "/api/projects/{id}/{username}/",
    tag = "projects",
    params(
        ("id" = i64, Path, description = "Project id"),
        ("username" = String, Path, description = "Owner username")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Unknown id or owner mismatch", body = ErrorResponse)
    )
)]
pub async fn delete_project(
    method: Method,
    State(state): State<AppState>,
    Path((id, username)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    let project = resolve_scoped_project(state.store.as_ref(), &method, id, &username).await?;

    state.store.delete_project(project.id).await?;

    tracing::info!(project_id = project.id, owner = %project.owner_username, "Project deleted");

    Ok(StatusCode::NO_CONTENT)
}
