/// Ownership checks for projects
///
/// # Permission Model
///
/// 1. **Safe methods** (GET, HEAD, OPTIONS) are always permitted.
/// 2. **Mutating methods** are permitted only when the project's owner
///    username equals the username in the request path.
/// 3. **Project creation** requires an authenticated caller, who becomes owner.
///
/// The ownership-scoped endpoint resolves the project by id and then applies
/// both the owner/path match and the predicate in a single step. A project
/// that exists but fails the check is reported exactly like a missing one.
///
/// # Example
///
/// ```
/// use axum::http::Method;
/// use chrono::Utc;
/// use projectmgr_shared::auth::authorization::has_object_permission;
/// use projectmgr_shared::models::project::ProjectWithOwner;
///
/// let project = ProjectWithOwner {
///     id: 1,
///     title: "T".into(),
///     description: String::new(),
///     created_at: Utc::now(),
///     owner_id: 1,
///     owner_username: "alice".into(),
///     owner_email: "alice@example.com".into(),
/// };
///
/// assert!(has_object_permission(&Method::GET, &project, "bob"));
/// assert!(has_object_permission(&Method::PATCH, &project, "alice"));
/// assert!(!has_object_permission(&Method::PATCH, &project, "bob"));
/// ```

use axum::http::Method;

use super::middleware::AuthContext;
use crate::models::project::ProjectWithOwner;
use crate::store::{Store, StoreError};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Missing, or present but not accessible through this path
    #[error("Not found.")]
    NotFound,

    /// Anonymous caller attempted an authenticated-only action
    #[error("Authentication credentials were not provided.")]
    PermissionDenied,

    /// Storage failure during resolution
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Whether `method` is read-only
pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Object-level permission for a project reached through `/{id}/{username}/`
pub fn has_object_permission(
    method: &Method,
    project: &ProjectWithOwner,
    path_username: &str,
) -> bool {
    is_safe_method(method) || project.owner_username == path_username
}

/// Resolves a project through the ownership-scoped path
///
/// # Errors
///
/// - `AuthzError::NotFound` if the id doesn't exist, the owner username
///   differs from `path_username`, or the permission predicate fails
/// - `AuthzError::Store` on storage failure
pub async fn resolve_scoped_project(
    store: &dyn Store,
    method: &Method,
    id: i64,
    path_username: &str,
) -> Result<ProjectWithOwner, AuthzError> {
    let project = store.find_project(id).await?.ok_or(AuthzError::NotFound)?;

    if project.owner_username != path_username
        || !has_object_permission(method, &project, path_username)
    {
        tracing::debug!(
            project_id = id,
            path_username = %path_username,
            method = %method,
            "Ownership-scoped lookup did not match"
        );
        return Err(AuthzError::NotFound);
    }

    Ok(project)
}

/// Requires an authenticated caller for project creation
pub fn require_creator(auth: Option<AuthContext>) -> Result<AuthContext, AuthzError> {
    auth.ok_or(AuthzError::PermissionDenied)
}
