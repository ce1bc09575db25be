/// Storage handle injected into the API
///
/// Handlers never talk to a global connection; they receive an
/// `Arc<dyn Store>` through application state. Two implementations exist:
///
/// - [`PgStore`]: PostgreSQL through the `models` query functions
/// - [`MemoryStore`]: `tokio::sync::RwLock`-guarded maps for development and tests
///
/// Both enforce the same unique constraints and report them the same way, so
/// the HTTP layer cannot tell them apart.
///
/// # Example
///
/// ```
/// use projectmgr_shared::models::user::CreateUser;
/// use projectmgr_shared::store::{MemoryStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let user = store
///     .create_user(CreateUser {
///         username: "alice".to_string(),
///         email: "alice@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     })
///     .await?;
///
/// assert!(store.find_user_by_username("alice").await?.is_some());
/// # Ok(())
/// # }
/// ```

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crate::models::listing::{Listing, PageRequest, ProjectFilter, UserFilter};
use crate::models::project::{CreateProject, ProjectWithOwner, UpdateProject};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The addressed record doesn't exist
    #[error("Record not found")]
    NotFound,

    /// A unique constraint rejected the write
    #[error("{entity} with this {field} already exists.")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
    },

    /// The project's owner no longer exists
    #[error("Owner does not exist")]
    OwnerMissing,

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            match db_err.constraint() {
                Some("users_username_key") => {
                    return StoreError::Duplicate {
                        entity: "user",
                        field: "username",
                    }
                }
                Some("users_email_key") => {
                    return StoreError::Duplicate {
                        entity: "user",
                        field: "email",
                    }
                }
                Some("projects_title_key") => {
                    return StoreError::Duplicate {
                        entity: "project",
                        field: "title",
                    }
                }
                Some("projects_owner_id_fkey") => return StoreError::OwnerMissing,
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

/// Result alias for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations needed by the API
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name reported by the health endpoint
    fn backend(&self) -> &'static str;

    /// Verifies the backend is reachable
    async fn ping(&self) -> StoreResult<()>;

    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Applies `data` to the user, `NotFound` if it doesn't exist
    async fn update_user(&self, id: i64, data: UpdateUser) -> StoreResult<User>;

    /// Deletes the user and every project they own
    async fn delete_user(&self, id: i64) -> StoreResult<()>;

    async fn list_users(&self, filter: &UserFilter, page: PageRequest)
        -> StoreResult<Listing<User>>;

    /// Inserts a project, `OwnerMissing` if the owner row is gone
    async fn create_project(&self, data: CreateProject) -> StoreResult<ProjectWithOwner>;

    async fn find_project(&self, id: i64) -> StoreResult<Option<ProjectWithOwner>>;

    async fn update_project(&self, id: i64, data: UpdateProject) -> StoreResult<ProjectWithOwner>;

    async fn delete_project(&self, id: i64) -> StoreResult<()>;

    async fn list_projects(
        &self,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<ProjectWithOwner>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_message() {
        let err = StoreError::Duplicate {
            entity: "project",
            field: "title",
        };
        assert_eq!(err.to_string(), "project with this title already exists.");
    }

    #[test]
    fn test_non_database_sqlx_error_is_passed_through() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::Database(sqlx::Error::RowNotFound)));
    }
}
