/// Database models for projectmgr
///
/// This module contains the domain records and their SQL operations.
///
/// # Models
///
/// - `user`: Registered accounts
/// - `project`: Projects, each owned by exactly one user
/// - `listing`: Search, ordering and filtering inputs shared by list endpoints
///
/// # Example
///
/// ```no_run
/// use projectmgr_shared::models::user::{User, CreateUser};
/// use projectmgr_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     username: "alice".to_string(),
///     email: "alice@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod listing;
pub mod project;
pub mod user;
