//! PostgreSQL-backed [`Store`]

use async_trait::async_trait;
use sqlx::PgPool;

use super::{Store, StoreError, StoreResult};
use crate::db::pool::health_check;
use crate::models::listing::{Listing, PageRequest, ProjectFilter, UserFilter};
use crate::models::project::{CreateProject, Project, ProjectWithOwner, UpdateProject};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Store over a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, used on shutdown
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn update_user(&self, id: i64, data: UpdateUser) -> StoreResult<User> {
        User::update(&self.pool, id, data)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn delete_user(&self, id: i64) -> StoreResult<()> {
        if User::delete(&self.pool, id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<User>> {
        Ok(User::list_with_count(&self.pool, filter, page).await?)
    }

    async fn create_project(&self, data: CreateProject) -> StoreResult<ProjectWithOwner> {
        let project = Project::create(&self.pool, data).await?;

        // Owner deleted between insert and read: the cascade took the project too
        Project::find_with_owner(&self.pool, project.id)
            .await?
            .ok_or(StoreError::OwnerMissing)
    }

    async fn find_project(&self, id: i64) -> StoreResult<Option<ProjectWithOwner>> {
        Ok(Project::find_with_owner(&self.pool, id).await?)
    }

    async fn update_project(&self, id: i64, data: UpdateProject) -> StoreResult<ProjectWithOwner> {
        Project::update(&self.pool, id, data)
            .await?
            .ok_or(StoreError::NotFound)?;

        Project::find_with_owner(&self.pool, id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn delete_project(&self, id: i64) -> StoreResult<()> {
        if Project::delete(&self.pool, id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn list_projects(
        &self,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<ProjectWithOwner>> {
        Ok(Project::list_with_count(&self.pool, filter, page).await?)
    }
}
