//! In-memory [`Store`] for development and tests
//!
//! Mirrors the PostgreSQL schema: sequential ids, the same unique constraints
//! and cascading deletes from users to their projects.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Store, StoreError, StoreResult};
use crate::models::listing::{Listing, PageRequest, ProjectFilter, UserFilter};
use crate::models::project::{CreateProject, Project, ProjectWithOwner, UpdateProject};
use crate::models::user::{CreateUser, UpdateUser, User};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    projects: BTreeMap<i64, Project>,
    next_user_id: i64,
    next_project_id: i64,
}

impl Tables {
    fn check_user_unique(&self, id: Option<i64>, username: &str, email: &str) -> StoreResult<()> {
        let others = self.users.values().filter(|u| Some(u.id) != id);
        for other in others {
            if other.username == username {
                return Err(StoreError::Duplicate {
                    entity: "user",
                    field: "username",
                });
            }
            if other.email == email {
                return Err(StoreError::Duplicate {
                    entity: "user",
                    field: "email",
                });
            }
        }
        Ok(())
    }

    fn check_title_unique(&self, id: Option<i64>, title: &str) -> StoreResult<()> {
        let taken = self
            .projects
            .values()
            .any(|p| Some(p.id) != id && p.title == title);

        if taken {
            Err(StoreError::Duplicate {
                entity: "project",
                field: "title",
            })
        } else {
            Ok(())
        }
    }

    fn with_owner(&self, project: &Project) -> Option<ProjectWithOwner> {
        self.users.get(&project.owner_id).map(|owner| {
            ProjectWithOwner::from_parts(project.clone(), owner.username.clone(), owner.email.clone())
        })
    }
}

fn window<T>(mut rows: Vec<T>, page: PageRequest) -> Listing<T> {
    let total = rows.len() as i64;
    let offset = page.offset.max(0) as usize;
    let limit = page.limit.max(0) as usize;

    let items = if offset >= rows.len() {
        Vec::new()
    } else {
        rows.drain(offset..).take(limit).collect()
    };

    Listing { total, items }
}

/// Store backed by in-process maps
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        tables.check_user_unique(None, &data.username, &data.email)?;

        tables.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: tables.next_user_id,
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());

        tracing::debug!(user_id = user.id, "Created user in memory store");
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: i64, data: UpdateUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;

        let mut user = tables.users.get(&id).cloned().ok_or(StoreError::NotFound)?;
        data.apply_to(&mut user);
        tables.check_user_unique(Some(id), &user.username, &user.email)?;

        user.updated_at = Utc::now();
        tables.users.insert(id, user.clone());

        Ok(user)
    }

    async fn delete_user(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        if tables.users.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        tables.projects.retain(|_, p| p.owner_id != id);

        tracing::debug!(user_id = id, "Deleted user and owned projects from memory store");
        Ok(())
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<User>> {
        let tables = self.tables.read().await;

        let mut rows: Vec<User> = tables
            .users
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        rows.sort_by(|a, b| filter.compare(a, b));

        Ok(window(rows, page))
    }

    async fn create_project(&self, data: CreateProject) -> StoreResult<ProjectWithOwner> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&data.owner_id) {
            return Err(StoreError::OwnerMissing);
        }
        tables.check_title_unique(None, &data.title)?;

        tables.next_project_id += 1;
        let project = Project {
            id: tables.next_project_id,
            title: data.title,
            description: data.description,
            created_at: Utc::now(),
            owner_id: data.owner_id,
        };
        tables.projects.insert(project.id, project.clone());

        tracing::debug!(project_id = project.id, "Created project in memory store");
        tables.with_owner(&project).ok_or(StoreError::OwnerMissing)
    }

    async fn find_project(&self, id: i64) -> StoreResult<Option<ProjectWithOwner>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.get(&id).and_then(|p| tables.with_owner(p)))
    }

    async fn update_project(&self, id: i64, data: UpdateProject) -> StoreResult<ProjectWithOwner> {
        let mut tables = self.tables.write().await;

        let mut project = tables.projects.get(&id).cloned().ok_or(StoreError::NotFound)?;
        data.apply_to(&mut project);
        tables.check_title_unique(Some(id), &project.title)?;

        tables.projects.insert(id, project.clone());

        tables.with_owner(&project).ok_or(StoreError::NotFound)
    }

    async fn delete_project(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        match tables.projects.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }

    async fn list_projects(
        &self,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<ProjectWithOwner>> {
        let tables = self.tables.read().await;

        let mut rows: Vec<ProjectWithOwner> = tables
            .projects
            .values()
            .filter_map(|p| tables.with_owner(p))
            .filter(|p| filter.matches(p))
            .collect();
        rows.sort_by(|a, b| filter.compare(a, b));

        Ok(window(rows, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds() {
        let listing = window((1..=7).collect::<Vec<i32>>(), PageRequest { limit: 5, offset: 5 });
        assert_eq!(listing.total, 7);
        assert_eq!(listing.items, vec![6, 7]);

        let past_end = window(vec![1, 2], PageRequest { limit: 5, offset: 10 });
        assert_eq!(past_end.total, 2);
        assert!(past_end.items.is_empty());
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = MemoryStore::new();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            let user = store
                .create_user(CreateUser {
                    username: name.to_string(),
                    email: format!("{}@example.com", name),
                    password_hash: "hash".to_string(),
                })
                .await
                .unwrap();
            assert_eq!(user.id, i as i64 + 1);
        }
    }
}
