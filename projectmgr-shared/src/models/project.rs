/// Project model and database operations
///
/// Every project is owned by exactly one user. Titles are unique across all
/// owners, and deleting a user removes the projects they own.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(100) NOT NULL DEFAULT 'Untitled Project',
///     description TEXT NOT NULL DEFAULT '',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     owner_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
///     CONSTRAINT projects_title_key UNIQUE (title)
/// );
/// ```
///
/// Reads go through [`ProjectWithOwner`], which joins the owner's public
/// fields so a project can be rendered without a second query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::listing::{like_pattern, order_by_clause, Listing, PageRequest, ProjectFilter};

/// Title given to projects created without one
pub const DEFAULT_PROJECT_TITLE: &str = "Untitled Project";

const PROJECT_WITH_OWNER_SELECT: &str = r#"
    SELECT p.id, p.title, p.description, p.created_at, p.owner_id,
           u.username AS owner_username, u.email AS owner_email
    FROM projects p
    JOIN users u ON u.id = p.owner_id
"#;

/// Project row as stored
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,

    /// Globally unique title
    pub title: String,

    pub description: String,

    pub created_at: DateTime<Utc>,

    /// Owning user's ID
    pub owner_id: i64,
}

/// Project joined with its owner's public fields
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectWithOwner {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub owner_id: i64,
    pub owner_username: String,
    pub owner_email: String,
}

/// Input for creating a new project
///
/// `owner_id` always comes from the authenticated caller, never from the
/// request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub title: String,

    pub description: String,

    pub owner_id: i64,
}

/// Input for updating an existing project
///
/// All fields are optional. Only non-None fields will be updated. The owner
/// cannot be changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    pub title: Option<String>,

    pub description: Option<String>,
}

impl UpdateProject {
    /// Applies the present fields to `project` in place
    pub fn apply_to(self, project: &mut Project) {
        if let Some(title) = self.title {
            project.title = title;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
    }
}

fn push_project_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProjectFilter) {
    let mut clauses = 0;

    if let Some(owner_id) = filter.owner_id {
        qb.push(clause_keyword(&mut clauses));
        qb.push("p.owner_id = ").push_bind(owner_id);
    }
    if let Some(ref title) = filter.title {
        qb.push(clause_keyword(&mut clauses));
        qb.push("p.title = ").push_bind(title.clone());
    }
    for term in &filter.search {
        qb.push(clause_keyword(&mut clauses));
        qb.push("p.title ILIKE ").push_bind(like_pattern(term));
    }
}

fn clause_keyword(clauses: &mut usize) -> &'static str {
    *clauses += 1;
    if *clauses == 1 {
        " WHERE "
    } else {
        " AND "
    }
}

impl Project {
    /// Creates a new project
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The title is already taken (`projects_title_key`)
    /// - The owner no longer exists (`projects_owner_id_fkey`)
    /// - Database connection fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use projectmgr_shared::models::project::{Project, CreateProject};
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// let project = Project::create(&pool, CreateProject {
    ///     title: "Website relaunch".to_string(),
    ///     description: String::new(),
    ///     owner_id: 1,
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (title, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, description, created_at, owner_id
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.owner_id)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID together with its owner
    pub async fn find_with_owner(
        pool: &PgPool,
        id: i64,
    ) -> Result<Option<ProjectWithOwner>, sqlx::Error> {
        let query = format!("{} WHERE p.id = $1", PROJECT_WITH_OWNER_SELECT);

        let project = sqlx::query_as::<_, ProjectWithOwner>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(project)
    }

    /// Updates an existing project
    ///
    /// # Returns
    ///
    /// The updated project if found, None if it doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET title = COALESCE($2, title),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, title, description, created_at, owner_id
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Deletes a project by ID
    ///
    /// # Returns
    ///
    /// True if the project was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists one page of projects matching `filter`, with owners
    pub async fn list(
        pool: &PgPool,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> Result<Vec<ProjectWithOwner>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(PROJECT_WITH_OWNER_SELECT);
        push_project_filter(&mut qb, filter);
        qb.push(" ORDER BY ")
            .push(order_by_clause(&filter.ordering, "p.id"))
            .push(" LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let projects = qb.build_query_as::<ProjectWithOwner>().fetch_all(pool).await?;

        Ok(projects)
    }

    /// Counts projects matching `filter`
    pub async fn count(pool: &PgPool, filter: &ProjectFilter) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM projects p");
        push_project_filter(&mut qb, filter);

        let (count,): (i64,) = qb.build_query_as().fetch_one(pool).await?;

        Ok(count)
    }

    /// Lists one page of projects along with the filtered total
    pub async fn list_with_count(
        pool: &PgPool,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> Result<Listing<ProjectWithOwner>, sqlx::Error> {
        let total = Self::count(pool, filter).await?;
        let items = Self::list(pool, filter, page).await?;

        Ok(Listing { total, items })
    }
}

impl ProjectWithOwner {
    /// Joins a stored project with its owner's public fields
    pub fn from_parts(project: Project, owner_username: String, owner_email: String) -> Self {
        Self {
            id: project.id,
            title: project.title,
            description: project.description,
            created_at: project.created_at,
            owner_id: project.owner_id,
            owner_username,
            owner_email,
        }
    }
}
