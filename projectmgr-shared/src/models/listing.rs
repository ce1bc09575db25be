/// List query inputs: search terms, ordering, filters and page windows
///
/// Both stores interpret these the same way:
///
/// - Search terms are ANDed together; a term matches when it is a
///   case-insensitive substring of any searchable field.
/// - Ordering keys are applied in order, with the primary key appended as a
///   final tiebreaker so pagination is stable.
///
/// # Example
///
/// ```
/// use projectmgr_shared::models::listing::{search_terms, OrderBy, ProjectOrderField, SortDirection};
///
/// assert_eq!(search_terms("rust, web  api"), vec!["rust", "web", "api"]);
///
/// let ordering = OrderBy::<ProjectOrderField>::parse_list("-created_at,bogus,title");
/// assert_eq!(ordering.len(), 2);
/// assert_eq!(ordering[0].direction, SortDirection::Desc);
/// ```

use std::cmp::Ordering;

use super::project::ProjectWithOwner;
use super::user::User;

/// Sort direction for an ordering key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// A whitelisted column a list endpoint may be ordered by
pub trait OrderField: Copy + Sized {
    /// Parses a public field name (as used in `?ordering=`)
    fn parse(name: &str) -> Option<Self>;

    /// Column expression used in SQL `ORDER BY`
    fn column(&self) -> &'static str;
}

/// One ordering key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F: OrderField> OrderBy<F> {
    /// Parses a comma-separated ordering parameter such as `title,-created_at`
    ///
    /// Unknown fields are dropped silently.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|item| {
                let (direction, name) = match item.strip_prefix('-') {
                    Some(name) => (SortDirection::Desc, name),
                    None => (SortDirection::Asc, item),
                };
                F::parse(name).map(|field| OrderBy { field, direction })
            })
            .collect()
    }
}

/// Renders the `ORDER BY` body for the given keys, ending with `tiebreak ASC`
pub fn order_by_clause<F: OrderField>(ordering: &[OrderBy<F>], tiebreak: &str) -> String {
    let mut parts: Vec<String> = ordering
        .iter()
        .map(|o| format!("{} {}", o.field.column(), o.direction.sql()))
        .collect();
    parts.push(format!("{} ASC", tiebreak));
    parts.join(", ")
}

/// Splits a search parameter into terms on whitespace and commas
pub fn search_terms(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builds an `ILIKE` pattern matching `term` anywhere, with LIKE wildcards escaped
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Fields users can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserOrderField {
    Username,
    Email,
}

impl OrderField for UserOrderField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "username" => Some(UserOrderField::Username),
            "email" => Some(UserOrderField::Email),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            UserOrderField::Username => "username",
            UserOrderField::Email => "email",
        }
    }
}

/// Fields projects can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectOrderField {
    Title,
    CreatedAt,
}

impl OrderField for ProjectOrderField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "title" => Some(ProjectOrderField::Title),
            "created_at" => Some(ProjectOrderField::CreatedAt),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            ProjectOrderField::Title => "p.title",
            ProjectOrderField::CreatedAt => "p.created_at",
        }
    }
}

/// Filter for the user list: search over username and email
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: Vec<String>,
    pub ordering: Vec<OrderBy<UserOrderField>>,
}

impl UserFilter {
    /// Whether `user` passes every search term
    pub fn matches(&self, user: &User) -> bool {
        self.search
            .iter()
            .all(|term| contains_ci(&user.username, term) || contains_ci(&user.email, term))
    }

    /// Total order implied by the ordering keys, id last
    pub fn compare(&self, a: &User, b: &User) -> Ordering {
        self.ordering
            .iter()
            .map(|o| {
                let ord = match o.field {
                    UserOrderField::Username => a.username.cmp(&b.username),
                    UserOrderField::Email => a.email.cmp(&b.email),
                };
                o.direction.apply(ord)
            })
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| a.id.cmp(&b.id))
    }
}

/// Filter for the project list
///
/// `owner_id` and `title` are exact matches; `search` runs over the title.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub owner_id: Option<i64>,
    pub title: Option<String>,
    pub search: Vec<String>,
    pub ordering: Vec<OrderBy<ProjectOrderField>>,
}

impl ProjectFilter {
    /// Whether `project` passes the exact filters and every search term
    pub fn matches(&self, project: &ProjectWithOwner) -> bool {
        if let Some(owner_id) = self.owner_id {
            if project.owner_id != owner_id {
                return false;
            }
        }
        if let Some(ref title) = self.title {
            if &project.title != title {
                return false;
            }
        }
        self.search.iter().all(|term| contains_ci(&project.title, term))
    }

    /// Total order implied by the ordering keys, id last
    pub fn compare(&self, a: &ProjectWithOwner, b: &ProjectWithOwner) -> Ordering {
        self.ordering
            .iter()
            .map(|o| {
                let ord = match o.field {
                    ProjectOrderField::Title => a.title.cmp(&b.title),
                    ProjectOrderField::CreatedAt => a.created_at.cmp(&b.created_at),
                };
                o.direction.apply(ord)
            })
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| a.id.cmp(&b.id))
    }
}

/// Window of rows to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
}

/// One window of a filtered list, with the size of the whole filtered list
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub total: i64,
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn user(id: i64, username: &str, email: &str) -> User {
        let now = Utc::now();
        User {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn project(id: i64, title: &str, owner_id: i64, age_minutes: i64) -> ProjectWithOwner {
        ProjectWithOwner {
            id,
            title: title.to_string(),
            description: String::new(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
            owner_id,
            owner_username: format!("owner{}", owner_id),
            owner_email: format!("owner{}@example.com", owner_id),
        }
    }

    #[test]
    fn test_search_terms_split() {
        assert_eq!(search_terms("  foo  "), vec!["foo"]);
        assert_eq!(search_terms("foo,bar baz"), vec!["foo", "bar", "baz"]);
        assert!(search_terms(" , ").is_empty());
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("foo"), "%foo%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_parse_ordering_ignores_unknown_fields() {
        let ordering = OrderBy::<UserOrderField>::parse_list(" -email , password,username");
        assert_eq!(
            ordering,
            vec![
                OrderBy { field: UserOrderField::Email, direction: SortDirection::Desc },
                OrderBy { field: UserOrderField::Username, direction: SortDirection::Asc },
            ]
        );

        assert!(OrderBy::<ProjectOrderField>::parse_list("owner,-id").is_empty());
    }

    #[test]
    fn test_order_by_clause() {
        let ordering = OrderBy::<ProjectOrderField>::parse_list("-created_at,title");
        assert_eq!(
            order_by_clause(&ordering, "p.id"),
            "p.created_at DESC, p.title ASC, p.id ASC"
        );
        assert_eq!(order_by_clause::<UserOrderField>(&[], "id"), "id ASC");
    }

    #[test]
    fn test_user_filter_matches_any_field_all_terms() {
        let filter = UserFilter {
            search: search_terms("ALI example"),
            ordering: vec![],
        };

        assert!(filter.matches(&user(1, "alice", "a@example.com")));
        assert!(!filter.matches(&user(2, "alice", "a@corp.io")));
        assert!(!filter.matches(&user(3, "bob", "bob@example.com")));
    }

    #[test]
    fn test_user_filter_compare_falls_back_to_id() {
        let filter = UserFilter {
            search: vec![],
            ordering: OrderBy::parse_list("-username"),
        };
        let mut users = vec![
            user(3, "bob", "b1@x.com"),
            user(1, "carol", "c@x.com"),
            user(2, "bob", "b2@x.com"),
        ];
        users.sort_by(|a, b| filter.compare(a, b));

        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_project_filter_matches() {
        let foo = project(1, "Foo Tracker", 10, 0);
        let bar = project(2, "Bar", 11, 0);

        let by_search = ProjectFilter {
            search: search_terms("foo"),
            ..Default::default()
        };
        assert!(by_search.matches(&foo));
        assert!(!by_search.matches(&bar));

        let by_owner = ProjectFilter {
            owner_id: Some(11),
            ..Default::default()
        };
        assert!(!by_owner.matches(&foo));
        assert!(by_owner.matches(&bar));

        let by_title = ProjectFilter {
            title: Some("Foo".to_string()),
            ..Default::default()
        };
        assert!(!by_title.matches(&foo), "title filter is exact");
    }

    #[test]
    fn test_project_filter_compare_created_at_desc() {
        let filter = ProjectFilter {
            ordering: OrderBy::parse_list("-created_at"),
            ..Default::default()
        };
        let mut projects = vec![project(1, "a", 1, 30), project(2, "b", 1, 10), project(3, "c", 1, 20)];
        projects.sort_by(|a, b| filter.compare(a, b));

        let ids: Vec<i64> = projects.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
