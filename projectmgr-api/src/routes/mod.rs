/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login, token refresh and the current caller
/// - `users`: User registration and management
/// - `projects`: Projects and ownership-scoped access
/// - `docs`: OpenAPI document and Swagger UI
/// - `pagination`: Shared page envelope

pub mod auth;
pub mod docs;
pub mod health;
pub mod pagination;
pub mod projects;
pub mod users;
