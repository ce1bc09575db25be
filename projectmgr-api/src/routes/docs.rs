/// OpenAPI document and Swagger UI
///
/// - `GET /api/openapi.json`: the generated document
/// - `GET /swagger/`: Swagger UI rendering it

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::error::{ErrorResponse, ValidationErrorDetail};
use crate::routes::{auth, health, projects, users};

/// OpenAPI documentation for the whole API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "projectmgr API",
        description = "Users and the projects they own"
    ),
    paths(
        health::health_check,
        auth::login,
        auth::refresh,
        auth::me,
        users::register,
        users::list_users,
        users::get_user,
        users::replace_user,
        users::patch_user,
        users::delete_user,
        projects::list_projects,
        projects::create_project,
        projects::get_project,
        projects::get_scoped_project,
        projects::replace_project,
        projects::patch_project,
        projects::delete_project,
    ),
    components(schemas(
        health::HealthResponse,
        auth::LoginRequest,
        auth::LoginResponse,
        auth::RefreshRequest,
        auth::RefreshResponse,
        users::UserResponse,
        users::UserInput,
        users::UserPage,
        projects::ProjectResponse,
        projects::ProjectInput,
        projects::ProjectPage,
        ErrorResponse,
        ValidationErrorDetail,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Login and tokens"),
        (name = "users", description = "User accounts"),
        (name = "projects", description = "Projects and ownership")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` JWT scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Swagger UI at `/swagger/`, serving the document at `/api/openapi.json`
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger").url("/api/openapi.json", ApiDoc::openapi())
}
