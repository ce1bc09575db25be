/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use projectmgr_api::{app::AppState, config::Config};
/// use projectmgr_shared::{db::pool::create_pool, store::PgStore};
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.database.pool_config()).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), config);
/// let app = projectmgr_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use projectmgr_shared::{
    auth::middleware::{resolve_identity, AuthError},
    store::Store,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check
/// ├── /swagger/                        # Swagger UI
/// └── /api/
///     ├── openapi.json                 # served by the Swagger UI router
///     ├── login/                       # POST
///     ├── token/refresh/               # POST
///     ├── me/                          # GET (authenticated)
///     ├── users/                       # GET list, POST register
///     │   ├── register/                # POST
///     │   └── :username/               # GET PUT PATCH DELETE (authenticated)
///     └── projects/                    # GET list, POST create (authenticated)
///         ├── :id/                     # GET
///         └── :id/:username/           # GET PUT PATCH DELETE (ownership-scoped)
/// ```
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. Security headers
/// 2. CORS
/// 3. Request tracing
/// 4. Identity resolution (every route; anonymous when no header)
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/login/", post(routes::auth::login))
        .route("/token/refresh/", post(routes::auth::refresh))
        .route("/me/", get(routes::auth::me))
        .route(
            "/users/",
            get(routes::users::list_users).post(routes::users::register),
        )
        .route("/users/register/", post(routes::users::register))
        .route(
            "/users/:username/",
            get(routes::users::get_user)
                .put(routes::users::replace_user)
                .patch(routes::users::patch_user)
                .delete(routes::users::delete_user),
        )
        .route(
            "/projects/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route("/projects/:id/", get(routes::projects::get_project))
        .route(
            "/projects/:id/:username/",
            get(routes::projects::get_scoped_project)
                .put(routes::projects::replace_project)
                .patch(routes::projects::patch_project)
                .delete(routes::projects::delete_project),
        );

    let cors = if state.config.cors_permissive() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(routes::docs::swagger_ui())
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            identity_layer,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Resolves the bearer token (if any) into an `AuthContext` extension
async fn identity_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    resolve_identity(state.store.as_ref(), &state.config.jwt.secret, req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode};
    use projectmgr_shared::store::MemoryStore;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let config = Config::with_defaults(
            "postgresql://localhost/unused",
            "test-secret-key-at-least-32-bytes-long",
        );
        build_router(AppState::new(Arc::new(MemoryStore::new()), config))
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_authorization_is_bad_request() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/users/")
                    .header(header::AUTHORIZATION, "Token abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = test_app()
            .oneshot(Request::builder().uri("/v1/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
