pub mod bootstrap;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use chrono::Duration;
use fieldops_auth::TokenIssuer;
use sea_orm::DatabaseConnection;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

pub use error::{ApiError, ApiResult};

/// Application state shared across handlers
pub struct AppState {
    pub db: DatabaseConnection,
    pub tokens: TokenIssuer,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Fieldops API",
        version = "0.1.0",
        description = "Scheduling of field service visits: clients, services, teams, visits and reports"
    ),
    paths(
        handlers::health::health_check,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::get_current_user,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::teams::list_teams,
        handlers::teams::get_team,
        handlers::teams::create_team,
        handlers::teams::update_team,
        handlers::teams::delete_team,
        handlers::clients::list_clients,
        handlers::clients::get_client,
        handlers::clients::create_client,
        handlers::clients::update_client,
        handlers::clients::delete_client,
        handlers::services::list_services,
        handlers::services::get_service,
        handlers::services::create_service,
        handlers::services::update_service,
        handlers::services::delete_service,
        handlers::visits::list_visits,
        handlers::visits::get_visit,
        handlers::visits::create_visit,
        handlers::visits::update_visit,
        handlers::visits::complete_visit,
        handlers::visits::cancel_visit,
        handlers::reports::team_report,
        handlers::reports::client_report,
        handlers::reports::hours_report,
    ),
    components(
        schemas(
            fieldops_core::Role,
            fieldops_core::VisitStatus,
            fieldops_core::StatusCounts,
            fieldops_core::TeamHours,
            fieldops_core::VisitHours,
            models::ErrorResponse,
            models::MessageResponse,
            models::HealthResponse,
            models::LoginRequest,
            models::LoginResponse,
            models::SessionUser,
            models::UserSummary,
            models::TeamRef,
            models::User,
            models::CreateUserRequest,
            models::UpdateUserRequest,
            models::Team,
            models::TeamDetail,
            models::CreateTeamRequest,
            models::UpdateTeamRequest,
            models::Client,
            models::ClientDetail,
            models::CreateClientRequest,
            models::UpdateClientRequest,
            models::Service,
            models::ServiceDetail,
            models::CreateServiceRequest,
            models::UpdateServiceRequest,
            models::VisitSummary,
            models::Visit,
            models::CreateVisitRequest,
            models::UpdateVisitRequest,
            models::CompleteVisitRequest,
            models::CancelVisitResponse,
            models::TeamReport,
            models::ClientReport,
            models::ReportPeriod,
            models::HoursReport,
        )
    ),
    tags(
        (name = "auth", description = "Login, logout and current identity"),
        (name = "users", description = "Identity management"),
        (name = "teams", description = "Field teams and membership"),
        (name = "clients", description = "Client records"),
        (name = "services", description = "Service catalog"),
        (name = "visits", description = "Visit scheduling and lifecycle"),
        (name = "reports", description = "Aggregates over visits"),
        (name = "system", description = "System health")
    )
)]
struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS
    pub enable_cors: bool,
    /// Allowed CORS origins (if None, localhost origins are allowed)
    pub cors_origins: Option<Vec<String>>,
    /// Secret for signing session tokens
    pub jwt_secret: String,
    /// Session token lifetime
    pub token_ttl: Duration,
}

impl ApiServerConfig {
    pub fn new(bind_addr: SocketAddr, jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr,
            enable_cors: true,
            cors_origins: None,
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::hours(24),
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, db: DatabaseConnection) -> Self {
        let tokens = TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_ttl);
        let state = Arc::new(AppState { db, tokens });

        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let api_doc = ApiDoc::openapi();

        let jwt_state = Arc::new(middleware::JwtState::new(self.state.tokens.validator()));

        // PUBLIC routes
        let public_router = Router::new()
            .route("/api/health", get(handlers::health::health_check))
            .route("/api/auth/login", post(handlers::auth::login))
            .route("/api/auth/logout", post(handlers::auth::logout))
            .with_state(self.state.clone());

        // PROTECTED routes (bearer session token)
        let protected_router = Router::new()
            .route("/api/auth/me", get(handlers::auth::get_current_user))
            .route(
                "/api/users",
                get(handlers::users::list_users).post(handlers::users::create_user),
            )
            .route(
                "/api/users/{id}",
                get(handlers::users::get_user)
                    .put(handlers::users::update_user)
                    .delete(handlers::users::delete_user),
            )
            .route(
                "/api/teams",
                get(handlers::teams::list_teams).post(handlers::teams::create_team),
            )
            .route(
                "/api/teams/{id}",
                get(handlers::teams::get_team)
                    .put(handlers::teams::update_team)
                    .delete(handlers::teams::delete_team),
            )
            .route(
                "/api/clients",
                get(handlers::clients::list_clients).post(handlers::clients::create_client),
            )
            .route(
                "/api/clients/{id}",
                get(handlers::clients::get_client)
                    .put(handlers::clients::update_client)
                    .delete(handlers::clients::delete_client),
            )
            .route(
                "/api/services",
                get(handlers::services::list_services).post(handlers::services::create_service),
            )
            .route(
                "/api/services/{id}",
                get(handlers::services::get_service)
                    .put(handlers::services::update_service)
                    .delete(handlers::services::delete_service),
            )
            .route(
                "/api/visits",
                get(handlers::visits::list_visits).post(handlers::visits::create_visit),
            )
            .route(
                "/api/visits/{id}",
                get(handlers::visits::get_visit)
                    .put(handlers::visits::update_visit)
                    .delete(handlers::visits::cancel_visit),
            )
            .route("/api/visits/{id}/complete", put(handlers::visits::complete_visit))
            .route("/api/reports/team/{team_id}", get(handlers::reports::team_report))
            .route("/api/reports/client/{client_id}", get(handlers::reports::client_report))
            .route("/api/reports/hours", get(handlers::reports::hours_report))
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                jwt_state,
                middleware::require_auth,
            ));

        let router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(public_router)
            .merge(protected_router);

        let mut router = router.layer(TraceLayer::new_for_http());

        if let Some(cors) = self.cors_layer() {
            router = router.layer(cors);
        }

        router
    }

    fn cors_layer(&self) -> Option<CorsLayer> {
        if !self.config.enable_cors {
            return None;
        }

        let allow_origin = match &self.config.cors_origins {
            Some(origins) => {
                let parsed: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|origin| match HeaderValue::from_str(origin) {
                        Ok(value) => Some(value),
                        Err(_) => {
                            warn!("Ignoring invalid CORS origin: {}", origin);
                            None
                        }
                    })
                    .collect();
                AllowOrigin::list(parsed)
            }
            // Development default: any localhost port
            None => AllowOrigin::predicate(|origin: &HeaderValue, _| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str.starts_with("http://localhost:")
                    || origin_str.starts_with("http://127.0.0.1:")
                    || origin_str.starts_with("https://localhost:")
                    || origin_str.starts_with("https://127.0.0.1:")
            }),
        };

        Some(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::PATCH,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_origin(allow_origin),
        )
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!("OpenAPI document: http://{}/api/openapi.json", self.config.bind_addr);
        info!("Swagger UI: http://{}/swagger-ui", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}
