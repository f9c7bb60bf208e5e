//! # Server Configuration
//!
//! This module contains the server setup and configuration for the SSP
//! Connector service.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::handlers;
use crate::manager::{ConnectionManager, InstanceIdentity};
use crate::platform::{HttpPlatformClient, PlatformClient};
use crate::repositories::ConfigurationRepository;
use crate::token::{TokenGenerator, UrlSafeTokenGenerator};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub platform: Arc<dyn PlatformClient>,
    pub tokens: Arc<dyn TokenGenerator>,
}

impl AppState {
    /// Builds state with the production platform client and token generator.
    pub fn new(config: Arc<AppConfig>, db: DatabaseConnection) -> Self {
        let platform = Arc::new(HttpPlatformClient::new(
            Duration::from_secs(config.register_timeout_seconds),
            Duration::from_secs(config.test_timeout_seconds),
        ));
        Self {
            config,
            db,
            platform,
            tokens: Arc::new(UrlSafeTokenGenerator),
        }
    }

    /// Assembles a connection manager over this state's resources.
    pub fn manager(&self) -> ConnectionManager {
        ConnectionManager::new(
            ConfigurationRepository::new(Arc::new(self.db.clone())),
            Arc::clone(&self.platform),
            Arc::clone(&self.tokens),
            InstanceIdentity {
                base_url: self.config.instance_base_url.clone(),
                database: self.config.instance_database.clone(),
            },
            self.config.platform_base_url.clone(),
        )
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route(
            "/configurations",
            post(handlers::configurations::create_configuration),
        )
        .route(
            "/configurations/{company_id}",
            get(handlers::configurations::get_configuration)
                .delete(handlers::configurations::deactivate_configuration),
        )
        .route(
            "/configurations/{company_id}/register",
            post(handlers::configurations::register),
        )
        .route(
            "/configurations/{company_id}/test-connection",
            post(handlers::configurations::test_connection),
        )
        .route(
            "/configurations/{company_id}/entry-point",
            get(handlers::configurations::entry_point),
        )
        .route(
            "/dashboard/{company_id}",
            get(handlers::dashboard::open_dashboard),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let state = AppState::new(Arc::new(config), db);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::configurations::create_configuration,
        crate::handlers::configurations::get_configuration,
        crate::handlers::configurations::deactivate_configuration,
        crate::handlers::configurations::register,
        crate::handlers::configurations::test_connection,
        crate::handlers::configurations::entry_point,
        crate::handlers::dashboard::open_dashboard,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::configuration::ConfigurationStatus,
            crate::handlers::configurations::CreateConfigurationRequest,
            crate::handlers::configurations::RegisterRequestBody,
            crate::handlers::configurations::ConfigurationInfo,
            crate::manager::Notification,
            crate::manager::NotificationKind,
            crate::manager::EntryPoint,
            crate::error::ApiError,
        )
    ),
    info(
        title = "SSP Connector API",
        description = "Links an ERP instance to the Smart Solutions Platform and resolves single-sign-on dashboard access",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
