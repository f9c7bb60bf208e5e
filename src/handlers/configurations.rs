//! # Configuration API Handlers
//!
//! Handlers for creating platform configurations, triggering manual
//! registration, testing the connection and resolving the entry point.

use crate::error::ApiError;
use crate::manager::{EntryPoint, NewConfiguration, Notification};
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Request body for creating a configuration
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateConfigurationRequest {
    /// Owning company identifier
    #[schema(value_type = String)]
    pub company_id: Uuid,
    /// Company display name, forwarded to the platform
    pub company_name: String,
    /// Email for the platform account (will be the login)
    pub admin_email: String,
    /// Contact name; defaults to the requesting user when omitted
    pub admin_name: Option<String>,
    /// Pre-provisioned communication token; generated when omitted
    pub communication_token: Option<String>,
    /// Platform base URL override
    pub platform_base_url: Option<String>,
    /// Optional ISO country code
    pub country_code: Option<String>,
    /// Login of the user performing the request
    pub requested_by: Option<String>,
}

/// Request body for manual (re-)registration
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct RegisterRequestBody {
    /// Login of the user performing the request
    pub requested_by: Option<String>,
}

/// Configuration information for API responses
///
/// Secrets never leave the service: the communication token and API key are
/// reported as presence flags only.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConfigurationInfo {
    /// Unique identifier for the configuration
    #[schema(value_type = String)]
    pub id: Uuid,
    /// Owning company identifier
    #[schema(value_type = String)]
    pub company_id: Uuid,
    pub company_name: String,
    pub admin_name: Option<String>,
    pub admin_email: String,
    pub platform_base_url: String,
    pub country_code: Option<String>,
    pub active: bool,
    /// Lifecycle status: unconfigured | connected | error
    pub status: String,
    /// Platform-assigned account identifier, once registered
    pub account_id: Option<String>,
    /// Whether the platform has issued an API key
    pub has_api_key: bool,
    /// Timestamp of the last successful platform exchange (RFC 3339)
    pub last_sync_at: Option<String>,
}

impl From<crate::models::configuration::Model> for ConfigurationInfo {
    fn from(model: crate::models::configuration::Model) -> Self {
        Self {
            id: model.id,
            company_id: model.company_id,
            has_api_key: model.is_registered(),
            last_sync_at: model
                .last_sync_at
                .map(|dt| dt.naive_utc().and_utc().to_rfc3339()),
            company_name: model.company_name,
            admin_name: model.admin_name,
            admin_email: model.admin_email,
            platform_base_url: model.platform_base_url,
            country_code: model.country_code,
            active: model.active,
            status: model.status,
            account_id: model.account_id,
        }
    }
}

/// Creates a configuration and immediately attempts platform registration
#[utoipa::path(
    post,
    path = "/configurations",
    request_body = CreateConfigurationRequest,
    responses(
        (status = 201, description = "Configuration created (registration may have failed, see status)", body = ConfigurationInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 409, description = "Configuration already exists for this company", body = ApiError)
    ),
    tag = "configurations"
)]
pub async fn create_configuration(
    State(state): State<AppState>,
    Json(request): Json<CreateConfigurationRequest>,
) -> Result<(StatusCode, Json<ConfigurationInfo>), ApiError> {
    let manager = state.manager();

    let record = manager
        .create_configuration(NewConfiguration {
            company_id: request.company_id,
            company_name: request.company_name,
            admin_email: request.admin_email,
            admin_name: request.admin_name,
            communication_token: request.communication_token,
            platform_base_url: request.platform_base_url,
            country_code: request.country_code,
            requested_by: request.requested_by,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Returns the active configuration for a company
#[utoipa::path(
    get,
    path = "/configurations/{company_id}",
    params(
        ("company_id" = String, Path, description = "Company identifier")
    ),
    responses(
        (status = 200, description = "Active configuration", body = ConfigurationInfo),
        (status = 404, description = "No active configuration", body = ApiError)
    ),
    tag = "configurations"
)]
pub async fn get_configuration(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<ConfigurationInfo>, ApiError> {
    let manager = state.manager();

    match manager.get_active_configuration(&company_id).await? {
        Some(record) => Ok(Json(record.into())),
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "No active configuration exists for this company",
        )),
    }
}

/// Soft-deactivates the company's configuration
#[utoipa::path(
    delete,
    path = "/configurations/{company_id}",
    params(
        ("company_id" = String, Path, description = "Company identifier")
    ),
    responses(
        (status = 204, description = "Configuration deactivated"),
        (status = 404, description = "No active configuration", body = ApiError)
    ),
    tag = "configurations"
)]
pub async fn deactivate_configuration(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let manager = state.manager();

    manager.deactivate_configuration(&company_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Manually (re-)registers the company's configuration with the platform
#[utoipa::path(
    post,
    path = "/configurations/{company_id}/register",
    params(
        ("company_id" = String, Path, description = "Company identifier")
    ),
    request_body = RegisterRequestBody,
    responses(
        (status = 200, description = "Registration succeeded", body = Notification),
        (status = 404, description = "No active configuration", body = ApiError),
        (status = 409, description = "Email already registered on the platform", body = ApiError),
        (status = 502, description = "Platform rejected or was unreachable", body = ApiError)
    ),
    tag = "configurations"
)]
pub async fn register(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    body: Option<Json<RegisterRequestBody>>,
) -> Result<Json<Notification>, ApiError> {
    let manager = state.manager();
    let requested_by = body.and_then(|Json(b)| b.requested_by);

    let notification = manager
        .register(&company_id, requested_by.as_deref())
        .await?;
    Ok(Json(notification))
}

/// Tests the connection to the platform with the stored API key
#[utoipa::path(
    post,
    path = "/configurations/{company_id}/test-connection",
    params(
        ("company_id" = String, Path, description = "Company identifier")
    ),
    responses(
        (status = 200, description = "Test outcome (success or danger)", body = Notification),
        (status = 404, description = "No active configuration", body = ApiError)
    ),
    tag = "configurations"
)]
pub async fn test_connection(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let manager = state.manager();

    let notification = manager.test_connection(&company_id).await?;
    Ok(Json(notification))
}

/// Resolves where a user opening the platform should be routed
#[utoipa::path(
    get,
    path = "/configurations/{company_id}/entry-point",
    params(
        ("company_id" = String, Path, description = "Company identifier")
    ),
    responses(
        (status = 200, description = "Entry point decision", body = EntryPoint)
    ),
    tag = "configurations"
)]
pub async fn entry_point(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<EntryPoint>, ApiError> {
    let manager = state.manager();

    let entry = manager.resolve_entry_point(&company_id).await?;
    Ok(Json(entry))
}
