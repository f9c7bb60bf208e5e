//! Connection lifecycle management.
//!
//! The [`ConnectionManager`] owns the state machine that takes a
//! configuration from `unconfigured` to `connected` (or `error`): token
//! generation, remote registration, connection testing and entry-point
//! resolution. Persistence goes through [`ConfigurationRepository`]; the
//! remote platform is reached only through the [`PlatformClient`] trait.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::is_unique_violation;
use crate::models::configuration::{self, ConfigurationStatus, Model as ConfigurationModel};
use crate::platform::{PlatformClient, PlatformError, RegistrationRequest};
use crate::repositories::ConfigurationRepository;
use crate::token::TokenGenerator;

/// Registration failures surfaced to callers of [`ConnectionManager::register`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// The platform answered 200 with `success: false`.
    #[error("platform rejected registration: {message}")]
    Rejected { message: String },
    /// The platform answered 409. The configuration was marked connected
    /// anyway; the remote account is presumed to already exist.
    #[error(
        "this email is already registered on the platform; the configuration was marked as \
         connected, but the dashboard token may need a manual refresh if the dashboard does \
         not open"
    )]
    AlreadyRegistered,
    /// Any other HTTP status.
    #[error("unexpected platform response HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    /// Transport-level failure (timeout, refused connection, DNS).
    #[error("connection error: {details}")]
    Transport { details: String },
}

impl From<PlatformError> for RegistrationError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Rejected { message } => RegistrationError::Rejected { message },
            PlatformError::Conflict => RegistrationError::AlreadyRegistered,
            PlatformError::UnexpectedStatus { status, body } => {
                RegistrationError::UnexpectedStatus { status, body }
            }
            PlatformError::Transport { details } => RegistrationError::Transport { details },
        }
    }
}

/// Errors produced by the connection manager.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("expected exactly one active configuration for company {company_id}, found {found}")]
    Precondition { company_id: Uuid, found: usize },
    #[error("a configuration already exists for company {company_id}")]
    Duplicate { company_id: Uuid },
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    Db(#[from] anyhow::Error),
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Danger,
}

/// User-facing result object for registration and connection tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

impl Notification {
    pub fn success<T: Into<String>, M: Into<String>>(title: T, message: M) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: NotificationKind::Success,
        }
    }

    pub fn danger<T: Into<String>, M: Into<String>>(title: T, message: M) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: NotificationKind::Danger,
        }
    }
}

/// Where a user should be routed when opening the platform from the ERP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EntryPoint {
    /// No configuration yet: open the creation form pre-filled with the company.
    CreateConfiguration { company_id: Uuid },
    /// Configuration exists but registration has not issued an API key yet.
    EditConfiguration { configuration_id: Uuid },
    /// Fully configured: open the dashboard through single-sign-on.
    Dashboard { sso_url: String },
}

/// Identity of this ERP instance, reported in the registration payload.
#[derive(Debug, Clone)]
pub struct InstanceIdentity {
    /// Externally reachable base URL of the instance.
    pub base_url: String,
    /// Local database/tenant identifier.
    pub database: String,
}

/// Fields accepted when creating a configuration.
#[derive(Debug, Clone)]
pub struct NewConfiguration {
    pub company_id: Uuid,
    pub company_name: String,
    pub admin_email: String,
    pub admin_name: Option<String>,
    /// Kept verbatim when supplied; generated otherwise. Never regenerated.
    pub communication_token: Option<String>,
    pub platform_base_url: Option<String>,
    pub country_code: Option<String>,
    /// Login of the user performing the request; defaults the admin name and
    /// the username sent to the platform.
    pub requested_by: Option<String>,
}

/// Owns the registration/connection lifecycle for configurations.
pub struct ConnectionManager {
    repo: ConfigurationRepository,
    platform: Arc<dyn PlatformClient>,
    tokens: Arc<dyn TokenGenerator>,
    instance: InstanceIdentity,
    default_platform_base_url: String,
}

impl ConnectionManager {
    pub fn new(
        repo: ConfigurationRepository,
        platform: Arc<dyn PlatformClient>,
        tokens: Arc<dyn TokenGenerator>,
        instance: InstanceIdentity,
        default_platform_base_url: String,
    ) -> Self {
        Self {
            repo,
            platform,
            tokens,
            instance,
            default_platform_base_url,
        }
    }

    /// Creates a configuration and immediately attempts registration.
    ///
    /// Registration failure does not abort creation: the record is kept with
    /// `status = error` and the failure is logged. Creation itself fails only
    /// on validation or persistence errors.
    pub async fn create_configuration(
        &self,
        new: NewConfiguration,
    ) -> Result<ConfigurationModel, ManagerError> {
        if new.admin_email.trim().is_empty() || !new.admin_email.contains('@') {
            return Err(ManagerError::Validation(
                "admin_email is required and must be an email address".to_string(),
            ));
        }
        if new.company_name.trim().is_empty() {
            return Err(ManagerError::Validation(
                "company_name is required".to_string(),
            ));
        }

        let communication_token = new
            .communication_token
            .filter(|token| !token.is_empty())
            .unwrap_or_else(|| self.tokens.generate());
        let admin_name = new.admin_name.or_else(|| new.requested_by.clone());
        let platform_base_url = new
            .platform_base_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.default_platform_base_url.clone());

        let now = Utc::now();
        let active_model = configuration::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(new.company_id),
            company_name: Set(new.company_name),
            admin_name: Set(admin_name),
            admin_email: Set(new.admin_email),
            communication_token: Set(communication_token),
            api_key: Set(None),
            account_id: Set(None),
            platform_base_url: Set(platform_base_url),
            country_code: Set(new.country_code),
            active: Set(true),
            status: Set(ConfigurationStatus::Unconfigured.as_str().to_string()),
            last_sync_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let created = self.repo.create(active_model).await.map_err(|err| {
            if is_unique_violation(&err) {
                ManagerError::Duplicate {
                    company_id: new.company_id,
                }
            } else {
                ManagerError::Db(err.into())
            }
        })?;

        match self
            .register(&created.company_id, new.requested_by.as_deref())
            .await
        {
            Ok(_) => {}
            Err(ManagerError::Registration(err)) => {
                // Creation always succeeds once validation passed; the
                // registration failure is recorded on the configuration.
                error!(
                    company_name = %created.company_name,
                    admin_email = %created.admin_email,
                    "Failed to auto-register on the platform: {}",
                    err
                );
                self.repo
                    .set_status(&created.id, ConfigurationStatus::Error, None)
                    .await?;
            }
            Err(other) => return Err(other),
        }

        let refreshed = self
            .repo
            .find_by_id(&created.id)
            .await?
            .unwrap_or(created);
        Ok(refreshed)
    }

    /// Registers the company's single active configuration with the platform.
    ///
    /// The 409 path intentionally advances the record to `connected` while
    /// still failing: state and outcome do not always agree, and callers must
    /// not assume they do.
    pub async fn register(
        &self,
        company_id: &Uuid,
        actor: Option<&str>,
    ) -> Result<Notification, ManagerError> {
        let record = self.ensure_one(company_id).await?;

        let admin_name = record
            .admin_name
            .clone()
            .or_else(|| actor.map(str::to_string))
            .unwrap_or_else(|| record.admin_email.clone());
        let username = actor
            .map(str::to_string)
            .unwrap_or_else(|| record.admin_email.clone());

        let payload = RegistrationRequest {
            company_name: record.company_name.clone(),
            admin_email: record.admin_email.clone(),
            admin_name,
            odoo_url: self.instance.base_url.clone(),
            odoo_database: self.instance.database.clone(),
            odoo_username: username,
            odoo_api_key: record.communication_token.clone(),
            country: record.country_code.clone(),
        };

        info!(
            company_name = %payload.company_name,
            admin_email = %payload.admin_email,
            "Registering on the platform"
        );

        match self
            .platform
            .register(&record.platform_base_url, &payload)
            .await
        {
            Ok(accepted) => {
                let updated = self
                    .repo
                    .mark_registered(
                        &record.id,
                        accepted.account_id.clone(),
                        accepted.sso_token,
                        Utc::now(),
                    )
                    .await?;
                info!(
                    company_name = %updated.company_name,
                    account_id = %accepted.account_id,
                    "Successfully registered on the platform"
                );
                Ok(Notification::success(
                    "Success!",
                    format!(
                        "Account created on the platform. Account ID: {}",
                        accepted.account_id
                    ),
                ))
            }
            Err(PlatformError::Conflict) => {
                // Best-effort recovery: the remote account is presumed to
                // already exist for this email.
                self.repo
                    .set_status(&record.id, ConfigurationStatus::Connected, None)
                    .await?;
                Err(RegistrationError::AlreadyRegistered.into())
            }
            Err(PlatformError::Transport { details }) => {
                error!(
                    company_name = %record.company_name,
                    admin_email = %record.admin_email,
                    "Platform registration transport failure: {}",
                    details
                );
                self.repo
                    .set_status(&record.id, ConfigurationStatus::Error, None)
                    .await?;
                Err(RegistrationError::Transport { details }.into())
            }
            // Rejections and unexpected statuses leave the record untouched.
            Err(other) => {
                warn!(
                    company_name = %record.company_name,
                    admin_email = %record.admin_email,
                    "Platform registration failed: {}",
                    other
                );
                Err(RegistrationError::from(other).into())
            }
        }
    }

    /// Probes the platform with the stored API key.
    ///
    /// Always yields a notification; platform failures are reported through
    /// the `danger` kind rather than raised.
    pub async fn test_connection(&self, company_id: &Uuid) -> Result<Notification, ManagerError> {
        let record = self.ensure_one(company_id).await?;
        let api_key = record.api_key.clone().unwrap_or_default();

        match self
            .platform
            .test_connection(&record.platform_base_url, &api_key)
            .await
        {
            Ok(()) => {
                self.repo
                    .set_status(&record.id, ConfigurationStatus::Connected, Some(Utc::now()))
                    .await?;
                Ok(Notification::success(
                    "Connection OK",
                    "The platform responded to the connection test.",
                ))
            }
            Err(err) => {
                warn!(
                    company_name = %record.company_name,
                    admin_email = %record.admin_email,
                    "Connection test failed: {}",
                    err
                );
                self.repo
                    .set_status(&record.id, ConfigurationStatus::Error, None)
                    .await?;
                Ok(Notification::danger(
                    "Connection failed",
                    format!("The platform could not be reached: {}", err),
                ))
            }
        }
    }

    /// Soft-deactivates the company's configuration. The record and its
    /// communication token are kept; only the `active` flag changes.
    pub async fn deactivate_configuration(&self, company_id: &Uuid) -> Result<(), ManagerError> {
        let record = self.ensure_one(company_id).await?;
        self.repo.deactivate(&record.id).await?;
        info!(company_name = %record.company_name, "Configuration deactivated");
        Ok(())
    }

    /// Returns the single active configuration for the company, or none.
    pub async fn get_active_configuration(
        &self,
        company_id: &Uuid,
    ) -> Result<Option<ConfigurationModel>, ManagerError> {
        Ok(self.repo.find_active_by_company(company_id).await?)
    }

    /// Decides where a user opening the platform should land.
    pub async fn resolve_entry_point(&self, company_id: &Uuid) -> Result<EntryPoint, ManagerError> {
        let Some(config) = self.repo.find_active_by_company(company_id).await? else {
            return Ok(EntryPoint::CreateConfiguration {
                company_id: *company_id,
            });
        };

        match config.sso_url() {
            Some(sso_url) => Ok(EntryPoint::Dashboard { sso_url }),
            None => Ok(EntryPoint::EditConfiguration {
                configuration_id: config.id,
            }),
        }
    }

    /// Ensure-one contract: exactly one active configuration per company.
    async fn ensure_one(&self, company_id: &Uuid) -> Result<ConfigurationModel, ManagerError> {
        let mut records = self.repo.list_active_by_company(company_id).await?;
        if records.len() != 1 {
            return Err(ManagerError::Precondition {
                company_id: *company_id,
                found: records.len(),
            });
        }
        Ok(records.remove(0))
    }
}
