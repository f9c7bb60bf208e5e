//! Configuration entity model
//!
//! This module contains the SeaORM entity model for the configurations table,
//! which stores the per-company link to the Smart Solutions Platform.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a platform configuration.
///
/// `error` is never terminal; a later successful registration or
/// test-connection call moves the record back to `connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationStatus {
    Unconfigured,
    Connected,
    Error,
}

impl ConfigurationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigurationStatus::Unconfigured => "unconfigured",
            ConfigurationStatus::Connected => "connected",
            ConfigurationStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for ConfigurationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConfigurationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "unconfigured" => Ok(ConfigurationStatus::Unconfigured),
            "connected" => Ok(ConfigurationStatus::Connected),
            "error" => Ok(ConfigurationStatus::Error),
            other => Err(format!("unknown configuration status '{}'", other)),
        }
    }
}

/// Configuration entity linking one company to the remote platform
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "configurations")]
pub struct Model {
    /// Unique identifier for the configuration (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning company; unique across the table, immutable after creation
    pub company_id: Uuid,

    /// Company display name, sent in the registration payload
    pub company_name: String,

    /// Contact name for the remote account (defaulted from the requesting user)
    pub admin_name: Option<String>,

    /// Contact email for the remote account (the platform login)
    pub admin_email: String,

    /// Locally generated secret authenticating this instance during
    /// registration; generated once, never regenerated
    pub communication_token: String,

    /// Bearer credential issued by the platform after successful registration
    pub api_key: Option<String>,

    /// Platform-assigned account identifier
    pub account_id: Option<String>,

    /// Base URL of the remote platform
    pub platform_base_url: String,

    /// Optional ISO country code forwarded during registration
    pub country_code: Option<String>,

    /// Soft-enable flag; records are deactivated, never deleted
    pub active: bool,

    /// Lifecycle status: unconfigured | connected | error
    pub status: String,

    /// Timestamp of the most recent successful exchange with the platform
    pub last_sync_at: Option<DateTimeWithTimeZone>,

    /// Timestamp when the configuration was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the configuration was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parsed lifecycle status; unknown values collapse to `error`.
    pub fn lifecycle_status(&self) -> ConfigurationStatus {
        self.status
            .parse()
            .unwrap_or(ConfigurationStatus::Error)
    }

    /// True once the platform has issued credentials for this record.
    pub fn is_registered(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }

    /// Dashboard entry URL carrying the API key for single-sign-on.
    pub fn sso_url(&self) -> Option<String> {
        let api_key = self.api_key.as_deref().filter(|key| !key.is_empty())?;
        Some(format!(
            "{}/sso/odoo?token={}",
            self.platform_base_url.trim_end_matches('/'),
            api_key
        ))
    }
}
