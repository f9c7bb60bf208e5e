//! Configuration repository for database operations
//!
//! This module provides the ConfigurationRepository struct which encapsulates
//! SeaORM operations for the configurations table. Uniqueness of
//! `company_id` is enforced by the schema; duplicate creates surface the
//! backend's unique-violation error.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::configuration::{self, ConfigurationStatus, Entity as Configuration};

/// Repository for configuration database operations
#[derive(Debug, Clone)]
pub struct ConfigurationRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl ConfigurationRepository {
    /// Creates a new ConfigurationRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a new configuration record.
    ///
    /// Propagates the raw `DbErr` so callers can distinguish unique-violation
    /// conflicts from other failures.
    pub async fn create(
        &self,
        configuration: configuration::ActiveModel,
    ) -> Result<configuration::Model, sea_orm::DbErr> {
        let id = configuration
            .id
            .clone()
            .take()
            .ok_or_else(|| sea_orm::DbErr::Custom("configuration id must be set".to_string()))?;

        configuration.insert(&*self.db).await?;

        // For SQLite, query the record directly since we already know the ID.
        let fetched = Configuration::find_by_id(id).one(&*self.db).await?;
        fetched.ok_or_else(|| sea_orm::DbErr::RecordNotFound("configuration".to_string()))
    }

    /// Retrieves a configuration by its ID
    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<configuration::Model>> {
        Ok(Configuration::find_by_id(*id).one(&*self.db).await?)
    }

    /// Returns the single active configuration for a company, or none.
    pub async fn find_active_by_company(
        &self,
        company_id: &Uuid,
    ) -> Result<Option<configuration::Model>> {
        Ok(Configuration::find()
            .filter(configuration::Column::CompanyId.eq(*company_id))
            .filter(configuration::Column::Active.eq(true))
            .one(&*self.db)
            .await?)
    }

    /// Lists every active configuration for a company.
    ///
    /// The schema guarantees at most one row per company; the full list form
    /// exists so callers can enforce the ensure-one contract explicitly.
    pub async fn list_active_by_company(
        &self,
        company_id: &Uuid,
    ) -> Result<Vec<configuration::Model>> {
        Ok(Configuration::find()
            .filter(configuration::Column::CompanyId.eq(*company_id))
            .filter(configuration::Column::Active.eq(true))
            .all(&*self.db)
            .await?)
    }

    /// Persists the credentials issued by the platform after a successful
    /// registration, advancing the record to `connected` in the same update.
    pub async fn mark_registered(
        &self,
        id: &Uuid,
        account_id: String,
        api_key: String,
        synced_at: DateTime<Utc>,
    ) -> Result<configuration::Model> {
        let existing = self.require(id).await?;

        let mut model: configuration::ActiveModel = existing.into();
        model.account_id = Set(Some(account_id));
        model.api_key = Set(Some(api_key));
        model.status = Set(ConfigurationStatus::Connected.as_str().to_string());
        let fixed: DateTimeWithTimeZone = synced_at.into();
        model.last_sync_at = Set(Some(fixed));
        model.updated_at = Set(Utc::now().into());

        Ok(model.update(&*self.db).await?)
    }

    /// Updates the lifecycle status, optionally stamping `last_sync_at`.
    pub async fn set_status(
        &self,
        id: &Uuid,
        status: ConfigurationStatus,
        synced_at: Option<DateTime<Utc>>,
    ) -> Result<configuration::Model> {
        let existing = self.require(id).await?;

        let mut model: configuration::ActiveModel = existing.into();
        model.status = Set(status.as_str().to_string());
        if let Some(synced_at) = synced_at {
            let fixed: DateTimeWithTimeZone = synced_at.into();
            model.last_sync_at = Set(Some(fixed));
        }
        model.updated_at = Set(Utc::now().into());

        Ok(model.update(&*self.db).await?)
    }

    /// Soft-deactivates a configuration; records are never deleted.
    pub async fn deactivate(&self, id: &Uuid) -> Result<configuration::Model> {
        let existing = self.require(id).await?;

        let mut model: configuration::ActiveModel = existing.into();
        model.active = Set(false);
        model.updated_at = Set(Utc::now().into());

        Ok(model.update(&*self.db).await?)
    }

    async fn require(&self, id: &Uuid) -> Result<configuration::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow!("Configuration '{}' not found", id))
    }
}
