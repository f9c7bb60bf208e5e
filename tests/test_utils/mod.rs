//! Test utilities for database testing.
//!
//! This module provides utilities for setting up in-memory SQLite databases
//! with migrations for testing purposes.

use anyhow::Result;
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use ssp_connector::models::configuration;
use uuid::Uuid;

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Inserts a configuration row directly for testing.
#[allow(dead_code)]
pub async fn insert_configuration(
    db: &DatabaseConnection,
    company_id: Uuid,
    api_key: Option<&str>,
    status: &str,
) -> Result<configuration::Model> {
    let now = Utc::now();
    let model = configuration::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(company_id),
        company_name: Set("Test Company".to_string()),
        admin_name: Set(Some("Test Admin".to_string())),
        admin_email: Set("admin@test.example".to_string()),
        communication_token: Set("test-communication-token".to_string()),
        api_key: Set(api_key.map(str::to_string)),
        account_id: Set(api_key.map(|_| "1".to_string())),
        platform_base_url: Set("https://platform.test".to_string()),
        country_code: Set(None),
        active: Set(true),
        status: Set(status.to_string()),
        last_sync_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(model.insert(db).await?)
}
