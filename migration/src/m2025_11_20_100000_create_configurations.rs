//! Migration to create the configurations table.
//!
//! This migration creates the configurations table which stores the
//! per-company link to the Smart Solutions Platform, including the locally
//! generated communication token and the credentials issued by the platform
//! after registration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Configurations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Configurations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Configurations::CompanyId).uuid().not_null())
                    .col(
                        ColumnDef::new(Configurations::CompanyName)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Configurations::AdminName).text().null())
                    .col(
                        ColumnDef::new(Configurations::AdminEmail)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Configurations::CommunicationToken)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Configurations::ApiKey).text().null())
                    .col(ColumnDef::new(Configurations::AccountId).text().null())
                    .col(
                        ColumnDef::new(Configurations::PlatformBaseUrl)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Configurations::CountryCode).text().null())
                    .col(
                        ColumnDef::new(Configurations::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Configurations::Status)
                            .text()
                            .not_null()
                            .default("unconfigured"),
                    )
                    .col(
                        ColumnDef::new(Configurations::LastSyncAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Configurations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Configurations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One configuration per company, active or not.
        manager
            .create_index(
                Index::create()
                    .name("idx_configurations_company_id")
                    .table(Configurations::Table)
                    .col(Configurations::CompanyId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_configurations_company_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Configurations::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Configurations {
    Table,
    Id,
    CompanyId,
    CompanyName,
    AdminName,
    AdminEmail,
    CommunicationToken,
    ApiKey,
    AccountId,
    PlatformBaseUrl,
    CountryCode,
    Active,
    Status,
    LastSyncAt,
    CreatedAt,
    UpdatedAt,
}
