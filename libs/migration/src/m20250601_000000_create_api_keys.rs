use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApiKeys::Table)
                    .if_not_exists()
                    .col(pk_uuid(ApiKeys::Id))
                    .col(string_uniq(ApiKeys::PublicKey))
                    .col(string(ApiKeys::HashedSecret))
                    .col(uuid(ApiKeys::ProjectId))
                    .col(uuid(ApiKeys::OrgId))
                    .col(string(ApiKeys::Plan).default("default"))
                    .col(string(ApiKeys::AccessLevel).default("all"))
                    .col(json_null(ApiKeys::RateLimitOverrides))
                    .col(
                        timestamp_with_time_zone(ApiKeys::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(ApiKeys::LastUsedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_api_keys_project")
                    .table(ApiKeys::Table)
                    .col(ApiKeys::ProjectId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApiKeys::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ApiKeys {
    Table,
    Id,
    PublicKey,
    HashedSecret,
    ProjectId,
    OrgId,
    Plan,
    AccessLevel,
    RateLimitOverrides,
    CreatedAt,
    LastUsedAt,
}
