use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Traces::Table)
                    .if_not_exists()
                    .col(string(Traces::Id))
                    .col(uuid(Traces::ProjectId))
                    .col(timestamp_with_time_zone(Traces::Timestamp))
                    .col(string_null(Traces::Name))
                    .col(string_null(Traces::UserId))
                    .col(string_null(Traces::SessionId))
                    .col(string_null(Traces::Release))
                    .col(string_null(Traces::Version))
                    .col(json_null(Traces::Input))
                    .col(json_null(Traces::Output))
                    .col(json_null(Traces::Metadata))
                    .col(json_null(Traces::Tags))
                    .col(boolean(Traces::Public).default(false))
                    .col(
                        timestamp_with_time_zone(Traces::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Traces::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(Traces::Id)
                            .col(Traces::ProjectId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Observations::Table)
                    .if_not_exists()
                    .col(string(Observations::Id))
                    .col(uuid(Observations::ProjectId))
                    .col(string_null(Observations::TraceId))
                    .col(string(Observations::Kind).default("EVENT"))
                    .col(string_null(Observations::Name))
                    .col(timestamp_with_time_zone_null(Observations::StartTime))
                    .col(timestamp_with_time_zone_null(Observations::EndTime))
                    .col(string_null(Observations::ParentObservationId))
                    .col(string(Observations::Level).default("DEFAULT"))
                    .col(string_null(Observations::StatusMessage))
                    .col(string_null(Observations::Model))
                    .col(json_null(Observations::Input))
                    .col(json_null(Observations::Output))
                    .col(json_null(Observations::Metadata))
                    .col(
                        timestamp_with_time_zone(Observations::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Observations::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(Observations::Id)
                            .col(Observations::ProjectId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_observations_trace")
                    .table(Observations::Table)
                    .col(Observations::ProjectId)
                    .col(Observations::TraceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Scores::Table)
                    .if_not_exists()
                    .col(string(Scores::Id))
                    .col(uuid(Scores::ProjectId))
                    .col(string(Scores::TraceId))
                    .col(string_null(Scores::ObservationId))
                    .col(string(Scores::Name))
                    .col(double(Scores::Value))
                    .col(string_null(Scores::Comment))
                    .col(timestamp_with_time_zone(Scores::Timestamp))
                    .primary_key(
                        Index::create()
                            .col(Scores::Id)
                            .col(Scores::ProjectId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scores_trace")
                    .table(Scores::Table)
                    .col(Scores::ProjectId)
                    .col(Scores::TraceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(IngestionLog::Table)
                    .if_not_exists()
                    .col(string(IngestionLog::EventId))
                    .col(uuid(IngestionLog::ProjectId))
                    .col(string(IngestionLog::EventType))
                    .col(json(IngestionLog::Payload))
                    .col(json_null(IngestionLog::Metadata))
                    .col(
                        timestamp_with_time_zone(IngestionLog::ReceivedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(IngestionLog::EventId)
                            .col(IngestionLog::ProjectId),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(IngestionLog::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Scores::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Observations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Traces::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Traces {
    Table,
    Id,
    ProjectId,
    Timestamp,
    Name,
    UserId,
    SessionId,
    Release,
    Version,
    Input,
    Output,
    Metadata,
    Tags,
    Public,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Observations {
    Table,
    Id,
    ProjectId,
    TraceId,
    Kind,
    Name,
    StartTime,
    EndTime,
    ParentObservationId,
    Level,
    StatusMessage,
    Model,
    Input,
    Output,
    Metadata,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Scores {
    Table,
    Id,
    ProjectId,
    TraceId,
    ObservationId,
    Name,
    Value,
    Comment,
    Timestamp,
}

#[derive(DeriveIden)]
enum IngestionLog {
    Table,
    EventId,
    ProjectId,
    EventType,
    Payload,
    Metadata,
    ReceivedAt,
}
