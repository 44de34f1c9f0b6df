use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(JobExecutionStatus::Enum)
                    .values([
                        JobExecutionStatus::Pending,
                        JobExecutionStatus::Completed,
                        JobExecutionStatus::Error,
                        JobExecutionStatus::Cancelled,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JobConfigurations::Table)
                    .if_not_exists()
                    .col(pk_uuid(JobConfigurations::Id))
                    .col(uuid(JobConfigurations::ProjectId))
                    .col(string(JobConfigurations::Evaluator))
                    .col(boolean(JobConfigurations::Enabled).default(true))
                    .col(double(JobConfigurations::Sampling).default(1.0))
                    .col(
                        timestamp_with_time_zone(JobConfigurations::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_job_configurations_project")
                    .table(JobConfigurations::Table)
                    .col(JobConfigurations::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JobExecutions::Table)
                    .if_not_exists()
                    .col(pk_uuid(JobExecutions::Id))
                    .col(uuid(JobExecutions::ProjectId))
                    .col(uuid_null(JobExecutions::JobConfigurationId))
                    .col(string(JobExecutions::TraceId))
                    .col(
                        ColumnDef::new(JobExecutions::Status)
                            .enumeration(
                                JobExecutionStatus::Enum,
                                [
                                    JobExecutionStatus::Pending,
                                    JobExecutionStatus::Completed,
                                    JobExecutionStatus::Error,
                                    JobExecutionStatus::Cancelled,
                                ],
                            )
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(timestamp_with_time_zone_null(JobExecutions::StartTime))
                    .col(timestamp_with_time_zone_null(JobExecutions::EndTime))
                    .col(string_null(JobExecutions::Error))
                    .col(
                        timestamp_with_time_zone(JobExecutions::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(JobExecutions::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_job_executions_project_status")
                    .table(JobExecutions::Table)
                    .col(JobExecutions::ProjectId)
                    .col(JobExecutions::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JobExecutions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JobConfigurations::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(JobExecutionStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum JobConfigurations {
    Table,
    Id,
    ProjectId,
    Evaluator,
    Enabled,
    Sampling,
    CreatedAt,
}

#[derive(DeriveIden)]
enum JobExecutions {
    Table,
    Id,
    ProjectId,
    JobConfigurationId,
    TraceId,
    Status,
    StartTime,
    EndTime,
    Error,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum JobExecutionStatus {
    #[sea_orm(iden = "job_execution_status")]
    Enum,
    #[sea_orm(iden = "PENDING")]
    Pending,
    #[sea_orm(iden = "COMPLETED")]
    Completed,
    #[sea_orm(iden = "ERROR")]
    Error,
    #[sea_orm(iden = "CANCELLED")]
    Cancelled,
}
