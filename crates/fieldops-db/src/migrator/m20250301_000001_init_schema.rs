//! Initial schema: teams, identities, clients, services, visits

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. Teams
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Team::Table)
                    .if_not_exists()
                    .col(uuid(Team::Id).primary_key())
                    .col(string_len(Team::Name, 255).not_null())
                    .col(
                        timestamp_with_time_zone(Team::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Team::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. Users (identities); team membership lives on the user row
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::Name, 255).not_null())
                    .col(string_len(User::Email, 255).not_null().unique_key())
                    .col(string_len(User::PasswordHash, 255).not_null())
                    .col(string_len(User::Role, 32).not_null().default("FIELD_TEAM"))
                    .col(ColumnDef::new(User::TeamId).uuid().null())
                    .col(
                        timestamp_with_time_zone(User::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(User::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_team_id")
                            .from(User::Table, User::TeamId)
                            .to(Team::Table, Team::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_team_id")
                    .table(User::Table)
                    .col(User::TeamId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 3. Clients
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Client::Table)
                    .if_not_exists()
                    .col(uuid(Client::Id).primary_key())
                    .col(string_len(Client::Name, 255).not_null())
                    .col(ColumnDef::new(Client::Address).string_len(255).null())
                    .col(ColumnDef::new(Client::City).string_len(128).null())
                    .col(ColumnDef::new(Client::State).string_len(64).null())
                    .col(ColumnDef::new(Client::ZipCode).string_len(32).null())
                    .col(ColumnDef::new(Client::Phone).string_len(64).null())
                    .col(ColumnDef::new(Client::Email).string_len(255).null())
                    .col(
                        timestamp_with_time_zone(Client::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Client::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 4. Service catalog
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Service::Table)
                    .if_not_exists()
                    .col(uuid(Service::Id).primary_key())
                    .col(string_len(Service::Name, 255).not_null())
                    .col(ColumnDef::new(Service::Description).text().null())
                    .col(integer(Service::Duration).not_null())
                    .col(ColumnDef::new(Service::Price).double().null())
                    .col(
                        timestamp_with_time_zone(Service::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Service::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 5. Visits
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Visit::Table)
                    .if_not_exists()
                    .col(uuid(Visit::Id).primary_key())
                    .col(string_len(Visit::Title, 255).not_null())
                    .col(ColumnDef::new(Visit::Description).text().null())
                    .col(timestamp_with_time_zone(Visit::Date).not_null())
                    .col(timestamp_with_time_zone(Visit::StartTime).not_null())
                    .col(
                        ColumnDef::new(Visit::EndTime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(string_len(Visit::Status, 32).not_null().default("SCHEDULED"))
                    .col(ColumnDef::new(Visit::Location).string_len(512).null())
                    .col(ColumnDef::new(Visit::Notes).text().null())
                    .col(ColumnDef::new(Visit::ImageUrl).string_len(1024).null())
                    .col(uuid(Visit::ClientId).not_null())
                    .col(uuid(Visit::TeamId).not_null())
                    .col(uuid(Visit::CreatedById).not_null())
                    .col(
                        timestamp_with_time_zone(Visit::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Visit::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_visits_client_id")
                            .from(Visit::Table, Visit::ClientId)
                            .to(Client::Table, Client::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_visits_team_id")
                            .from(Visit::Table, Visit::TeamId)
                            .to(Team::Table, Team::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_visits_created_by_id")
                            .from(Visit::Table, Visit::CreatedById)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_visits_team_id")
                    .table(Visit::Table)
                    .col(Visit::TeamId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_visits_client_id")
                    .table(Visit::Table)
                    .col(Visit::ClientId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_visits_date")
                    .table(Visit::Table)
                    .col(Visit::Date)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 6. Visit ↔ service junction
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(VisitService::Table)
                    .if_not_exists()
                    .col(uuid(VisitService::VisitId).not_null())
                    .col(uuid(VisitService::ServiceId).not_null())
                    .primary_key(
                        Index::create()
                            .col(VisitService::VisitId)
                            .col(VisitService::ServiceId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_visit_services_visit_id")
                            .from(VisitService::Table, VisitService::VisitId)
                            .to(Visit::Table, Visit::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_visit_services_service_id")
                            .from(VisitService::Table, VisitService::ServiceId)
                            .to(Service::Table, Service::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_visit_services_service_id")
                    .table(VisitService::Table)
                    .col(VisitService::ServiceId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reverse order of creation
        manager
            .drop_table(Table::drop().table(VisitService::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Visit::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Service::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Client::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Team::Table).to_owned())
            .await?;

        Ok(())
    }
}

// ============================================================
// Table identifiers
// ============================================================

#[derive(DeriveIden)]
enum Team {
    #[sea_orm(iden = "teams")]
    Table,
    Id,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Role,
    TeamId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Client {
    #[sea_orm(iden = "clients")]
    Table,
    Id,
    Name,
    Address,
    City,
    State,
    ZipCode,
    Phone,
    Email,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Service {
    #[sea_orm(iden = "services")]
    Table,
    Id,
    Name,
    Description,
    Duration,
    Price,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Visit {
    #[sea_orm(iden = "visits")]
    Table,
    Id,
    Title,
    Description,
    Date,
    StartTime,
    EndTime,
    Status,
    Location,
    Notes,
    ImageUrl,
    ClientId,
    TeamId,
    CreatedById,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum VisitService {
    #[sea_orm(iden = "visit_services")]
    Table,
    VisitId,
    ServiceId,
}
