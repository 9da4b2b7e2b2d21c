//! Payments captured against bookings and the audit trail of sensitive
//! booking operations.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Bookings {
    Table,
    Id,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    BookingId,
    Method,
    Status,
    AmountCents,
    FeeCents,
    NetCents,
    RefundedCents,
    Currency,
    Reference,
    RefundReason,
    CapturedBy,
    CapturedAt,
    RefundedAt,
}

#[derive(Iden)]
enum AuditLogs {
    Table,
    Id,
    ActorId,
    Entity,
    EntityId,
    Action,
    Detail,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payments::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Payments::BookingId).blob().not_null())
                    .col(
                        ColumnDef::new(Payments::Method)
                            .string()
                            .not_null()
                            .default("PIX"),
                    )
                    .col(ColumnDef::new(Payments::Status).string().not_null())
                    .col(ColumnDef::new(Payments::AmountCents).big_integer().not_null())
                    .col(ColumnDef::new(Payments::FeeCents).big_integer().not_null())
                    .col(ColumnDef::new(Payments::NetCents).big_integer().not_null())
                    .col(ColumnDef::new(Payments::RefundedCents).big_integer())
                    .col(
                        ColumnDef::new(Payments::Currency)
                            .string()
                            .not_null()
                            .default("BRL"),
                    )
                    .col(ColumnDef::new(Payments::Reference).string())
                    .col(ColumnDef::new(Payments::RefundReason).string())
                    .col(ColumnDef::new(Payments::CapturedBy).blob().not_null())
                    .col(ColumnDef::new(Payments::CapturedAt).timestamp().not_null())
                    .col(ColumnDef::new(Payments::RefundedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payments-booking_id")
                            .from(Payments::Table, Payments::BookingId)
                            .to(Bookings::Table, Bookings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A booking is paid at most once.
        manager
            .create_index(
                Index::create()
                    .name("uidx-payments-booking_id")
                    .table(Payments::Table)
                    .col(Payments::BookingId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Audit rows outlive the users and bookings they mention, so no FKs.
        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AuditLogs::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(AuditLogs::ActorId).blob().not_null())
                    .col(ColumnDef::new(AuditLogs::Entity).string().not_null())
                    .col(ColumnDef::new(AuditLogs::EntityId).blob().not_null())
                    .col(ColumnDef::new(AuditLogs::Action).string().not_null())
                    .col(ColumnDef::new(AuditLogs::Detail).string())
                    .col(ColumnDef::new(AuditLogs::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-audit_logs-entity-entity_id")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::Entity)
                    .col(AuditLogs::EntityId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-audit_logs-created_at")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        Ok(())
    }
}
