//! Initial schema migration - creates all tables from scratch.
//!
//! - `users`: admins, guides and trekkers
//! - `trails`: places expeditions happen on
//! - `expeditions`: dated trips with a fixed number of seats
//! - `bookings`: seat reservations on expeditions
//! - `reviews`: ratings of trails and expeditions
//! - `media`: photos and videos of trails and expeditions
//!
//! Ids are UUIDs stored as 16-byte blobs.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Email,
    Name,
    PasswordHash,
    Role,
    Cadastur,
    CadasturVerified,
    CommissionRateBps,
    Bio,
    Phone,
    CreatedAt,
}

#[derive(Iden)]
enum Trails {
    Table,
    Id,
    Name,
    State,
    City,
    RegionOrPark,
    DistanceMeters,
    ElevationGainM,
    Difficulty,
    RequiresGuide,
    EntryFeeCents,
    Description,
    CreatedAt,
}

#[derive(Iden)]
enum Expeditions {
    Table,
    Id,
    TrailId,
    GuideId,
    Title,
    StartDate,
    EndDate,
    PricePerPersonCents,
    MaxPeople,
    Currency,
    Status,
    Description,
    CreatedAt,
}

#[derive(Iden)]
enum Bookings {
    Table,
    Id,
    Code,
    ExpeditionId,
    TrekkerId,
    Headcount,
    TotalCents,
    Currency,
    Status,
    Notes,
    CommissionRateBps,
    RefundCents,
    CancellationReason,
    CreatedAt,
    ConfirmedAt,
    CancelledAt,
}

#[derive(Iden)]
enum Reviews {
    Table,
    Id,
    AuthorId,
    TrailId,
    ExpeditionId,
    Rating,
    Comment,
    CreatedAt,
}

#[derive(Iden)]
enum Media {
    Table,
    Id,
    UploadedBy,
    TrailId,
    ExpeditionId,
    Url,
    Kind,
    Caption,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(ColumnDef::new(Users::Cadastur).string())
                    .col(
                        ColumnDef::new(Users::CadasturVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::CommissionRateBps).integer())
                    .col(ColumnDef::new(Users::Bio).string())
                    .col(ColumnDef::new(Users::Phone).string())
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-email-unique")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Trails
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Trails::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Trails::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Trails::Name).string().not_null())
                    .col(ColumnDef::new(Trails::State).string().not_null())
                    .col(ColumnDef::new(Trails::City).string().not_null())
                    .col(ColumnDef::new(Trails::RegionOrPark).string().not_null())
                    .col(
                        ColumnDef::new(Trails::DistanceMeters)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Trails::ElevationGainM).integer().not_null())
                    .col(
                        ColumnDef::new(Trails::Difficulty)
                            .string()
                            .not_null()
                            .default("MODERATE"),
                    )
                    .col(
                        ColumnDef::new(Trails::RequiresGuide)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Trails::EntryFeeCents).big_integer())
                    .col(ColumnDef::new(Trails::Description).string())
                    .col(ColumnDef::new(Trails::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-trails-state")
                    .table(Trails::Table)
                    .col(Trails::State)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Expeditions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Expeditions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expeditions::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expeditions::TrailId).blob().not_null())
                    .col(ColumnDef::new(Expeditions::GuideId).blob().not_null())
                    .col(ColumnDef::new(Expeditions::Title).string().not_null())
                    .col(
                        ColumnDef::new(Expeditions::StartDate)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expeditions::EndDate).timestamp().not_null())
                    .col(
                        ColumnDef::new(Expeditions::PricePerPersonCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expeditions::MaxPeople).integer().not_null())
                    .col(
                        ColumnDef::new(Expeditions::Currency)
                            .string()
                            .not_null()
                            .default("BRL"),
                    )
                    .col(
                        ColumnDef::new(Expeditions::Status)
                            .string()
                            .not_null()
                            .default("DRAFT"),
                    )
                    .col(ColumnDef::new(Expeditions::Description).string())
                    .col(
                        ColumnDef::new(Expeditions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expeditions-trail_id")
                            .from(Expeditions::Table, Expeditions::TrailId)
                            .to(Trails::Table, Trails::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expeditions-guide_id")
                            .from(Expeditions::Table, Expeditions::GuideId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expeditions-trail_id-start_date")
                    .table(Expeditions::Table)
                    .col(Expeditions::TrailId)
                    .col(Expeditions::StartDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expeditions-guide_id")
                    .table(Expeditions::Table)
                    .col(Expeditions::GuideId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Bookings
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bookings::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Bookings::Code).string().not_null())
                    .col(ColumnDef::new(Bookings::ExpeditionId).blob().not_null())
                    .col(ColumnDef::new(Bookings::TrekkerId).blob().not_null())
                    .col(ColumnDef::new(Bookings::Headcount).integer().not_null())
                    .col(ColumnDef::new(Bookings::TotalCents).big_integer().not_null())
                    .col(
                        ColumnDef::new(Bookings::Currency)
                            .string()
                            .not_null()
                            .default("BRL"),
                    )
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .string()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(Bookings::Notes).string())
                    .col(ColumnDef::new(Bookings::CommissionRateBps).integer())
                    .col(ColumnDef::new(Bookings::RefundCents).big_integer())
                    .col(ColumnDef::new(Bookings::CancellationReason).string())
                    .col(ColumnDef::new(Bookings::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Bookings::ConfirmedAt).timestamp())
                    .col(ColumnDef::new(Bookings::CancelledAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-expedition_id")
                            .from(Bookings::Table, Bookings::ExpeditionId)
                            .to(Expeditions::Table, Expeditions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-trekker_id")
                            .from(Bookings::Table, Bookings::TrekkerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bookings-code-unique")
                    .table(Bookings::Table)
                    .col(Bookings::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Occupancy is summed over (expedition_id, status) on every reservation.
        manager
            .create_index(
                Index::create()
                    .name("idx-bookings-expedition_id-status")
                    .table(Bookings::Table)
                    .col(Bookings::ExpeditionId)
                    .col(Bookings::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bookings-trekker_id-created_at")
                    .table(Bookings::Table)
                    .col(Bookings::TrekkerId)
                    .col(Bookings::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Reviews
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Reviews::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Reviews::AuthorId).blob().not_null())
                    .col(ColumnDef::new(Reviews::TrailId).blob())
                    .col(ColumnDef::new(Reviews::ExpeditionId).blob())
                    .col(ColumnDef::new(Reviews::Rating).integer().not_null())
                    .col(ColumnDef::new(Reviews::Comment).string())
                    .col(ColumnDef::new(Reviews::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reviews-author_id")
                            .from(Reviews::Table, Reviews::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reviews-trail_id")
                            .from(Reviews::Table, Reviews::TrailId)
                            .to(Trails::Table, Trails::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reviews-expedition_id")
                            .from(Reviews::Table, Reviews::ExpeditionId)
                            .to(Expeditions::Table, Expeditions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Media
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Media::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Media::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Media::UploadedBy).blob().not_null())
                    .col(ColumnDef::new(Media::TrailId).blob())
                    .col(ColumnDef::new(Media::ExpeditionId).blob())
                    .col(ColumnDef::new(Media::Url).string().not_null())
                    .col(ColumnDef::new(Media::Kind).string().not_null())
                    .col(ColumnDef::new(Media::Caption).string())
                    .col(ColumnDef::new(Media::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-media-uploaded_by")
                            .from(Media::Table, Media::UploadedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-media-trail_id")
                            .from(Media::Table, Media::TrailId)
                            .to(Trails::Table, Trails::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-media-expedition_id")
                            .from(Media::Table, Media::ExpeditionId)
                            .to(Expeditions::Table, Expeditions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Media::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Reviews::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expeditions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Trails::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
