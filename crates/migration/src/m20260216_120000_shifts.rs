use sea_orm_migration::prelude::*;

use crate::m20260215_090000_users::Users;
use crate::m20260215_093000_drawers::Drawers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Shifts {
    Table,
    Id,
    DrawerId,
    CashierId,
    Status,
    OpenedAt,
    ClosedAt,
    ClosedBy,
    Notes,
    ApprovalStatus,
    DecidedBy,
    DecidedAt,
    DecisionNotes,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Shifts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Shifts::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Shifts::DrawerId).string().not_null())
                    .col(ColumnDef::new(Shifts::CashierId).string().not_null())
                    .col(ColumnDef::new(Shifts::Status).string().not_null())
                    .col(ColumnDef::new(Shifts::OpenedAt).timestamp().not_null())
                    .col(ColumnDef::new(Shifts::ClosedAt).timestamp())
                    .col(ColumnDef::new(Shifts::ClosedBy).string())
                    .col(ColumnDef::new(Shifts::Notes).string())
                    .col(ColumnDef::new(Shifts::ApprovalStatus).string())
                    .col(ColumnDef::new(Shifts::DecidedBy).string())
                    .col(ColumnDef::new(Shifts::DecidedAt).timestamp())
                    .col(ColumnDef::new(Shifts::DecisionNotes).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shifts-drawer_id")
                            .from(Shifts::Table, Shifts::DrawerId)
                            .to(Drawers::Table, Drawers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shifts-cashier_id")
                            .from(Shifts::Table, Shifts::CashierId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-shifts-drawer_id-status")
                    .table(Shifts::Table)
                    .col(Shifts::DrawerId)
                    .col(Shifts::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-shifts-closed_at")
                    .table(Shifts::Table)
                    .col(Shifts::ClosedAt)
                    .to_owned(),
            )
            .await?;

        // One open shift per (drawer, cashier) pair, enforced by the storage
        // engine itself: concurrent opens race on this index, not on an
        // application-level check. sea-query has no builder for partial
        // indexes, so this one is raw SQL (valid on SQLite and Postgres).
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS \"uidx-shifts-open-drawer-cashier\" \
                 ON \"shifts\" (\"drawer_id\", \"cashier_id\") WHERE \"status\" = 'open'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Shifts::Table).to_owned())
            .await?;
        Ok(())
    }
}
