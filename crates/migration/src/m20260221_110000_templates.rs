use sea_orm_migration::prelude::*;

use crate::m20260215_093000_drawers::Drawers;
use crate::m20260216_120000_shifts::Shifts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum ShiftTemplates {
    Table,
    DrawerId,
    Currency,
    AmountMinor,
    DerivedFromShiftId,
    HasDiscrepancy,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShiftTemplates::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ShiftTemplates::DrawerId).string().not_null())
                    .col(ColumnDef::new(ShiftTemplates::Currency).string().not_null())
                    .col(
                        ColumnDef::new(ShiftTemplates::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShiftTemplates::DerivedFromShiftId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShiftTemplates::HasDiscrepancy)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShiftTemplates::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ShiftTemplates::DrawerId)
                            .col(ShiftTemplates::Currency),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shift_templates-drawer_id")
                            .from(ShiftTemplates::Table, ShiftTemplates::DrawerId)
                            .to(Drawers::Table, Drawers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shift_templates-derived_from_shift_id")
                            .from(ShiftTemplates::Table, ShiftTemplates::DerivedFromShiftId)
                            .to(Shifts::Table, Shifts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ShiftTemplates::Table).to_owned())
            .await?;
        Ok(())
    }
}
