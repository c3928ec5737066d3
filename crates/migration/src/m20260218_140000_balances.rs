use sea_orm_migration::prelude::*;

use crate::m20260216_120000_shifts::Shifts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum BeginningBalances {
    Table,
    ShiftId,
    Currency,
    AmountMinor,
    Source,
}

#[derive(Iden)]
enum EndBalances {
    Table,
    ShiftId,
    Currency,
    ExpectedMinor,
    CountedMinor,
    DiscrepancyMinor,
    Reason,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BeginningBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BeginningBalances::ShiftId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BeginningBalances::Currency)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BeginningBalances::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BeginningBalances::Source).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(BeginningBalances::ShiftId)
                            .col(BeginningBalances::Currency),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-beginning_balances-shift_id")
                            .from(BeginningBalances::Table, BeginningBalances::ShiftId)
                            .to(Shifts::Table, Shifts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EndBalances::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EndBalances::ShiftId).string().not_null())
                    .col(ColumnDef::new(EndBalances::Currency).string().not_null())
                    .col(
                        ColumnDef::new(EndBalances::ExpectedMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EndBalances::CountedMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EndBalances::DiscrepancyMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EndBalances::Reason).string())
                    .primary_key(
                        Index::create()
                            .col(EndBalances::ShiftId)
                            .col(EndBalances::Currency),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-end_balances-shift_id")
                            .from(EndBalances::Table, EndBalances::ShiftId)
                            .to(Shifts::Table, Shifts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EndBalances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BeginningBalances::Table).to_owned())
            .await?;
        Ok(())
    }
}
