use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum ExchangeRates {
    Table,
    Id,
    BaseCurrency,
    QuoteCurrency,
    RateMicros,
    EffectiveFrom,
    ExpiresAt,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExchangeRates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExchangeRates::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExchangeRates::BaseCurrency)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExchangeRates::QuoteCurrency)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExchangeRates::RateMicros)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExchangeRates::EffectiveFrom)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExchangeRates::ExpiresAt).timestamp())
                    .col(
                        ColumnDef::new(ExchangeRates::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-exchange_rates-pair-effective_from")
                    .table(ExchangeRates::Table)
                    .col(ExchangeRates::BaseCurrency)
                    .col(ExchangeRates::QuoteCurrency)
                    .col(ExchangeRates::EffectiveFrom)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExchangeRates::Table).to_owned())
            .await?;
        Ok(())
    }
}
