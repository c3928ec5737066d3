use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Drawers {
    Table,
    Id,
    Name,
    Location,
    Active,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Drawers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Drawers::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Drawers::Name).string().not_null())
                    .col(ColumnDef::new(Drawers::Location).string().not_null())
                    .col(ColumnDef::new(Drawers::Active).boolean().not_null())
                    .col(ColumnDef::new(Drawers::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-drawers-name")
                    .table(Drawers::Table)
                    .col(Drawers::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-drawers-location")
                    .table(Drawers::Table)
                    .col(Drawers::Location)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Drawers::Table).to_owned())
            .await?;
        Ok(())
    }
}
