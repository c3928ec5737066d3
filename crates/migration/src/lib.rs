pub use sea_orm_migration::prelude::*;

mod m20260215_090000_users;
mod m20260215_093000_drawers;
mod m20260216_120000_shifts;
mod m20260218_100000_transactions;
mod m20260218_140000_balances;
mod m20260221_110000_templates;
mod m20260301_090000_exchange_rates;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260215_090000_users::Migration),
            Box::new(m20260215_093000_drawers::Migration),
            Box::new(m20260216_120000_shifts::Migration),
            Box::new(m20260218_100000_transactions::Migration),
            Box::new(m20260218_140000_balances::Migration),
            Box::new(m20260221_110000_templates::Migration),
            Box::new(m20260301_090000_exchange_rates::Migration),
        ]
    }
}
