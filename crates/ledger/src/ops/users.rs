use chrono::{DateTime, Utc};
use sea_orm::{TransactionTrait, prelude::*};

use crate::{LedgerError, ResultLedger, Role, User, users};
use crate::util::normalize_required_name;

use super::{Ledger, with_tx};

impl Ledger {
    /// Register a platform user the ledger can attribute work to.
    pub async fn create_user(
        &self,
        username: &str,
        display_name: &str,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> ResultLedger<()> {
        let username = normalize_required_name(username, "user")?;
        let display_name = normalize_required_name(display_name, "user display")?;

        with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(LedgerError::ExistingKey(username));
            }

            let user = User {
                username,
                display_name,
                role,
                created_at,
            };
            users::ActiveModel::from(&user).insert(&db_tx).await?;
            Ok(())
        })
    }

    /// Look up a user by username.
    pub async fn user(&self, username: &str) -> ResultLedger<User> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, username).await?;
            User::try_from(model)
        })
    }
}
