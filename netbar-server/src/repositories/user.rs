use std::sync::Arc;

use netbar_api::Money;
use sqlx::{Error, Pool, Row, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::User;

#[derive(Clone)]
pub struct UserRepository {
    storage: Arc<Storage>,
}

impl UserRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &Pool<Sqlite> {
        self.storage.get_pool()
    }
}

impl UserRepository {
    pub async fn create(&self, item: &User, transaction: &mut Transaction<'_, Sqlite>) -> Result<i64, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO users (card_uid, username, id_card, balance, is_active)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&item.card_uid)
        .bind(&item.username)
        .bind(&item.id_card)
        .bind(item.balance.cents())
        .bind(item.is_active)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, Error> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(user)
    }

    pub async fn find_by_card(&self, card_uid: &str) -> Result<Option<User>, Error> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE card_uid = $1")
            .bind(card_uid)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(user)
    }

    /// Debits `amount`, flooring the balance at zero. Returns the user id and
    /// the balance afterwards, or `None` for an unknown card.
    pub async fn deduct(
        &self,
        card_uid: &str,
        amount: Money,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<Option<(i64, Money)>, Error> {
        let row = sqlx::query(
            r#"
            UPDATE users SET balance = MAX(0, balance - $1)
            WHERE card_uid = $2
            RETURNING id, balance
            "#,
        )
        .bind(amount.cents())
        .bind(card_uid)
        .fetch_optional(&mut **transaction)
        .await?;

        match row {
            Some(row) => Ok(Some((row.try_get("id")?, Money::from_cents(row.try_get("balance")?)))),
            None => Ok(None),
        }
    }

    pub async fn credit(
        &self,
        card_uid: &str,
        amount: Money,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<Option<(i64, Money)>, Error> {
        let row = sqlx::query(
            r#"
            UPDATE users SET balance = balance + $1
            WHERE card_uid = $2
            RETURNING id, balance
            "#,
        )
        .bind(amount.cents())
        .bind(card_uid)
        .fetch_optional(&mut **transaction)
        .await?;

        match row {
            Some(row) => Ok(Some((row.try_get("id")?, Money::from_cents(row.try_get("balance")?)))),
            None => Ok(None),
        }
    }
}
