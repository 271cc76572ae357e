//! Transaction-backed session.

use super::messages::timestamp;
use crate::models::{HealthFacility, Incoming, NewFacility, User};
use crate::store::{Session, StoreError};
use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};

type UserRow = (i64, String, Option<String>, Option<String>, i64);

fn user(row: UserRow) -> User {
    let (id, number, name, location, mask) = row;
    User {
        id: Some(id),
        number,
        name,
        location,
        mask: u32::try_from(mask).unwrap_or_default(),
    }
}

fn unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// One SQLite transaction. Dropped without commit, it rolls back.
pub struct SqliteSession {
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteSession {
    pub fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self { tx: Some(tx) }
    }

    fn tx(&mut self) -> Result<&mut Transaction<'static, Sqlite>, StoreError> {
        self.tx.as_mut().ok_or(StoreError::Finished)
    }
}

#[async_trait]
impl Session for SqliteSession {
    async fn add(&mut self, message: &Incoming) -> Result<i64, StoreError> {
        let command = serde_json::to_string(&message.command)?;
        let tx = self.tx()?;
        let result = sqlx::query(
            r#"
            INSERT INTO messages (kind, sender, text, command, received_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(message.kind())
        .bind(&message.sender)
        .bind(&message.text)
        .bind(&command)
        .bind(message.time.timestamp())
        .execute(&mut **tx)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn set_reply(&mut self, id: i64, reply: &str) -> Result<(), StoreError> {
        let tx = self.tx()?;
        let result = sqlx::query("UPDATE messages SET reply = ? WHERE id = ?")
            .bind(reply)
            .bind(id)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MessageNotFound(id));
        }
        Ok(())
    }

    async fn find_user(&mut self, number: &str) -> Result<Option<User>, StoreError> {
        let tx = self.tx()?;
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, number, name, location, mask FROM users WHERE number = ?",
        )
        .bind(number)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(user))
    }

    async fn save_user(&mut self, user: &User) -> Result<i64, StoreError> {
        let tx = self.tx()?;
        let mask = i64::from(user.mask);

        let result = match user.id {
            Some(id) => {
                let result = sqlx::query(
                    r#"
                    UPDATE users SET number = ?, name = ?, location = ?, mask = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&user.number)
                .bind(&user.name)
                .bind(&user.location)
                .bind(mask)
                .bind(id)
                .execute(&mut **tx)
                .await;
                match result {
                    Ok(done) if done.rows_affected() == 0 => {
                        return Err(StoreError::UserNotFound(id));
                    }
                    Ok(_) => Ok(id),
                    Err(e) => Err(e),
                }
            }
            None => sqlx::query(
                "INSERT INTO users (number, name, location, mask) VALUES (?, ?, ?, ?)",
            )
            .bind(&user.number)
            .bind(&user.name)
            .bind(&user.location)
            .bind(mask)
            .execute(&mut **tx)
            .await
            .map(|done| done.last_insert_rowid()),
        };

        result.map_err(|e| {
            if unique_violation(&e) {
                return StoreError::Duplicate(format!("user number {}", user.number));
            }
            StoreError::from(e)
        })
    }

    async fn find_facility(&mut self, hmis: i64) -> Result<Option<HealthFacility>, StoreError> {
        let tx = self.tx()?;
        let row = sqlx::query_as::<_, (i64, i64, String, Option<String>)>(
            "SELECT id, hmis, name, location FROM facilities WHERE hmis = ?",
        )
        .bind(hmis)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(|(id, hmis, name, location)| HealthFacility {
            id,
            hmis,
            name,
            location,
        }))
    }

    async fn add_facility(&mut self, facility: &NewFacility) -> Result<i64, StoreError> {
        let tx = self.tx()?;
        let result = sqlx::query("INSERT INTO facilities (hmis, name, location) VALUES (?, ?, ?)")
            .bind(facility.hmis)
            .bind(&facility.name)
            .bind(&facility.location)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                if unique_violation(&e) {
                    return StoreError::Duplicate(format!("HMIS code {}", facility.hmis));
                }
                StoreError::from(e)
            })?;

        Ok(result.last_insert_rowid())
    }

    async fn set_membership(&mut self, user: i64, facility: i64) -> Result<(), StoreError> {
        let tx = self.tx()?;
        sqlx::query(
            r#"
            INSERT INTO facility_memberships (user_id, facility_id) VALUES (?, ?)
            ON CONFLICT(user_id) DO UPDATE SET facility_id = excluded.facility_id
            "#,
        )
        .bind(user)
        .bind(facility)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn facility_members(&mut self, facility: i64) -> Result<Vec<User>, StoreError> {
        let tx = self.tx()?;
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.number, u.name, u.location, u.mask
            FROM users u
            JOIN facility_memberships m ON m.user_id = u.id
            WHERE m.facility_id = ?
            ORDER BY u.id
            "#,
        )
        .bind(facility)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows.into_iter().map(user).collect())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::Finished)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}
