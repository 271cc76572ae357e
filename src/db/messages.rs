//! Read access to recorded messages.

use super::DbError;
use crate::store::MessageRecord;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

type MessageRow = (i64, String, String, String, String, i64, Option<String>);

pub(super) fn timestamp(seconds: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| DbError::Corrupt(format!("timestamp out of range: {seconds}")))
}

fn record(row: MessageRow) -> Result<MessageRecord, DbError> {
    let (id, kind, sender, text, command, received_at, reply) = row;
    Ok(MessageRecord {
        id,
        kind,
        sender,
        text,
        command,
        received_at: timestamp(received_at)?,
        reply,
    })
}

/// Repository for message queries.
pub struct MessageRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MessageRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Every committed message, oldest first.
    pub async fn all(&self) -> Result<Vec<MessageRecord>, DbError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, kind, sender, text, command, received_at, reply
            FROM messages
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(record).collect()
    }

    pub async fn find(&self, id: i64) -> Result<Option<MessageRecord>, DbError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, kind, sender, text, command, received_at, reply
            FROM messages
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(record).transpose()
    }

    /// Messages received from `sender`.
    pub async fn count_from(&self, sender: &str) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE sender = ?")
            .bind(sender)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
