//! Transcript store (append-only)

use sqlx::SqliteConnection;
use taskmint_common::time::to_db_string;
use taskmint_common::{Result, Transcript};
use uuid::Uuid;

/// Store a transcript verbatim
///
/// Takes a connection so it can share a transaction with the task batch
/// derived from it.
pub async fn insert_transcript(
    conn: &mut SqliteConnection,
    owner_id: Uuid,
    content: &str,
    created_at: chrono::DateTime<chrono::Utc>,
) -> Result<Transcript> {
    let transcript = Transcript {
        id: Uuid::new_v4(),
        owner_id,
        content: content.to_string(),
        created_at,
    };

    sqlx::query("INSERT INTO transcripts (id, owner_id, content, created_at) VALUES (?, ?, ?, ?)")
        .bind(transcript.id.to_string())
        .bind(owner_id.to_string())
        .bind(&transcript.content)
        .bind(to_db_string(&transcript.created_at))
        .execute(&mut *conn)
        .await?;

    Ok(transcript)
}

/// Read-side queries; transcripts are write-only over the API
#[cfg(test)]
pub(crate) mod readback {
    use sqlx::{Row, SqlitePool};
    use taskmint_common::time::from_db_string;
    use taskmint_common::{Result, Transcript};
    use uuid::Uuid;

    use crate::db::parse_uuid;

    /// Owner's transcripts, newest first
    pub async fn list_transcripts(pool: &SqlitePool, owner_id: Uuid) -> Result<Vec<Transcript>> {
        let rows = sqlx::query(
            "SELECT id, owner_id, content, created_at FROM transcripts \
             WHERE owner_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(owner_id.to_string())
        .fetch_all(pool)
        .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                let owner: String = row.try_get("owner_id")?;
                let created_at: String = row.try_get("created_at")?;
                Ok(Transcript {
                    id: parse_uuid(&id, "transcript id")?,
                    owner_id: parse_uuid(&owner, "owner id")?,
                    content: row.try_get("content")?,
                    created_at: from_db_string(&created_at)?,
                })
            })
            .collect()
    }

    pub async fn count_transcripts(pool: &SqlitePool, owner_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM transcripts WHERE owner_id = ?")
            .bind(owner_id.to_string())
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
