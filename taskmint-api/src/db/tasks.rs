//! Task store
//!
//! Listing order is newest first. Tasks of one batch share a creation
//! timestamp and keep their extraction order among themselves.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use taskmint_common::time::{from_db_string, now, to_db_string};
use taskmint_common::{Error, NewTask, Result, Task, TaskPatch, TaskStatus};
use uuid::Uuid;

use super::parse_uuid;

const TASK_COLUMNS: &str =
    "id, owner_id, transcript_id, text, status, priority, tags, created_at, updated_at";

fn task_from_row(row: &SqliteRow) -> Result<Task> {
    let id: String = row.try_get("id")?;
    let owner_id: String = row.try_get("owner_id")?;
    let transcript_id: Option<String> = row.try_get("transcript_id")?;
    let status: String = row.try_get("status")?;
    let priority: String = row.try_get("priority")?;
    let tags: String = row.try_get("tags")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Task {
        id: parse_uuid(&id, "task id")?,
        owner_id: parse_uuid(&owner_id, "owner id")?,
        transcript_id: transcript_id
            .map(|t| parse_uuid(&t, "transcript id"))
            .transpose()?,
        text: row.try_get("text")?,
        status: status
            .parse()
            .map_err(|_| Error::Internal(format!("Invalid stored status: {}", status)))?,
        priority: priority
            .parse()
            .map_err(|_| Error::Internal(format!("Invalid stored priority: {}", priority)))?,
        tags: serde_json::from_str(&tags)
            .map_err(|e| Error::Internal(format!("Failed to deserialize tags: {}", e)))?,
        created_at: from_db_string(&created_at)?,
        updated_at: from_db_string(&updated_at)?,
    })
}

fn tags_json(tags: &[String]) -> Result<String> {
    serde_json::to_string(tags)
        .map_err(|e| Error::Internal(format!("Failed to serialize tags: {}", e)))
}

/// Owner's tasks, newest batch first
pub async fn list_tasks(pool: &SqlitePool, owner_id: Uuid) -> Result<Vec<Task>> {
    let sql = format!(
        "SELECT {} FROM tasks WHERE owner_id = ? ORDER BY created_at DESC, rowid ASC",
        TASK_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(owner_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(task_from_row).collect()
}

pub async fn get_task(pool: &SqlitePool, owner_id: Uuid, id: Uuid) -> Result<Option<Task>> {
    let sql = format!("SELECT {} FROM tasks WHERE id = ? AND owner_id = ?", TASK_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(task_from_row).transpose()
}

/// Insert one pending task per item on the given connection
///
/// Does not open a transaction; callers that need the batch to be atomic
/// pass a transaction (see [`create_batch`]).
pub async fn insert_batch(
    conn: &mut SqliteConnection,
    owner_id: Uuid,
    transcript_id: Option<Uuid>,
    items: &[NewTask],
    created_at: DateTime<Utc>,
) -> Result<Vec<Task>> {
    let mut tasks = Vec::with_capacity(items.len());

    for item in items {
        let task = Task {
            id: Uuid::new_v4(),
            owner_id,
            text: item.text.clone(),
            status: TaskStatus::Pending,
            priority: item.priority,
            tags: item.tags.clone(),
            transcript_id,
            created_at,
            updated_at: created_at,
        };

        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, owner_id, transcript_id, text, status, priority, tags, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(task.id.to_string())
        .bind(owner_id.to_string())
        .bind(transcript_id.map(|t| t.to_string()))
        .bind(&task.text)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(tags_json(&task.tags)?)
        .bind(to_db_string(&task.created_at))
        .bind(to_db_string(&task.updated_at))
        .execute(&mut *conn)
        .await?;

        tasks.push(task);
    }

    Ok(tasks)
}

/// Store-level batch creation: every item is stored or none is
///
/// Entry point for batches that do not share a transaction with anything
/// else. Transcript submission instead calls [`insert_batch`] inside its own
/// transaction so the transcript row commits with the tasks.
pub async fn create_batch(
    pool: &SqlitePool,
    owner_id: Uuid,
    transcript_id: Option<Uuid>,
    items: &[NewTask],
) -> Result<Vec<Task>> {
    let mut tx = pool.begin().await?;
    let tasks = insert_batch(&mut *tx, owner_id, transcript_id, items, now()).await?;
    tx.commit().await?;
    Ok(tasks)
}

/// Apply a validated patch to an owned task
pub async fn update_task(
    pool: &SqlitePool,
    owner_id: Uuid,
    id: Uuid,
    patch: &TaskPatch,
) -> Result<Task> {
    let mut task = get_task(pool, owner_id, id)
        .await?
        .ok_or_else(|| Error::NotFound("Task not found".to_string()))?;

    if patch.is_empty() {
        return Ok(task);
    }

    patch.apply_to(&mut task);
    task.updated_at = now();

    let result = sqlx::query(
        r#"
        UPDATE tasks
        SET text = ?, status = ?, priority = ?, tags = ?, updated_at = ?
        WHERE id = ? AND owner_id = ?
        "#,
    )
    .bind(&task.text)
    .bind(task.status.as_str())
    .bind(task.priority.as_str())
    .bind(tags_json(&task.tags)?)
    .bind(to_db_string(&task.updated_at))
    .bind(id.to_string())
    .bind(owner_id.to_string())
    .execute(pool)
    .await?;

    // Deleted by a concurrent request between the read and the write
    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Task not found".to_string()));
    }

    Ok(task)
}

pub async fn delete_task(pool: &SqlitePool, owner_id: Uuid, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND owner_id = ?")
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Task not found".to_string()));
    }

    Ok(())
}

/// Remove every task of the owner in one statement; returns the count
pub async fn delete_all_tasks(pool: &SqlitePool, owner_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM tasks WHERE owner_id = ?")
        .bind(owner_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
