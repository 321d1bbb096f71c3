//! Transcript submission: extract, then persist transcript and tasks together
//!
//! Nothing is written until the model answer has been parsed. The transcript
//! row and the whole task batch then commit in one transaction, so a failed
//! extraction leaves no orphan transcript and a failed insert leaves no
//! partial batch.

use sqlx::SqlitePool;
use taskmint_common::time::now;
use taskmint_common::{Task, Transcript};
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::error::ApiError;
use crate::extraction::{extract_tasks, LanguageModel};

/// Result of one successful submission
#[derive(Debug, Clone)]
pub struct GeneratedBatch {
    pub transcript: Transcript,
    pub tasks: Vec<Task>,
}

pub async fn generate_tasks(
    pool: &SqlitePool,
    model: &dyn LanguageModel,
    owner_id: Uuid,
    transcript: &str,
) -> Result<GeneratedBatch, ApiError> {
    let extracted = extract_tasks(model, transcript).await?;

    let created_at = now();
    let mut tx = pool.begin().await.map_err(taskmint_common::Error::from)?;

    let stored_transcript =
        db::transcripts::insert_transcript(&mut *tx, owner_id, transcript, created_at).await?;
    let tasks = db::tasks::insert_batch(
        &mut *tx,
        owner_id,
        Some(stored_transcript.id),
        &extracted,
        created_at,
    )
    .await?;

    tx.commit().await.map_err(taskmint_common::Error::from)?;

    info!(
        owner = %owner_id,
        transcript = %stored_transcript.id,
        tasks = tasks.len(),
        "Stored generated tasks"
    );

    Ok(GeneratedBatch {
        transcript: stored_transcript,
        tasks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ExtractionError;
    use async_trait::async_trait;
    use taskmint_common::db::init_memory_database;
    use taskmint_common::{Priority, TaskStatus};

    struct Answer(&'static str);

    #[async_trait]
    impl LanguageModel for Answer {
        async fn complete(&self, _: &str, _: &str) -> Result<String, ExtractionError> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &str {
            "answer"
        }
    }

    async fn setup() -> (SqlitePool, Uuid) {
        let pool = init_memory_database().await.unwrap();
        let user = db::users::create_user(&pool, "alice@example.com", "h", "Alice")
            .await
            .unwrap();
        (pool, user.id)
    }

    #[tokio::test]
    async fn test_batch_is_traceable_to_transcript() {
        let (pool, owner) = setup().await;
        let model = Answer(r#"[{"text":"Ship release","priority":"high"},{"text":"Write notes"}]"#);

        let batch = generate_tasks(&pool, &model, owner, "We ship on Monday.").await.unwrap();

        assert_eq!(batch.tasks.len(), 2);
        assert_eq!(batch.transcript.content, "We ship on Monday.");
        for task in &batch.tasks {
            assert_eq!(task.transcript_id, Some(batch.transcript.id));
            assert_eq!(task.status, TaskStatus::Pending);
            assert_eq!(task.created_at, batch.transcript.created_at);
        }
        assert_eq!(batch.tasks[1].priority, Priority::Medium);

        let listed = db::tasks::list_tasks(&pool, owner).await.unwrap();
        assert_eq!(listed, batch.tasks);
        assert_eq!(db::transcripts::readback::count_transcripts(&pool, owner).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_extraction_stores_nothing() {
        let (pool, owner) = setup().await;
        let model = Answer("Here is a summary of the meeting instead.");

        let result = generate_tasks(&pool, &model, owner, "Some transcript").await;

        assert!(matches!(result, Err(ApiError::Extraction(_))));
        assert!(db::tasks::list_tasks(&pool, owner).await.unwrap().is_empty());
        assert_eq!(db::transcripts::readback::count_transcripts(&pool, owner).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blank_transcript_is_validation_error() {
        let (pool, owner) = setup().await;
        let result = generate_tasks(&pool, &Answer("[]"), owner, "  ").await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
