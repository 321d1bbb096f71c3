//! Domain models
//!
//! Tasks, transcripts and users as they are persisted and served.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Task completion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(Error::InvalidInput(format!("Unknown task status: {}", other))),
        }
    }
}

/// Task urgency
///
/// - High: blockers, deadlines within a week, P0 issues
/// - Medium: standard work items
/// - Low: backlog, nice-to-haves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Lenient parse used for model output: case-insensitive, anything
    /// unrecognized becomes `Medium`.
    pub fn from_model_label(label: Option<&str>) -> Self {
        match label.map(|l| l.trim().to_ascii_lowercase()).as_deref() {
            Some("high") => Priority::High,
            Some("low") => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(Error::InvalidInput(format!("Unknown priority: {}", other))),
        }
    }
}

/// A persisted action item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    #[serde(skip)]
    pub owner_id: Uuid,
    pub text: String,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One extracted action item, before it becomes a [`Task`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub text: String,
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update of a task; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskPatch {
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none() && self.text.is_none() && self.tags.is_none()
    }

    /// Reject values that would break task invariants and normalize the rest
    pub fn validated(mut self) -> crate::Result<Self> {
        if let Some(text) = self.text.take() {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(Error::InvalidInput("Task text must not be empty".to_string()));
            }
            self.text = Some(trimmed.to_string());
        }
        if let Some(tags) = self.tags.take() {
            self.tags = Some(normalize_tags(tags));
        }
        Ok(self)
    }

    /// Apply the present fields to a task
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(text) = &self.text {
            task.text = text.clone();
        }
        if let Some(tags) = &self.tags {
            task.tags = tags.clone();
        }
    }
}

/// Trim tags, drop a leading `@`, remove empties and duplicates (first wins)
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        let tag = tag.strip_prefix('@').unwrap_or(tag).trim();
        if tag.is_empty() || out.iter().any(|t| t == tag) {
            continue;
        }
        out.push(tag.to_string());
    }
    out
}

/// Raw meeting text as submitted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Account as exposed over the API (never carries the credential hash)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
