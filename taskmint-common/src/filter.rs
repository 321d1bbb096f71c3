//! Task filtering and aggregation
//!
//! Filters narrow the listed view; [`TaskStats`] always describes the whole
//! collection so progress and priority charts do not move with the filter.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::{Priority, Task, TaskStatus};
use crate::Error;

/// Status predicate for the task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    pub fn matches(&self, status: TaskStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == TaskStatus::Pending,
            StatusFilter::Completed => status == TaskStatus::Completed,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "completed" => Ok(StatusFilter::Completed),
            other => Err(Error::InvalidInput(format!("Unknown status filter: {}", other))),
        }
    }
}

/// Priority predicate for the task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityFilter {
    #[default]
    All,
    High,
    Medium,
    Low,
}

impl PriorityFilter {
    pub fn matches(&self, priority: Priority) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::High => priority == Priority::High,
            PriorityFilter::Medium => priority == Priority::Medium,
            PriorityFilter::Low => priority == Priority::Low,
        }
    }
}

impl FromStr for PriorityFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(PriorityFilter::All),
            "high" => Ok(PriorityFilter::High),
            "medium" => Ok(PriorityFilter::Medium),
            "low" => Ok(PriorityFilter::Low),
            other => Err(Error::InvalidInput(format!("Unknown priority filter: {}", other))),
        }
    }
}

/// Keep the tasks matching both predicates, in input order
pub fn filter_tasks<'a>(
    tasks: &'a [Task],
    status: StatusFilter,
    priority: PriorityFilter,
) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| status.matches(t.status) && priority.matches(t.priority))
        .collect()
}

/// Global counts over an owner's full task collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl TaskStats {
    /// Single pass over the unfiltered collection
    pub fn from_tasks(tasks: &[Task]) -> Self {
        tasks.iter().fold(TaskStats::default(), |mut stats, task| {
            stats.total += 1;
            match task.status {
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Pending => stats.pending += 1,
            }
            match task.priority {
                Priority::High => stats.high += 1,
                Priority::Medium => stats.medium += 1,
                Priority::Low => stats.low += 1,
            }
            stats
        })
    }
}
