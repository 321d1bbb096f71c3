//! # taskmint Common Library
//!
//! Shared code for the taskmint service:
//! - Task, transcript and user models
//! - Task filtering and aggregation
//! - Configuration loading
//! - Database bootstrap
//! - Common error type

pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod models;
pub mod time;

pub use error::{Error, Result};
pub use filter::{filter_tasks, PriorityFilter, StatusFilter, TaskStats};
pub use models::{NewTask, Priority, Task, TaskPatch, TaskStatus, Transcript, User};
