//! Business operations composed from extraction and the stores

pub mod task_generator;

pub use task_generator::{generate_tasks, GeneratedBatch};
