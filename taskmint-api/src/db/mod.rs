//! Database access for taskmint-api
//!
//! Every task and transcript query is scoped by `owner_id`; a row owned by
//! someone else is indistinguishable from a missing one.

pub mod tasks;
pub mod transcripts;
pub mod users;

use taskmint_common::{Error, Result};
use uuid::Uuid;

pub(crate) fn parse_uuid(value: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("Invalid {} '{}': {}", column, value, e)))
}
