//! User accounts

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use taskmint_common::time::{from_db_string, now, to_db_string};
use taskmint_common::{Error, Result, User};
use uuid::Uuid;

use super::parse_uuid;

/// Emails are unique case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let id: String = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(User {
        id: parse_uuid(&id, "user id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        created_at: from_db_string(&created_at)?,
    })
}

/// Insert a new account; `Conflict` when the email is taken
pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    name: &str,
) -> Result<User> {
    let user = User {
        id: Uuid::new_v4(),
        email: normalize_email(email),
        name: name.trim().to_string(),
        created_at: now(),
    };

    let result = sqlx::query(
        "INSERT INTO users (id, email, password_hash, name, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user.id.to_string())
    .bind(&user.email)
    .bind(password_hash)
    .bind(&user.name)
    .bind(to_db_string(&user.created_at))
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(user),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            Error::Conflict(format!("Email already registered: {}", user.email)),
        ),
        Err(e) => Err(e.into()),
    }
}

/// Account and stored password hash for login
pub async fn find_credentials(pool: &SqlitePool, email: &str) -> Result<Option<(User, String)>> {
    let row = sqlx::query(
        "SELECT id, email, name, created_at, password_hash FROM users WHERE email = ?",
    )
    .bind(normalize_email(email))
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let hash: String = row.try_get("password_hash")?;
            Ok(Some((user_from_row(&row)?, hash)))
        }
        None => Ok(None),
    }
}

pub async fn get_user(pool: &SqlitePool, id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query("SELECT id, email, name, created_at FROM users WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}
