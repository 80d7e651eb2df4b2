//! User account persistence.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
                            is_staff, is_superuser, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        is_staff: row.get(6)?,
        is_superuser: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub struct UserRepository;

impl UserRepository {
    pub fn insert(conn: &Connection, user: &NewUser) -> Result<i64> {
        conn.execute(
            "INSERT INTO users (username, email, password_hash, first_name, last_name, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.username,
                user.email,
                user.password_hash,
                user.first_name,
                user.last_name,
                Utc::now(),
            ],
        )
        .context("Failed to insert user")?;

        Ok(conn.last_insert_rowid())
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<UserRecord>> {
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()
        .context("Failed to query user")
    }

    pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<UserRecord>> {
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()
        .context("Failed to query user by username")
    }

    pub fn username_exists(conn: &Connection, username: &str) -> Result<bool> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .context("Failed to check username")?;
        Ok(count > 0)
    }

    pub fn email_exists(conn: &Connection, email: &str) -> Result<bool> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE email = ?1 COLLATE NOCASE",
                params![email],
                |row| row.get(0),
            )
            .context("Failed to check email")?;
        Ok(count > 0)
    }
}
