use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            is_staff INTEGER NOT NULL DEFAULT 0,
            is_superuser INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL
        )",
        [],
    )
    .context("Failed to create users table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS meetings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uid TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL,
            meeting_type TEXT NOT NULL DEFAULT 'in_person',
            start_time TIMESTAMP NOT NULL,
            duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0),
            status TEXT NOT NULL DEFAULT 'scheduled',
            created_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            recipient_emails TEXT NOT NULL DEFAULT '[]',
            otp_code TEXT,
            is_otp_verified INTEGER NOT NULL DEFAULT 0,
            otp_failed_attempts INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )",
        [],
    )
    .context("Failed to create meetings table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_meetings_start_time ON meetings(start_time DESC)",
        [],
    )
    .context("Failed to create meetings start_time index")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_meetings_status ON meetings(status)",
        [],
    )
    .context("Failed to create meetings status index")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS meeting_photos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meeting_id INTEGER NOT NULL REFERENCES meetings(id) ON DELETE CASCADE,
            file TEXT NOT NULL,
            uploaded_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL
        )",
        [],
    )
    .context("Failed to create meeting_photos table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_meeting_photos_meeting ON meeting_photos(meeting_id)",
        [],
    )
    .context("Failed to create meeting_photos index")?;

    Ok(())
}
