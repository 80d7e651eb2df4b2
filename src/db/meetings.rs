//! Meeting and meeting photo persistence.
//!
//! Same pattern as `users.rs`: raw SQL, repository of associated functions
//! taking a borrowed connection.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};

use crate::meeting::model::{Meeting, MeetingDraft, MeetingPhoto, UserSummary};
use crate::meeting::status::{MeetingStatus, MeetingType};

const MEETING_SELECT: &str = "SELECT m.id, m.uid, m.title, m.description, m.location, \
     m.meeting_type, m.start_time, m.duration_minutes, m.status, m.recipient_emails, \
     m.otp_code, m.is_otp_verified, m.otp_failed_attempts, m.created_at, m.updated_at, \
     u.id, u.username, u.email \
     FROM meetings m JOIN users u ON u.id = m.created_by";

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn meeting_from_row(row: &Row<'_>) -> rusqlite::Result<Meeting> {
    let meeting_type: String = row.get(5)?;
    let status: String = row.get(8)?;
    let recipients: String = row.get(9)?;

    Ok(Meeting {
        id: row.get(0)?,
        uid: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        location: row.get(4)?,
        meeting_type: MeetingType::parse(&meeting_type).map_err(|e| conversion_error(5, e))?,
        start_time: row.get(6)?,
        duration_minutes: row.get(7)?,
        status: MeetingStatus::parse(&status).map_err(|e| conversion_error(8, e))?,
        recipient_emails: serde_json::from_str(&recipients).map_err(|e| conversion_error(9, e))?,
        otp_code: row.get(10)?,
        is_otp_verified: row.get(11)?,
        otp_failed_attempts: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
        created_by: UserSummary {
            id: row.get(15)?,
            username: row.get(16)?,
            email: row.get(17)?,
        },
    })
}

fn photo_from_row(row: &Row<'_>) -> rusqlite::Result<MeetingPhoto> {
    Ok(MeetingPhoto {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        file: row.get(2)?,
        uploaded_by: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Repository for meetings and their photos.
pub struct MeetingRepository;

impl MeetingRepository {
    /// Insert a new meeting in `scheduled` status. Returns the row id.
    pub fn insert(
        conn: &Connection,
        uid: &str,
        draft: &MeetingDraft,
        created_by: i64,
    ) -> Result<i64> {
        let now = Utc::now();
        let recipients = serde_json::to_string(&draft.recipient_emails)?;

        conn.execute(
            "INSERT INTO meetings (uid, title, description, location, meeting_type, start_time, \
             duration_minutes, status, created_by, recipient_emails, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                uid,
                draft.title,
                draft.description,
                draft.location,
                draft.meeting_type.as_str(),
                draft.start_time,
                draft.duration_minutes,
                MeetingStatus::Scheduled.as_str(),
                created_by,
                recipients,
                now,
            ],
        )
        .context("Failed to insert meeting")?;

        Ok(conn.last_insert_rowid())
    }

    pub fn get_by_uid(conn: &Connection, uid: &str) -> Result<Option<Meeting>> {
        conn.query_row(
            &format!("{MEETING_SELECT} WHERE m.uid = ?1"),
            params![uid],
            meeting_from_row,
        )
        .optional()
        .context("Failed to query meeting")
    }

    /// List meetings, latest start time first, optionally filtered by status.
    pub fn list(
        conn: &Connection,
        status: Option<MeetingStatus>,
        limit: usize,
    ) -> Result<Vec<Meeting>> {
        let mut stmt = conn
            .prepare(&format!(
                "{MEETING_SELECT} WHERE (?1 IS NULL OR m.status = ?1) \
                 ORDER BY m.start_time DESC, m.id DESC LIMIT ?2"
            ))
            .context("Failed to prepare meetings list query")?;

        let rows = stmt
            .query_map(
                params![status.map(|s| s.as_str()), limit as i64],
                meeting_from_row,
            )
            .context("Failed to list meetings")?;

        let mut meetings = Vec::new();
        for row in rows {
            meetings.push(row?);
        }

        Ok(meetings)
    }

    /// Overwrite the editable fields. Status and OTP state are untouched.
    pub fn update_details(conn: &Connection, uid: &str, draft: &MeetingDraft) -> Result<bool> {
        let recipients = serde_json::to_string(&draft.recipient_emails)?;

        let updated = conn
            .execute(
                "UPDATE meetings SET title = ?1, description = ?2, location = ?3, \
                 meeting_type = ?4, start_time = ?5, duration_minutes = ?6, \
                 recipient_emails = ?7, updated_at = ?8 WHERE uid = ?9",
                params![
                    draft.title,
                    draft.description,
                    draft.location,
                    draft.meeting_type.as_str(),
                    draft.start_time,
                    draft.duration_minutes,
                    recipients,
                    Utc::now(),
                    uid,
                ],
            )
            .context("Failed to update meeting")?;

        Ok(updated > 0)
    }

    /// Delete a meeting; photos go with it through the foreign key.
    pub fn delete(conn: &Connection, uid: &str) -> Result<bool> {
        let deleted = conn
            .execute("DELETE FROM meetings WHERE uid = ?1", params![uid])
            .context("Failed to delete meeting")?;
        Ok(deleted > 0)
    }

    /// Move from `expected` to `status` only if nobody changed it in between.
    /// Returns false when the stored status no longer equals `expected`.
    pub fn compare_and_set_status(
        conn: &Connection,
        uid: &str,
        expected: MeetingStatus,
        status: MeetingStatus,
    ) -> Result<bool> {
        let updated = conn
            .execute(
                "UPDATE meetings SET status = ?1, updated_at = ?2 WHERE uid = ?3 AND status = ?4",
                params![status.as_str(), Utc::now(), uid, expected.as_str()],
            )
            .context("Failed to update meeting status")?;
        Ok(updated > 0)
    }

    /// Store a freshly generated code and reset the failed-attempt counter.
    /// `is_otp_verified` is left as is.
    pub fn store_otp(conn: &Connection, uid: &str, code: &str) -> Result<()> {
        conn.execute(
            "UPDATE meetings SET otp_code = ?1, otp_failed_attempts = 0, \
             updated_at = ?2 WHERE uid = ?3",
            params![code, Utc::now(), uid],
        )
        .context("Failed to store meeting OTP")?;
        Ok(())
    }

    pub fn mark_otp_verified(conn: &Connection, uid: &str) -> Result<()> {
        conn.execute(
            "UPDATE meetings SET is_otp_verified = 1, updated_at = ?1 WHERE uid = ?2",
            params![Utc::now(), uid],
        )
        .context("Failed to mark meeting OTP verified")?;
        Ok(())
    }

    pub fn record_failed_otp(conn: &Connection, uid: &str) -> Result<()> {
        conn.execute(
            "UPDATE meetings SET otp_failed_attempts = otp_failed_attempts + 1 WHERE uid = ?1",
            params![uid],
        )
        .context("Failed to record OTP attempt")?;
        Ok(())
    }

    pub fn insert_photo(
        conn: &Connection,
        meeting_id: i64,
        file: &str,
        uploaded_by: i64,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO meeting_photos (meeting_id, file, uploaded_by, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![meeting_id, file, uploaded_by, Utc::now()],
        )
        .context("Failed to insert meeting photo")?;

        Ok(conn.last_insert_rowid())
    }

    pub fn list_photos(conn: &Connection, meeting_id: i64) -> Result<Vec<MeetingPhoto>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, meeting_id, file, uploaded_by, created_at \
                 FROM meeting_photos WHERE meeting_id = ?1 ORDER BY created_at, id",
            )
            .context("Failed to prepare photo query")?;

        let photos = stmt
            .query_map(params![meeting_id], photo_from_row)
            .context("Failed to query meeting photos")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map meeting photos")?;

        Ok(photos)
    }
}
