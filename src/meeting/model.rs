//! Meeting entities and their JSON representations.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::status::{MeetingStatus, MeetingType};
use crate::error::{FieldErrors, MeetResult};

pub const MAX_RECIPIENTS: usize = 10;
const MAX_CHAR_FIELD: usize = 255;

/// Identity of a user as embedded in meeting payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// A persisted meeting, including fields never exposed over HTTP.
#[derive(Debug, Clone)]
pub struct Meeting {
    pub id: i64,
    pub uid: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub meeting_type: MeetingType,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub status: MeetingStatus,
    pub created_by: UserSummary,
    pub recipient_emails: Vec<String>,
    pub otp_code: Option<String>,
    pub is_otp_verified: bool,
    pub otp_failed_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeetingPhoto {
    pub id: i64,
    #[serde(skip)]
    pub meeting_id: i64,
    /// Path relative to the media root.
    pub file: String,
    pub uploaded_by: i64,
    pub created_at: DateTime<Utc>,
}

/// Public representation of a meeting.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingView {
    pub uid: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub location: String,
    pub meeting_type: MeetingType,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub status: MeetingStatus,
    pub next_status: Vec<MeetingStatus>,
    pub created_by: UserSummary,
    pub recipient_emails: Vec<String>,
    pub photos: Vec<MeetingPhoto>,
}

impl MeetingView {
    pub fn new(meeting: Meeting, photos: Vec<MeetingPhoto>) -> Self {
        Self {
            next_status: meeting.status.allowed_transitions().to_vec(),
            uid: meeting.uid,
            created_at: meeting.created_at,
            updated_at: meeting.updated_at,
            title: meeting.title,
            description: meeting.description,
            location: meeting.location,
            meeting_type: meeting.meeting_type,
            start_time: meeting.start_time,
            duration_minutes: meeting.duration_minutes,
            status: meeting.status,
            created_by: meeting.created_by,
            recipient_emails: meeting.recipient_emails,
            photos,
        }
    }
}

/// Create/update request body. Every field is optional at the wire level so
/// that missing values come back as field errors instead of a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeetingInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub meeting_type: Option<String>,
    pub start_time: Option<String>,
    pub duration_minutes: Option<i64>,
    pub recipient_emails: Option<Vec<String>>,
}

/// Validated meeting fields ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub meeting_type: MeetingType,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub recipient_emails: Vec<String>,
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)+$")
            .expect("email pattern is valid")
    })
}

pub fn is_valid_email(address: &str) -> bool {
    email_regex().is_match(address)
}

fn required_text(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> String {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        errors.add(field, "This field may not be blank.");
    } else if value.chars().count() > MAX_CHAR_FIELD {
        errors.add(
            field,
            format!("Ensure this field has no more than {MAX_CHAR_FIELD} characters."),
        );
    }
    value.to_string()
}

impl MeetingInput {
    pub fn validate(self) -> MeetResult<MeetingDraft> {
        let mut errors = FieldErrors::new();

        let title = required_text(&mut errors, "title", self.title.as_deref());
        let location = required_text(&mut errors, "location", self.location.as_deref());
        let description = self.description.unwrap_or_default().trim().to_string();

        let meeting_type = match self.meeting_type.as_deref() {
            None => MeetingType::default(),
            Some(raw) => MeetingType::parse(raw).unwrap_or_else(|_| {
                errors.add("meeting_type", format!("\"{raw}\" is not a valid choice."));
                MeetingType::default()
            }),
        };

        let start_time = match self.start_time.as_deref() {
            None => {
                errors.add("start_time", "This field is required.");
                None
            }
            Some(raw) => match DateTime::parse_from_rfc3339(raw) {
                Ok(parsed) => Some(parsed.with_timezone(&Utc)),
                Err(_) => {
                    errors.add("start_time", "Expected an RFC 3339 timestamp.");
                    None
                }
            },
        };

        let duration_minutes = match self.duration_minutes {
            None => {
                errors.add("duration_minutes", "This field is required.");
                0
            }
            Some(minutes) if minutes < 1 || minutes > i64::from(u32::MAX) => {
                errors.add(
                    "duration_minutes",
                    "Ensure this value is a positive number of minutes.",
                );
                0
            }
            Some(minutes) => minutes as u32,
        };

        let recipient_emails: Vec<String> = self
            .recipient_emails
            .unwrap_or_default()
            .into_iter()
            .map(|email| email.trim().to_string())
            .collect();
        if recipient_emails.is_empty() {
            errors.add("recipient_emails", "At least one recipient is required.");
        } else if recipient_emails.len() > MAX_RECIPIENTS {
            errors.add(
                "recipient_emails",
                format!("Ensure this field has no more than {MAX_RECIPIENTS} elements."),
            );
        }
        for email in recipient_emails.iter().filter(|e| !is_valid_email(e)) {
            errors.add("recipient_emails", format!("\"{email}\" is not a valid email address."));
        }

        errors.into_result()?;

        Ok(MeetingDraft {
            title,
            description,
            location,
            meeting_type,
            start_time: start_time.unwrap_or_default(),
            duration_minutes,
            recipient_emails,
        })
    }
}
