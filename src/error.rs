//! Domain errors shared by the meeting, account, and API layers.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::meeting::status::MeetingStatus;

/// Field name → list of problems, surfaced verbatim to API callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error.
    pub fn into_result(self) -> Result<(), MeetError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(MeetError::Validation(self))
        }
    }
}

#[derive(Debug, Error)]
pub enum MeetError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("Too many invalid OTP attempts, request a new code")]
    OtpLocked,

    #[error("Cannot change meeting status from {from} to {to}")]
    InvalidTransition {
        from: MeetingStatus,
        to: MeetingStatus,
    },

    #[error("Meeting status was changed by another request, retry")]
    Conflict,

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl MeetError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }
}

impl From<rusqlite::Error> for MeetError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Internal(err.into())
    }
}

pub type MeetResult<T> = Result<T, MeetError>;
