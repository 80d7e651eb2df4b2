//! One-time codes confirming that a meeting took place.

use rand::Rng;

use super::model::Meeting;

pub const OTP_MIN: u32 = 100_000;
pub const OTP_MAX: u32 = 999_999;

/// A fresh six digit code, uniform over `OTP_MIN..=OTP_MAX`.
pub fn generate_code() -> String {
    generate_code_with(&mut rand::thread_rng())
}

pub fn generate_code_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.gen_range(OTP_MIN..=OTP_MAX).to_string()
}

/// Exact comparison against the stored code. No stored code never matches.
pub fn code_matches(stored: Option<&str>, candidate: &str) -> bool {
    matches!(stored, Some(code) if code == candidate)
}

/// Whether the meeting has used up its verification attempts.
pub fn attempts_exhausted(meeting: &Meeting, max_attempts: Option<u32>) -> bool {
    max_attempts.is_some_and(|max| meeting.otp_failed_attempts >= max)
}
