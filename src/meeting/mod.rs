//! Meeting domain.
//!
//! Status values and the transition guard, the meeting record and its
//! validation, OTP confirmation, and the service tying them to storage and
//! notifications.

pub mod model;
pub mod otp;
pub mod service;
pub mod status;

pub use model::{Meeting, MeetingInput, MeetingPhoto, MeetingView, UserSummary};
pub use service::{CompletionOutcome, MeetingService};
pub use status::{plan_transition, MeetingStatus, MeetingType, TransitionOutcome};
