//! Email bodies for meeting events.

use crate::meeting::model::Meeting;
use crate::meeting::status::MeetingStatus;

use super::Notification;

const SIGNATURE: &str = "Thank you,\nMeetdesk Team";

pub fn otp_issued(meeting: &Meeting, code: &str) -> Notification {
    let subject = format!("Your Meeting Verification Code: {}", code);
    let body = format!(
        "Hello,\n\nYour OTP for the meeting '{}' is: {}\n\n\
         Please provide this code to the meeting organizer to verify your attendance.\n\n{}",
        meeting.title, code, SIGNATURE
    );

    Notification::new(subject, body, meeting.recipient_emails.iter().cloned())
}

/// Announce a status change. `actor` is only written out for cancellations.
pub fn status_changed(
    meeting: &Meeting,
    from: MeetingStatus,
    to: MeetingStatus,
    actor: &str,
) -> Notification {
    let subject = format!("Meeting '{}' is now {}", meeting.title, to.label());

    let mut body = format!(
        "Hello,\n\nThe status of a meeting you are invited to has changed.\n\n\
         Meeting: {}\n\
         Previous status: {}\n\
         New status: {}\n\
         Start time: {}\n\
         Location: {}\n\
         Type: {}\n\
         Duration: {} minutes\n",
        meeting.title,
        from.label(),
        to.label(),
        meeting.start_time.format("%Y-%m-%d %H:%M UTC"),
        meeting.location,
        meeting.meeting_type.label(),
        meeting.duration_minutes,
    );
    if to == MeetingStatus::Cancelled {
        body.push_str(&format!("Cancelled by: {}\n", actor));
    }
    body.push('\n');
    body.push_str(SIGNATURE);

    Notification::new(subject, body, meeting.recipient_emails.iter().cloned())
}
