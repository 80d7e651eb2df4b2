//! Meeting workflows: CRUD, status transitions, OTP confirmation and photos.
//!
//! Every operation is a read-modify-write against the database followed by an
//! optional notification. The write always lands first; a failed notification
//! is logged and never undoes it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::Connection;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::model::{Meeting, MeetingInput, MeetingView, UserSummary};
use super::otp;
use super::status::{plan_transition, MeetingStatus, TransitionOutcome};
use crate::config::OtpConfig;
use crate::db::{Database, MeetingRepository};
use crate::error::{MeetError, MeetResult};
use crate::notify::{messages, Notification, Notifier};

pub const PHOTO_DIR: &str = "meeting_photos";

/// What `mark_completed` did.
#[derive(Debug)]
pub enum CompletionOutcome {
    /// No code was supplied, so one was generated and sent.
    OtpSent(Meeting),
    /// The code matched and the completion transition was applied (or was
    /// already in place).
    Completed {
        meeting: Meeting,
        outcome: TransitionOutcome,
    },
}

pub struct MeetingService {
    db: Database,
    notifier: Arc<dyn Notifier>,
    media_dir: PathBuf,
    otp_max_attempts: Option<u32>,
}

fn fetch(conn: &Connection, uid: &str) -> MeetResult<Meeting> {
    MeetingRepository::get_by_uid(conn, uid)?.ok_or(MeetError::NotFound("Meeting"))
}

/// Compare `candidate` with the stored code and record the result. Fails
/// with `OtpLocked` once the attempt limit is reached.
fn check_code(
    conn: &Connection,
    meeting: &Meeting,
    candidate: &str,
    max_attempts: Option<u32>,
) -> MeetResult<bool> {
    if otp::attempts_exhausted(meeting, max_attempts) {
        return Err(MeetError::OtpLocked);
    }

    if otp::code_matches(meeting.otp_code.as_deref(), candidate) {
        MeetingRepository::mark_otp_verified(conn, &meeting.uid)?;
        Ok(true)
    } else {
        MeetingRepository::record_failed_otp(conn, &meeting.uid)?;
        Ok(false)
    }
}

/// Apply a planned transition with a compare-and-set on the current status.
fn apply_transition(
    conn: &Connection,
    meeting: Meeting,
    outcome: TransitionOutcome,
) -> MeetResult<Meeting> {
    match outcome {
        TransitionOutcome::AlreadyInState(_) => Ok(meeting),
        TransitionOutcome::Transitioned { from, to } => {
            if !MeetingRepository::compare_and_set_status(conn, &meeting.uid, from, to)? {
                return Err(MeetError::Conflict);
            }
            fetch(conn, &meeting.uid)
        }
    }
}

fn to_view(conn: &Connection, meeting: Meeting) -> MeetResult<MeetingView> {
    let photos = MeetingRepository::list_photos(conn, meeting.id)?;
    Ok(MeetingView::new(meeting, photos))
}

/// Lowercase alphanumeric extension of an uploaded file name, if any.
fn photo_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "jpg".to_string())
}

impl MeetingService {
    pub fn new(
        db: Database,
        notifier: Arc<dyn Notifier>,
        media_dir: PathBuf,
        otp_config: &OtpConfig,
    ) -> Self {
        Self {
            db,
            notifier,
            media_dir,
            otp_max_attempts: otp_config.max_attempts,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Send a notification, downgrading delivery failures to a warning.
    async fn dispatch(&self, notification: Notification) -> bool {
        match self.notifier.send(&notification).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Failed to send \"{}\" to {}: {}",
                    notification.subject,
                    notification.recipients().join(", "),
                    e
                );
                false
            }
        }
    }

    pub async fn create(&self, input: MeetingInput, creator_id: i64) -> MeetResult<Meeting> {
        let draft = input.validate()?;
        let uid = Uuid::new_v4().to_string();

        let meeting = self
            .db
            .run(move |conn| {
                MeetingRepository::insert(conn, &uid, &draft, creator_id)?;
                fetch(conn, &uid)
            })
            .await?;

        info!("Meeting {} created by user {}", meeting.uid, creator_id);
        Ok(meeting)
    }

    pub async fn get(&self, uid: &str) -> MeetResult<Meeting> {
        let uid = uid.to_string();
        self.db.run(move |conn| fetch(conn, &uid)).await
    }

    /// Meeting plus its photos, ready to serialize.
    pub async fn view(&self, uid: &str) -> MeetResult<MeetingView> {
        let uid = uid.to_string();
        self.db
            .run(move |conn| to_view(conn, fetch(conn, &uid)?))
            .await
    }

    pub async fn present(&self, meeting: Meeting) -> MeetResult<MeetingView> {
        self.db.run(move |conn| to_view(conn, meeting)).await
    }

    pub async fn list(
        &self,
        status: Option<MeetingStatus>,
        limit: usize,
    ) -> MeetResult<Vec<MeetingView>> {
        self.db
            .run(move |conn| {
                MeetingRepository::list(conn, status, limit)?
                    .into_iter()
                    .map(|meeting| to_view(conn, meeting))
                    .collect()
            })
            .await
    }

    pub async fn update(&self, uid: &str, input: MeetingInput) -> MeetResult<Meeting> {
        let draft = input.validate()?;
        let uid = uid.to_string();

        self.db
            .run(move |conn| {
                if !MeetingRepository::update_details(conn, &uid, &draft)? {
                    return Err(MeetError::NotFound("Meeting"));
                }
                fetch(conn, &uid)
            })
            .await
    }

    /// Delete a meeting, its photo rows and (best effort) the stored files.
    pub async fn delete(&self, uid: &str) -> MeetResult<()> {
        let uid = uid.to_string();
        let photos = self
            .db
            .run(move |conn| {
                let meeting = fetch(conn, &uid)?;
                let photos = MeetingRepository::list_photos(conn, meeting.id)?;
                MeetingRepository::delete(conn, &uid)?;
                Ok(photos)
            })
            .await?;

        for photo in photos {
            let path = self.media_dir.join(&photo.file);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!("Failed to remove photo file {:?}: {}", path, e);
            }
        }

        Ok(())
    }

    /// Move a meeting to `target` if the transition table allows it.
    ///
    /// Asking for the current status is a no-op that sends nothing. The
    /// status write is a compare-and-swap on the status that was read, so a
    /// concurrent change surfaces as [`MeetError::Conflict`].
    pub async fn transition(
        &self,
        uid: &str,
        target: MeetingStatus,
        actor: &UserSummary,
    ) -> MeetResult<(Meeting, TransitionOutcome)> {
        let uid = uid.to_string();
        let (meeting, outcome) = self
            .db
            .run(move |conn| {
                let meeting = fetch(conn, &uid)?;
                let outcome = plan_transition(meeting.status, target)?;
                Ok((apply_transition(conn, meeting, outcome)?, outcome))
            })
            .await?;

        self.announce(&meeting, outcome, actor).await;
        Ok((meeting, outcome))
    }

    async fn announce(&self, meeting: &Meeting, outcome: TransitionOutcome, actor: &UserSummary) {
        match outcome {
            TransitionOutcome::Transitioned { from, to } => {
                info!(
                    "Meeting {} moved from {} to {} by {}",
                    meeting.uid, from, to, actor.username
                );
                self.dispatch(messages::status_changed(meeting, from, to, &actor.username))
                    .await;
            }
            TransitionOutcome::AlreadyInState(status) => {
                debug!("Meeting {} already {}, nothing to do", meeting.uid, status);
            }
        }
    }

    /// Generate, store and email a new code. Status is not checked.
    pub async fn generate_otp(&self, uid: &str) -> MeetResult<Meeting> {
        let uid = uid.to_string();
        let code = otp::generate_code();

        let meeting = {
            let code = code.clone();
            self.db
                .run(move |conn| {
                    fetch(conn, &uid)?;
                    MeetingRepository::store_otp(conn, &uid, &code)?;
                    fetch(conn, &uid)
                })
                .await?
        };

        info!("OTP generated for meeting {}", meeting.uid);
        self.dispatch(messages::otp_issued(&meeting, &code)).await;

        Ok(meeting)
    }

    /// Compare `candidate` with the stored code, recording the result.
    pub async fn verify_otp(&self, uid: &str, candidate: &str) -> MeetResult<bool> {
        let key = uid.to_string();
        let candidate = candidate.to_string();
        let max_attempts = self.otp_max_attempts;

        let matched = self
            .db
            .run(move |conn| {
                let meeting = fetch(conn, &key)?;
                check_code(conn, &meeting, &candidate, max_attempts)
            })
            .await?;

        if matched {
            info!("OTP verified for meeting {}", uid);
        } else {
            warn!("Invalid OTP submitted for meeting {}", uid);
        }

        Ok(matched)
    }

    /// Without a code, send one. With a code, verify it and complete the
    /// meeting. A blank code counts as no code; any other code is compared
    /// exactly.
    ///
    /// The transition is planned before the code is checked, so a meeting
    /// that cannot be completed keeps its OTP state untouched.
    pub async fn mark_completed(
        &self,
        uid: &str,
        code: Option<&str>,
        actor: &UserSummary,
    ) -> MeetResult<CompletionOutcome> {
        let Some(code) = code.filter(|c| !c.trim().is_empty()) else {
            let meeting = self.generate_otp(uid).await?;
            return Ok(CompletionOutcome::OtpSent(meeting));
        };

        let key = uid.to_string();
        let candidate = code.to_string();
        let max_attempts = self.otp_max_attempts;

        let (meeting, outcome) = self
            .db
            .run(move |conn| {
                let meeting = fetch(conn, &key)?;
                let outcome = plan_transition(meeting.status, MeetingStatus::Completed)?;
                if !check_code(conn, &meeting, &candidate, max_attempts)? {
                    return Err(MeetError::InvalidOtp);
                }
                let meeting = fetch(conn, &key)?;
                Ok((apply_transition(conn, meeting, outcome)?, outcome))
            })
            .await
            .inspect_err(|e| {
                if matches!(e, MeetError::InvalidOtp) {
                    warn!("Invalid OTP submitted for meeting {}", uid);
                }
            })?;

        info!("OTP verified for meeting {}", uid);
        self.announce(&meeting, outcome, actor).await;
        Ok(CompletionOutcome::Completed { meeting, outcome })
    }

    /// Store an uploaded photo under the media root and attach it to the
    /// meeting. Returns the new photo id.
    pub async fn upload_photo(
        &self,
        uid: &str,
        file_name: Option<&str>,
        bytes: Vec<u8>,
        uploader: &UserSummary,
    ) -> MeetResult<i64> {
        let meeting = self.get(uid).await?;

        if bytes.is_empty() {
            return Err(MeetError::validation("file", "The submitted file is empty."));
        }

        let relative = format!(
            "{}/{}.{}",
            PHOTO_DIR,
            Uuid::new_v4().simple(),
            photo_extension(file_name)
        );
        let path = self.media_dir.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create photo directory: {}", e))?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write photo {:?}: {}", path, e))?;

        let meeting_id = meeting.id;
        let uploader_id = uploader.id;
        let file = relative.clone();
        let inserted = self
            .db
            .run(move |conn| {
                Ok(MeetingRepository::insert_photo(conn, meeting_id, &file, uploader_id)?)
            })
            .await;

        match inserted {
            Ok(photo_id) => {
                info!(
                    "Photo {} ({} bytes) uploaded to meeting {} by {}",
                    photo_id,
                    bytes.len(),
                    meeting.uid,
                    uploader.username
                );
                Ok(photo_id)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&path).await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::meeting::status::MeetingType;
    use crate::notify::testing::RecordingNotifier;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        service: MeetingService,
        notifier: RecordingNotifier,
        actor: UserSummary,
    }

    fn fixture_with(notifier: RecordingNotifier, otp: OtpConfig) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("meetdesk.db")).unwrap();
        let conn = db.connect().unwrap();
        let id = UserRepository::insert(
            &conn,
            &NewUser {
                username: "olga".to_string(),
                email: "olga@example.com".to_string(),
                password_hash: "x".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        let service = MeetingService::new(
            db,
            Arc::new(notifier.clone()),
            dir.path().join("media"),
            &otp,
        );

        Fixture {
            _dir: dir,
            service,
            notifier,
            actor: UserSummary {
                id,
                username: "olga".to_string(),
                email: "olga@example.com".to_string(),
            },
        }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingNotifier::default(), OtpConfig::default())
    }

    fn input() -> MeetingInput {
        MeetingInput {
            title: Some("Board meeting".to_string()),
            description: None,
            location: Some("Room 1".to_string()),
            meeting_type: None,
            start_time: Some("2026-02-10T15:00:00Z".to_string()),
            duration_minutes: Some(60),
            recipient_emails: Some(vec![
                "a@example.com".to_string(),
                "b@example.com".to_string(),
            ]),
        }
    }

    async fn create(f: &Fixture) -> Meeting {
        f.service.create(input(), f.actor.id).await.unwrap()
    }

    async fn force_status(f: &Fixture, uid: &str, status: MeetingStatus) {
        let uid = uid.to_string();
        f.service
            .database()
            .run(move |conn| {
                conn.execute(
                    "UPDATE meetings SET status = ?1 WHERE uid = ?2",
                    rusqlite::params![status.as_str(), uid],
                )?;
                Ok(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_starts_scheduled() {
        let f = fixture();
        let meeting = create(&f).await;
        assert_eq!(meeting.status, MeetingStatus::Scheduled);
        assert_eq!(meeting.meeting_type, MeetingType::InPerson);
        assert_eq!(meeting.uid.len(), 36);
        assert_eq!(meeting.created_by, f.actor);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let f = fixture();
        let err = f
            .service
            .create(MeetingInput::default(), f.actor.id)
            .await
            .unwrap_err();
        assert!(matches!(err, MeetError::Validation(_)));
    }

    #[tokio::test]
    async fn test_mark_in_progress_then_repeat_is_noop() {
        let f = fixture();
        let meeting = create(&f).await;

        let (updated, outcome) = f
            .service
            .transition(&meeting.uid, MeetingStatus::InProgress, &f.actor)
            .await
            .unwrap();
        assert_eq!(updated.status, MeetingStatus::InProgress);
        assert!(outcome.changed());
        assert_eq!(f.notifier.sent().len(), 1);

        let (again, outcome) = f
            .service
            .transition(&meeting.uid, MeetingStatus::InProgress, &f.actor)
            .await
            .unwrap();
        assert_eq!(again.status, MeetingStatus::InProgress);
        assert_eq!(outcome, TransitionOutcome::AlreadyInState(MeetingStatus::InProgress));
        assert_eq!(f.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_transition_notification_goes_to_recipients() {
        let f = fixture();
        let meeting = create(&f).await;

        f.service
            .transition(&meeting.uid, MeetingStatus::Cancelled, &f.actor)
            .await
            .unwrap();

        let sent = f.notifier.sent();
        assert_eq!(sent[0].recipients(), &["a@example.com", "b@example.com"]);
        assert!(sent[0].body.contains("Previous status: Scheduled"));
        assert!(sent[0].body.contains("Cancelled by: olga"));
    }

    #[tokio::test]
    async fn test_terminal_states_reject_transitions() {
        for terminal in [MeetingStatus::Completed, MeetingStatus::Cancelled] {
            let f = fixture();
            let meeting = create(&f).await;
            f.service.generate_otp(&meeting.uid).await.unwrap();
            force_status(&f, &meeting.uid, terminal).await;
            let before = f.service.get(&meeting.uid).await.unwrap();
            let sent_before = f.notifier.sent().len();

            for target in MeetingStatus::ALL.into_iter().filter(|s| *s != terminal) {
                let err = f
                    .service
                    .transition(&meeting.uid, target, &f.actor)
                    .await
                    .unwrap_err();
                assert!(matches!(err, MeetError::InvalidTransition { .. }));
            }

            let after = f.service.get(&meeting.uid).await.unwrap();
            assert_eq!(after.status, terminal);
            assert_eq!(after.otp_code, before.otp_code);
            assert_eq!(after.is_otp_verified, before.is_otp_verified);
            assert_eq!(f.notifier.sent().len(), sent_before);
        }
    }

    #[tokio::test]
    async fn test_unknown_uid_is_not_found() {
        let f = fixture();
        let err = f
            .service
            .transition("zzz", MeetingStatus::InProgress, &f.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, MeetError::NotFound("Meeting")));
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_status() {
        let f = fixture_with(RecordingNotifier::failing(), OtpConfig::default());
        let meeting = create(&f).await;

        let (updated, outcome) = f
            .service
            .transition(&meeting.uid, MeetingStatus::InProgress, &f.actor)
            .await
            .unwrap();
        assert!(outcome.changed());
        assert_eq!(updated.status, MeetingStatus::InProgress);
        assert_eq!(
            f.service.get(&meeting.uid).await.unwrap().status,
            MeetingStatus::InProgress
        );

        let with_code = f.service.generate_otp(&meeting.uid).await.unwrap();
        assert!(with_code.otp_code.is_some());
    }

    #[tokio::test]
    async fn test_otp_round_trip() {
        let f = fixture();
        let meeting = create(&f).await;

        let meeting = f.service.generate_otp(&meeting.uid).await.unwrap();
        let code = meeting.otp_code.clone().unwrap();
        assert_eq!(code.len(), 6);

        let sent = f.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.ends_with(&code));

        assert!(!f.service.verify_otp(&meeting.uid, "000000").await.unwrap());
        assert!(!f.service.get(&meeting.uid).await.unwrap().is_otp_verified);

        assert!(f.service.verify_otp(&meeting.uid, &code).await.unwrap());
        assert!(f.service.get(&meeting.uid).await.unwrap().is_otp_verified);
    }

    #[tokio::test]
    async fn test_verify_without_generated_code() {
        let f = fixture();
        let meeting = create(&f).await;
        assert!(!f.service.verify_otp(&meeting.uid, "123456").await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_completed_without_code_only_sends_otp() {
        let f = fixture();
        let meeting = create(&f).await;

        let outcome = f
            .service
            .mark_completed(&meeting.uid, None, &f.actor)
            .await
            .unwrap();
        let CompletionOutcome::OtpSent(sent) = outcome else {
            panic!("expected an OTP to be sent");
        };
        assert!(sent.otp_code.is_some());
        assert_eq!(sent.status, MeetingStatus::Scheduled);

        let blank = f
            .service
            .mark_completed(&meeting.uid, Some("  "), &f.actor)
            .await
            .unwrap();
        assert!(matches!(blank, CompletionOutcome::OtpSent(_)));
    }

    #[tokio::test]
    async fn test_mark_completed_with_code_is_idempotent() {
        let f = fixture();
        let meeting = create(&f).await;
        let code = f
            .service
            .generate_otp(&meeting.uid)
            .await
            .unwrap()
            .otp_code
            .unwrap();

        let first = f
            .service
            .mark_completed(&meeting.uid, Some(&code), &f.actor)
            .await
            .unwrap();
        let CompletionOutcome::Completed { meeting: done, outcome } = first else {
            panic!("expected completion");
        };
        assert_eq!(done.status, MeetingStatus::Completed);
        assert!(outcome.changed());
        let sent_after_first = f.notifier.sent().len();

        let second = f
            .service
            .mark_completed(&meeting.uid, Some(&code), &f.actor)
            .await
            .unwrap();
        let CompletionOutcome::Completed { outcome, .. } = second else {
            panic!("expected completion");
        };
        assert_eq!(outcome, TransitionOutcome::AlreadyInState(MeetingStatus::Completed));
        assert_eq!(f.notifier.sent().len(), sent_after_first);
    }

    #[tokio::test]
    async fn test_mark_completed_wrong_code_leaves_status() {
        let f = fixture();
        let meeting = create(&f).await;
        f.service.generate_otp(&meeting.uid).await.unwrap();

        let err = f
            .service
            .mark_completed(&meeting.uid, Some("not-it"), &f.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, MeetError::InvalidOtp));

        let meeting = f.service.get(&meeting.uid).await.unwrap();
        assert_eq!(meeting.status, MeetingStatus::Scheduled);
        assert!(!meeting.is_otp_verified);
    }

    #[tokio::test]
    async fn test_mark_completed_on_cancelled_meeting_keeps_otp_state() {
        let f = fixture();
        let meeting = create(&f).await;
        let code = f
            .service
            .generate_otp(&meeting.uid)
            .await
            .unwrap()
            .otp_code
            .unwrap();
        force_status(&f, &meeting.uid, MeetingStatus::Cancelled).await;
        let before = f.service.get(&meeting.uid).await.unwrap();

        for candidate in [code.as_str(), "000000"] {
            let err = f
                .service
                .mark_completed(&meeting.uid, Some(candidate), &f.actor)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                MeetError::InvalidTransition {
                    from: MeetingStatus::Cancelled,
                    to: MeetingStatus::Completed,
                }
            ));
        }

        let after = f.service.get(&meeting.uid).await.unwrap();
        assert_eq!(after.status, MeetingStatus::Cancelled);
        assert_eq!(after.otp_code, before.otp_code);
        assert!(!after.is_otp_verified);
        assert_eq!(after.otp_failed_attempts, before.otp_failed_attempts);
    }

    #[tokio::test]
    async fn test_mark_completed_rejects_padded_code() {
        let f = fixture();
        let meeting = create(&f).await;
        let code = f
            .service
            .generate_otp(&meeting.uid)
            .await
            .unwrap()
            .otp_code
            .unwrap();

        let err = f
            .service
            .mark_completed(&meeting.uid, Some(&format!(" {code} ")), &f.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, MeetError::InvalidOtp));

        let meeting = f.service.get(&meeting.uid).await.unwrap();
        assert_eq!(meeting.status, MeetingStatus::Scheduled);
        assert!(!meeting.is_otp_verified);
    }

    #[tokio::test]
    async fn test_new_code_after_completion_keeps_verification() {
        let f = fixture();
        let meeting = create(&f).await;
        let code = f
            .service
            .generate_otp(&meeting.uid)
            .await
            .unwrap()
            .otp_code
            .unwrap();
        f.service
            .mark_completed(&meeting.uid, Some(&code), &f.actor)
            .await
            .unwrap();

        let outcome = f
            .service
            .mark_completed(&meeting.uid, None, &f.actor)
            .await
            .unwrap();
        let CompletionOutcome::OtpSent(resent) = outcome else {
            panic!("expected an OTP to be sent");
        };
        assert_eq!(resent.status, MeetingStatus::Completed);
        assert!(resent.is_otp_verified);
        assert!(resent.otp_code.is_some());
        assert_eq!(resent.otp_failed_attempts, 0);
    }

    #[tokio::test]
    async fn test_otp_attempt_limit() {
        let f = fixture_with(
            RecordingNotifier::default(),
            OtpConfig {
                max_attempts: Some(3),
            },
        );
        let meeting = create(&f).await;
        let code = f
            .service
            .generate_otp(&meeting.uid)
            .await
            .unwrap()
            .otp_code
            .unwrap();

        for _ in 0..3 {
            assert!(!f.service.verify_otp(&meeting.uid, "bad").await.unwrap());
        }
        let err = f.service.verify_otp(&meeting.uid, &code).await.unwrap_err();
        assert!(matches!(err, MeetError::OtpLocked));

        let fresh = f
            .service
            .generate_otp(&meeting.uid)
            .await
            .unwrap()
            .otp_code
            .unwrap();
        assert!(f.service.verify_otp(&meeting.uid, &fresh).await.unwrap());
    }

    #[tokio::test]
    async fn test_unlimited_attempts_by_default() {
        let f = fixture();
        let meeting = create(&f).await;
        let code = f
            .service
            .generate_otp(&meeting.uid)
            .await
            .unwrap()
            .otp_code
            .unwrap();

        for _ in 0..20 {
            assert!(!f.service.verify_otp(&meeting.uid, "bad").await.unwrap());
        }
        assert!(f.service.verify_otp(&meeting.uid, &code).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let f = fixture();
        let meeting = create(&f).await;

        let updated = f
            .service
            .update(
                &meeting.uid,
                MeetingInput {
                    title: Some("Renamed".to_string()),
                    ..input()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Renamed");

        f.service.delete(&meeting.uid).await.unwrap();
        assert!(matches!(
            f.service.get(&meeting.uid).await.unwrap_err(),
            MeetError::NotFound(_)
        ));
        assert!(matches!(
            f.service.delete(&meeting.uid).await.unwrap_err(),
            MeetError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_upload_photo_and_cascade() {
        let f = fixture();
        let meeting = create(&f).await;

        let photo_id = f
            .service
            .upload_photo(&meeting.uid, Some("Team.PNG"), vec![1, 2, 3], &f.actor)
            .await
            .unwrap();
        assert!(photo_id > 0);

        let view = f.service.view(&meeting.uid).await.unwrap();
        assert_eq!(view.photos.len(), 1);
        let file = view.photos[0].file.clone();
        assert!(file.starts_with("meeting_photos/"));
        assert!(file.ends_with(".png"));
        let stored = f.service.media_dir().join(&file);
        assert_eq!(std::fs::read(&stored).unwrap(), vec![1, 2, 3]);

        f.service.delete(&meeting.uid).await.unwrap();
        assert!(!stored.exists());
    }

    #[tokio::test]
    async fn test_upload_photo_rejects_empty_and_unknown() {
        let f = fixture();
        let meeting = create(&f).await;

        let err = f
            .service
            .upload_photo(&meeting.uid, Some("a.jpg"), Vec::new(), &f.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, MeetError::Validation(_)));

        let err = f
            .service
            .upload_photo("zzz", Some("a.jpg"), vec![1], &f.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, MeetError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_view_lists_next_statuses() {
        let f = fixture();
        let meeting = create(&f).await;
        let view = f.service.view(&meeting.uid).await.unwrap();
        assert_eq!(
            view.next_status,
            vec![
                MeetingStatus::InProgress,
                MeetingStatus::Completed,
                MeetingStatus::Cancelled
            ]
        );

        let listed = f.service.list(None, 10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(f
            .service
            .list(Some(MeetingStatus::Completed), 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_photo_extension() {
        assert_eq!(photo_extension(Some("x.JPEG")), "jpeg");
        assert_eq!(photo_extension(Some("noext")), "jpg");
        assert_eq!(photo_extension(Some("../../evil.p/h")), "jpg");
        assert_eq!(photo_extension(None), "jpg");
    }
}
