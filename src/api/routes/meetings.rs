//! Meeting API endpoints.
//!
//! Provides HTTP endpoints for:
//! - Meeting CRUD (GET/POST /meetings, GET/PUT/DELETE /meetings/:uid)
//! - Status changes (POST /meetings/:uid/mark-in-progress, mark-completed, mark-cancelled)
//! - OTP confirmation (POST /meetings/:uid/generate-otp, verify-otp)
//! - Photo upload (POST /meetings/:uid/upload-photo)

use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::MeetError;
use crate::meeting::{
    CompletionOutcome, MeetingInput, MeetingStatus, MeetingView, TransitionOutcome,
};

const DEFAULT_LIST_LIMIT: usize = 100;
const MAX_LIST_LIMIT: usize = 500;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

/// Body of mark-completed and verify-otp. The code may arrive as a string or
/// a bare number.
#[derive(Debug, Default, Deserialize)]
pub struct OtpRequest {
    #[serde(default, deserialize_with = "code_from_str_or_number")]
    pub otp_code: Option<String>,
}

impl OtpRequest {
    /// An empty body means no code. Anything else must be a valid request.
    fn from_body(body: &[u8]) -> ApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| {
            ApiError::bad_request(format!(
                "Failed to deserialize the JSON body into the target type: {e}"
            ))
        })
    }
}

fn code_from_str_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "otp_code must be a string, got {other}"
        ))),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/meetings", get(list_meetings).post(create_meeting))
        .route(
            "/meetings/:uid",
            get(get_meeting).put(update_meeting).delete(delete_meeting),
        )
        .route("/meetings/:uid/mark-in-progress", post(mark_in_progress))
        .route("/meetings/:uid/mark-completed", post(mark_completed))
        .route("/meetings/:uid/mark-cancelled", post(mark_cancelled))
        .route("/meetings/:uid/generate-otp", post(generate_otp))
        .route("/meetings/:uid/verify-otp", post(verify_otp))
        .route("/meetings/:uid/upload-photo", post(upload_photo))
}

fn data(view: MeetingView) -> Json<Value> {
    Json(json!({
        "status": true,
        "data": view,
    }))
}

async fn list_meetings(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;

    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(MeetingStatus::parse)
        .transpose()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let meetings = state.meetings.list(status, limit).await?;

    Ok(Json(json!({
        "status": true,
        "data": meetings,
    })))
}

async fn create_meeting(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    body: Result<Json<MeetingInput>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(input) = body?;

    let meeting = state.meetings.create(input, user.id).await?;
    let view = state.meetings.present(meeting).await?;

    Ok((StatusCode::CREATED, data(view)).into_response())
}

async fn get_meeting(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(data(state.meetings.view(&uid).await?))
}

async fn update_meeting(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(uid): Path<String>,
    body: Result<Json<MeetingInput>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(input) = body?;

    let meeting = state.meetings.update(&uid, input).await?;
    info!("Meeting {} updated by {}", uid, user.username);

    Ok(data(state.meetings.present(meeting).await?))
}

async fn delete_meeting(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> ApiResult<StatusCode> {
    state.meetings.delete(&uid).await?;
    info!("Meeting {} deleted by {}", uid, user.username);
    Ok(StatusCode::NO_CONTENT)
}

async fn change_status(
    state: &AppState,
    uid: &str,
    target: MeetingStatus,
    user: &AuthUser,
) -> ApiResult<Json<Value>> {
    let (meeting, outcome) = state.meetings.transition(uid, target, &user.0).await?;

    let message = match outcome {
        TransitionOutcome::Transitioned { to, .. } => format!("Meeting marked as {}", to.label()),
        TransitionOutcome::AlreadyInState(status) => {
            format!("Meeting is already {}", status.label())
        }
    };
    let view = state.meetings.present(meeting).await?;

    Ok(Json(json!({
        "status": true,
        "message": message,
        "data": view,
    })))
}

async fn mark_in_progress(
    user: AuthUser,
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> ApiResult<Json<Value>> {
    change_status(&state, &uid, MeetingStatus::InProgress, &user).await
}

async fn mark_cancelled(
    user: AuthUser,
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> ApiResult<Json<Value>> {
    change_status(&state, &uid, MeetingStatus::Cancelled, &user).await
}

async fn mark_completed(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(uid): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let request = OtpRequest::from_body(&body)?;

    match state
        .meetings
        .mark_completed(&uid, request.otp_code.as_deref(), &user)
        .await?
    {
        CompletionOutcome::OtpSent(_) => Ok(Json(json!({
            "status": true,
            "message": "OTP sent to the meeting recipients. Submit it to complete the meeting.",
        }))),
        CompletionOutcome::Completed { meeting, outcome } => {
            let message = if outcome.changed() {
                "Meeting marked as Completed"
            } else {
                "Meeting is already Completed"
            };
            let view = state.meetings.present(meeting).await?;
            Ok(Json(json!({
                "status": true,
                "message": message,
                "data": view,
            })))
        }
    }
}

async fn generate_otp(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> ApiResult<Json<Value>> {
    state.meetings.generate_otp(&uid).await?;

    Ok(Json(json!({
        "status": true,
        "message": "OTP sent to the meeting recipients",
    })))
}

async fn verify_otp(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(uid): Path<String>,
    body: Result<Json<OtpRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = body?;
    let code = request.otp_code.unwrap_or_default();

    if state.meetings.verify_otp(&uid, &code).await? {
        Ok(Json(json!({
            "status": true,
            "message": "OTP Verified",
        })))
    } else {
        Err(MeetError::InvalidOtp.into())
    }
}

async fn upload_photo(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(uid): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Response> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let is_image = field
            .content_type()
            .is_some_and(|ct| ct.starts_with("image/"));
        if !is_image {
            return Err(ApiError::bad_request(
                "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
            ));
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        let photo_id = state
            .meetings
            .upload_photo(&uid, file_name.as_deref(), bytes.to_vec(), &user)
            .await?;

        return Ok((
            StatusCode::CREATED,
            Json(json!({
                "status": true,
                "message": "Photo uploaded",
                "photo_id": photo_id,
            })),
        )
            .into_response());
    }

    Err(ApiError::bad_request("No file provided"))
}
