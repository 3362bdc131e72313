use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use super::{ApiError, AppState};
use crate::auth::{self, AuthUser};
use minutes_core::models::Recording;

#[derive(Debug, Serialize)]
pub struct RecordingView {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub audio_url: String,
    pub transcript: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub has_audio: bool,
}

impl From<Recording> for RecordingView {
    fn from(recording: Recording) -> Self {
        let has_audio = recording.has_audio();
        Self {
            id: recording.id,
            created_at: recording.created_at,
            name: recording.name,
            audio_url: recording.audio_url.unwrap_or_default(),
            transcript: recording.transcript.unwrap_or_default(),
            summary: recording.summary.unwrap_or_default(),
            duration: recording.duration,
            notes: recording.notes,
            has_audio,
        }
    }
}

pub async fn list_recordings(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let recordings: Vec<RecordingView> = state
        .db
        .list_recordings()?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(json!({ "recordings": recordings })))
}

pub async fn get_recording(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let recording = state
        .db
        .get_recording(id)?
        .ok_or_else(|| ApiError::NotFound("recording not found".into()))?;
    Ok(Json(json!({ "recording": RecordingView::from(recording) })))
}

pub async fn delete_recording(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    auth::require_admin(&state.db, user_id)?;
    if !state.db.delete_recording(id)? {
        return Err(ApiError::NotFound("recording not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
