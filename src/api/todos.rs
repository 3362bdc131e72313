use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ApiError, AppState};
use crate::auth::{self, AuthUser};
use minutes_core::models::{
    ChangeKind, CreateTodoInput, DisplayStatus, Todo, TodoHistory, UpdateTodoInput,
};

/// The wire encodes absent references as 0 or omits them. Convert to a real
/// option at the boundary so "0 means absent" never reaches store logic.
fn opt_id(raw: Option<i64>) -> Option<i64> {
    raw.filter(|id| *id != 0)
}

fn opt_text(raw: Option<String>) -> Option<String> {
    raw.filter(|text| !text.is_empty())
}

#[derive(Debug, Serialize)]
pub struct TodoView {
    pub id: i64,
    pub name: String,
    pub desc: String,
    pub status: DisplayStatus,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_recording_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at_recording_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_recording_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_recording_date: Option<DateTime<Utc>>,
}

impl From<Todo> for TodoView {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            name: todo.name,
            desc: todo.description.unwrap_or_default(),
            status: DisplayStatus::from_stored(&todo.status),
            user_id: todo.user_id,
            created_at_recording_id: todo.created_at_recording_id,
            updated_at_recording_id: todo.updated_at_recording_id,
            created_at_recording_name: todo.created_at_recording_name,
            created_at_recording_date: todo.created_at_recording_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TodoHistoryView {
    pub id: i64,
    pub todo_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_user_id: Option<i64>,
    pub change_kind: ChangeKind,
    pub name: String,
    pub desc: String,
    pub status: DisplayStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_recording_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at_recording_id: Option<i64>,
    pub changed_at: DateTime<Utc>,
}

impl From<TodoHistory> for TodoHistoryView {
    fn from(entry: TodoHistory) -> Self {
        Self {
            id: entry.id,
            todo_id: entry.todo_id,
            actor_user_id: entry.actor_user_id,
            change_kind: entry.change_kind,
            name: entry.name,
            desc: entry.description.unwrap_or_default(),
            status: DisplayStatus::from_stored(&entry.status),
            user_id: entry.user_id,
            created_at_recording_id: entry.created_at_recording_id,
            updated_at_recording_id: entry.updated_at_recording_id,
            changed_at: entry.changed_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListTodosQuery {
    pub user_id: Option<i64>,
    pub recording_id: Option<i64>,
}

pub async fn list_todos(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListTodosQuery>,
) -> Result<Json<Value>, ApiError> {
    let todos = if let Some(recording_id) = opt_id(query.recording_id) {
        state.db.list_todos_by_recording(recording_id)?
    } else {
        let user_id = opt_id(query.user_id)
            .ok_or_else(|| ApiError::InvalidArgument("user_id is required".into()))?;
        state.db.list_todos_by_user(user_id)?
    };
    let todos: Vec<TodoView> = todos.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "todos": todos })))
}

pub async fn get_todo(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let todo = state
        .db
        .get_todo(id)?
        .ok_or_else(|| ApiError::NotFound("todo not found".into()))?;
    Ok(Json(json!({ "todo": TodoView::from(todo) })))
}

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub created_at_recording_id: Option<i64>,
    #[serde(default)]
    pub updated_at_recording_id: Option<i64>,
    #[serde(default)]
    pub actor_user_id: Option<i64>,
}

pub async fn create_todo(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<CreateTodoRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let todo = state.db.create_todo(CreateTodoInput {
        name: req.name,
        description: opt_text(req.desc),
        status: req.status,
        user_id: req.user_id,
        created_at_recording_id: opt_id(req.created_at_recording_id),
        updated_at_recording_id: opt_id(req.updated_at_recording_id),
        actor_user_id: opt_id(req.actor_user_id),
    })?;
    Ok((StatusCode::CREATED, Json(json!({ "todo": TodoView::from(todo) }))))
}

#[derive(Debug, Deserialize)]
pub struct UpdateTodoRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub updated_at_recording_id: Option<i64>,
    #[serde(default)]
    pub actor_user_id: Option<i64>,
}

pub async fn update_todo(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTodoRequest>,
) -> Result<Json<Value>, ApiError> {
    let todo = state
        .db
        .update_todo(
            id,
            UpdateTodoInput {
                name: req.name,
                description: opt_text(req.desc),
                status: req.status,
                user_id: req.user_id,
                updated_at_recording_id: opt_id(req.updated_at_recording_id),
                actor_user_id: opt_id(req.actor_user_id),
            },
        )?
        .ok_or_else(|| ApiError::NotFound("todo not found".into()))?;
    Ok(Json(json!({ "todo": TodoView::from(todo) })))
}

#[derive(Debug, Deserialize)]
pub struct DeleteTodoQuery {
    pub actor_user_id: Option<i64>,
}

pub async fn delete_todo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Query(query): Query<DeleteTodoQuery>,
) -> Result<StatusCode, ApiError> {
    auth::require_admin(&state.db, user_id)?;
    if !state.db.delete_todo(id, opt_id(query.actor_user_id))? {
        return Err(ApiError::NotFound("todo not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_todo_history(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let history: Vec<TodoHistoryView> = state
        .db
        .list_todo_history(id)?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(json!({ "history": history })))
}
