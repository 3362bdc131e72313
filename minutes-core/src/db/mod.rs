use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::StoreError;
use crate::models::{
    ChangeKind, CreateRecordingInput, CreateTodoInput, CreateUserInput, Recording, Todo,
    TodoHistory, TodoStatus, UpdateTodoInput, User, UserSummary,
};

mod schema;

pub use schema::SCHEMA;

type Result<T> = std::result::Result<T, StoreError>;

/// Handle to the SQLite store, cheap to clone and share across handlers.
///
/// All todo mutations go through the coordinator methods ([`create_todo`],
/// [`update_todo`], [`delete_todo`]) which pair the primary write with its
/// history append inside one transaction. There is no way to mutate a todo
/// through this type without producing the matching ledger entry.
///
/// [`create_todo`]: Database::create_todo
/// [`update_todo`]: Database::update_todo
/// [`delete_todo`]: Database::delete_todo
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        tracing::debug!("opened database at {}", path.as_ref().display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the database at the platform data directory, creating it as
    /// needed.
    pub fn open_default() -> anyhow::Result<Self> {
        let dirs = directories::ProjectDirs::from("com", "minutes", "minutes")
            .context("could not determine data directory")?;
        fs::create_dir_all(dirs.data_dir())?;
        Ok(Self::open(dirs.data_dir().join("minutes.db"))?)
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA)?;
        tracing::debug!("schema applied");
        Ok(())
    }

    // --- Users ---

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let user = conn
            .query_row(
                "SELECT id, first_name, last_name, role, email, password_hash
                 FROM users WHERE id = ?1",
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let user = conn
            .query_row(
                "SELECT id, first_name, last_name, role, email, password_hash
                 FROM users WHERE email = ?1",
                params![email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<UserSummary>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, first_name, last_name, role FROM users ORDER BY id ASC",
        )?;
        let users = stmt.query_map([], |row| {
            Ok(UserSummary {
                id: row.get("id")?,
                first_name: row.get("first_name")?,
                last_name: row.get::<_, Option<String>>("last_name")?.unwrap_or_default(),
                role: row.get::<_, Option<String>>("role")?.unwrap_or_default(),
            })
        })?;
        Ok(users.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn create_user(&self, input: CreateUserInput) -> Result<User> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO users (first_name, last_name, role, email, password_hash)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                input.first_name,
                input.last_name,
                input.role,
                input.email,
                input.password_hash
            ],
        )?;
        Ok(User {
            id: conn.last_insert_rowid(),
            first_name: input.first_name,
            last_name: input.last_name,
            role: input.role,
            email: input.email,
            password_hash: input.password_hash,
        })
    }

    // --- Recordings ---

    pub fn list_recordings(&self) -> Result<Vec<Recording>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, created_at, name, audio_url, transcript, summary, duration, notes, archived
             FROM recordings WHERE archived = 0 ORDER BY created_at DESC, id DESC",
        )?;
        let recordings = stmt.query_map([], recording_from_row)?;
        Ok(recordings.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_recording(&self, id: i64) -> Result<Option<Recording>> {
        let conn = self.conn.lock().unwrap();
        let recording = conn
            .query_row(
                "SELECT id, created_at, name, audio_url, transcript, summary, duration, notes, archived
                 FROM recordings WHERE id = ?1",
                params![id],
                recording_from_row,
            )
            .optional()?;
        Ok(recording)
    }

    pub fn create_recording(&self, input: CreateRecordingInput) -> Result<Recording> {
        let created_at = Utc::now();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO recordings (created_at, name, audio_url, transcript, summary, duration, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                format_timestamp(created_at),
                input.name,
                input.audio_url,
                input.transcript,
                input.summary,
                input.duration,
                input.notes
            ],
        )?;
        Ok(Recording {
            id: conn.last_insert_rowid(),
            created_at,
            name: input.name,
            audio_url: input.audio_url,
            transcript: input.transcript,
            summary: input.summary,
            duration: input.duration,
            notes: input.notes,
            archived: false,
        })
    }

    pub fn delete_recording(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM recordings WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    // --- Todos ---

    pub fn list_todos_by_user(&self, user_id: i64) -> Result<Vec<Todo>> {
        if user_id <= 0 {
            return Err(StoreError::InvalidInput("user_id is required".into()));
        }
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.description, t.status, t.user_id,
                    t.created_at_recording_id, t.updated_at_recording_id,
                    r.name AS recording_name, r.created_at AS recording_date
             FROM todos t
             LEFT JOIN recordings r ON r.id = t.created_at_recording_id
             WHERE t.user_id = ?1
             ORDER BY t.id DESC",
        )?;
        let todos = stmt.query_map(params![user_id], todo_from_row)?;
        Ok(todos.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn list_todos_by_recording(&self, recording_id: i64) -> Result<Vec<Todo>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.description, t.status, t.user_id,
                    t.created_at_recording_id, t.updated_at_recording_id,
                    r.name AS recording_name, r.created_at AS recording_date
             FROM todos t
             LEFT JOIN recordings r ON r.id = t.created_at_recording_id
             WHERE t.created_at_recording_id = ?1
             ORDER BY t.id DESC",
        )?;
        let todos = stmt.query_map(params![recording_id], todo_from_row)?;
        Ok(todos.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_todo(&self, id: i64) -> Result<Option<Todo>> {
        let conn = self.conn.lock().unwrap();
        Ok(fetch_todo(&conn, id)?)
    }

    /// Create a todo and its `create` ledger entry in one transaction.
    pub fn create_todo(&self, input: CreateTodoInput) -> Result<Todo> {
        let status = validate_todo_fields(&input.name, &input.status)?;
        if input.user_id <= 0 {
            return Err(StoreError::InvalidInput("user_id is required".into()));
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO todos (name, description, status, user_id,
                                created_at_recording_id, updated_at_recording_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                input.name,
                input.description,
                status.as_str(),
                input.user_id,
                input.created_at_recording_id,
                input.updated_at_recording_id
            ],
        )?;
        let id = tx.last_insert_rowid();
        let todo = fetch_todo(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        let actor = input.actor_user_id.unwrap_or(todo.user_id);
        append_history(&tx, &todo, actor, ChangeKind::Create)?;
        tx.commit()?;
        Ok(todo)
    }

    /// Replace a todo's mutable fields and append the `update` ledger entry
    /// in one transaction. Returns `None` if the id does not exist, in which
    /// case nothing is written.
    pub fn update_todo(&self, id: i64, input: UpdateTodoInput) -> Result<Option<Todo>> {
        let status = validate_todo_fields(&input.name, &input.status)?;
        if input.user_id <= 0 {
            return Err(StoreError::InvalidInput("user_id is required".into()));
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE todos
             SET name = ?1, description = ?2, status = ?3, user_id = ?4,
                 updated_at_recording_id = ?5
             WHERE id = ?6",
            params![
                input.name,
                input.description,
                status.as_str(),
                input.user_id,
                input.updated_at_recording_id,
                id
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        let todo = fetch_todo(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        let actor = input.actor_user_id.unwrap_or(todo.user_id);
        append_history(&tx, &todo, actor, ChangeKind::Update)?;
        tx.commit()?;
        Ok(Some(todo))
    }

    /// Delete a todo, recording a `delete` snapshot of its final state
    /// first. The snapshot is itself swept away by the cascade when the row
    /// goes, leaving the ledger empty for that id. Returns `false` if the id
    /// does not exist.
    pub fn delete_todo(&self, id: i64, actor_user_id: Option<i64>) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let Some(todo) = fetch_todo(&tx, id)? else {
            return Ok(false);
        };
        let actor = actor_user_id.unwrap_or(todo.user_id);
        append_history(&tx, &todo, actor, ChangeKind::Delete)?;
        tx.execute("DELETE FROM todos WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(true)
    }

    // --- History ---

    pub fn list_todo_history(&self, todo_id: i64) -> Result<Vec<TodoHistory>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, todo_id, actor_user_id, change_kind, name, description, status,
                    user_id, created_at_recording_id, updated_at_recording_id, changed_at
             FROM todo_history
             WHERE todo_id = ?1
             ORDER BY changed_at DESC, id DESC",
        )?;
        let history = stmt.query_map(params![todo_id], history_from_row)?;
        Ok(history.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

/// Write-path validation. Runs before any transaction is opened; a failure
/// here means the store was never touched.
fn validate_todo_fields(name: &str, status: &str) -> Result<TodoStatus> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidInput("name is required".into()));
    }
    let status = status.trim();
    if status.is_empty() {
        return Err(StoreError::InvalidInput("status is required".into()));
    }
    TodoStatus::from_str(status).ok_or_else(|| StoreError::InvalidInput("invalid status".into()))
}

fn fetch_todo(conn: &Connection, id: i64) -> rusqlite::Result<Option<Todo>> {
    conn.query_row(
        "SELECT t.id, t.name, t.description, t.status, t.user_id,
                t.created_at_recording_id, t.updated_at_recording_id,
                r.name AS recording_name, r.created_at AS recording_date
         FROM todos t
         LEFT JOIN recordings r ON r.id = t.created_at_recording_id
         WHERE t.id = ?1",
        params![id],
        todo_from_row,
    )
    .optional()
}

fn append_history(
    conn: &Connection,
    todo: &Todo,
    actor_user_id: i64,
    kind: ChangeKind,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO todo_history (todo_id, actor_user_id, change_kind, name, description,
                                   status, user_id, created_at_recording_id,
                                   updated_at_recording_id, changed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            todo.id,
            actor_user_id,
            kind.as_str(),
            todo.name,
            todo.description,
            todo.status,
            todo.user_id,
            todo.created_at_recording_id,
            todo.updated_at_recording_id,
            format_timestamp(Utc::now())
        ],
    )?;
    Ok(())
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        role: row.get("role")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
    })
}

fn recording_from_row(row: &Row) -> rusqlite::Result<Recording> {
    Ok(Recording {
        id: row.get("id")?,
        created_at: parse_timestamp(row.get("created_at")?)?,
        name: row.get("name")?,
        audio_url: row.get("audio_url")?,
        transcript: row.get("transcript")?,
        summary: row.get("summary")?,
        duration: row.get("duration")?,
        notes: row.get("notes")?,
        archived: row.get("archived")?,
    })
}

fn todo_from_row(row: &Row) -> rusqlite::Result<Todo> {
    let recording_date: Option<String> = row.get("recording_date")?;
    Ok(Todo {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        status: row.get("status")?,
        user_id: row.get("user_id")?,
        created_at_recording_id: row.get("created_at_recording_id")?,
        updated_at_recording_id: row.get("updated_at_recording_id")?,
        created_at_recording_name: row.get("recording_name")?,
        created_at_recording_date: recording_date.map(parse_timestamp).transpose()?,
    })
}

fn history_from_row(row: &Row) -> rusqlite::Result<TodoHistory> {
    let kind: String = row.get("change_kind")?;
    let change_kind = ChangeKind::from_str(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unknown change kind: {kind}").into(),
        )
    })?;
    Ok(TodoHistory {
        id: row.get("id")?,
        todo_id: row.get("todo_id")?,
        actor_user_id: row.get("actor_user_id")?,
        change_kind,
        name: row.get("name")?,
        description: row.get("description")?,
        status: row.get("status")?,
        user_id: row.get("user_id")?,
        created_at_recording_id: row.get("created_at_recording_id")?,
        updated_at_recording_id: row.get("updated_at_recording_id")?,
        changed_at: parse_timestamp(row.get("changed_at")?)?,
    })
}

/// Fixed-width RFC 3339 so that lexicographic ordering on the stored text
/// matches chronological ordering.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
        })
}
