use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One immutable audit entry: a full snapshot of a todo's fields as they
/// stood immediately after a mutation (immediately before removal, for
/// deletes). Rows are only ever removed by the todo-delete cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoHistory {
    pub id: i64,
    pub todo_id: i64,
    /// Null once the actor's user row has been deleted.
    pub actor_user_id: Option<i64>,
    pub change_kind: ChangeKind,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub user_id: Option<i64>,
    pub created_at_recording_id: Option<i64>,
    pub updated_at_recording_id: Option<i64>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}
