use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current state of a todo. The `created_at_recording_*` fields carry the
/// originating recording's name and date when the read query joined them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Stored status token. Canonical for everything written through this
    /// crate; reads may still encounter legacy tokens from older data.
    pub status: String,
    pub user_id: i64,
    /// Recording that created this todo. Set once, never updated.
    pub created_at_recording_id: Option<i64>,
    pub updated_at_recording_id: Option<i64>,
    pub created_at_recording_name: Option<String>,
    pub created_at_recording_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    NotStarted,
    Partial,
    Done,
    Blocked,
    Skipped,
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Partial => "partial",
            Self::Done => "done",
            Self::Blocked => "blocked",
            Self::Skipped => "skipped",
        }
    }

    /// Strict write-path parse: only exact canonical tokens are accepted.
    /// Legacy synonyms are handled on the read path by [`DisplayStatus`].
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(Self::NotStarted),
            "partial" => Some(Self::Partial),
            "done" => Some(Self::Done),
            "blocked" => Some(Self::Blocked),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

/// Lenient read-path category for rendering stored status tokens.
///
/// Old rows may hold tokens written before status normalization existed.
/// Those must still render sensibly, so this mapping folds known historical
/// synonyms onto their canonical value and buckets anything unrecognized as
/// `Unspecified` instead of failing. Writes never go through this mapping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    NotStarted,
    Partial,
    Done,
    Blocked,
    Skipped,
    Unspecified,
}

impl DisplayStatus {
    pub fn from_stored(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "not_started" | "pending" => Self::NotStarted,
            "partial" | "in_progress" | "in progress" => Self::Partial,
            "done" | "completed" => Self::Done,
            "blocked" => Self::Blocked,
            "skipped" => Self::Skipped,
            _ => Self::Unspecified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Partial => "partial",
            Self::Done => "done",
            Self::Blocked => "blocked",
            Self::Skipped => "skipped",
            Self::Unspecified => "unspecified",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodoInput {
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub user_id: i64,
    pub created_at_recording_id: Option<i64>,
    pub updated_at_recording_id: Option<i64>,
    /// Who to attribute the change to. Defaults to the owning user.
    pub actor_user_id: Option<i64>,
}

/// Wholesale replacement of the mutable fields. `created_at_recording_id`
/// is deliberately absent: it is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTodoInput {
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub user_id: i64,
    pub updated_at_recording_id: Option<i64>,
    pub actor_user_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_parse_accepts_only_canonical_tokens() {
        assert_eq!(TodoStatus::from_str("partial"), Some(TodoStatus::Partial));
        assert_eq!(TodoStatus::from_str("skipped"), Some(TodoStatus::Skipped));
        assert_eq!(TodoStatus::from_str("pending"), None);
        assert_eq!(TodoStatus::from_str("in_progress"), None);
        assert_eq!(TodoStatus::from_str("Done"), None);
        assert_eq!(TodoStatus::from_str(""), None);
    }

    #[test]
    fn display_maps_legacy_synonyms() {
        assert_eq!(DisplayStatus::from_stored("pending"), DisplayStatus::NotStarted);
        assert_eq!(DisplayStatus::from_stored("in_progress"), DisplayStatus::Partial);
        assert_eq!(DisplayStatus::from_stored("in progress"), DisplayStatus::Partial);
        assert_eq!(DisplayStatus::from_stored("completed"), DisplayStatus::Done);
    }

    #[test]
    fn display_keeps_canonical_values() {
        for status in ["not_started", "partial", "done", "blocked", "skipped"] {
            assert_eq!(DisplayStatus::from_stored(status).as_str(), status);
        }
    }

    #[test]
    fn display_tolerates_case_and_unknown_tokens() {
        assert_eq!(DisplayStatus::from_stored(" Completed "), DisplayStatus::Done);
        assert_eq!(DisplayStatus::from_stored("wontfix"), DisplayStatus::Unspecified);
        assert_eq!(DisplayStatus::from_stored(""), DisplayStatus::Unspecified);
    }
}
