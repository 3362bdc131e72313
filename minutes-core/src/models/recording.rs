use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub audio_url: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    /// Duration in seconds.
    pub duration: Option<i64>,
    pub notes: Option<String>,
    pub archived: bool,
}

impl Recording {
    /// An empty audio URL counts as "no audio", same as an absent one.
    pub fn has_audio(&self) -> bool {
        self.audio_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecordingInput {
    pub name: String,
    pub audio_url: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub duration: Option<i64>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(audio_url: Option<&str>) -> Recording {
        Recording {
            id: 1,
            created_at: Utc::now(),
            name: "Weekly sync".into(),
            audio_url: audio_url.map(Into::into),
            transcript: None,
            summary: None,
            duration: None,
            notes: None,
            archived: false,
        }
    }

    #[test]
    fn has_audio_requires_nonempty_url() {
        assert!(!recording(None).has_audio());
        assert!(!recording(Some("")).has_audio());
        assert!(recording(Some("https://example.com/a.ogg")).has_audio());
    }
}
