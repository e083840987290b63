use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// A note as returned by the backend.
///
/// The backend emits integer ids; the client keeps them as opaque strings
/// (see `api::parse_note`).
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub(crate) struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub last_modified: String,
    pub last_opened: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub media: Vec<String>,
}

impl Note {
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled Note"
        } else {
            &self.title
        }
    }

    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Tag {
    pub id: String,
    pub name: String,
    /// `#rrggbb`
    pub color: String,
}

/// One page of the notes listing.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct NotePage {
    pub notes: Vec<Note>,
    pub pages: u32,
}

#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum SortMode {
    #[default]
    Opened,
    Modified,
    Created,
    Title,
    /// Only meaningful together with a search query.
    Relevance,
}

impl SortMode {
    pub fn label(self) -> &'static str {
        match self {
            SortMode::Opened => "Last opened",
            SortMode::Modified => "Last modified",
            SortMode::Created => "Date created",
            SortMode::Title => "Title",
            SortMode::Relevance => "Relevance",
        }
    }

    /// Modes offered for the current query; relevance needs something to rank by.
    pub fn available(query: &str) -> Vec<SortMode> {
        let has_query = !query.trim().is_empty();
        SortMode::iter()
            .filter(|m| has_query || *m != SortMode::Relevance)
            .collect()
    }

    /// The mode actually sent to the backend.
    pub fn effective(self, query: &str) -> SortMode {
        if self == SortMode::Relevance && query.trim().is_empty() {
            SortMode::default()
        } else {
            self
        }
    }

    /// Starting a search switches to relevance; clearing it leaves relevance.
    pub fn after_query_change(self, old: &str, new: &str) -> SortMode {
        match (old.trim().is_empty(), new.trim().is_empty()) {
            (true, false) => SortMode::Relevance,
            _ => self.effective(new),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct NoteQuery {
    pub query: String,
    pub sort: SortMode,
    pub tag_ids: Vec<String>,
    pub per_page: u32,
    pub page: u32,
}

impl Default for NoteQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort: SortMode::default(),
            tag_ids: vec![],
            per_page: 20,
            page: 1,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// `GET /health` payload. Check values are either `"UP"`/`"DOWN"` strings or booleans
/// depending on the backend service, so they are kept as raw JSON.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub(crate) struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub checks: std::collections::BTreeMap<String, serde_json::Value>,
}

impl HealthReport {
    pub fn check_is_up(value: &serde_json::Value) -> bool {
        match value {
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::String(s) => s.eq_ignore_ascii_case("up"),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_sort_mode_wire_strings() {
        assert_eq!(SortMode::Opened.as_ref(), "opened");
        assert_eq!(SortMode::Relevance.to_string(), "relevance");
        assert_eq!(SortMode::from_str("title").unwrap(), SortMode::Title);
        assert!(SortMode::from_str("bogus").is_err());
        assert_eq!(SortMode::iter().count(), 5);
    }

    #[test]
    fn test_relevance_only_with_query() {
        assert!(!SortMode::available("").contains(&SortMode::Relevance));
        assert_eq!(SortMode::available("  ").len(), 4);
        assert_eq!(SortMode::available("cats").len(), 5);

        assert_eq!(SortMode::Relevance.effective(" "), SortMode::Opened);
        assert_eq!(SortMode::Title.effective(""), SortMode::Title);
    }

    #[test]
    fn test_sort_follows_query_changes() {
        assert_eq!(SortMode::Title.after_query_change("", "c"), SortMode::Relevance);
        assert_eq!(SortMode::Title.after_query_change("c", "ca"), SortMode::Title);
        assert_eq!(SortMode::Relevance.after_query_change("ca", ""), SortMode::Opened);
        assert_eq!(SortMode::Modified.after_query_change("ca", ""), SortMode::Modified);
    }

    #[test]
    fn test_chat_role_serializes_lowercase() {
        let v = serde_json::to_value(ChatMessage::assistant("hi")).expect("serialize");
        assert_eq!(v["role"], "assistant");
        assert_eq!(v["content"], "hi");
    }

    #[test]
    fn test_health_check_values() {
        assert!(HealthReport::check_is_up(&serde_json::json!("UP")));
        assert!(HealthReport::check_is_up(&serde_json::json!(true)));
        assert!(!HealthReport::check_is_up(&serde_json::json!("DOWN")));
        assert!(!HealthReport::check_is_up(&serde_json::json!(null)));
    }

    #[test]
    fn test_display_title_falls_back_for_blank() {
        let mut n = Note::default();
        assert_eq!(n.display_title(), "Untitled Note");
        n.title = "Groceries".to_string();
        assert_eq!(n.display_title(), "Groceries");
    }
}
