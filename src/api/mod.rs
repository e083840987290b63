use crate::autosave::{AutosaveConfig, NoteFields};
use crate::models::{ChatMessage, ChatRole, HealthReport, Note, NotePage, NoteQuery, Tag};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Network,
    NotFound,
    Http,
    Parse,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn not_found(path: &str) -> Self {
        Self {
            kind: ApiErrorKind::NotFound,
            message: format!("Not found: {path}"),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }

    fn missing(what: &str, data: &Value) -> Self {
        Self::parse(format!("response is missing {what}: {data}"))
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

pub(crate) const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Runtime configuration injected by the hosting page as `window.ENV`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct EnvConfig {
    pub api_url: String,
    pub autosave_ms: Option<i64>,
    pub autosave_retry_ms: Option<i64>,
}

impl EnvConfig {
    pub fn new() -> Self {
        let env = web_sys::window()
            .and_then(|w| w.get("ENV"))
            .filter(|env| !env.is_undefined() && env.is_object());

        let Some(env) = env else {
            leptos::logging::log!("window.ENV not set, using {DEFAULT_API_URL}");
            return Self::from_lookup(|_| None);
        };

        Self::from_lookup(|key| {
            let v = js_sys::Reflect::get(&env, &key.into()).ok()?;
            v.as_string()
                .or_else(|| v.as_f64().map(|n| (n as i64).to_string()))
        })
    }

    /// We accept both `API_URL` (documented) and `api_url` (legacy) for the backend URL.
    pub(crate) fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = get("API_URL")
            .or_else(|| get("api_url"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let get_ms = |k: &str| get(k).and_then(|s| s.trim().parse::<i64>().ok());

        Self {
            api_url,
            autosave_ms: get_ms("AUTOSAVE_MS"),
            autosave_retry_ms: get_ms("AUTOSAVE_RETRY_MS"),
        }
    }

    pub fn autosave(&self) -> AutosaveConfig {
        AutosaveConfig::from_parts(self.autosave_ms, self.autosave_retry_ms)
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct TagRequest {
    pub name: String,
    pub color: String,
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct ChatRequest<'a> {
    pub messages: &'a [ChatMessage],
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct RagRequest {
    pub query: String,
    #[serde(rename = "nResults")]
    pub n_results: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env(env: &EnvConfig) -> Self {
        Self::new(env.api_url.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request_api(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> ApiResult<reqwest::Response> {
        let client = reqwest::Client::new();
        let mut req = client.request(method.clone(), self.url(path));
        if let Some(b) = body {
            req = req.json(&b);
        }

        let res = req.send().await.map_err(ApiError::network)?;
        let status = res.status();

        if status.is_success() {
            Ok(res)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Err(ApiError::not_found(path))
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, &format!("{method} {path} failed")))
        }
    }

    async fn request_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> ApiResult<Value> {
        let res = self.request_api(method, path, body).await?;
        res.json().await.map_err(ApiError::parse)
    }

    async fn request_note(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> ApiResult<Note> {
        let data = self.request_json(method, path, body).await?;
        parse_note(&data).ok_or_else(|| ApiError::missing("note id", &data))
    }

    // ----- Health ----- //

    pub async fn health(&self) -> ApiResult<HealthReport> {
        let data = self.request_json(reqwest::Method::GET, "/health", None).await?;
        serde_json::from_value(data).map_err(ApiError::parse)
    }

    // ----- Notes ----- //

    pub async fn list_notes(&self, query: &NoteQuery) -> ApiResult<NotePage> {
        let data = self
            .request_json(reqwest::Method::GET, &notes_path(query), None)
            .await?;
        Ok(parse_note_page(&data))
    }

    pub async fn get_note(&self, id: &str) -> ApiResult<Note> {
        self.request_note(reqwest::Method::GET, &format!("/notes/{id}"), None)
            .await
    }

    pub async fn create_note(&self) -> ApiResult<Note> {
        self.request_note(reqwest::Method::POST, "/notes", None).await
    }

    /// Returns the canonical stored note, which may differ from what was sent.
    pub async fn update_note(&self, id: &str, fields: &NoteFields) -> ApiResult<Note> {
        let body = serde_json::to_value(fields).map_err(ApiError::parse)?;
        self.request_note(reqwest::Method::PUT, &format!("/notes/{id}"), Some(body))
            .await
    }

    /// Bumps the note's last-opened timestamp.
    pub async fn open_note(&self, id: &str) -> ApiResult<Note> {
        self.request_note(reqwest::Method::POST, &format!("/notes/{id}/open"), None)
            .await
    }

    pub async fn delete_note(&self, id: &str) -> ApiResult<()> {
        self.request_api(reqwest::Method::DELETE, &format!("/notes/{id}"), None)
            .await?;
        Ok(())
    }

    /// Recomputes the note's search embedding. Callers treat this as fire-and-forget.
    pub async fn refresh_embedding(&self, id: &str) -> ApiResult<()> {
        self.request_api(reqwest::Method::POST, &format!("/embed/{id}"), None)
            .await?;
        Ok(())
    }

    // ----- Tags ----- //

    pub async fn list_tags(&self) -> ApiResult<Vec<Tag>> {
        let data = self.request_json(reqwest::Method::GET, "/tags", None).await?;
        Ok(parse_tag_list(&data))
    }

    pub async fn create_tag(&self, name: &str, color: &str) -> ApiResult<Tag> {
        let body = serde_json::to_value(TagRequest {
            name: name.to_string(),
            color: color.to_string(),
        })
        .map_err(ApiError::parse)?;
        let data = self
            .request_json(reqwest::Method::POST, "/tags", Some(body))
            .await?;
        parse_tag(&data).ok_or_else(|| ApiError::missing("tag id", &data))
    }

    pub async fn update_tag(&self, id: &str, name: &str, color: &str) -> ApiResult<Tag> {
        let body = serde_json::to_value(TagRequest {
            name: name.to_string(),
            color: color.to_string(),
        })
        .map_err(ApiError::parse)?;
        let data = self
            .request_json(reqwest::Method::PUT, &format!("/tags/{id}"), Some(body))
            .await?;
        parse_tag(&data).ok_or_else(|| ApiError::missing("tag id", &data))
    }

    pub async fn delete_tag(&self, id: &str) -> ApiResult<()> {
        self.request_api(reqwest::Method::DELETE, &format!("/tags/{id}"), None)
            .await?;
        Ok(())
    }

    pub async fn add_tag_to_note(&self, note_id: &str, tag_id: &str) -> ApiResult<Note> {
        self.request_note(
            reqwest::Method::POST,
            &format!("/notes/{note_id}/tags/{tag_id}"),
            None,
        )
        .await
    }

    pub async fn remove_tag_from_note(&self, note_id: &str, tag_id: &str) -> ApiResult<Note> {
        self.request_note(
            reqwest::Method::DELETE,
            &format!("/notes/{note_id}/tags/{tag_id}"),
            None,
        )
        .await
    }

    // ----- Chat, summary and RAG ----- //

    pub async fn chat(&self, messages: &[ChatMessage]) -> ApiResult<ChatMessage> {
        let body = serde_json::to_value(ChatRequest { messages }).map_err(ApiError::parse)?;
        let data = self
            .request_json(reqwest::Method::POST, "/chat", Some(body))
            .await?;
        parse_chat_message(&data).ok_or_else(|| ApiError::missing("message content", &data))
    }

    pub async fn summarize(&self, text: &str) -> ApiResult<String> {
        let data = self
            .request_json(
                reqwest::Method::POST,
                "/summarize",
                Some(serde_json::json!({ "text": text })),
            )
            .await?;
        data.get("summary")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ApiError::missing("summary", &data))
    }

    /// Notes the backend judged relevant to `query`.
    pub async fn rag(&self, query: &str, n_results: u32) -> ApiResult<Vec<Note>> {
        let body = serde_json::to_value(RagRequest {
            query: query.to_string(),
            n_results,
        })
        .map_err(ApiError::parse)?;
        let data = self
            .request_json(reqwest::Method::POST, "/rag", Some(body))
            .await?;
        Ok(parse_note_array(data.get("notes")))
    }
}

/// `GET /notes` path with the listing query string.
pub(crate) fn notes_path(q: &NoteQuery) -> String {
    let mut url = String::from("/notes?");

    let query = q.query.trim();
    if !query.is_empty() {
        url.push_str(&format!("q={}&", urlencoding::encode(query)));
    }
    url.push_str(&format!("sort={}&", q.sort.effective(query)));
    if !q.tag_ids.is_empty() {
        url.push_str(&format!("tags={}&", urlencoding::encode(&q.tag_ids.join(","))));
    }
    url.push_str(&format!("n={}&page={}", q.per_page.max(1), q.page.max(1)));
    url
}

/// Ids come back as integers from the backend; accept strings as well.
fn id_string(v: Option<&Value>) -> Option<String> {
    let id = match v? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

fn get_s(item: &Value, k: &str) -> Option<String> {
    item.get(k).and_then(|v| v.as_str()).map(|s| s.to_string())
}

pub(crate) fn parse_tag(item: &Value) -> Option<Tag> {
    Some(Tag {
        id: id_string(item.get("id"))?,
        name: get_s(item, "name").unwrap_or_default(),
        color: get_s(item, "color").unwrap_or_else(|| "#6c757d".to_string()),
    })
}

pub(crate) fn parse_tag_list(data: &Value) -> Vec<Tag> {
    data.get("tags")
        .and_then(|v| v.as_array())
        .map(|list| list.iter().filter_map(parse_tag).collect())
        .unwrap_or_default()
}

pub(crate) fn parse_note(item: &Value) -> Option<Note> {
    let id = id_string(item.get("id"))?;

    let tags = item
        .get("tags")
        .and_then(|v| v.as_array())
        .map(|list| list.iter().filter_map(parse_tag).collect())
        .unwrap_or_default();

    let media = item
        .get("media")
        .and_then(|v| v.as_array())
        .map(|list| list.iter().filter_map(|m| id_string(Some(m))).collect())
        .unwrap_or_default();

    Some(Note {
        id,
        title: get_s(item, "title").unwrap_or_default(),
        content: get_s(item, "content").unwrap_or_default(),
        created_at: get_s(item, "created_at").unwrap_or_default(),
        last_modified: get_s(item, "last_modified").unwrap_or_default(),
        last_opened: get_s(item, "last_opened"),
        tags,
        media,
    })
}

fn parse_note_array(list: Option<&Value>) -> Vec<Note> {
    list.and_then(|v| v.as_array())
        .map(|list| list.iter().filter_map(parse_note).collect())
        .unwrap_or_default()
}

pub(crate) fn parse_note_page(data: &Value) -> NotePage {
    let notes = parse_note_array(data.get("notes"));
    let pages = data
        .get("pages")
        .and_then(|v| v.as_u64())
        .unwrap_or(1)
        .max(1) as u32;
    NotePage { notes, pages }
}

/// The chat endpoint relays the model's message object; the role is optional in practice.
pub(crate) fn parse_chat_message(data: &Value) -> Option<ChatMessage> {
    let content = get_s(data, "content")?;
    let role = data
        .get("role")
        .and_then(|r| serde_json::from_value::<ChatRole>(r.clone()).ok())
        .unwrap_or(ChatRole::Assistant);
    Some(ChatMessage { role, content })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autosave::RetryPolicy;
    use crate::models::SortMode;

    #[test]
    fn test_note_contract_deserialize() {
        // Shape of `Note.to_dict()` on the Flask backend.
        let json = serde_json::json!({
            "id": 12,
            "title": "Groceries",
            "content": "eggs\nmilk",
            "created_at": "Tue, 02 Jan 2024 10:00:00 GMT",
            "last_modified": "Tue, 02 Jan 2024 10:05:00 GMT",
            "last_opened": null,
            "tags": [{"id": 3, "name": "home", "color": "#AF3FAF"}],
            "media": [7]
        });
        let note = parse_note(&json).expect("note should parse");
        assert_eq!(note.id, "12");
        assert_eq!(note.content, "eggs\nmilk");
        assert!(note.last_opened.is_none());
        assert_eq!(note.tags[0].id, "3");
        assert_eq!(note.tags[0].color, "#AF3FAF");
        assert_eq!(note.media, vec!["7".to_string()]);
        assert!(note.has_tag("3"));
    }

    #[test]
    fn test_note_without_id_is_rejected() {
        assert!(parse_note(&serde_json::json!({"title": "x"})).is_none());
        assert!(parse_note(&serde_json::json!({"id": "  "})).is_none());
        assert_eq!(
            parse_note(&serde_json::json!({"id": "abc"})).map(|n| n.id),
            Some("abc".to_string())
        );
    }

    #[test]
    fn test_note_page_defaults() {
        let page = parse_note_page(&serde_json::json!({
            "notes": [{"id": 1}, {"title": "no id"}, {"id": 2}],
            "pages": 0
        }));
        assert_eq!(page.notes.len(), 2);
        assert_eq!(page.pages, 1);

        let empty = parse_note_page(&serde_json::json!({}));
        assert!(empty.notes.is_empty());
        assert_eq!(empty.pages, 1);
    }

    #[test]
    fn test_tag_list_contract() {
        let tags = parse_tag_list(&serde_json::json!({
            "tags": [{"id": 1, "name": "work", "color": "#112233"}, {"name": "orphan"}]
        }));
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "work");
    }

    #[test]
    fn test_chat_message_parse() {
        let m = parse_chat_message(&serde_json::json!({"role": "assistant", "content": "Hi"}))
            .expect("message");
        assert_eq!(m.role, ChatRole::Assistant);
        assert_eq!(m.content, "Hi");

        let m = parse_chat_message(&serde_json::json!({"content": "no role"})).unwrap();
        assert_eq!(m.role, ChatRole::Assistant);
        assert!(parse_chat_message(&serde_json::json!({"role": "assistant"})).is_none());
    }

    #[test]
    fn test_update_body_uses_title_and_content_keys() {
        let v = serde_json::to_value(NoteFields::new("T", "C")).expect("serialize");
        assert_eq!(v, serde_json::json!({"title": "T", "content": "C"}));
    }

    #[test]
    fn test_rag_request_uses_camel_case_count() {
        let v = serde_json::to_value(RagRequest {
            query: "q".to_string(),
            n_results: 5,
        })
        .unwrap();
        assert_eq!(v["nResults"], 5);
    }

    #[test]
    fn test_notes_path() {
        assert_eq!(
            notes_path(&NoteQuery::default()),
            "/notes?sort=opened&n=20&page=1"
        );

        let q = NoteQuery {
            query: " a b&c ".to_string(),
            sort: SortMode::Relevance,
            tag_ids: vec!["1".to_string(), "4".to_string()],
            per_page: 10,
            page: 3,
        };
        assert_eq!(
            notes_path(&q),
            "/notes?q=a%20b%26c&sort=relevance&tags=1%2C4&n=10&page=3"
        );

        let blank = NoteQuery {
            sort: SortMode::Relevance,
            ..NoteQuery::default()
        };
        assert_eq!(notes_path(&blank), "/notes?sort=opened&n=20&page=1");
    }

    #[test]
    fn test_api_client_trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:5000/api/");
        assert_eq!(client.base_url, "http://localhost:5000/api");
        assert_eq!(client.url("/notes/1"), "http://localhost:5000/api/notes/1");
    }

    #[test]
    fn test_env_config_lookup() {
        let env = EnvConfig::from_lookup(|_| None);
        assert_eq!(env.api_url, DEFAULT_API_URL);
        assert_eq!(env.autosave(), AutosaveConfig::default());

        let env = EnvConfig::from_lookup(|k| match k {
            "api_url" => Some("http://notes.local/api".to_string()),
            "AUTOSAVE_MS" => Some("1500".to_string()),
            "AUTOSAVE_RETRY_MS" => Some(" 10000 ".to_string()),
            _ => None,
        });
        assert_eq!(env.api_url, "http://notes.local/api");
        let autosave = env.autosave();
        assert_eq!(autosave.window_ms, 1500);
        assert_eq!(autosave.retry, RetryPolicy::After { delay_ms: 10_000 });

        // README style wins over the legacy key.
        let env = EnvConfig::from_lookup(|k| match k {
            "API_URL" => Some("http://a".to_string()),
            "api_url" => Some("http://b".to_string()),
            "AUTOSAVE_MS" => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(env.api_url, "http://a");
        assert_eq!(env.autosave_ms, None);
    }

    #[test]
    fn test_api_error_display() {
        let e = ApiError::not_found("/notes/9");
        assert_eq!(e.kind, ApiErrorKind::NotFound);
        assert_eq!(e.to_string(), "Not found: /notes/9");
    }
}
