mod note_sync;

pub(crate) use note_sync::NoteSyncController;

use crate::api::{ApiClient, EnvConfig};
use crate::autosave::AutosaveConfig;
use crate::models::Tag;
use crate::storage::{load_list_prefs, ListPrefs};
use leptos::prelude::*;

#[derive(Clone)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,
    pub autosave: AutosaveConfig,

    /// All tags, shared by the list filter, the note tag picker and settings.
    pub tags: RwSignal<Vec<Tag>>,
    pub tags_loading: RwSignal<bool>,
    pub tags_error: RwSignal<Option<String>>,
    /// Guards against stale tag responses.
    pub tags_request_id: RwSignal<u64>,

    /// Notes list controls; kept here so they survive navigating into a note and back.
    pub search_query: RwSignal<String>,
    pub tag_filter: RwSignal<Vec<String>>,
    pub list_prefs: RwSignal<ListPrefs>,
    pub page: RwSignal<u32>,
}

impl AppState {
    pub fn new() -> Self {
        let env = EnvConfig::new();

        Self {
            api_client: RwSignal::new(ApiClient::from_env(&env)),
            autosave: env.autosave(),
            tags: RwSignal::new(vec![]),
            tags_loading: RwSignal::new(false),
            tags_error: RwSignal::new(None),
            tags_request_id: RwSignal::new(0),
            search_query: RwSignal::new(String::new()),
            tag_filter: RwSignal::new(vec![]),
            list_prefs: RwSignal::new(load_list_prefs()),
            page: RwSignal::new(1),
        }
    }

    /// Reload the shared tag list. Responses from superseded requests are dropped.
    pub fn reload_tags(&self) {
        let req_id = self.tags_request_id.get_untracked().wrapping_add(1);
        self.tags_request_id.set(req_id);
        self.tags_loading.set(true);
        self.tags_error.set(None);

        let api_client = self.api_client.get_untracked();
        let tags = self.tags;
        let tags_loading = self.tags_loading;
        let tags_error = self.tags_error;
        let tags_request_id = self.tags_request_id;

        leptos::task::spawn_local(async move {
            let result = api_client.list_tags().await;
            if tags_request_id.get_untracked() != req_id {
                return;
            }

            match result {
                Ok(list) => tags.set(list),
                Err(e) => tags_error.set(Some(e.to_string())),
            }
            tags_loading.set(false);
        });
    }

    /// Replace (or insert) one tag in the shared list.
    pub fn upsert_tag(&self, tag: Tag) {
        self.tags.update(|list| upsert_tag_in(list, tag));
    }

    pub fn remove_tag(&self, tag_id: &str) {
        self.tags.update(|list| list.retain(|t| t.id != tag_id));
        self.tag_filter.update(|ids| ids.retain(|id| id != tag_id));
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn upsert_tag_in(list: &mut Vec<Tag>, tag: Tag) {
    match list.iter_mut().find(|t| t.id == tag.id) {
        Some(existing) => *existing = tag,
        None => list.push(tag),
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
