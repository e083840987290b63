use crate::models::SortMode;
use serde::{Deserialize, Serialize};

pub(crate) const LIST_PREFS_KEY: &str = "ai_notes_list_prefs";

pub(crate) const PER_PAGE_CHOICES: [u32; 3] = [10, 20, 50];

/// Notes list preferences remembered across visits.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ListPrefs {
    #[serde(default)]
    pub sort: SortMode,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_per_page() -> u32 {
    20
}

impl Default for ListPrefs {
    fn default() -> Self {
        Self {
            sort: SortMode::default(),
            per_page: default_per_page(),
        }
    }
}

impl ListPrefs {
    /// A page size outside the offered choices falls back to the default.
    fn normalized(mut self) -> Self {
        if !PER_PAGE_CHOICES.contains(&self.per_page) {
            self.per_page = default_per_page();
        }
        self
    }
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let json = local_storage()?.get_item(key).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(key, &json);
        }
    }
}

/// Tolerant load: missing or malformed data falls back to defaults.
pub(crate) fn load_list_prefs() -> ListPrefs {
    load_json_from_storage::<ListPrefs>(LIST_PREFS_KEY)
        .map(ListPrefs::normalized)
        .unwrap_or_default()
}

pub(crate) fn save_list_prefs(prefs: &ListPrefs) {
    save_json_to_storage(LIST_PREFS_KEY, prefs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_prefs_roundtrip_json() {
        let prefs = ListPrefs {
            sort: SortMode::Title,
            per_page: 50,
        };
        let json = serde_json::to_string(&prefs).unwrap();
        assert_eq!(json, r#"{"sort":"title","per_page":50}"#);
        assert_eq!(serde_json::from_str::<ListPrefs>(&json).unwrap(), prefs);
    }

    #[test]
    fn test_list_prefs_tolerant_decode() {
        assert_eq!(serde_json::from_str::<ListPrefs>("{}").unwrap(), ListPrefs::default());
        let odd: ListPrefs = serde_json::from_str(r#"{"sort":"created","per_page":7}"#).unwrap();
        assert_eq!(
            odd.normalized(),
            ListPrefs {
                sort: SortMode::Created,
                per_page: 20
            }
        );
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_list_prefs_storage_roundtrip() {
        let prefs = ListPrefs {
            sort: SortMode::Modified,
            per_page: 10,
        };
        save_list_prefs(&prefs);
        assert_eq!(load_list_prefs(), prefs);

        let loaded: Option<serde_json::Value> = load_json_from_storage(LIST_PREFS_KEY);
        assert_eq!(loaded.map(|v| v["sort"].clone()), Some(serde_json::json!("modified")));
    }

    #[wasm_bindgen_test]
    fn test_load_list_prefs_tolerates_bad_stored_values() {
        let storage = local_storage().expect("localStorage");

        storage.set_item(LIST_PREFS_KEY, r#"{"sort":"title","per_page":7}"#).unwrap();
        assert_eq!(
            load_list_prefs(),
            ListPrefs {
                sort: SortMode::Title,
                per_page: 20
            }
        );

        storage.set_item(LIST_PREFS_KEY, "{broken").unwrap();
        assert_eq!(load_list_prefs(), ListPrefs::default());

        storage.remove_item(LIST_PREFS_KEY).unwrap();
        assert_eq!(load_list_prefs(), ListPrefs::default());
    }
}
