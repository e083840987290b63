use crate::api::ApiClient;
use crate::autosave::{
    AutosaveAction, AutosaveConfig, AutosaveController, NoteField, NoteFields, SaveStatus,
    TimerId,
};
use crate::models::Note;
use crate::util::now_ms;
use leptos::ev;
use leptos::logging::{log, warn};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::{window_event_listener, WindowListenerHandle};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wasm_bindgen::JsCast;

/// Browser driver for one note editing session.
///
/// Owns the sans-IO [`AutosaveController`] and executes the actions it returns:
/// - browser timeouts for the debounce and retry timers
/// - `PUT /notes/{id}` saves and `POST /embed/{id}` refreshes via `spawn_local`
/// - status, draft and synced-note signals for the views
/// - the `pagehide` listener
///
/// The core lock is never held while actions run, so timer callbacks and
/// response handlers can re-enter freely.
#[derive(Clone)]
pub(crate) struct NoteSyncController {
    api_client: ApiClient,
    core: Arc<Mutex<AutosaveController>>,

    /// Logical timer -> `setTimeout` handle.
    timers: Arc<Mutex<HashMap<TimerId, i32>>>,

    status: RwSignal<SaveStatus>,
    /// Local (title, content) as typed.
    draft: RwSignal<NoteFields>,
    /// Last server copy of the note.
    note: RwSignal<Note>,

    pagehide_handle: Arc<Mutex<Option<WindowListenerHandle>>>,
}

impl NoteSyncController {
    pub fn new(api_client: ApiClient, note: Note, config: AutosaveConfig) -> Self {
        let core = AutosaveController::new(
            note.id.clone(),
            NoteFields::from(&note),
            config,
            now_ms(),
        );

        let s = Self {
            api_client,
            core: Arc::new(Mutex::new(core)),
            timers: Arc::new(Mutex::new(HashMap::new())),
            status: RwSignal::new(SaveStatus::Clean),
            draft: RwSignal::new(NoteFields::from(&note)),
            note: RwSignal::new(note),
            pagehide_handle: Arc::new(Mutex::new(None)),
        };

        s.start_pagehide_listener();
        s
    }

    pub fn status(&self) -> RwSignal<SaveStatus> {
        self.status
    }

    pub fn draft(&self) -> RwSignal<NoteFields> {
        self.draft
    }

    /// The note as last confirmed by the server. Tag edits go through here too.
    pub fn note(&self) -> RwSignal<Note> {
        self.note
    }

    pub fn on_title_input(&self, value: String) {
        self.on_edit(NoteField::Title, value);
    }

    pub fn on_content_input(&self, value: String) {
        self.on_edit(NoteField::Content, value);
    }

    fn on_edit(&self, field: NoteField, value: String) {
        let _ = self.draft.try_update(|d| match field {
            NoteField::Title => d.title = value.clone(),
            NoteField::Content => d.content = value.clone(),
        });
        self.with_core(|c| c.on_edit(field, value, now_ms()));
    }

    /// Editing view is going away. Safe to call more than once.
    pub fn end_session(&self) {
        self.with_core(|c| c.end_session());

        if let Ok(mut handle) = self.pagehide_handle.lock() {
            if let Some(h) = handle.take() {
                h.remove();
            }
        }
    }

    fn on_page_hide(&self) {
        self.with_core(|c| c.on_page_hide());
    }

    fn on_timer_fired(&self, timer: TimerId) {
        if let Ok(mut map) = self.timers.lock() {
            map.remove(&timer);
        }
        self.with_core(|c| c.on_timer_fired(timer, now_ms()));
    }

    fn with_core(&self, f: impl FnOnce(&mut AutosaveController) -> Vec<AutosaveAction>) {
        let actions = match self.core.lock() {
            Ok(mut core) => f(&mut core),
            Err(_) => return,
        };
        self.run(actions);
    }

    fn run(&self, actions: Vec<AutosaveAction>) {
        for action in actions {
            match action {
                AutosaveAction::ArmTimer { timer, delay_ms } => self.arm_timer(timer, delay_ms),
                AutosaveAction::CancelTimer { timer } => self.cancel_timer(timer),
                AutosaveAction::SendSave {
                    note_id,
                    ticket,
                    fields,
                } => self.send_save(note_id, ticket, fields),
                AutosaveAction::RefreshDerived { note_id } => self.refresh_derived(note_id),
                AutosaveAction::StatusChanged(status) => {
                    let _ = self.status.try_set(status);
                }
                AutosaveAction::Synced(fields) => {
                    let _ = self.note.try_update(|n| {
                        n.title = fields.title;
                        n.content = fields.content;
                    });
                }
            }
        }
    }

    fn arm_timer(&self, timer: TimerId, delay_ms: i64) {
        let Some(win) = web_sys::window() else {
            return;
        };

        let s2 = self.clone();
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
            s2.on_timer_fired(timer);
        });

        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        let tid = win
            .set_timeout_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), delay)
            .unwrap_or(0);

        if let Ok(mut map) = self.timers.lock() {
            map.insert(timer, tid);
        }
    }

    fn cancel_timer(&self, timer: TimerId) {
        let tid = self.timers.lock().ok().and_then(|mut map| map.remove(&timer));
        if let (Some(tid), Some(win)) = (tid, web_sys::window()) {
            win.clear_timeout_with_handle(tid);
        }
    }

    fn send_save(&self, note_id: String, ticket: u64, fields: NoteFields) {
        let api_client = self.api_client.clone();
        let s2 = self.clone();
        spawn_local(async move {
            match api_client.update_note(&note_id, &fields).await {
                Ok(saved) => {
                    let _ = s2.note.try_update(|n| {
                        n.last_modified = saved.last_modified.clone();
                        n.last_opened = saved.last_opened.clone();
                    });
                    let server = NoteFields::from(&saved);
                    s2.with_core(|c| c.on_save_succeeded(ticket, server, now_ms()));
                }
                Err(e) => {
                    warn!("autosave of note {note_id} failed: {e}");
                    s2.with_core(|c| c.on_save_failed(ticket, now_ms()));
                }
            }
        });
    }

    fn refresh_derived(&self, note_id: String) {
        let api_client = self.api_client.clone();
        spawn_local(async move {
            if let Err(e) = api_client.refresh_embedding(&note_id).await {
                log!("embedding refresh for note {note_id} dropped: {e}");
            }
        });
    }

    fn start_pagehide_listener(&self) {
        let s2 = self.clone();
        let pagehide =
            window_event_listener(ev::pagehide, move |_ev: web_sys::PageTransitionEvent| {
                s2.on_page_hide();
            });

        if let Ok(mut handle) = self.pagehide_handle.lock() {
            *handle = Some(pagehide);
        }
    }
}
