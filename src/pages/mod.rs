mod ask;
mod note;
mod notes;
mod settings;

pub use ask::AskPage;
pub use note::NotePage;
pub use notes::NotesPage;
pub use settings::SettingsPage;

use crate::chat::APP_TITLE;
use crate::components::ui::{Button, ButtonSize, ButtonVariant, Card, CardContent, TagChip};
use crate::models::Note;
use crate::search::{highlight_segments, preview_segments, Segment, MATCH_RADIUS};
use crate::state::AppContext;
use icons::Trash2;
use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;
use wasm_bindgen::JsCast;

/// How often the header re-checks backend health.
const HEALTH_POLL_MS: i32 = 10_000;

pub(crate) fn set_document_title(title: &str) {
    if let Some(doc) = web_sys::window().and_then(|w| w.document()) {
        doc.set_title(title);
    }
}

/// Top bar shared by every route. Lives for the whole app.
#[component]
pub fn Header() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;
    let navigate = StoredValue::new(use_navigate());

    // None while the first probe is pending.
    let connected: RwSignal<Option<bool>> = RwSignal::new(None);
    let creating: RwSignal<bool> = RwSignal::new(false);

    let probe = move || {
        let api_client = api_client.get_untracked();
        spawn_local(async move {
            let ok = api_client.health().await.is_ok();
            let _ = connected.try_set(Some(ok));
        });
    };

    probe();
    if let Some(win) = web_sys::window() {
        let cb = wasm_bindgen::closure::Closure::wrap(Box::new(probe) as Box<dyn FnMut()>);
        let _ = win.set_interval_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            HEALTH_POLL_MS,
        );
        // Header lives for app lifetime; no on_cleanup needed.
        cb.forget();
    }

    let on_new_note = move |_| {
        if creating.get_untracked() {
            return;
        }
        creating.set(true);

        let api_client = api_client.get_untracked();
        spawn_local(async move {
            match api_client.create_note().await {
                Ok(note) => {
                    navigate.with_value(|nav| nav(&format!("/note/{}", note.id), Default::default()));
                }
                Err(e) => warn!("create note failed: {e}"),
            }
            creating.set(false);
        });
    };

    let link = "text-sm text-muted-foreground hover:text-foreground";

    view! {
        <header class="flex items-center gap-4 border-b px-4 py-2">
            <a href="/" class="font-semibold">{APP_TITLE}</a>
            <nav class="flex items-center gap-3">
                <a href="/" class=link>"Notes"</a>
                <a href="/ask" class=link>"Ask"</a>
                <a href="/settings" class=link>"Settings"</a>
            </nav>
            <Button
                size=ButtonSize::Sm
                attr:disabled=move || creating.get()
                on:click=on_new_note
            >
                "New note"
            </Button>
            <span class="ml-auto text-xs">
                {move || match connected.get() {
                    None => view! { <span class="text-muted-foreground">"Connecting..."</span> }.into_any(),
                    Some(true) => view! { <span class="text-green-600">"Connected"</span> }.into_any(),
                    Some(false) => view! { <span class="text-destructive">"Disconnected"</span> }.into_any(),
                }}
            </span>
        </header>
    }
}

#[component]
pub fn Segments(segments: Vec<Segment>) -> impl IntoView {
    segments
        .into_iter()
        .map(|s| match s {
            Segment::Plain(t) => view! { <span>{t}</span> }.into_any(),
            Segment::Highlight(t) => {
                view! { <mark class="rounded-sm bg-yellow-200 px-0.5">{t}</mark> }.into_any()
            }
        })
        .collect_view()
}

/// Listing card: highlighted title, tag chips and a body preview around the first match.
///
/// Clicking bumps the note's last-opened time and navigates to it. `on_deleted` enables
/// the delete button.
#[component]
pub fn NoteCard(
    note: Note,
    #[prop(into, optional)] query: String,
    #[prop(optional)] on_deleted: Option<Callback<String>>,
) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;
    let navigate = StoredValue::new(use_navigate());

    let id = note.id.clone();
    let title = highlight_segments(note.display_title(), &query);
    let preview = preview_segments(&note.content, &query, MATCH_RADIUS);
    let tags = note.tags.clone();

    let on_open = {
        let id = id.clone();
        move |_| {
            let id = id.clone();
            let api_client = api_client.get_untracked();
            spawn_local(async move {
                if let Err(e) = api_client.open_note(&id).await {
                    warn!("open note {id} failed: {e}");
                }
                navigate.with_value(|nav| nav(&format!("/note/{id}"), Default::default()));
            });
        }
    };

    let delete_button = on_deleted.map(|cb| {
        let id = id.clone();
        let name = note.display_title().to_string();
        view! {
            <Button
                variant=ButtonVariant::Ghost
                size=ButtonSize::Icon
                class="absolute right-2 top-2 text-destructive"
                attr:title="Delete note"
                on:click=move |ev: web_sys::MouseEvent| {
                    ev.stop_propagation();
                    let confirmed = window()
                        .confirm_with_message(&format!("Delete \"{name}\"?"))
                        .unwrap_or(false);
                    if !confirmed {
                        return;
                    }

                    let id = id.clone();
                    let api_client = api_client.get_untracked();
                    spawn_local(async move {
                        match api_client.delete_note(&id).await {
                            Ok(()) => cb.run(id),
                            Err(e) => warn!("delete note {id} failed: {e}"),
                        }
                    });
                }
            >
                <Trash2 class="size-4" />
            </Button>
        }
    });

    view! {
        <Card class="relative cursor-pointer hover:bg-accent/30" on:click=on_open>
            <CardContent class="space-y-2">
                <div class="pr-8 font-medium">
                    <Segments segments=title />
                </div>
                <div class="flex flex-wrap gap-1">
                    {tags.into_iter().map(|tag| view! { <TagChip tag=tag /> }).collect_view()}
                </div>
                <div class="text-sm text-muted-foreground">
                    <Segments segments=preview />
                </div>
            </CardContent>
            {delete_button}
        </Card>
    }
}
