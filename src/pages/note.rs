use super::set_document_title;
use crate::autosave::NoteFields;
use crate::chat::{note_conversation, push_user_message, visible_messages, APP_TITLE};
use crate::components::ui::{
    Button, ButtonSize, ButtonVariant, Card, CardContent, ErrorAlert, Input, Spinner, TagChip,
};
use crate::editor::NoteEditor;
use crate::models::{ChatMessage, ChatRole, Note, Tag};
use crate::state::{AppContext, NoteSyncController};
use crate::util::{is_hex_color, random_tag_color};
use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;
use leptos_router::params::Params;
use strum::{Display, EnumIter, IntoEnumIterator};

/// Value of the "create a new tag" entry in the add-tag select.
const NEW_TAG_OPTION: &str = "__new__";

#[derive(Params, PartialEq, Clone, Debug)]
pub struct NoteRouteParams {
    pub id: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumIter)]
enum NoteTab {
    Edit,
    View,
    Chat,
    Summarize,
}

/// Tags the note does not carry yet, in list order.
pub(crate) fn addable_tags(all: &[Tag], note: &Note) -> Vec<Tag> {
    all.iter().filter(|t| !note.has_tag(&t.id)).cloned().collect()
}

/// The note as currently typed, for chat prompts.
fn note_with_draft(note: &Note, draft: &NoteFields) -> Note {
    Note {
        title: draft.title.clone(),
        content: draft.content.clone(),
        ..note.clone()
    }
}

#[component]
pub fn NotePage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;
    let params = leptos_router::hooks::use_params::<NoteRouteParams>();

    let note_id = move || params.get().ok().and_then(|p| p.id).unwrap_or_default();

    let loaded: RwSignal<Option<Note>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let request_id: RwSignal<u64> = RwSignal::new(0);

    Effect::new(move |_| {
        let id = note_id();
        loaded.set(None);
        error.set(None);
        if id.trim().is_empty() {
            return;
        }

        let rid = request_id.get_untracked().saturating_add(1);
        request_id.set(rid);
        loading.set(true);

        let api_client = api_client.get_untracked();
        spawn_local(async move {
            let result = api_client.get_note(&id).await;
            if request_id.get_untracked() != rid {
                return;
            }

            match result {
                Ok(note) => loaded.set(Some(note)),
                Err(e) => error.set(Some(e.to_string())),
            }
            loading.set(false);
        });
    });

    view! {
        <div class="mx-auto max-w-3xl space-y-4 px-4 py-6">
            <Show when=move || loading.get() fallback=|| ().into_view()>
                <div class="flex justify-center"><Spinner /></div>
            </Show>
            <ErrorAlert message=error />
            {move || loaded.get().map(|note| view! { <NoteWorkspace note=note /> })}
        </div>
    }
}

/// One editing session: autosave driver, tags, and the four tabs.
#[component]
fn NoteWorkspace(note: Note) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;
    let navigate = StoredValue::new(use_navigate());

    let sync = NoteSyncController::new(api_client.get_untracked(), note, app_state.0.autosave);
    let synced = sync.note();
    let draft = sync.draft();

    let tab: RwSignal<NoteTab> = RwSignal::new(NoteTab::Edit);
    let chat_history: RwSignal<Vec<ChatMessage>> = RwSignal::new(vec![]);
    let summary: RwSignal<Option<String>> = RwSignal::new(None);

    Effect::new(move |_| {
        let title = synced.with(|n| n.display_title().to_string());
        set_document_title(&format!("{title} - {APP_TITLE}"));
    });

    let on_delete = move |_| {
        let (id, name) = synced.with_untracked(|n| (n.id.clone(), n.display_title().to_string()));
        let confirmed = window()
            .confirm_with_message(&format!("Delete \"{name}\"?"))
            .unwrap_or(false);
        if !confirmed {
            return;
        }

        let api_client = api_client.get_untracked();
        spawn_local(async move {
            match api_client.delete_note(&id).await {
                Ok(()) => navigate.with_value(|nav| nav("/", Default::default())),
                Err(e) => warn!("delete note {id} failed: {e}"),
            }
        });
    };

    let tab_class = move |t: NoteTab| {
        if tab.get() == t {
            "border-b-2 border-primary px-3 py-1.5 text-sm font-medium"
        } else {
            "px-3 py-1.5 text-sm text-muted-foreground hover:text-foreground"
        }
    };

    view! {
        <div class="space-y-4">
            <div class="flex items-start justify-between gap-2">
                <NoteTagList note=synced />
                <Button variant=ButtonVariant::Ghost size=ButtonSize::Sm class="text-destructive" on:click=on_delete>
                    "Delete"
                </Button>
            </div>

            <nav class="flex gap-1 border-b">
                {NoteTab::iter()
                    .map(|t| {
                        view! {
                            <button class=move || tab_class(t) on:click=move |_| tab.set(t)>
                                {t.to_string()}
                            </button>
                        }
                    })
                    .collect_view()}
            </nav>

            // The editor stays mounted for the whole session; its teardown ends the session.
            <div class:hidden=move || tab.get() != NoteTab::Edit>
                <NoteEditor sync=sync />
            </div>

            <Show when=move || tab.get() == NoteTab::View fallback=|| ().into_view()>
                <NotePreview draft=draft />
            </Show>

            <Show when=move || tab.get() == NoteTab::Chat fallback=|| ().into_view()>
                <div class="grid gap-4 md:grid-cols-2">
                    <NotePreview draft=draft />
                    <ChatArea note=synced draft=draft history=chat_history />
                </div>
            </Show>

            <Show when=move || tab.get() == NoteTab::Summarize fallback=|| ().into_view()>
                <div class="grid gap-4 md:grid-cols-2">
                    <NotePreview draft=draft />
                    <SummarizeArea draft=draft summary=summary />
                </div>
            </Show>
        </div>
    }
}

/// Read-only rendering of the note as typed. Plain text, line breaks kept.
#[component]
fn NotePreview(draft: RwSignal<NoteFields>) -> impl IntoView {
    view! {
        <div class="space-y-2">
            <h2 class="text-xl font-semibold">
                {move || draft.with(|d| if d.title.trim().is_empty() { "Untitled Note".to_string() } else { d.title.clone() })}
            </h2>
            <div class="whitespace-pre-wrap text-sm leading-relaxed">
                {move || draft.with(|d| d.content.clone())}
            </div>
        </div>
    }
}

#[component]
fn NoteTagList(note: RwSignal<Note>) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;
    let all_tags = app_state.0.tags;

    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let busy: RwSignal<bool> = RwSignal::new(false);
    let show_new: RwSignal<bool> = RwSignal::new(false);
    let new_name: RwSignal<String> = RwSignal::new(String::new());
    let new_color: RwSignal<String> = RwSignal::new(random_tag_color());

    if all_tags.get_untracked().is_empty() {
        app_state.0.reload_tags();
    }

    // Only tags change here; title and content belong to the autosave session.
    let merge_tags = move |updated: Note| {
        let _ = note.try_update(|n| n.tags = updated.tags);
    };

    let add_tag = move |tag_id: String| {
        let note_id = note.with_untracked(|n| n.id.clone());
        let api_client = api_client.get_untracked();
        busy.set(true);
        error.set(None);
        spawn_local(async move {
            match api_client.add_tag_to_note(&note_id, &tag_id).await {
                Ok(updated) => merge_tags(updated),
                Err(e) => {
                    let _ = error.try_set(Some(e.to_string()));
                }
            }
            let _ = busy.try_set(false);
        });
    };

    let on_remove = Callback::new(move |tag_id: String| {
        let note_id = note.with_untracked(|n| n.id.clone());
        let api_client = api_client.get_untracked();
        error.set(None);
        spawn_local(async move {
            match api_client.remove_tag_from_note(&note_id, &tag_id).await {
                Ok(updated) => merge_tags(updated),
                Err(e) => {
                    let _ = error.try_set(Some(e.to_string()));
                }
            }
        });
    });

    let on_select = move |ev: web_sys::Event| {
        let select = event_target::<web_sys::HtmlSelectElement>(&ev);
        let value = select.value();
        select.set_value("");

        if value == NEW_TAG_OPTION {
            new_name.set(String::new());
            new_color.set(random_tag_color());
            show_new.set(true);
        } else if !value.is_empty() {
            add_tag(value);
        }
    };

    let on_create = {
        let app = app_state.0.clone();
        move |_| {
            let name = new_name.get_untracked().trim().to_string();
            let color = new_color.get_untracked();
            if name.is_empty() || !is_hex_color(&color) {
                return;
            }

            let app = app.clone();
            let api_client = api_client.get_untracked();
            busy.set(true);
            error.set(None);
            spawn_local(async move {
                match api_client.create_tag(&name, &color).await {
                    Ok(tag) => {
                        let tag_id = tag.id.clone();
                        app.upsert_tag(tag);
                        let _ = show_new.try_set(false);
                        add_tag(tag_id);
                    }
                    Err(e) => {
                        let _ = error.try_set(Some(e.to_string()));
                        let _ = busy.try_set(false);
                    }
                }
            });
        }
    };

    view! {
        <div class="space-y-2">
            <div class="flex flex-wrap items-center gap-1.5">
                <For
                    each=move || note.get().tags
                    key=|t| (t.id.clone(), t.name.clone(), t.color.clone())
                    children=move |tag| view! { <TagChip tag=tag on_remove=on_remove /> }
                />
                <select
                    class="h-7 rounded-full border bg-transparent px-2 text-xs"
                    aria-label="Add a tag"
                    disabled=move || busy.get()
                    on:change=on_select
                >
                    <option value="" selected=true>"Add a tag"</option>
                    <option value=NEW_TAG_OPTION>"New tag..."</option>
                    {move || {
                        addable_tags(&all_tags.get(), &note.get())
                            .into_iter()
                            .map(|t| view! { <option value=t.id>{t.name}</option> })
                            .collect_view()
                    }}
                </select>
            </div>

            <Show when=move || show_new.get() fallback=|| ().into_view()>
                <div class="flex items-center gap-2">
                    <Input bind_value=new_name placeholder="Tag name" class="h-8 max-w-48" />
                    <Input bind_value=new_color r#type="color" class="h-8 w-12 p-1" />
                    <Button
                        size=ButtonSize::Sm
                        attr:disabled=move || busy.get() || new_name.get().trim().is_empty()
                        on:click=on_create.clone()
                    >
                        "Create"
                    </Button>
                    <Button variant=ButtonVariant::Ghost size=ButtonSize::Sm on:click=move |_| show_new.set(false)>
                        "Cancel"
                    </Button>
                </div>
            </Show>

            <ErrorAlert message=error />
        </div>
    }
}

#[component]
fn ChatArea(
    note: RwSignal<Note>,
    draft: RwSignal<NoteFields>,
    history: RwSignal<Vec<ChatMessage>>,
) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;

    let input: RwSignal<String> = RwSignal::new(String::new());
    let thinking: RwSignal<bool> = RwSignal::new(false);
    let error: RwSignal<Option<String>> = RwSignal::new(None);

    let restart = move || {
        let current = note.with_untracked(|n| draft.with_untracked(|d| note_with_draft(n, d)));
        history.set(note_conversation(&current));
        error.set(None);
    };

    if history.with_untracked(|h| h.is_empty()) {
        restart();
    }

    let send = move || {
        if thinking.get_untracked() {
            return;
        }
        let mut messages = history.get_untracked();
        if !push_user_message(&mut messages, &input.get_untracked()) {
            return;
        }
        history.set(messages.clone());
        input.set(String::new());
        thinking.set(true);
        error.set(None);

        let api_client = api_client.get_untracked();
        spawn_local(async move {
            match api_client.chat(&messages).await {
                Ok(reply) => {
                    let _ = history.try_update(|h| h.push(reply));
                }
                Err(e) => {
                    let _ = error.try_set(Some(e.to_string()));
                }
            }
            let _ = thinking.try_set(false);
        });
    };

    view! {
        <div class="flex flex-col gap-3">
            <div class="flex max-h-[60vh] flex-col gap-2 overflow-y-auto">
                {move || {
                    visible_messages(&history.get())
                        .into_iter()
                        .map(|m| {
                            let class = if m.role == ChatRole::User {
                                "ml-8 self-end rounded-lg bg-primary px-3 py-2 text-sm text-primary-foreground whitespace-pre-wrap"
                            } else {
                                "mr-8 self-start rounded-lg bg-muted px-3 py-2 text-sm whitespace-pre-wrap"
                            };
                            view! { <div class=class>{m.content}</div> }
                        })
                        .collect_view()
                }}
                <Show when=move || thinking.get() fallback=|| ().into_view()>
                    <div class="flex items-center gap-2 text-xs text-muted-foreground">
                        <Spinner />
                        "Thinking..."
                    </div>
                </Show>
            </div>

            <ErrorAlert message=error />

            <div class="flex items-center gap-2">
                <Input
                    bind_value=input
                    placeholder="Say something..."
                    on:keydown=move |ev: web_sys::KeyboardEvent| {
                        if ev.key() == "Enter" {
                            ev.prevent_default();
                            send();
                        }
                    }
                />
                <Button
                    size=ButtonSize::Sm
                    attr:disabled=move || thinking.get() || input.get().trim().is_empty()
                    on:click=move |_| send()
                >
                    "Send"
                </Button>
                <Button variant=ButtonVariant::Ghost size=ButtonSize::Sm on:click=move |_| restart()>
                    "Restart"
                </Button>
            </div>
        </div>
    }
}

#[component]
fn SummarizeArea(draft: RwSignal<NoteFields>, summary: RwSignal<Option<String>>) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;

    let thinking: RwSignal<bool> = RwSignal::new(false);
    let error: RwSignal<Option<String>> = RwSignal::new(None);

    let generate = move |_| {
        let text = draft.with_untracked(|d| d.content.clone());
        let api_client = api_client.get_untracked();
        thinking.set(true);
        error.set(None);
        spawn_local(async move {
            match api_client.summarize(&text).await {
                Ok(s) => {
                    let _ = summary.try_set(Some(s));
                }
                Err(e) => {
                    let _ = error.try_set(Some(e.to_string()));
                }
            }
            let _ = thinking.try_set(false);
        });
    };

    view! {
        <div class="flex flex-col gap-3">
            <Button attr:disabled=move || thinking.get() on:click=generate>
                "Generate Summary"
            </Button>
            <Show when=move || thinking.get() fallback=|| ().into_view()>
                <Spinner />
            </Show>
            <ErrorAlert message=error />
            {move || {
                summary
                    .get()
                    .filter(|s| !s.is_empty())
                    .map(|s| {
                        view! {
                            <Card>
                                <CardContent class="whitespace-pre-wrap text-sm">{s}</CardContent>
                            </Card>
                        }
                    })
            }}
        </div>
    }
}
