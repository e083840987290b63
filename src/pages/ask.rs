use super::{set_document_title, NoteCard};
use crate::chat::{rag_conversation, APP_TITLE, NO_MATCHES_REPLY};
use crate::components::ui::{Button, ButtonSize, Card, CardContent, ErrorAlert, Input, Spinner};
use crate::models::Note;
use crate::state::AppContext;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Notes retrieved per question.
const RAG_RESULTS: u32 = 5;

/// Ask a question answered from retrieved notes.
#[component]
pub fn AskPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;

    let query: RwSignal<String> = RwSignal::new(String::new());
    // Empty when idle.
    let status: RwSignal<String> = RwSignal::new(String::new());
    let answer: RwSignal<Option<String>> = RwSignal::new(None);
    let references: RwSignal<Vec<Note>> = RwSignal::new(vec![]);
    let error: RwSignal<Option<String>> = RwSignal::new(None);

    set_document_title(&format!("Ask - {APP_TITLE}"));

    let send = move || {
        let q = query.get_untracked().trim().to_string();
        if q.is_empty() || !status.get_untracked().is_empty() {
            return;
        }

        status.set("Searching for notes...".to_string());
        answer.set(None);
        references.set(vec![]);
        error.set(None);

        let api_client = api_client.get_untracked();
        spawn_local(async move {
            let notes = match api_client.rag(&q, RAG_RESULTS).await {
                Ok(notes) => notes,
                Err(e) => {
                    let _ = error.try_set(Some(e.to_string()));
                    let _ = status.try_set(String::new());
                    return;
                }
            };

            if notes.is_empty() {
                let _ = query.try_set(String::new());
                let _ = status.try_set(String::new());
                let _ = answer.try_set(Some(NO_MATCHES_REPLY.to_string()));
                return;
            }

            let _ = status.try_set("Searching notes for information...".to_string());
            let _ = references.try_set(notes.clone());

            match api_client.chat(&rag_conversation(&notes, &q)).await {
                Ok(reply) => {
                    let _ = query.try_set(String::new());
                    let _ = answer.try_set(Some(reply.content));
                }
                Err(e) => {
                    let _ = error.try_set(Some(e.to_string()));
                }
            }
            let _ = status.try_set(String::new());
        });
    };

    view! {
        <div class="mx-auto max-w-2xl space-y-4 px-4 py-6">
            <div class="flex items-center gap-2">
                <Input
                    bind_value=query
                    placeholder="Ask a question..."
                    on:keydown=move |ev: web_sys::KeyboardEvent| {
                        if ev.key() == "Enter" {
                            ev.prevent_default();
                            send();
                        }
                    }
                />
                <Button
                    size=ButtonSize::Sm
                    attr:disabled=move || !status.get().is_empty() || query.get().trim().is_empty()
                    on:click=move |_| send()
                >
                    "Ask"
                </Button>
            </div>

            <Show when=move || !status.get().is_empty() fallback=|| ().into_view()>
                <div class="flex items-center justify-center gap-3 text-sm text-muted-foreground">
                    <Spinner />
                    {move || status.get()}
                </div>
            </Show>

            <ErrorAlert message=error />

            {move || {
                answer
                    .get()
                    .map(|a| {
                        view! {
                            <Card class="bg-muted">
                                <CardContent class="whitespace-pre-wrap text-sm">{a}</CardContent>
                            </Card>
                        }
                    })
            }}

            <div class="space-y-3">
                <For
                    each=move || references.get()
                    key=|n| n.id.clone()
                    children=move |note| view! { <NoteCard note=note /> }
                />
            </div>
        </div>
    }
}
