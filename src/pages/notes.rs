use super::{set_document_title, NoteCard};
use crate::chat::APP_TITLE;
use crate::components::ui::{Button, ButtonSize, ButtonVariant, ErrorAlert, Input, Spinner, TagChip};
use crate::models::{Note, NoteQuery, SortMode};
use crate::state::AppContext;
use crate::storage::{save_list_prefs, PER_PAGE_CHOICES};
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Keep the requested page inside `1..=pages`.
pub(crate) fn clamp_page(page: u32, pages: u32) -> u32 {
    page.clamp(1, pages.max(1))
}

#[component]
pub fn NotesPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;
    let search_query = app_state.0.search_query;
    let tag_filter = app_state.0.tag_filter;
    let list_prefs = app_state.0.list_prefs;
    let page = app_state.0.page;
    let tags = app_state.0.tags;

    let notes: RwSignal<Vec<Note>> = RwSignal::new(vec![]);
    let pages: RwSignal<u32> = RwSignal::new(1);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let request_id: RwSignal<u64> = RwSignal::new(0);
    // Bumped after a delete to refetch the current page.
    let reload: RwSignal<u64> = RwSignal::new(0);

    set_document_title(APP_TITLE);

    if tags.get_untracked().is_empty() {
        app_state.0.reload_tags();
    }

    Effect::new(move |_| {
        save_list_prefs(&list_prefs.get());
    });

    // Refetch whenever any listing control changes.
    Effect::new(move |_| {
        let prefs = list_prefs.get();
        let query = NoteQuery {
            query: search_query.get(),
            sort: prefs.sort,
            tag_ids: tag_filter.get(),
            per_page: prefs.per_page,
            page: page.get(),
        };
        reload.track();

        let rid = request_id.get_untracked().saturating_add(1);
        request_id.set(rid);
        loading.set(true);
        error.set(None);

        let api_client = api_client.get_untracked();
        spawn_local(async move {
            let result = api_client.list_notes(&query).await;

            // Ignore stale responses.
            if request_id.get_untracked() != rid {
                return;
            }

            match result {
                Ok(listing) => {
                    let clamped = clamp_page(query.page, listing.pages);
                    pages.set(listing.pages.max(1));
                    notes.set(listing.notes);
                    if clamped != query.page {
                        page.set(clamped);
                    }
                }
                Err(e) => {
                    notes.set(vec![]);
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    });

    let previous_query = StoredValue::new(search_query.get_untracked());
    Effect::new(move |_| {
        let q = search_query.get();
        let old = previous_query.get_value();
        if old == q {
            return;
        }
        previous_query.set_value(q.clone());

        let sort = list_prefs.get_untracked().sort.after_query_change(&old, &q);
        if sort != list_prefs.get_untracked().sort {
            list_prefs.update(|p| p.sort = sort);
        }
        page.set(1);
    });

    let on_sort_change = move |ev: web_sys::Event| {
        if let Ok(sort) = event_target_value(&ev).parse::<SortMode>() {
            list_prefs.update(|p| p.sort = sort);
            page.set(1);
        }
    };

    let on_per_page_change = move |ev: web_sys::Event| {
        if let Ok(n) = event_target_value(&ev).parse::<u32>() {
            list_prefs.update(|p| p.per_page = n);
            page.set(1);
        }
    };

    let toggle_tag = Callback::new(move |tag_id: String| {
        tag_filter.update(|ids| {
            if let Some(pos) = ids.iter().position(|id| *id == tag_id) {
                ids.remove(pos);
            } else {
                ids.push(tag_id);
            }
        });
        page.set(1);
    });

    let on_deleted = Callback::new(move |_id: String| {
        reload.update(|n| *n += 1);
    });

    view! {
        <div class="mx-auto max-w-2xl space-y-4 px-4 py-6">
            <div class="flex items-center gap-2">
                <Input
                    bind_value=search_query
                    r#type="search"
                    placeholder="Search notes by title or content"
                />
                <select
                    class="h-9 rounded-md border bg-transparent px-2 text-sm"
                    aria-label="Sort mode"
                    on:change=on_sort_change
                >
                    {move || {
                        SortMode::available(&search_query.get())
                            .into_iter()
                            .map(|m| {
                                view! {
                                    <option value=m.to_string() selected=move || list_prefs.get().sort == m>
                                        {m.label()}
                                    </option>
                                }
                            })
                            .collect_view()
                    }}
                </select>
            </div>

            <div class="flex flex-wrap items-center gap-1.5">
                <span class="text-xs text-muted-foreground">"Filter by tag:"</span>
                <For
                    each=move || tags.get()
                    key=|t| (t.id.clone(), t.name.clone(), t.color.clone())
                    children=move |tag| {
                        let id = tag.id.clone();
                        let active = Signal::derive(move || tag_filter.get().contains(&id));
                        view! { <TagChip tag=tag active=active on_click=toggle_tag /> }
                    }
                />
            </div>

            <ErrorAlert message=error />

            <Show when=move || loading.get() fallback=|| ().into_view()>
                <div class="flex justify-center"><Spinner /></div>
            </Show>

            <div class="space-y-3">
                <Show
                    when=move || !notes.get().is_empty() || loading.get()
                    fallback=|| view! { <em class="text-sm text-muted-foreground">"No notes found."</em> }
                >
                    <For
                        each=move || notes.get()
                        key=move |n| {
                            (n.id.clone(), n.title.clone(), n.content.clone(), n.tags.len(), search_query.get_untracked())
                        }
                        children=move |note| {
                            view! { <NoteCard note=note query=search_query.get_untracked() on_deleted=on_deleted /> }
                        }
                    />
                </Show>
            </div>

            <div class="flex items-center justify-center gap-2 text-sm">
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    attr:disabled=move || page.get() <= 1
                    on:click=move |_| page.update(|p| *p = p.saturating_sub(1).max(1))
                >
                    "Prev"
                </Button>
                <span class="text-muted-foreground">
                    {move || format!("Page {} of {}", page.get(), pages.get())}
                </span>
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    attr:disabled=move || page.get() >= pages.get()
                    on:click=move |_| page.update(|p| *p = clamp_page(*p + 1, pages.get_untracked()))
                >
                    "Next"
                </Button>
                <select
                    class="h-8 rounded-md border bg-transparent px-2 text-sm"
                    aria-label="Notes per page"
                    on:change=on_per_page_change
                >
                    {PER_PAGE_CHOICES
                        .into_iter()
                        .map(|n| {
                            view! {
                                <option value=n.to_string() selected=move || list_prefs.get().per_page == n>
                                    {format!("{n} per page")}
                                </option>
                            }
                        })
                        .collect_view()}
                </select>
            </div>
        </div>
    }
}
