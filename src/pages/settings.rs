use super::set_document_title;
use crate::chat::APP_TITLE;
use crate::components::ui::{
    Button, ButtonSize, ButtonVariant, Card, CardContent, CardDescription, CardHeader, CardTitle,
    ErrorAlert, Input, Label, Spinner, TagChip,
};
use crate::models::{HealthReport, Tag};
use crate::state::AppContext;
use crate::util::is_hex_color;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Name stored when the user clears a tag's name.
const FALLBACK_TAG_NAME: &str = "New tag";

pub(crate) fn tag_name_or_default(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        FALLBACK_TAG_NAME.to_string()
    } else {
        name.to_string()
    }
}

#[component]
pub fn SettingsPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let tags = app_state.0.tags;
    let tags_loading = app_state.0.tags_loading;
    let tags_error = app_state.0.tags_error;

    set_document_title(&format!("Settings - {APP_TITLE}"));
    app_state.0.reload_tags();

    view! {
        <div class="mx-auto max-w-2xl space-y-6 px-4 py-6">
            <HealthCard />

            <section class="space-y-3">
                <h2 class="text-lg font-semibold">"Manage Tags"</h2>
                <Show when=move || tags_loading.get() fallback=|| ().into_view()>
                    <Spinner />
                </Show>
                <ErrorAlert message=tags_error />
                <Show
                    when=move || !tags.get().is_empty() || tags_loading.get()
                    fallback=|| view! { <em class="text-sm text-muted-foreground">"No tags yet."</em> }
                >
                    <For
                        each=move || tags.get()
                        key=|t| t.id.clone()
                        children=move |tag| view! { <TagCard tag=tag /> }
                    />
                </Show>
            </section>
        </div>
    }
}

#[component]
fn HealthCard() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;

    let report: RwSignal<Option<HealthReport>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let error: RwSignal<Option<String>> = RwSignal::new(None);

    let check = move || {
        loading.set(true);
        error.set(None);
        let api_client = api_client.get_untracked();
        spawn_local(async move {
            match api_client.health().await {
                Ok(r) => {
                    let _ = report.try_set(Some(r));
                }
                Err(e) => {
                    let _ = report.try_set(None);
                    let _ = error.try_set(Some(e.to_string()));
                }
            }
            let _ = loading.try_set(false);
        });
    };

    check();

    view! {
        <Card>
            <CardHeader>
                <CardTitle>"Backend"</CardTitle>
                <CardDescription>
                    {move || api_client.with(|c| c.base_url.clone())}
                </CardDescription>
            </CardHeader>
            <CardContent class="space-y-2">
                <ErrorAlert message=error />
                {move || {
                    report
                        .get()
                        .map(|r| {
                            let checks = r
                                .checks
                                .into_iter()
                                .map(|(name, value)| {
                                    let (class, label) = if HealthReport::check_is_up(&value) {
                                        ("text-green-600", "UP")
                                    } else {
                                        ("text-destructive", "DOWN")
                                    };
                                    view! {
                                        <li class="flex justify-between text-sm">
                                            <span>{name}</span>
                                            <span class=class>{label}</span>
                                        </li>
                                    }
                                })
                                .collect_view();
                            view! {
                                <div class="text-sm">"Status: " {r.status}</div>
                                <ul class="space-y-1">{checks}</ul>
                            }
                        })
                }}
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    attr:disabled=move || loading.get()
                    on:click=move |_| check()
                >
                    "Check again"
                </Button>
            </CardContent>
        </Card>
    }
}

/// Rename/recolor/delete one tag. Changes are saved when a field is committed.
#[component]
fn TagCard(tag: Tag) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;

    let current: RwSignal<Tag> = RwSignal::new(tag.clone());
    let name: RwSignal<String> = RwSignal::new(tag.name);
    let color: RwSignal<String> = RwSignal::new(tag.color);
    let error: RwSignal<Option<String>> = RwSignal::new(None);

    let save = {
        let app = app_state.0.clone();
        move || {
            let new_name = tag_name_or_default(&name.get_untracked());
            let new_color = color.get_untracked();
            if !is_hex_color(&new_color) {
                return;
            }

            let id = current.with_untracked(|t| t.id.clone());
            let app = app.clone();
            let api_client = api_client.get_untracked();
            error.set(None);
            spawn_local(async move {
                match api_client.update_tag(&id, &new_name, &new_color).await {
                    Ok(updated) => {
                        let _ = name.try_set(updated.name.clone());
                        let _ = color.try_set(updated.color.clone());
                        let _ = current.try_set(updated.clone());
                        app.upsert_tag(updated);
                    }
                    Err(e) => {
                        let _ = error.try_set(Some(e.to_string()));
                    }
                }
            });
        }
    };

    let on_delete = {
        let app = app_state.0.clone();
        move |_| {
            let (id, tag_name) = current.with_untracked(|t| (t.id.clone(), t.name.clone()));
            let confirmed = window()
                .confirm_with_message(&format!("Are you sure you want to delete \"{tag_name}\"?"))
                .unwrap_or(false);
            if !confirmed {
                return;
            }

            let app = app.clone();
            let api_client = api_client.get_untracked();
            spawn_local(async move {
                match api_client.delete_tag(&id).await {
                    Ok(()) => app.remove_tag(&id),
                    Err(e) => {
                        let _ = error.try_set(Some(e.to_string()));
                    }
                }
            });
        }
    };

    let save_name = save.clone();
    let save_color = save;

    view! {
        <Card>
            <CardContent class="space-y-3">
                <div class="flex items-center justify-between">
                    {move || view! { <TagChip tag=current.get() /> }}
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Sm
                        class="text-destructive"
                        on:click=on_delete
                    >
                        "Delete"
                    </Button>
                </div>
                <div class="flex items-end gap-3">
                    <div class="flex-1 space-y-1">
                        <Label>"Name"</Label>
                        <Input bind_value=name placeholder="Tag name" on:change=move |_| save_name() />
                    </div>
                    <div class="space-y-1">
                        <Label>"Color"</Label>
                        <Input bind_value=color r#type="color" class="w-12 p-1" on:change=move |_| save_color() />
                    </div>
                </div>
                <ErrorAlert message=error />
            </CardContent>
        </Card>
    }
}
