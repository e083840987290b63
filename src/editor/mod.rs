use crate::state::NoteSyncController;
use leptos::html;
use leptos::prelude::*;

/// Grow a textarea to fit its content.
fn autosize(el: &web_sys::HtmlTextAreaElement) {
    let style = web_sys::HtmlElement::style(el);
    let _ = style.set_property("height", "auto");
    let _ = style.set_property("height", &format!("{}px", el.scroll_height()));
}

/// Title + body editor for one note session.
///
/// Owns the session lifetime: when this view is torn down the session is ended,
/// which cancels the pending timer and flushes the note's embedding refresh.
#[component]
pub fn NoteEditor(sync: NoteSyncController) -> impl IntoView {
    let status = sync.status();
    let draft = sync.draft();
    let content_ref: NodeRef<html::Textarea> = NodeRef::new();

    {
        let sync = sync.clone();
        on_cleanup(move || sync.end_session());
    }

    // Size once the node is mounted.
    Effect::new(move |_| {
        if let Some(el) = content_ref.get() {
            autosize(&el);
        }
    });

    let (initial_title, initial_content) = draft.with_untracked(|d| (d.title.clone(), d.content.clone()));
    let sync_title = sync.clone();
    let sync_content = sync;

    view! {
        <div class="space-y-3">
            // Failures are only logged; the status line is all the user sees.
            <div class="text-xs text-muted-foreground" data-status=move || format!("{:?}", status.get())>
                {move || status.get().label()}
            </div>

            <input
                class="w-full border-0 bg-transparent text-2xl font-semibold outline-none placeholder:text-muted-foreground"
                placeholder="Untitled Note"
                prop:value=initial_title
                on:input=move |ev| sync_title.on_title_input(event_target_value(&ev))
            />

            <textarea
                node_ref=content_ref
                class="min-h-[50vh] w-full resize-none border-0 bg-transparent text-sm leading-relaxed outline-none placeholder:text-muted-foreground"
                placeholder="Start writing..."
                prop:value=initial_content
                on:input=move |ev| {
                    sync_content.on_content_input(event_target_value(&ev));
                    if let Some(el) = content_ref.get_untracked() {
                        autosize(&el);
                    }
                }
            />
        </div>
    }
}
