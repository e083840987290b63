use crate::models::Tag;
use icons::X;
use leptos::prelude::*;
use tw_merge::tw_merge;

/// Tag pill: a colored dot and border around the tag name.
///
/// With `on_click` the chip is a toggle (used by the list filter); with `on_remove` it
/// shows a small remove button (used on the note page).
#[component]
pub fn TagChip(
    tag: Tag,
    #[prop(into, default = Signal::stored(false))] active: Signal<bool>,
    #[prop(optional)] on_click: Option<Callback<String>>,
    #[prop(optional)] on_remove: Option<Callback<String>>,
) -> impl IntoView {
    let Tag { id, name, color } = tag;
    let id_for_click = id.clone();
    let id_for_remove = id;

    let class = move || {
        tw_merge!(
            "inline-flex items-center gap-1.5 rounded-full border px-2.5 py-0.5 text-xs",
            if on_click.is_some() { "cursor-pointer select-none" } else { "" },
            if active.get() { "bg-accent font-medium" } else { "" }
        )
    };

    view! {
        <span
            class=class
            style=format!("border-color: {color}")
            on:click=move |_| {
                if let Some(cb) = on_click {
                    cb.run(id_for_click.clone());
                }
            }
        >
            <span class="size-2 rounded-full" style=format!("background-color: {color}") />
            <span class="truncate">{name}</span>
            {on_remove.map(|cb| {
                view! {
                    <button
                        class="text-muted-foreground hover:text-foreground"
                        title="Remove tag"
                        on:click=move |ev: web_sys::MouseEvent| {
                            ev.stop_propagation();
                            cb.run(id_for_remove.clone());
                        }
                    >
                        <X class="size-3" />
                    </button>
                }
            })}
        </span>
    }
}
