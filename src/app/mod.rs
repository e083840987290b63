use crate::pages::{AskPage, Header, NotePage, NotesPage, SettingsPage};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new()));

    // Router hooks (params, navigate) need the <Router> context, so the header lives inside it.
    view! {
        <Router>
            <Header />
            <main>
                <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                    <Route path=path!("") view=NotesPage />
                    <Route path=path!("note/:id") view=NotePage />
                    <Route path=path!("ask") view=AskPage />
                    <Route path=path!("settings") view=SettingsPage />
                </Routes>
            </main>
        </Router>
    }
}
