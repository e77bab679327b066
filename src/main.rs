mod api;
mod components;
mod models;
mod state;
mod stream;

use leptos::mount::mount_to_body;
use leptos::prelude::*;

use components::chat::ChatWindow;
use components::sidebar::Sidebar;
use state::AppState;

/// Root application component.
#[component]
fn App() -> impl IntoView {
    let state = AppState::provide();

    // Load the conversation list on mount
    state.load_chats();

    view! {
        <div class="app">
            <Sidebar />
            <ChatWindow />
        </div>
    }
}

fn main() {
    console_log::init_with_level(log::Level::Debug).expect("Failed to init logger");
    mount_to_body(App);
}
