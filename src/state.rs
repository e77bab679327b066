use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::models::{ChatSummary, Message, Role};
use crate::stream::StreamState;

/// Fixed assistant reply appended when a send fails.
const APOLOGY: &str = "Sorry, something went wrong. Please try again.";

/// Current time as an ISO-8601 string, matching the server's timestamps.
fn now_iso() -> String {
    js_sys::Date::new_0().to_iso_string().into()
}

/// Shared application state, provided via Leptos context.
#[derive(Clone)]
pub struct AppState {
    // --- Read signals (for components to subscribe to) ---
    pub chats: ReadSignal<Vec<ChatSummary>>,
    pub active_chat: ReadSignal<Option<String>>,
    pub messages: ReadSignal<Vec<Message>>,
    pub loading: ReadSignal<bool>,

    // --- Write signals (for mutating state) ---
    pub set_chats: WriteSignal<Vec<ChatSummary>>,
    pub set_active_chat: WriteSignal<Option<String>>,
    pub set_messages: WriteSignal<Vec<Message>>,
    pub set_loading: WriteSignal<bool>,
}

impl AppState {
    /// Create a new `AppState` and provide it in the current Leptos context.
    pub fn provide() -> Self {
        let (chats, set_chats) = signal(Vec::<ChatSummary>::new());
        let (active_chat, set_active_chat) = signal(None::<String>);
        let (messages, set_messages) = signal(Vec::<Message>::new());
        let (loading, set_loading) = signal(false);

        let state = Self {
            chats,
            active_chat,
            messages,
            loading,
            set_chats,
            set_active_chat,
            set_messages,
            set_loading,
        };

        provide_context(state.clone());
        state
    }

    /// Refresh the conversation summary list from the backend. Failures are
    /// logged and the list is left as it was.
    pub fn load_chats(&self) {
        let state = self.clone();
        spawn_local(async move {
            match api::fetch_chats().await {
                Ok(chats) => state.set_chats.set(chats),
                Err(e) => log::error!("Failed to fetch chats: {e}"),
            }
        });
    }

    /// Load a conversation's history and make it active. On failure the
    /// selection does not change.
    pub fn select_chat(&self, id: String) {
        let state = self.clone();
        spawn_local(async move {
            match api::fetch_messages(&id).await {
                Ok(msgs) => {
                    state.set_active_chat.set(Some(id));
                    state.set_messages.set(msgs);
                }
                Err(e) => log::error!("Failed to load chat: {e}"),
            }
        });
    }

    /// Start a fresh conversation. Purely local; the server learns about it
    /// only once the first message is sent.
    pub fn new_chat(&self) {
        self.set_active_chat.set(None);
        self.set_messages.set(Vec::new());
    }

    /// Delete a conversation server-side, then refresh the summary list.
    /// Deleting the active conversation also clears the local view.
    pub fn delete_chat(&self, id: String) {
        let state = self.clone();
        spawn_local(async move {
            match api::delete_chat(&id).await {
                Ok(()) => {
                    state.load_chats();
                    if state.active_chat.get_untracked().as_deref() == Some(id.as_str()) {
                        state.set_active_chat.set(None);
                        state.set_messages.set(Vec::new());
                    }
                }
                Err(e) => log::error!("Failed to delete chat: {e}"),
            }
        });
    }

    /// Send a user message and stream the assistant's reply.
    ///
    /// The user message is appended optimistically and never reconciled with
    /// the server. `loading` covers only the window between issuing the
    /// request and the response being accepted; once the empty assistant
    /// placeholder is appended, streaming progress is visible in the
    /// placeholder itself. Each content fragment replaces the trailing
    /// message wholesale with the accumulated text and sources seen so far.
    pub fn send_message(&self, text: String) {
        let state = self.clone();
        let chat_id = self.active_chat.get_untracked();
        let had_active = chat_id.is_some();

        self.set_messages.update(|msgs| {
            msgs.push(Message {
                role: Role::User,
                content: text.clone(),
                timestamp: now_iso(),
                rag_sources: None,
            })
        });
        self.set_loading.set(true);

        spawn_local(async move {
            let set_messages = state.set_messages;
            let set_loading = state.set_loading;
            let set_active_chat = state.set_active_chat;

            let on_accept = move || {
                set_messages.update(|msgs| {
                    msgs.push(Message {
                        role: Role::Assistant,
                        content: String::new(),
                        timestamp: now_iso(),
                        rag_sources: None,
                    })
                });
                set_loading.set(false);
            };

            let on_event = move |snapshot: &StreamState, text_changed: bool| {
                // Adopt the server-assigned id only when this exchange
                // started without an active conversation.
                if !had_active {
                    if let Some(id) = &snapshot.chat_id {
                        set_active_chat.set(Some(id.clone()));
                    }
                }
                if text_changed {
                    let replacement = Message {
                        role: Role::Assistant,
                        content: snapshot.content.clone(),
                        timestamp: now_iso(),
                        rag_sources: snapshot.sources.clone(),
                    };
                    set_messages.update(|msgs| {
                        if let Some(last) = msgs.last_mut() {
                            *last = replacement;
                        }
                    });
                }
            };

            match api::send_chat_stream(&text, chat_id.as_deref(), on_accept, on_event).await {
                Ok(final_state) => {
                    // Sources can arrive after the last content fragment;
                    // make sure the rendered message carries them.
                    if let Some(sources) = final_state.sources {
                        set_messages.update(|msgs| {
                            if let Some(last) = msgs.last_mut() {
                                last.rag_sources = Some(sources);
                            }
                        });
                    }
                }
                Err(e) => {
                    log::error!("Failed to send message: {e}");
                    set_loading.set(false);
                    set_messages.update(|msgs| {
                        msgs.push(Message {
                            role: Role::Assistant,
                            content: APOLOGY.to_string(),
                            timestamp: now_iso(),
                            rag_sources: None,
                        })
                    });
                }
            }

            // Refresh the sidebar whether the stream succeeded or failed so
            // new conversations and message counts show up.
            state.load_chats();
        });
    }
}
