use leptos::ev;
use leptos::prelude::*;

use crate::state::AppState;

/// Sidebar showing the conversation list and a "New Chat" button.
#[component]
pub fn Sidebar() -> impl IntoView {
    let state = expect_context::<AppState>();

    let on_new = {
        let state = state.clone();
        move |_| state.new_chat()
    };

    view! {
        <aside class="sidebar">
            <div class="sidebar-header">
                <h2>"Cape Town Chat"</h2>
                <button class="new-chat-btn" on:click=on_new>
                    "+ New Chat"
                </button>
            </div>
            <div class="chat-list">
                {move || {
                    let chats = state.chats.get();
                    if chats.is_empty() {
                        view! {
                            <p class="no-chats">"No conversations yet"</p>
                        }.into_any()
                    } else {
                        let state = state.clone();
                        view! {
                            <For
                                each=move || state.chats.get()
                                key=|c| (c.id.clone(), c.message_count)
                                let:chat
                            >
                                {
                                    let state = state.clone();
                                    let id = chat.id.clone();
                                    let id_active = id.clone();
                                    let id_click = id.clone();
                                    let on_delete = {
                                        let state = state.clone();
                                        move |ev: ev::MouseEvent| {
                                            // Keep the click from also selecting the chat.
                                            ev.stop_propagation();
                                            state.delete_chat(id.clone());
                                        }
                                    };
                                    view! {
                                        <div
                                            class="chat-item"
                                            class:active=move || {
                                                state.active_chat.get().as_deref()
                                                    == Some(id_active.as_str())
                                            }
                                            on:click=move |_| {
                                                state.select_chat(id_click.clone());
                                            }
                                        >
                                            <div class="chat-item-content">
                                                <span class="chat-title">{chat.title.clone()}</span>
                                                <span class="chat-meta">
                                                    {format!("{} messages", chat.message_count)}
                                                </span>
                                            </div>
                                            <button class="delete-btn" on:click=on_delete>
                                                "x"
                                            </button>
                                        </div>
                                    }
                                }
                            </For>
                        }.into_any()
                    }
                }}
            </div>
            <div class="sidebar-footer">
                <p>"Powered by RAG"</p>
            </div>
        </aside>
    }
}
