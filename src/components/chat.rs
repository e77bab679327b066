use gloo_timers::callback::Timeout;
use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use web_sys::{ScrollBehavior, ScrollIntoViewOptions};

use crate::models::Message;
use crate::state::AppState;

/// Main chat window: message history, thinking indicator, and input form.
#[component]
pub fn ChatWindow() -> impl IntoView {
    let state = expect_context::<AppState>();

    let bottom_anchor = NodeRef::<html::Div>::new();

    // Scroll to the newest content whenever the message list changes. The
    // zero-delay timeout defers the scroll until after the DOM is patched.
    Effect::new(move |_| {
        state.messages.track();
        Timeout::new(0, move || {
            if let Some(el) = bottom_anchor.get_untracked() {
                let opts = ScrollIntoViewOptions::new();
                opts.set_behavior(ScrollBehavior::Smooth);
                el.scroll_into_view_with_scroll_into_view_options(&opts);
            }
        })
        .forget();
    });

    view! {
        <div class="chat-window">
            <div class="messages-container">
                {move || {
                    let msgs = state.messages.get();
                    if msgs.is_empty() {
                        view! { <WelcomePanel /> }.into_any()
                    } else {
                        msgs.into_iter()
                            .map(|msg| view! { <MessageBubble msg=msg /> })
                            .collect_view()
                            .into_any()
                    }
                }}
                {move || {
                    state.loading.get().then(|| view! {
                        <div class="message assistant">
                            <div class="message-content">
                                <span class="typing-indicator">"Thinking..."</span>
                            </div>
                        </div>
                    })
                }}
                <div node_ref=bottom_anchor></div>
            </div>
            <ChatInput />
        </div>
    }
}

/// Shown in place of the history while no conversation has any messages.
#[component]
fn WelcomePanel() -> impl IntoView {
    view! {
        <div class="welcome-message">
            <h2>"Welcome to Cape Town Chat"</h2>
            <p>"Ask me anything about Cape Town and the Western Cape!"</p>
            <p>"Try questions like:"</p>
            <ul>
                <li>"\"What are the best wine regions near Cape Town?\""</li>
                <li>"\"Tell me about Table Mountain\""</li>
                <li>"\"What is there to do in the Garden Route?\""</li>
            </ul>
        </div>
    }
}

/// A single chat message with its role label and any retrieval sources.
#[component]
fn MessageBubble(msg: Message) -> impl IntoView {
    let css_class = format!("message {}", msg.role.css_class());

    let sources = msg
        .rag_sources
        .clone()
        .filter(|sources| !sources.is_empty());

    view! {
        <div class=css_class>
            <div class="message-content">
                <span class="message-role">{msg.role.label()}</span>
                <p>{msg.content.clone()}</p>
                {sources.map(|sources| view! {
                    <div class="rag-sources">
                        <span class="sources-label">"Sources used:"</span>
                        {sources.iter().map(|source| view! {
                            <div class="source-item">
                                <span class="source-score">
                                    {format!("{:.0}% match", source.score * 100.0)}
                                </span>
                                <span class="source-text">{excerpt(&source.text)}</span>
                            </div>
                        }).collect_view()}
                    </div>
                })}
            </div>
        </div>
    }
}

/// First 150 characters of a source text, ellipsized.
fn excerpt(text: &str) -> String {
    let mut short: String = text.chars().take(150).collect();
    short.push_str("...");
    short
}

/// Input form. Empty or whitespace-only input never submits, and neither
/// does anything while a request is waiting to be accepted. The field is
/// cleared as soon as the text is handed off.
#[component]
fn ChatInput() -> impl IntoView {
    let state = expect_context::<AppState>();
    let (input, set_input) = signal(String::new());

    let loading = state.loading;

    let on_submit = {
        let state = state.clone();
        move |ev: ev::SubmitEvent| {
            ev.prevent_default();
            let text = input.get_untracked().trim().to_string();
            if text.is_empty() || loading.get_untracked() {
                return;
            }
            set_input.set(String::new());
            state.send_message(text);
        }
    };

    view! {
        <form class="input-form" on:submit=on_submit>
            <input
                type="text"
                prop:value=input
                placeholder="Ask about Cape Town..."
                on:input=move |ev| {
                    set_input.set(event_target_value(&ev));
                }
                disabled=move || loading.get()
            />
            <button
                type="submit"
                disabled=move || loading.get() || input.get().trim().is_empty()
            >
                "Send"
            </button>
        </form>
    }
}
