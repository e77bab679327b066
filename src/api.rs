use gloo_net::http::Request;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{ReadableStreamDefaultReader, RequestInit, Response};

use crate::models::{ChatHistory, ChatList, ChatRequest, ChatSummary, Message};
use crate::stream::{SseParser, StreamState};

/// Base URL of the backend API server.
const API_BASE: &str = "http://localhost:8000";

/// Fetches the list of all conversation summaries.
pub async fn fetch_chats() -> Result<Vec<ChatSummary>, String> {
    let resp = Request::get(&format!("{API_BASE}/api/chats"))
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;

    if !resp.ok() {
        return Err(format!("Server error: {}", resp.status()));
    }

    resp.json::<ChatList>()
        .await
        .map(|list| list.chats)
        .map_err(|e| format!("Parse error: {e}"))
}

/// Fetches the full message history of one conversation.
pub async fn fetch_messages(chat_id: &str) -> Result<Vec<Message>, String> {
    let resp = Request::get(&format!("{API_BASE}/api/chats/{chat_id}"))
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;

    if !resp.ok() {
        return Err(format!("Server error: {}", resp.status()));
    }

    resp.json::<ChatHistory>()
        .await
        .map(|history| history.messages)
        .map_err(|e| format!("Parse error: {e}"))
}

/// Requests server-side removal of a conversation. The response body is
/// unused.
pub async fn delete_chat(chat_id: &str) -> Result<(), String> {
    let resp = Request::delete(&format!("{API_BASE}/api/chats/{chat_id}"))
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;

    if !resp.ok() {
        return Err(format!("Server error: {}", resp.status()));
    }
    Ok(())
}

/// Issues the streaming chat POST and drives the read loop.
///
/// `on_accept` fires once the response headers are accepted, before any
/// body chunk arrives. `on_event` fires after each decoded stream event;
/// its second argument is `true` when the accumulated assistant text
/// changed. Returns the final accumulated state once the stream closes.
///
/// gloo-net has no incremental body access, so this drops to raw
/// `web-sys` fetch and reads the body's `ReadableStream` directly.
pub async fn send_chat_stream(
    message: &str,
    chat_id: Option<&str>,
    mut on_accept: impl FnMut(),
    mut on_event: impl FnMut(&StreamState, bool),
) -> Result<StreamState, String> {
    let body = ChatRequest {
        message: message.to_string(),
        chat_id: chat_id.map(|s| s.to_string()),
    };
    let body_json = serde_json::to_string(&body).map_err(|e| format!("Serialize error: {e}"))?;

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(&JsValue::from_str(&body_json));

    let request = web_sys::Request::new_with_str_and_init(&format!("{API_BASE}/api/chat"), &init)
        .map_err(|e| format!("Request error: {e:?}"))?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .map_err(|e| format!("Request error: {e:?}"))?;

    let window = web_sys::window().ok_or_else(|| "No window object".to_string())?;
    let resp: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| format!("Network error: {e:?}"))?
        .dyn_into()
        .map_err(|_| "Fetch did not return a Response".to_string())?;

    if !resp.ok() {
        return Err(format!("Server error: {}", resp.status()));
    }
    on_accept();

    let body = resp
        .body()
        .ok_or_else(|| "Response has no body".to_string())?;
    let reader: ReadableStreamDefaultReader = body
        .get_reader()
        .dyn_into()
        .map_err(|_| "Body reader unavailable".to_string())?;

    let mut parser = SseParser::new();
    let mut state = StreamState::default();

    loop {
        let result = JsFuture::from(reader.read())
            .await
            .map_err(|e| format!("Stream error: {e:?}"))?;
        let done = js_sys::Reflect::get(&result, &JsValue::from_str("done"))
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        if done {
            break;
        }
        let value = js_sys::Reflect::get(&result, &JsValue::from_str("value"))
            .map_err(|e| format!("Stream error: {e:?}"))?;
        let chunk = js_sys::Uint8Array::new(&value).to_vec();

        for event in parser.push_chunk(&chunk) {
            let text_changed = state.apply(event);
            on_event(&state, text_changed);
        }
    }

    Ok(state)
}
