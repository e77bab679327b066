use serde::Deserialize;

use crate::models::RagSource;

/// Payload of one `data:` line of the streamed chat response. All fields
/// are optional; the server mixes them freely across events.
#[derive(Clone, Debug, Deserialize)]
pub struct StreamEvent {
    pub content: Option<String>,
    pub sources: Option<Vec<RagSource>>,
    pub chat_id: Option<String>,
}

/// Incremental line-buffered parser for the `POST /api/chat` response body.
///
/// Raw byte chunks go in, complete events come out. Bytes after the last
/// newline stay buffered until a later chunk completes the line, so a
/// `data:` line (or a multi-byte UTF-8 sequence inside one) split across
/// chunk boundaries is reassembled before parsing.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns every event completed by it, in order.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            if let Some(event) = parse_line(&line) {
                events.push(event);
            }
        }
        events
    }
}

/// Recognizes a `data:`-prefixed line and decodes its JSON payload.
/// Anything else, including malformed JSON, is skipped silently.
fn parse_line(line: &str) -> Option<StreamEvent> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }
    serde_json::from_str(payload).ok()
}

/// Accumulated view of the stream so far, folded from events.
#[derive(Clone, Debug, Default)]
pub struct StreamState {
    pub content: String,
    pub sources: Option<Vec<RagSource>>,
    pub chat_id: Option<String>,
}

impl StreamState {
    /// Folds one event in. Returns `true` if the visible assistant text
    /// changed, which is the caller's cue to re-render the trailing message.
    pub fn apply(&mut self, event: StreamEvent) -> bool {
        let mut text_changed = false;
        if let Some(fragment) = event.content {
            self.content.push_str(&fragment);
            text_changed = true;
        }
        if let Some(sources) = event.sources {
            self.sources = Some(sources);
        }
        if let Some(id) = event.chat_id {
            if self.chat_id.is_none() {
                self.chat_id = Some(id);
            }
        }
        text_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(chunks: &[&str]) -> StreamState {
        let mut parser = SseParser::new();
        let mut state = StreamState::default();
        for chunk in chunks {
            for event in parser.push_chunk(chunk.as_bytes()) {
                state.apply(event);
            }
        }
        state
    }

    #[test]
    fn single_complete_line() {
        let state = run(&["data: {\"content\":\"Hello\"}\n"]);
        assert_eq!(state.content, "Hello");
        assert_eq!(state.sources, None);
        assert_eq!(state.chat_id, None);
    }

    #[test]
    fn line_split_across_chunks() {
        let state = run(&["data: {\"cont", "ent\":\"Hello\"}", "\n"]);
        assert_eq!(state.content, "Hello");
    }

    #[test]
    fn content_concatenates_in_arrival_order() {
        let state = run(&[
            "data: {\"content\":\"one \"}\ndata: {\"content\":\"two \"}\n",
            "data: {\"content\":\"three\"}\n",
        ]);
        assert_eq!(state.content, "one two three");
    }

    #[test]
    fn final_content_independent_of_chunk_boundaries() {
        let full = "data: {\"content\":\"Kirstenbosch \"}\ndata: {\"content\":\"gardens\"}\n";
        let whole = run(&[full]);
        for split in 1..full.len() {
            let state = run(&[&full[..split], &full[split..]]);
            assert_eq!(state.content, whole.content);
        }
    }

    #[test]
    fn partial_multibyte_sequence_survives_chunk_boundary() {
        let line = "data: {\"content\":\"caf\u{e9}\"}\n".as_bytes();
        // Split inside the two-byte encoding of 'é'.
        let split = line.len() - 4;
        let mut parser = SseParser::new();
        let mut state = StreamState::default();
        for chunk in [&line[..split], &line[split..]] {
            for event in parser.push_chunk(chunk) {
                state.apply(event);
            }
        }
        assert_eq!(state.content, "caf\u{e9}");
    }

    #[test]
    fn non_data_lines_ignored() {
        let state = run(&["event: ping\n", ": keepalive\n", "data: {\"content\":\"ok\"}\n"]);
        assert_eq!(state.content, "ok");
    }

    #[test]
    fn malformed_json_skipped_silently() {
        let state = run(&[
            "data: {not json}\n",
            "data:\n",
            "data: {\"content\":\"still here\"}\n",
        ]);
        assert_eq!(state.content, "still here");
    }

    #[test]
    fn sources_replace_wholesale() {
        let state = run(&[
            "data: {\"sources\":[{\"score\":0.2,\"text\":\"old\"}]}\n",
            "data: {\"sources\":[{\"score\":0.8,\"text\":\"new\"}]}\n",
        ]);
        assert_eq!(
            state.sources,
            Some(vec![RagSource {
                score: 0.8,
                text: "new".to_string(),
            }])
        );
    }

    #[test]
    fn sources_after_last_content_are_recorded() {
        let state = run(&[
            "data: {\"content\":\"answer\"}\n",
            "data: {\"sources\":[{\"score\":0.9,\"text\":\"excerpt\"}]}\n",
        ]);
        assert_eq!(state.content, "answer");
        assert!(state.sources.is_some());
    }

    #[test]
    fn missing_chat_id_stays_unset() {
        let state = run(&["data: {\"content\":\"no id here\"}\n"]);
        assert_eq!(state.chat_id, None);
    }

    #[test]
    fn sources_only_event_does_not_change_text() {
        let mut parser = SseParser::new();
        let mut state = StreamState::default();
        let events = parser.push_chunk(b"data: {\"sources\":[{\"score\":0.5,\"text\":\"x\"}]}\n");
        assert_eq!(events.len(), 1);
        assert!(!state.apply(events.into_iter().next().unwrap()));
    }

    #[test]
    fn worked_example_from_table_mountain() {
        let state = run(&[
            "data: {\"content\":\"Tab",
            "le \"}\n",
            "data: {\"content\":\"Mountain\"}\n",
            "data: {\"sources\":[{\"score\":0.9,\"text\":\"...\"}],\"chat_id\":\"c1\"}\n",
        ]);
        assert_eq!(state.content, "Table Mountain");
        assert_eq!(state.sources.as_ref().map(Vec::len), Some(1));
        assert_eq!(state.chat_id.as_deref(), Some("c1"));
    }
}
