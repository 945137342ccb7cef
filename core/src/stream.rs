use crate::error::ApiResult;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Events delivered to a [`ChatStream`] subscriber. `Done` and `Error` are
/// terminal: the connection is already closed when they arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Chunk(String),
    Done(String),
    Error(String),
}

/// A wire-level server-sent event, one `event:`/`data:` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub name: String,
    pub data: String,
}

/// Incremental SSE line parser. Chunks arrive at arbitrary byte boundaries,
/// so partial lines are buffered until a newline completes them.
#[derive(Default)]
pub struct SseParser {
    buffer: String,
    event_name: Option<String>,
    data_lines: Vec<String>,
}

impl SseParser {
    pub fn push(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.buffer.push_str(chunk);
        let mut events = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            let line = line.trim_end_matches(|c| c == '\n' || c == '\r');
            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    events.push(event);
                }
            } else if let Some(name) = line.strip_prefix("event:") {
                self.event_name = Some(name.trim_start().to_string());
            } else if let Some(data) = line.strip_prefix("data:") {
                self.data_lines.push(data.strip_prefix(' ').unwrap_or(data).to_string());
            }
            // Comments and fields we do not use (id:, retry:) fall through.
        }
        events
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.event_name.is_none() && self.data_lines.is_empty() {
            return None;
        }
        let name = self
            .event_name
            .take()
            .unwrap_or_else(|| "message".to_string());
        let data = std::mem::take(&mut self.data_lines).join("\n");
        Some(SseEvent { name, data })
    }
}

/// Map a wire event onto the subscriber vocabulary. `message` is the default
/// event name, so unnamed blocks are chunks too.
fn classify(event: SseEvent) -> StreamEvent {
    match event.name.as_str() {
        "error" => StreamEvent::Error(event.data),
        "end" => StreamEvent::Done(event.data),
        _ => StreamEvent::Chunk(event.data),
    }
}

/// One server-push chat reply: a single connection feeding an event channel.
/// Dropping the handle aborts the connection; a terminal event closes it
/// from the inside.
pub struct ChatStream {
    id: Uuid,
    events: mpsc::UnboundedReceiver<StreamEvent>,
    task: tokio::task::JoinHandle<()>,
}

impl ChatStream {
    /// Open `GET {base_url}/chat/stream?message=&token=`. The credential
    /// rides in the query string because the event-stream request carries no
    /// headers the caller controls.
    pub fn open(base_url: &str, message: &str, token: Option<&str>) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let request = client
            .get(format!("{}/chat/stream", base_url.trim_end_matches('/')))
            .query(&[("message", message), ("token", token.unwrap_or(""))]);

        let (tx, events) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_stream(request, tx));
        Ok(Self {
            id: Uuid::new_v4(),
            events,
            task,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next event, or `None` once a terminal event has been consumed.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    /// Early cancellation. Equivalent to dropping the handle.
    pub fn close(self) {}
}

impl Drop for ChatStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_stream(request: reqwest::RequestBuilder, tx: mpsc::UnboundedSender<StreamEvent>) {
    let response = match request.send().await {
        Ok(response) => response,
        Err(err) => {
            let _ = tx.send(StreamEvent::Error(err.to_string()));
            return;
        }
    };
    if !response.status().is_success() {
        let _ = tx.send(StreamEvent::Error(format!(
            "stream rejected with status {}",
            response.status().as_u16()
        )));
        return;
    }

    let mut body = response.bytes_stream();
    let mut parser = SseParser::default();
    while let Some(next) = body.next().await {
        let bytes = match next {
            Ok(bytes) => bytes,
            Err(err) => {
                let _ = tx.send(StreamEvent::Error(err.to_string()));
                return;
            }
        };
        for event in parser.push(&String::from_utf8_lossy(&bytes)) {
            let classified = classify(event);
            let terminal = !matches!(classified, StreamEvent::Chunk(_));
            let _ = tx.send(classified);
            if terminal {
                // Returning drops the response and closes the connection.
                return;
            }
        }
    }
    // The server hung up without an `end` event.
    let _ = tx.send(StreamEvent::Error("stream closed before completion".to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_events_split_across_chunks() {
        let mut parser = SseParser::default();
        assert!(parser.push("event: mess").is_empty());
        assert!(parser.push("age\ndata: hel").is_empty());
        let events = parser.push("lo\n\n");
        assert_eq!(
            events,
            vec![SseEvent {
                name: "message".to_string(),
                data: "hello".to_string(),
            }]
        );
    }

    #[test]
    fn unnamed_blocks_default_to_message() {
        let mut parser = SseParser::default();
        let events = parser.push("data: plain\n\n");
        assert_eq!(events[0].name, "message");
        assert_eq!(events[0].data, "plain");
    }

    #[test]
    fn joins_multiple_data_lines() {
        let mut parser = SseParser::default();
        let events = parser.push("data: first\ndata: second\n\n");
        assert_eq!(events[0].data, "first\nsecond");
    }

    #[test]
    fn crlf_lines_and_comments_are_tolerated() {
        let mut parser = SseParser::default();
        let events = parser.push(": keepalive\r\nevent: end\r\ndata: bye\r\n\r\n");
        assert_eq!(
            events,
            vec![SseEvent {
                name: "end".to_string(),
                data: "bye".to_string(),
            }]
        );
    }

    #[test]
    fn blank_line_without_fields_emits_nothing() {
        let mut parser = SseParser::default();
        assert!(parser.push("\n\n\n").is_empty());
    }

    #[test]
    fn classifies_the_three_event_names() {
        let chunk = classify(SseEvent {
            name: "message".into(),
            data: "a".into(),
        });
        assert_eq!(chunk, StreamEvent::Chunk("a".to_string()));
        let done = classify(SseEvent {
            name: "end".into(),
            data: "final".into(),
        });
        assert_eq!(done, StreamEvent::Done("final".to_string()));
        let error = classify(SseEvent {
            name: "error".into(),
            data: "boom".into(),
        });
        assert_eq!(error, StreamEvent::Error("boom".to_string()));
    }
}
