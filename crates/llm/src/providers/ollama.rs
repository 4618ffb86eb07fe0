use std::collections::VecDeque;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::provider::{ChatProvider, LlmError, Message, TokenStream};

pub struct OllamaProvider {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(url: String, model: String) -> Self {
        Self::with_client(reqwest::Client::new(), url, model)
    }

    pub fn with_client(client: reqwest::Client, url: String, model: String) -> Self {
        Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, messages: &[Message], stream: bool) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": messages,
            "stream": stream,
        })
    }

    async fn send(&self, messages: &[Message], stream: bool) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}/api/chat", self.url);
        debug!(model = %self.model, stream, "Ollama request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(messages, stream))
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }
        Ok(response)
    }
}

#[async_trait]
impl ChatProvider for OllamaProvider {
    async fn complete(&self, messages: Vec<Message>) -> Result<String, LlmError> {
        let resp: serde_json::Value = self.send(&messages, false).await?.json().await?;
        let content = resp["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError("missing message.content".into()))?
            .to_string();
        Ok(content)
    }

    async fn stream(&self, messages: Vec<Message>) -> Result<TokenStream, LlmError> {
        let response = self.send(&messages, true).await?;
        Ok(delta_stream(response.bytes_stream()))
    }
}

// ── NDJSON streaming ────────────────────────────────────────────────

/// One line of a streaming `/api/chat` response.
#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

/// What one decoded line means for the consumer.
#[derive(Debug, PartialEq)]
enum LineEvent {
    Delta(String),
    Done,
}

/// Splits a byte stream into newline-delimited JSON lines. Bytes are buffered
/// until a newline so multi-byte characters split across reads stay intact.
#[derive(Default)]
struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    fn push(&mut self, chunk: &[u8]) -> Vec<Result<LineEvent, LlmError>> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Whatever is left once the body ends (a final line without a newline).
    fn finish(&mut self) -> Option<Result<LineEvent, LlmError>> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }
}

fn parse_line(line: &[u8]) -> Option<Result<LineEvent, LlmError>> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let chunk: ChatChunk = match serde_json::from_str(text) {
        Ok(chunk) => chunk,
        Err(e) => return Some(Err(LlmError::ParseError(format!("{e}: {text}")))),
    };
    if let Some(error) = chunk.error {
        return Some(Err(LlmError::ModelError(error)));
    }
    if chunk.done {
        return Some(Ok(LineEvent::Done));
    }
    let content = chunk.message.map(|m| m.content).unwrap_or_default();
    Some(Ok(LineEvent::Delta(content)))
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

struct StreamState {
    bytes: ByteStream,
    decoder: NdjsonDecoder,
    pending: VecDeque<Result<LineEvent, LlmError>>,
    finished: bool,
}

/// Turn a streaming response body into a stream of non-empty content deltas.
/// The stream ends at the `done` line, at the end of the body, or after the first error.
fn delta_stream<S>(bytes: S) -> TokenStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    let state = StreamState {
        bytes: Box::pin(bytes),
        decoder: NdjsonDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    let deltas = stream::unfold(state, |mut state| async move {
        loop {
            if state.finished {
                return None;
            }

            if let Some(event) = state.pending.pop_front() {
                match event {
                    Ok(LineEvent::Delta(text)) if text.is_empty() => continue,
                    Ok(LineEvent::Delta(text)) => return Some((Ok(text), state)),
                    Ok(LineEvent::Done) => {
                        state.finished = true;
                        return None;
                    }
                    Err(e) => {
                        state.finished = true;
                        return Some((Err(e), state));
                    }
                }
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => state.pending.extend(state.decoder.push(&chunk)),
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(LlmError::HttpError(e)), state));
                }
                None => match state.decoder.finish() {
                    Some(event) => state.pending.push_back(event),
                    None => return None,
                },
            }
        }
    });

    Box::pin(deltas)
}
