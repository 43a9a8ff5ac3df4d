//! OpenAI compatible chat completions client (streaming only)

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use super::{ChatMessage, TextGenerator, TextStream};
use crate::config::{LlmConfig, require_api_key};
use crate::sources::http;
use crate::{Result, TripPlannerError};

const SERVICE: &str = "OpenAI";

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(client: Client, api_key: String, base_url: &str, model: &str) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn from_config(client: Client, config: &LlmConfig) -> Result<Self> {
        let api_key = require_api_key(config.api_key.as_deref(), "OPENAI_API_KEY", SERVICE)?;
        Ok(Self::new(client, api_key, &config.base_url, &config.model))
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    async fn stream(&self, messages: Vec<ChatMessage>) -> Result<TextStream> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!("Opening completion stream at {}", url);

        let request = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": messages,
                "stream": true,
            }));
        let response = http::send(SERVICE, request).await?;

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()))
            .boxed();
        Ok(fragments(bytes))
    }
}

/// One meaningful line of an SSE body
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    Data(String),
    Done,
}

/// Splits an SSE byte stream into lines. Bytes are buffered until a full line
/// is present, so a multi-byte character cut by the network is never mangled.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseLine> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            if let Some(parsed) = parse_line(&line) {
                lines.push(parsed);
            }
        }
        lines
    }

    /// Whatever is left once the body ends without a trailing newline
    pub fn finish(&mut self) -> Option<SseLine> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }
}

fn parse_line(raw: &[u8]) -> Option<SseLine> {
    let line = String::from_utf8_lossy(raw);
    let data = line.trim().strip_prefix("data:")?.trim_start();
    if data == "[DONE]" {
        Some(SseLine::Done)
    } else {
        Some(SseLine::Data(data.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    message: String,
}

/// Text carried by one `data:` payload, if any
fn delta_text(payload: &str) -> Result<Option<String>> {
    let chunk: StreamChunk = serde_json::from_str(payload)
        .map_err(|e| TripPlannerError::generation(format!("Malformed stream chunk: {e}")))?;
    if let Some(error) = chunk.error {
        return Err(TripPlannerError::generation(error.message));
    }
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|text| !text.is_empty()))
}

struct FragmentState {
    bytes: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String>>,
    finished: bool,
}

impl FragmentState {
    /// Queue the fragments in `lines`; stops at `[DONE]` or the first error
    fn queue(&mut self, lines: Vec<SseLine>) {
        for line in lines {
            match line {
                SseLine::Done => {
                    self.finished = true;
                    return;
                }
                SseLine::Data(payload) => match delta_text(&payload) {
                    Ok(Some(text)) => self.pending.push_back(Ok(text)),
                    Ok(None) => {}
                    Err(e) => {
                        self.pending.push_back(Err(e));
                        self.finished = true;
                        return;
                    }
                },
            }
        }
    }
}

/// Turn a raw SSE body into a stream of text fragments
pub fn fragments(bytes: BoxStream<'static, reqwest::Result<Vec<u8>>>) -> TextStream {
    let state = FragmentState {
        bytes,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(next) = state.pending.pop_front() {
                return Some((next, state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let lines = state.decoder.feed(&chunk);
                    state.queue(lines);
                }
                Some(Err(e)) => {
                    state.pending.push_back(Err(TripPlannerError::from_reqwest(SERVICE, e)));
                    state.finished = true;
                }
                None => {
                    let rest: Vec<SseLine> = state.decoder.finish().into_iter().collect();
                    state.queue(rest);
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}
