//! Streaming response handling
//!
//! Chat streams arrive as server-sent events, one `data: {json}` line per delta and a final
//! `data: [DONE]`. Fragments are decoded lazily: nothing is parsed until the consumer polls, so
//! at most one decoded fragment is ever waiting to be delivered. Dropping a [`ReplyStream`]
//! drops the underlying body, which closes the upstream connection.

use std::fmt::Display;
use std::pin::Pin;
use std::task::Context;
use std::task::Poll;

use futures::Stream;
use futures::StreamExt;
use serde::Deserialize;

use crate::errors::CopilotError;
use crate::errors::Result;

pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Lazy, single-pass sequence of reply fragments
pub struct ReplyStream {
    stream: FragmentStream,
}

impl ReplyStream {
    pub fn new(stream: FragmentStream) -> Self {
        Self { stream }
    }

    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<String>> + Send + 'static,
    {
        Self::new(Box::pin(stream))
    }

    /// Stream that yields the given fragments in order
    pub fn from_fragments<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = String>,
        I::IntoIter: Send + 'static,
    {
        Self::from_stream(futures::stream::iter(fragments.into_iter().map(Ok)))
    }

    /// Apply `f` to every error item
    #[must_use]
    pub fn map_errors<F>(self, f: F) -> Self
    where
        F: Fn(CopilotError) -> CopilotError + Send + 'static,
    {
        Self::from_stream(self.stream.map(move |item| item.map_err(&f)))
    }

    /// Collect all chunks into a single string
    pub async fn collect_all(mut self) -> Result<String> {
        let mut result = String::new();
        while let Some(chunk) = self.stream.next().await {
            result.push_str(&chunk?);
        }
        Ok(result)
    }
}

impl Stream for ReplyStream {
    type Item = Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().stream.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for ReplyStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyStream").finish_non_exhaustive()
    }
}

/// Line-oriented decoder for `text/event-stream` bodies
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Pop the next complete line, without its terminator
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buffer.drain(..=pos).collect();
        Some(
            String::from_utf8_lossy(&line)
                .trim_end_matches(['\r', '\n'])
                .to_string(),
        )
    }

    /// Pop the payload of the next complete `data:` line, skipping comments and other fields
    pub fn next_data(&mut self) -> Option<String> {
        while let Some(line) = self.next_line() {
            if let Some(data) = line.strip_prefix("data:") {
                return Some(data.trim_start().to_string());
            }
        }
        None
    }

    /// Terminate a trailing line that arrived without a newline
    pub fn finish(&mut self) {
        if !self.buffer.is_empty() {
            self.buffer.push(b'\n');
        }
    }
}

struct LineState<S> {
    body: Pin<Box<S>>,
    decoder: SseDecoder,
    body_done: bool,
}

/// Decode an event-stream body into its non-empty raw lines, as they arrive
pub fn sse_lines<S, B, E>(body: S) -> impl Stream<Item = Result<String>> + Send + 'static
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = LineState {
        body: Box::pin(body),
        decoder: SseDecoder::new(),
        body_done: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            while let Some(line) = st.decoder.next_line() {
                if !line.is_empty() {
                    return Some((Ok(line), st));
                }
            }

            if st.body_done {
                return None;
            }

            match st.body.next().await {
                Some(Ok(bytes)) => st.decoder.push(bytes.as_ref()),
                Some(Err(e)) => {
                    st.body_done = true;
                    st.decoder = SseDecoder::new();
                    return Some((Err(CopilotError::StreamingError(e.to_string())), st));
                }
                None => {
                    st.decoder.finish();
                    st.body_done = true;
                }
            }
        }
    })
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    content: Option<String>,
}

/// Extract the text delta of one chat-completion chunk, if it carries any
fn parse_delta(data: &str) -> Result<Option<String>> {
    let chunk: ChatChunk = serde_json::from_str(data)
        .map_err(|e| CopilotError::StreamingError(format!("malformed chunk: {e}")))?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

struct DeltaState<S> {
    body: Pin<Box<S>>,
    decoder: SseDecoder,
    body_done: bool,
    finished: bool,
}

/// Decode a chat-completion SSE body into reply fragments
pub fn chat_deltas<S, B, E>(body: S) -> ReplyStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = DeltaState {
        body: Box::pin(body),
        decoder: SseDecoder::new(),
        body_done: false,
        finished: false,
    };

    ReplyStream::from_stream(futures::stream::unfold(state, |mut st| async move {
        if st.finished {
            return None;
        }
        loop {
            while let Some(data) = st.decoder.next_data() {
                if data == "[DONE]" {
                    return None;
                }
                match parse_delta(&data) {
                    Ok(Some(fragment)) => return Some((Ok(fragment), st)),
                    Ok(None) => {}
                    Err(e) => {
                        st.finished = true;
                        return Some((Err(e), st));
                    }
                }
            }

            if st.body_done {
                return None;
            }

            match st.body.next().await {
                Some(Ok(bytes)) => st.decoder.push(bytes.as_ref()),
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(CopilotError::StreamingError(e.to_string())), st));
                }
                None => {
                    st.decoder.finish();
                    st.body_done = true;
                }
            }
        }
    }))
}
