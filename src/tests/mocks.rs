//! In-process capability mocks that record every call

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::embeddings::EmbeddingModel;
use crate::errors::CopilotError;
use crate::errors::Result;
use crate::llm::ChatModel;
use crate::llm::ChatParams;
use crate::llm::CompletionModel;
use crate::llm::PromptTemplate;
use crate::llm::ReplyStream;
use crate::models::RetrievedPassage;
use crate::models::Turn;
use crate::search::VectorSearch;

/// Error a real client would produce for this HTTP status
pub fn upstream_error(service: &str, status: u16) -> CopilotError {
    if status == 429 {
        CopilotError::UpstreamRateLimited {
            service: service.to_string(),
            retry_after: None,
        }
    } else {
        CopilotError::Upstream {
            service: service.to_string(),
            status,
            message: "mock failure".to_string(),
        }
    }
}

pub struct MockCompletion {
    output: String,
    fail_status: Option<u16>,
    pub calls: Mutex<Vec<(String, HashMap<String, String>, u32)>>,
}

impl MockCompletion {
    pub fn returning(output: &str) -> Self {
        Self {
            output: output.to_string(),
            fail_status: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::returning("")
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionModel for MockCompletion {
    async fn complete(
        &self,
        template: &PromptTemplate,
        variables: &HashMap<String, String>,
        max_tokens: u32,
    ) -> Result<String> {
        self.calls.lock().unwrap().push((
            template.render(variables),
            variables.clone(),
            max_tokens,
        ));
        match self.fail_status {
            Some(status) => Err(upstream_error("chat", status)),
            None => Ok(self.output.clone()),
        }
    }
}

pub struct MockEmbedder {
    dimension: usize,
    fail_status: Option<u16>,
    pub calls: Mutex<Vec<String>>,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail_status: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::new(4)
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingModel for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.lock().unwrap().push(text.to_string());
        match self.fail_status {
            Some(status) => Err(upstream_error("embeddings", status)),
            None => Ok(vec![text.len() as f32; self.dimension]),
        }
    }
}

/// Returns every configured hit regardless of `k`
pub struct MockSearch {
    hits: Vec<RetrievedPassage>,
    fail_status: Option<u16>,
    pub calls: Mutex<Vec<(Vec<f32>, usize, Vec<String>)>>,
}

impl MockSearch {
    pub fn returning(hits: Vec<RetrievedPassage>) -> Self {
        Self {
            hits,
            fail_status: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::returning(Vec::new())
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl VectorSearch for MockSearch {
    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        fields: &[&str],
    ) -> Result<Vec<RetrievedPassage>> {
        self.calls.lock().unwrap().push((
            vector.to_vec(),
            k,
            fields.iter().map(ToString::to_string).collect(),
        ));
        match self.fail_status {
            Some(status) => Err(upstream_error("search", status)),
            None => Ok(self.hits.clone()),
        }
    }
}

pub struct MockChat {
    fragments: Vec<String>,
    fail_status: Option<u16>,
    fail_mid_stream: bool,
    pub calls: Mutex<Vec<(Vec<Turn>, ChatParams)>>,
}

impl MockChat {
    pub fn returning(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(ToString::to_string).collect(),
            fail_status: None,
            fail_mid_stream: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::returning(&[])
        }
    }

    /// Streams the first fragment, then breaks
    pub fn breaking_mid_stream(fragments: &[&str]) -> Self {
        Self {
            fail_mid_stream: true,
            ..Self::returning(fragments)
        }
    }

    pub fn last_messages(&self) -> Vec<Turn> {
        self.calls
            .lock()
            .unwrap()
            .last()
            .map(|(messages, _)| messages.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, messages: &[Turn], params: ChatParams) -> Result<()> {
        self.calls.lock().unwrap().push((messages.to_vec(), params));
        match self.fail_status {
            Some(status) => Err(upstream_error("chat", status)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChatModel for MockChat {
    async fn chat(&self, messages: &[Turn], params: ChatParams) -> Result<String> {
        self.record(messages, params)?;
        Ok(self.fragments.concat())
    }

    async fn chat_stream(&self, messages: &[Turn], params: ChatParams) -> Result<ReplyStream> {
        self.record(messages, params)?;
        if self.fail_mid_stream {
            let mut items: Vec<Result<String>> =
                self.fragments.iter().take(1).cloned().map(Ok).collect();
            items.push(Err(CopilotError::StreamingError(
                "connection reset".to_string(),
            )));
            return Ok(ReplyStream::from_stream(futures::stream::iter(items)));
        }
        Ok(ReplyStream::from_fragments(self.fragments.clone()))
    }
}
