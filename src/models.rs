use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// History entry as accepted on the wire.
///
/// Callers send either plain turns or prompt-flow style exchanges
/// (`{"inputs": {"chat_input": ..}, "outputs": {"reply": ..}}`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HistoryEntry {
    Turn(Turn),
    Exchange {
        inputs: ExchangeInputs,
        outputs: ExchangeOutputs,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInputs {
    pub chat_input: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeOutputs {
    pub reply: String,
}

/// Ordered, append-only list of turns (most recent last)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<HistoryEntry>")]
pub struct Conversation(Vec<Turn>);

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.0.push(turn);
    }

    /// Append a user question and the assistant's reply to it
    pub fn push_exchange(&mut self, question: impl Into<String>, reply: impl Into<String>) {
        self.0.push(Turn::user(question));
        self.0.push(Turn::assistant(reply));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.0.iter()
    }

    /// Render as `role: content` lines for prompt templates
    #[must_use]
    pub fn transcript(&self) -> String {
        self.0
            .iter()
            .map(|turn| format!("{}: {}", turn.role, turn.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<Turn>> for Conversation {
    fn from(turns: Vec<Turn>) -> Self {
        Self(turns)
    }
}

impl From<Vec<HistoryEntry>> for Conversation {
    fn from(entries: Vec<HistoryEntry>) -> Self {
        let mut conversation = Self::new();
        for entry in entries {
            match entry {
                HistoryEntry::Turn(turn) => conversation.push(turn),
                HistoryEntry::Exchange { inputs, outputs } => {
                    conversation.push_exchange(inputs.chat_input, outputs.reply);
                }
            }
        }
        conversation
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A document chunk returned by the search index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub id: String,
    pub content: String,
}

impl RetrievedPassage {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// Ranked passages, most relevant first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetrievalResult(Vec<RetrievedPassage>);

impl RetrievalResult {
    /// Keep the given order and drop anything past `limit`
    #[must_use]
    pub fn from_ranked(mut passages: Vec<RetrievedPassage>, limit: usize) -> Self {
        passages.truncate(limit);
        Self(passages)
    }

    pub fn passages(&self) -> &[RetrievedPassage] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RetrievedPassage> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a RetrievalResult {
    type Item = &'a RetrievedPassage;
    type IntoIter = std::slice::Iter<'a, RetrievedPassage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Pipeline input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub chat_input: String,
    #[serde(default)]
    pub chat_history: Conversation,
}

impl ChatRequest {
    pub fn new(chat_input: impl Into<String>) -> Self {
        Self {
            chat_input: chat_input.into(),
            chat_history: Conversation::new(),
        }
    }

    #[must_use]
    pub fn with_history(mut self, history: Conversation) -> Self {
        self.chat_history = history;
        self
    }
}

/// Complete reply together with the passages it was grounded on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub context: RetrievalResult,
}
