pub mod mocks;

use std::sync::Arc;

use crate::config::CopilotConfig;
use crate::models::RetrievedPassage;
use crate::rag::CopilotService;
use crate::tests::mocks::MockChat;
use crate::tests::mocks::MockCompletion;
use crate::tests::mocks::MockEmbedder;
use crate::tests::mocks::MockSearch;

/// Mock capabilities wired into one service, kept around for call assertions
pub struct TestCopilot {
    pub service: CopilotService,
    pub completion: Arc<MockCompletion>,
    pub embedder: Arc<MockEmbedder>,
    pub search: Arc<MockSearch>,
    pub chat: Arc<MockChat>,
}

/// Test helper to build a copilot over mock capabilities
pub fn create_test_copilot(
    resolved_query: &str,
    hits: Vec<RetrievedPassage>,
    reply_fragments: &[&str],
) -> TestCopilot {
    crate::logging::init_simple_logging();

    let completion = Arc::new(MockCompletion::returning(resolved_query));
    let embedder = Arc::new(MockEmbedder::new(4));
    let search = Arc::new(MockSearch::returning(hits));
    let chat = Arc::new(MockChat::returning(reply_fragments));

    let service = CopilotService::from_capabilities(
        completion.clone(),
        embedder.clone(),
        search.clone(),
        chat.clone(),
        &CopilotConfig::default(),
    );

    TestCopilot {
        service,
        completion,
        embedder,
        search,
        chat,
    }
}

/// The passage used by the trailwalker scenarios
pub fn trailwalker_passage() -> RetrievedPassage {
    RetrievedPassage::new("doc1", "Trailwalker shoes are waterproof up to 2 meters.")
}
