//! Context assembly from retrieved passages

use crate::cli::output::truncate_str;
use crate::models::RetrievalResult;
use crate::models::RetrievedPassage;

/// Renders retrieved passages into the text the grounding prompt embeds
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAssembler;

impl ContextAssembler {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Format a single passage as a labelled block
    #[must_use]
    pub fn format_passage(&self, passage: &RetrievedPassage) -> String {
        format!(">>> From: {}\n{}", passage.id, passage.content)
    }

    /// Assemble every passage, in retrieval order
    #[must_use]
    pub fn assemble(&self, context: &RetrievalResult) -> String {
        let mut documents = String::new();
        for passage in context.iter() {
            documents.push('\n');
            documents.push_str(&self.format_passage(passage));
        }
        documents
    }

    /// Create a summary of the retrieved passages
    #[must_use]
    pub fn create_summary(&self, context: &RetrievalResult) -> String {
        if context.is_empty() {
            return "No passages found.".to_string();
        }

        let mut summary = format!("Found {} relevant passage(s):\n\n", context.len());

        for (idx, passage) in context.iter().enumerate() {
            summary.push_str(&format!(
                "{}. {}\n   {}\n\n",
                idx + 1,
                passage.id,
                truncate_str(&passage.content, 100)
            ));
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RetrievalResult {
        RetrievalResult::from_ranked(
            vec![
                RetrievedPassage::new("doc1", "Trailwalker shoes are waterproof up to 2 meters."),
                RetrievedPassage::new("doc2", "Our socks are made of merino wool."),
            ],
            3,
        )
    }

    #[test]
    fn test_format_passage() {
        let passage = RetrievedPassage::new("doc1", "Waterproof.");
        assert_eq!(
            ContextAssembler::new().format_passage(&passage),
            ">>> From: doc1\nWaterproof."
        );
    }

    #[test]
    fn test_assemble_keeps_order() {
        let documents = ContextAssembler::new().assemble(&context());
        assert_eq!(
            documents,
            "\n>>> From: doc1\nTrailwalker shoes are waterproof up to 2 meters.\n>>> From: doc2\nOur socks are made of merino wool."
        );
    }

    #[test]
    fn test_assemble_empty() {
        let empty = RetrievalResult::from_ranked(Vec::new(), 3);
        assert!(ContextAssembler::new().assemble(&empty).is_empty());
        assert_eq!(
            ContextAssembler::new().create_summary(&empty),
            "No passages found."
        );
    }

    #[test]
    fn test_create_summary() {
        let summary = ContextAssembler::new().create_summary(&context());
        assert!(summary.starts_with("Found 2 relevant passage(s)"));
        assert!(summary.contains("1. doc1"));
        assert!(summary.contains("2. doc2"));
    }
}
