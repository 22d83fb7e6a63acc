//! Prompt templates for the copilot stages

use std::collections::HashMap;

/// Template with `{{variable}}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Fill in the template with variables
    ///
    /// Placeholders without a value are left as-is. Substituted values are never rescanned.
    #[must_use]
    pub fn render(&self, values: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find("{{") {
            let Some(len) = rest[start + 2..].find("}}") else {
                break;
            };
            let name = &rest[start + 2..start + 2 + len];
            let end = start + 2 + len + 2;

            result.push_str(&rest[..start]);
            match values.get(name) {
                Some(value) => result.push_str(value),
                None => result.push_str(&rest[start..end]),
            }
            rest = &rest[end..];
        }
        result.push_str(rest);
        result
    }

    /// Get required variables
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Variables the template needs that `values` does not provide
    #[must_use]
    pub fn missing_variables(&self, values: &HashMap<String, String>) -> Vec<String> {
        self.variables
            .iter()
            .filter(|v| !values.contains_key(*v))
            .cloned()
            .collect()
    }
}

/// Extract variable names from template
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'{') {
            chars.next(); // skip second '{'
            let mut var_name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch == '}' {
                    chars.next();
                    if chars.peek() == Some(&'}') {
                        chars.next();
                        break;
                    }
                } else {
                    var_name.push(ch);
                    chars.next();
                }
            }
            if !var_name.is_empty() && !variables.contains(&var_name) {
                variables.push(var_name);
            }
        }
    }

    variables
}

/// Built-in copilot prompts
pub struct CopilotPrompts;

impl CopilotPrompts {
    /// Rewrites the latest user message into a standalone search query.
    ///
    /// Variables: `chat_history`, `query`.
    #[must_use]
    pub fn query_intent() -> PromptTemplate {
        PromptTemplate::new(
            r"You are an AI assistant reading the transcript of a conversation between a user and an assistant.
Given the chat history and the user's latest message, infer the user's intent and write it as a single search query.
The query must make sense on its own, without the chat history.
Return only the query text, with no quotes and no explanation.

Chat history:
{{chat_history}}

Latest message: {{query}}

Search query:",
        )
    }

    /// System message grounding the reply in retrieved documents.
    ///
    /// Variables: `documents`.
    #[must_use]
    pub fn grounded_chat() -> PromptTemplate {
        PromptTemplate::new(
            r"You are an AI assistant that helps people find information about products.
Answer the question using only the documents below. Keep answers brief and friendly.
If the documents do not contain the answer, say that you don't know.
When you use a document, mention the source it came from.

# Documents
{{documents}}",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_variables() {
        let template = PromptTemplate::new("Hello {{name}}, you are {{age}} years old.");
        assert_eq!(template.variables(), &["name", "age"]);
    }

    #[test]
    fn test_template_render() {
        let template = PromptTemplate::new("Hello {{name}}!");
        let mut values = HashMap::new();
        values.insert("name".to_string(), "Alice".to_string());
        assert_eq!(template.render(&values), "Hello Alice!");
    }

    #[test]
    fn test_render_keeps_placeholder_text_in_values() {
        let template = CopilotPrompts::query_intent();
        let mut values = HashMap::new();
        values.insert(
            "chat_history".to_string(),
            "user: how do I write {{query}} in a template?".to_string(),
        );
        values.insert("query".to_string(), "What about socks?".to_string());

        let prompt = template.render(&values);
        assert!(prompt.contains("user: how do I write {{query}} in a template?"));
        assert!(prompt.contains("Latest message: What about socks?"));
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        let template = PromptTemplate::new("{{a}} and {{b}} and {{ unclosed");
        let mut values = HashMap::new();
        values.insert("a".to_string(), "A".to_string());
        assert_eq!(template.render(&values), "A and {{b}} and {{ unclosed");
    }

    #[test]
    fn test_missing_variables() {
        let template = CopilotPrompts::query_intent();
        let mut values = HashMap::new();
        values.insert("query".to_string(), "socks?".to_string());
        assert_eq!(template.missing_variables(&values), vec!["chat_history"]);
    }

    #[test]
    fn test_builtin_prompt_variables() {
        assert_eq!(
            CopilotPrompts::query_intent().variables(),
            &["chat_history", "query"]
        );
        assert_eq!(CopilotPrompts::grounded_chat().variables(), &["documents"]);
    }
}
