//! Prompt templates for grounded answers and code generation

use crate::types::{HistoryTurn, MessageRole};

/// System prompt used when no passages were retrieved
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful coding assistant.";

/// Temperature used when no passages were retrieved
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Temperature used for code generation
pub const CODE_TEMPERATURE: f32 = 0.2;

/// Prompt builder for chat and code requests
pub struct PromptBuilder;

impl PromptBuilder {
    /// System prompt for answers grounded on documents
    pub fn context_system_prompt() -> &'static str {
        "You are an expert coding assistant. Answer using the provided documentation \
         excerpts when they are relevant, cite them by number like [1], and say so when \
         the excerpts do not contain the answer. Format code in Markdown code blocks."
    }

    /// Number the passages so the model can cite them
    pub fn build_context(passages: &[String]) -> String {
        passages
            .iter()
            .enumerate()
            .map(|(i, passage)| format!("[{}]\n{}", i + 1, passage.trim()))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }

    /// Prompt combining the excerpts, earlier turns and the question
    pub fn build_context_prompt(question: &str, passages: &[String], history: &[HistoryTurn]) -> String {
        let conversation = if history.is_empty() {
            String::new()
        } else {
            format!("CONVERSATION SO FAR:\n{}\n\n", Self::format_history(history))
        };

        format!(
            r#"DOCUMENTATION EXCERPTS:
{context}

{conversation}QUESTION: {question}

Answer the question using the excerpts above:"#,
            context = Self::build_context(passages),
            conversation = conversation,
            question = question
        )
    }

    /// Conversation history rendered as plain text
    pub fn format_history(history: &[HistoryTurn]) -> String {
        history
            .iter()
            .map(|turn| {
                let speaker = match turn.role {
                    MessageRole::User => "User",
                    MessageRole::Assistant => "Assistant",
                };
                format!("{}: {}", speaker, turn.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// System prompt for code generation
    pub fn code_system_prompt(language: &str) -> String {
        format!(
            "You are an expert {language} programmer. Reply with a single, complete, \
             well-commented {language} code block and nothing else."
        )
    }

    /// User prompt for code generation
    pub fn build_code_prompt(description: &str, language: &str) -> String {
        format!("Write {language} code for the following task:\n\n{description}")
    }
}

/// Remove a Markdown code fence wrapping the whole answer.
///
/// Text outside the first fenced block (explanations the model added anyway)
/// is dropped. Answers without a fence are returned trimmed.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed.to_string();
    };

    let after_open = &trimmed[start + 3..];
    // Skip the info string (language tag) on the opening line
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(after_open.len());
    let body = &after_open[body_start..];

    match body.find("```") {
        Some(end) => body[..end].trim_end().to_string(),
        None => body.trim_end().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_numbers_passages() {
        let passages = vec!["first".to_string(), "second".to_string()];
        let prompt = PromptBuilder::build_context_prompt("why?", &passages, &[]);
        assert!(prompt.contains("[1]\nfirst"));
        assert!(!prompt.contains("CONVERSATION"));
        assert!(prompt.contains("[2]\nsecond"));
        assert!(prompt.contains("QUESTION: why?"));
    }

    #[test]
    fn test_strip_code_fence() {
        let answer = "Here you go:\n```python\ndef add(a, b):\n    return a + b\n```\nEnjoy!";
        assert_eq!(strip_code_fence(answer), "def add(a, b):\n    return a + b");

        assert_eq!(strip_code_fence("  x = 1  "), "x = 1");
        assert_eq!(strip_code_fence("```\nfn main() {}\n"), "fn main() {}");
    }

    #[test]
    fn test_format_history() {
        let history = vec![
            HistoryTurn { role: MessageRole::User, content: "hi".into() },
            HistoryTurn { role: MessageRole::Assistant, content: "hello".into() },
        ];
        assert_eq!(PromptBuilder::format_history(&history), "User: hi\nAssistant: hello");
    }
}
