// ABOUTME: AI summarization of class notes using the OpenAI API
// ABOUTME: Wraps the async client behind a blocking Summarizer trait

use crate::{Error, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use tokio::runtime::Runtime;
use tracing::info;

pub const DEFAULT_MODEL: &str = "o3-mini";

const SYSTEM_PROMPT: &str = "For all lists provide a comma separated list. Use any style.";

const USER_PROMPT: &str = "Provide a summary in 20 words or less of these notes, as a list of phrases. \
Please give the topic and grammar practiced. Use any style. \
For example: ‘Future tense, past tense, present continuous, grammar corrections, business vocabulary, \
pronunciation, onomatopoeia, to be past tense, relaxed pronunciation.’ Notes: ";

pub fn build_user_prompt(notes: &str) -> String {
    format!("{}{}", USER_PROMPT, notes)
}

/// Turns one class's raw notes into a short summary.
pub trait Summarizer {
    fn summarize(&self, notes: &str) -> Result<String>;
}

pub struct OpenAiSummarizer {
    client: Client<OpenAIConfig>,
    model: String,
    runtime: Runtime,
}

impl OpenAiSummarizer {
    pub fn new(api_key: &str, api_base: Option<String>, model: Option<String>) -> Result<Self> {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = api_base {
            config = config.with_api_base(base);
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Summarization(format!("Failed to start runtime: {}", e)))?;

        Ok(OpenAiSummarizer {
            client: Client::with_config(config),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.into()),
            runtime,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Summarizer for OpenAiSummarizer {
    fn summarize(&self, notes: &str) -> Result<String> {
        info!(model = %self.model, "summarizing notes with OpenAI");
        self.runtime
            .block_on(summarize_notes(&self.client, &self.model, notes))
    }
}

async fn summarize_notes(client: &Client<OpenAIConfig>, model: &str, notes: &str) -> Result<String> {
    let messages = vec![
        ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| {
                    Error::Summarization(format!("Failed to build system message: {}", e))
                })?,
        ),
        ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(build_user_prompt(notes))
                .build()
                .map_err(|e| {
                    Error::Summarization(format!("Failed to build user message: {}", e))
                })?,
        ),
    ];

    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(messages)
        .build()
        .map_err(|e| Error::Summarization(format!("Failed to build request: {}", e)))?;

    let response = client
        .chat()
        .create(request)
        .await
        .map_err(|e| Error::Summarization(format!("OpenAI API error: {}", e)))?;

    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .map(|content| content.trim().to_string())
        .ok_or_else(|| Error::Summarization("No response from OpenAI".into()))
}

pub fn get_api_key_from_keychain() -> Result<String> {
    #[cfg(target_os = "macos")]
    {
        use keyring::Entry;

        let entry = Entry::new("classnotes", "openai_api_key")
            .map_err(|e| Error::Auth(format!("Failed to access keychain: {}", e)))?;

        entry.get_password().map_err(|e| {
            Error::Auth(format!(
                "OpenAI API key not found in keychain. Set it with: classnotes set-api-key <key>. Error: {}",
                e
            ))
        })
    }

    #[cfg(not(target_os = "macos"))]
    {
        Err(Error::Auth(
            "Keychain access only supported on macOS. Set OPENAI_API_KEY environment variable."
                .into(),
        ))
    }
}

pub fn set_api_key_in_keychain(api_key: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        use keyring::Entry;

        let entry = Entry::new("classnotes", "openai_api_key")
            .map_err(|e| Error::Auth(format!("Failed to access keychain: {}", e)))?;

        entry
            .set_password(api_key)
            .map_err(|e| Error::Auth(format!("Failed to store API key in keychain: {}", e)))?;

        info!("OpenAI API key stored in keychain");
        Ok(())
    }

    #[cfg(not(target_os = "macos"))]
    {
        let _ = api_key;
        Err(Error::Auth(
            "Keychain access only supported on macOS. Set OPENAI_API_KEY environment variable."
                .into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_embeds_notes() {
        let prompt = build_user_prompt("past simple, travel vocabulary");
        assert!(prompt.starts_with("Provide a summary in 20 words or less"));
        assert!(prompt.ends_with("Notes: past simple, travel vocabulary"));
    }

    #[test]
    fn test_user_prompt_example_uses_curly_quotes() {
        let prompt = build_user_prompt("");
        assert!(prompt.contains("For example: ‘Future tense, past tense,"));
        assert!(prompt.contains("relaxed pronunciation.’ Notes: "));
        assert!(!prompt.contains('\''));
    }

    #[test]
    fn test_system_prompt_asks_for_comma_lists() {
        assert!(SYSTEM_PROMPT.contains("comma separated list"));
    }

    #[test]
    fn test_summarizer_default_model() {
        let summarizer = OpenAiSummarizer::new("sk-test", None, None).unwrap();
        assert_eq!(summarizer.model(), DEFAULT_MODEL);

        let summarizer =
            OpenAiSummarizer::new("sk-test", None, Some("gpt-4o-mini".into())).unwrap();
        assert_eq!(summarizer.model(), "gpt-4o-mini");
    }
}
