//! Explanation generation for a single topic.
//!
//! [`Generator`] is the seam between the run coordinator and whatever
//! produces text. [`LlmGenerator`] implements it over the Anthropic
//! Messages API, retrying only rate-limited calls.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::sleep;

use crate::anthropic::{AnthropicError, Message, MessageSender, MessagesRequest};
use crate::topics::Topic;

pub const SYSTEM_PROMPT_FILE: &str = "main_system_prompt.txt";
pub const USER_PROMPT_FILE: &str = "main_user_prompt.txt";

/// Placeholder in the user prompt template replaced by the topic query.
pub(crate) const TOPIC_PLACEHOLDER: &str = "{topic}";

/// Generated explanation and the tokens it cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub token_count: u64,
}

/// Produces an explanation for a topic. `None` means nothing usable came back.
pub trait Generator {
    /// Identifier of the backend model, recorded with every outcome.
    fn model(&self) -> &str;

    async fn generate(&self, topic: &Topic) -> Option<Generation>;
}

/// System prompt plus a user prompt template containing `{topic}`.
#[derive(Debug, Clone)]
pub struct Prompts {
    pub system: String,
    pub user_template: String,
}

impl Prompts {
    /// Loads both prompt files from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read prompt {}", path.display()))
        };
        Ok(Self {
            system: read(SYSTEM_PROMPT_FILE)?,
            user_template: read(USER_PROMPT_FILE)?,
        })
    }

    pub fn render(&self, topic: &str) -> String {
        self.user_template.replace(TOPIC_PLACEHOLDER, topic)
    }
}

/// Retry behaviour for rate-limited calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 disables retrying.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    /// delay = base_delay_ms * 2^(attempt - 1)
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        self.base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// [`Generator`] backed by a Messages API sender.
pub struct LlmGenerator<S> {
    sender: S,
    prompts: Prompts,
    model: String,
    max_tokens: u32,
    retry: RetryConfig,
}

impl<S: MessageSender> LlmGenerator<S> {
    pub fn new(sender: S, prompts: Prompts, model: String, max_tokens: u32, retry: RetryConfig) -> Self {
        Self {
            sender,
            prompts,
            model,
            max_tokens,
            retry,
        }
    }

    fn request_for(&self, topic: &Topic) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: Some(self.prompts.system.clone()),
            messages: vec![Message::user(self.prompts.render(&topic.query))],
        }
    }
}

impl<S: MessageSender> Generator for LlmGenerator<S> {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, topic: &Topic) -> Option<Generation> {
        let req = self.request_for(topic);
        let (text, token_count) = complete(&self.sender, &req, &self.retry, &topic.code, "explanation").await?;
        Some(Generation { text, token_count })
    }
}

/// Sends `req`, retrying rate-limited calls per `retry`.
///
/// Returns the reply text and its total token cost, or `None` when the call
/// failed or came back blank. `step` names the call in log events.
pub(crate) async fn complete<S: MessageSender>(
    sender: &S,
    req: &MessagesRequest,
    retry: &RetryConfig,
    topic: &str,
    step: &'static str,
) -> Option<(String, u64)> {
    let mut attempt = 0;

    loop {
        match sender.send_message(req).await {
            Ok(resp) => {
                let text = resp.text();
                if text.trim().is_empty() {
                    tracing::warn!(topic, step, "model returned no text");
                    return None;
                }
                let token_count = resp.usage.total();
                tracing::debug!(topic, step, token_count, "completion received");
                return Some((text, token_count));
            }
            Err(e) if e.is_retryable() && attempt < retry.max_retries => {
                attempt += 1;
                let mut delay_ms = retry.delay_for_attempt(attempt);
                if let AnthropicError::RateLimited { retry_after_ms } = e {
                    delay_ms = delay_ms.max(retry_after_ms);
                }
                tracing::warn!(
                    topic,
                    step,
                    attempt,
                    max = retry.max_retries,
                    delay_ms,
                    "rate limited, retrying"
                );
                sleep(Duration::from_millis(delay_ms)).await;
            }
            Err(e) => {
                tracing::warn!(topic, step, error = %e, "completion failed");
                return None;
            }
        }
    }
}
