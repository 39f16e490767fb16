//! Optional second pass over a generated explanation.
//!
//! When configured, a secondary model reviews the explanation (critique) and
//! writes an illustrative Python example. Both are best effort: a failed or
//! blank reply is simply left out of the artifact and never changes the
//! topic's recorded outcome.

use std::path::Path;

use anyhow::{Context, Result};

use crate::anthropic::{Message, MessageSender, MessagesRequest};
use crate::generator::{RetryConfig, TOPIC_PLACEHOLDER, complete};
use crate::topics::Topic;

pub const CRITIC_SYSTEM_PROMPT_FILE: &str = "critic_system_prompt.txt";
pub const CRITIC_USER_PROMPT_FILE: &str = "critic_user_prompt.txt";
pub const CODE_SYSTEM_PROMPT_FILE: &str = "code_generation_system_prompt.txt";
pub const CODE_USER_PROMPT_FILE: &str = "code_generation_prompt.txt";

const CONTENT_PLACEHOLDER: &str = "{content}";
const PYTHON_FENCE: &str = "```python";
const FENCE: &str = "```";

/// Extra material for one topic. Either part may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub critique: Option<String>,
    pub code_example: Option<String>,
    /// Tokens spent by the secondary model.
    pub token_count: u64,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        self.critique.is_none() && self.code_example.is_none()
    }
}

/// Produces an [`Enrichment`] for an explanation. Never fails outright.
pub trait Enricher {
    async fn enrich(&self, topic: &Topic, explanation: &str) -> Enrichment;
}

/// No second pass.
impl Enricher for () {
    async fn enrich(&self, _topic: &Topic, _explanation: &str) -> Enrichment {
        Enrichment::default()
    }
}

/// Critic and code-generation prompts. User templates take `{topic}` and
/// `{content}`.
#[derive(Debug, Clone)]
pub struct EnrichmentPrompts {
    pub critic_system: String,
    pub critic_template: String,
    pub code_system: String,
    pub code_template: String,
}

impl EnrichmentPrompts {
    pub fn load(dir: &Path) -> Result<Self> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read prompt {}", path.display()))
        };
        Ok(Self {
            critic_system: read(CRITIC_SYSTEM_PROMPT_FILE)?,
            critic_template: read(CRITIC_USER_PROMPT_FILE)?,
            code_system: read(CODE_SYSTEM_PROMPT_FILE)?,
            code_template: read(CODE_USER_PROMPT_FILE)?,
        })
    }
}

fn render(template: &str, topic: &str, content: &str) -> String {
    template
        .replace(TOPIC_PLACEHOLDER, topic)
        .replace(CONTENT_PLACEHOLDER, content)
}

/// Removes a surrounding markdown code fence, with or without a `python` tag.
pub fn strip_code_fence(reply: &str) -> String {
    let mut code = reply.trim();
    if let Some(rest) = code.strip_prefix(PYTHON_FENCE) {
        code = rest.trim();
    } else if let Some(rest) = code.strip_prefix(FENCE) {
        code = rest.trim();
    }
    if let Some(rest) = code.strip_suffix(FENCE) {
        code = rest.trim();
    }
    code.to_string()
}

/// [`Enricher`] backed by a Messages API sender.
pub struct LlmEnricher<S> {
    sender: S,
    prompts: EnrichmentPrompts,
    model: String,
    max_tokens: u32,
    retry: RetryConfig,
}

impl<S: MessageSender> LlmEnricher<S> {
    pub fn new(sender: S, prompts: EnrichmentPrompts, model: String, max_tokens: u32, retry: RetryConfig) -> Self {
        Self {
            sender,
            prompts,
            model,
            max_tokens,
            retry,
        }
    }

    fn request(&self, system: &str, user: String) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: Some(system.to_string()),
            messages: vec![Message::user(user)],
        }
    }
}

impl<S: MessageSender> Enricher for LlmEnricher<S> {
    async fn enrich(&self, topic: &Topic, explanation: &str) -> Enrichment {
        let mut enrichment = Enrichment::default();

        let critique_req = self.request(
            &self.prompts.critic_system,
            render(&self.prompts.critic_template, &topic.query, explanation),
        );
        if let Some((text, tokens)) = complete(&self.sender, &critique_req, &self.retry, &topic.code, "critique").await {
            enrichment.critique = Some(text);
            enrichment.token_count += tokens;
        }

        let code_req = self.request(
            &self.prompts.code_system,
            render(&self.prompts.code_template, &topic.query, explanation),
        );
        if let Some((text, tokens)) = complete(&self.sender, &code_req, &self.retry, &topic.code, "code example").await {
            enrichment.token_count += tokens;
            let code = strip_code_fence(&text);
            if code.is_empty() {
                tracing::warn!(topic = %topic.code, "code example was only a fence");
            } else {
                enrichment.code_example = Some(code);
            }
        }

        tracing::debug!(
            topic = %topic.code,
            critique = enrichment.critique.is_some(),
            code_example = enrichment.code_example.is_some(),
            tokens = enrichment.token_count,
            "enrichment finished"
        );
        enrichment
    }
}
