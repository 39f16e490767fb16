//! Scripted [`MessageSender`] shared by unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use super::client::MessageSender;
use super::error::AnthropicError;
use super::types::{ContentBlock, MessagesRequest, MessagesResponse, Usage};

/// Replays canned replies in order and remembers every request.
pub struct MockSender {
    replies: RefCell<VecDeque<Result<MessagesResponse, AnthropicError>>>,
    pub seen: RefCell<Vec<MessagesRequest>>,
}

impl MockSender {
    pub fn new(replies: Vec<Result<MessagesResponse, AnthropicError>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl MessageSender for MockSender {
    async fn send_message(&self, req: &MessagesRequest) -> Result<MessagesResponse, AnthropicError> {
        self.seen.borrow_mut().push(req.clone());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(AnthropicError::ApiError {
                status: 500,
                message: "no more replies".into(),
            }))
    }
}

pub fn reply(text: &str, input: u32, output: u32) -> Result<MessagesResponse, AnthropicError> {
    Ok(MessagesResponse {
        id: "mock".into(),
        content: vec![ContentBlock {
            content_type: "text".into(),
            text: text.into(),
        }],
        model: "mock".into(),
        stop_reason: Some("end_turn".into()),
        usage: Usage {
            input_tokens: input,
            output_tokens: output,
        },
    })
}
