pub mod client;
pub mod error;
#[cfg(test)]
pub(crate) mod mock;
pub mod types;

pub use client::{AnthropicClient, MessageSender};
pub use error::AnthropicError;
pub use types::{ContentBlock, Message, MessagesRequest, MessagesResponse, Usage};
