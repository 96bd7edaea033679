//! Reminder text generation: chat-completions client with a deterministic fallback.

mod client;
mod generator;

pub use client::{API_VERSION, ChatClient, ChatMessage, ChatRequest, GenerateError};
pub use generator::{
    FallbackReason, GeneratedMessage, MessageGenerator, MessageSource, UNREADABLE_ANSWER,
    chat_request, fallback_message, user_prompt,
};
