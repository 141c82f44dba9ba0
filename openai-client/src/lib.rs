mod client;
pub mod domain;

pub use client::{ChatClient, OpenAiError};
pub use domain::{ChatMessage, ChatRequest, ChatRole};
