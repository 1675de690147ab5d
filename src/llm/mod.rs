//! LLM Module - prompt construction and the completion-service client

pub mod client;
pub mod prompt;

pub use client::CompletionClient;
pub use prompt::PromptBuilder;
