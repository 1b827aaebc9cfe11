//! AI provider integration: chat completions client and prompt templates.

pub mod client;
pub mod prompts;

pub use client::{AiClient, Completion, Usage};
pub use prompts::{PromptTemplate, COVER_LETTER, PROFESSIONALIZE};
