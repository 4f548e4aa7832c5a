//! Client for the prompts backend (accounts and published prompts).

mod client;

pub use client::PromptsClient;
pub use promptvault_schema::{PromptPayload, RemotePrompt};
