pub mod anthropic;
pub mod error;
pub mod huggingface;
pub mod openai;
pub mod prompts;
pub mod vertex;

pub use anthropic::{AnthropicRequestBody, AnthropicResponseBody};
pub use error::{UpstreamErrorBody, UpstreamErrorField, UpstreamErrorObject};
pub use huggingface::{HuggingFaceGeneration, HuggingFaceRequestBody, HuggingFaceResponseBody};
pub use openai::{ChatMessage, OpenaiChatRequestBody, OpenaiChatResponseBody, OpenaiModelList};
pub use prompts::{LoginRequest, LoginResponse, MessageBody, PromptPayload, RemotePrompt};
pub use vertex::{VertexInstance, VertexRequestBody, VertexResponseBody};
