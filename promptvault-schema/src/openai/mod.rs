mod chat_request;
mod chat_response;
mod model_list;

pub use chat_request::{ChatMessage, OpenaiChatRequestBody};
pub use chat_response::{OpenaiChatChoice, OpenaiChatResponseBody};
pub use model_list::{OpenaiModel, OpenaiModelList};
