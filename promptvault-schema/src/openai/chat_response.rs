use serde::{Deserialize, Serialize};

/// Subset of the Chat Completions response that the adapters read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenaiChatResponseBody {
    #[serde(default)]
    pub choices: Vec<OpenaiChatChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenaiChatChoice {
    pub message: OpenaiChatChoiceMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenaiChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl OpenaiChatResponseBody {
    /// Text of the first choice, if the upstream produced one.
    pub fn first_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
    }
}
