use async_trait::async_trait;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordPurpose {
    /// Decrypt the saved key for one operation.
    Unlock,
    /// Choose the password a key is re-sealed under.
    NewPassword,
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordRequest<'a> {
    pub friendly_name: &'a str,
    pub purpose: PasswordPurpose,
}

/// Suspend point for asking the user for a password.
///
/// Resolving to `None` means the user dismissed the prompt. The vault treats
/// that as "nothing happened", never as an error.
#[async_trait]
pub trait PasswordPrompt: Send + Sync {
    async fn request_password(&self, request: PasswordRequest<'_>) -> Option<Zeroizing<String>>;
}

/// Answers every request from a fixed queue; `None` entries cancel.
///
/// Useful for scripted callers and tests.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: std::sync::Mutex<std::collections::VecDeque<Option<String>>>,
}

impl std::fmt::Debug for ScriptedPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedPrompt")
            .field("remaining", &self.remaining())
            .finish_non_exhaustive()
    }
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            answers: std::sync::Mutex::new(
                answers.into_iter().map(|a| a.map(Into::into)).collect(),
            ),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().map_or(0, |queue| queue.len())
    }
}

#[async_trait]
impl PasswordPrompt for ScriptedPrompt {
    async fn request_password(&self, _request: PasswordRequest<'_>) -> Option<Zeroizing<String>> {
        let next = self.answers.lock().ok()?.pop_front()?;
        next.map(Zeroizing::new)
    }
}
