use tracing::debug;

/// Where one credential is during a vault operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    /// Only the sealed blob exists.
    Encrypted,
    /// Waiting on the password prompt.
    PendingPassword,
    /// Plaintext key held for the duration of one operation.
    Decrypted,
}

/// Result of an operation that may stop at a password prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    /// The user dismissed the prompt; nothing was decrypted or written.
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }
}

/// Tracks and traces the state of one credential.
#[derive(Debug)]
pub(crate) struct CredentialTracker<'a> {
    friendly_name: &'a str,
    state: CredentialState,
}

impl<'a> CredentialTracker<'a> {
    pub(crate) fn new(friendly_name: &'a str) -> Self {
        Self {
            friendly_name,
            state: CredentialState::Encrypted,
        }
    }

    pub(crate) fn state(&self) -> CredentialState {
        self.state
    }

    pub(crate) fn move_to(&mut self, next: CredentialState) {
        if self.state == next {
            return;
        }
        debug!(
            friendly_name = self.friendly_name,
            from = ?self.state,
            to = ?next,
            "Credential state transition"
        );
        self.state = next;
    }
}

impl Drop for CredentialTracker<'_> {
    fn drop(&mut self) {
        self.move_to(CredentialState::Encrypted);
    }
}
