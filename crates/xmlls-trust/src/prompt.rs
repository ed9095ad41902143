use std::path::Path;

use async_trait::async_trait;

/// The user's answer to an untrusted-binary prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustDecision {
    /// Trust the binary and remember its digest
    Trust,
    /// Do not run the binary
    Decline,
    /// The prompt was closed or could not be shown
    Dismissed,
}

impl TrustDecision {
    /// Only an explicit affirmative grants trust
    #[must_use]
    pub const fn is_trusted(self) -> bool {
        matches!(self, Self::Trust)
    }
}

/// Asks the user whether an unrecognized binary may run
#[async_trait]
pub trait TrustPrompt: Send + Sync {
    /// Ask about the binary at `path` whose SHA-256 is `digest`
    async fn confirm_untrusted(&self, path: &Path, digest: &str) -> TrustDecision;
}

/// Prompt for hosts that cannot ask; every binary it sees is refused
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

#[async_trait]
impl TrustPrompt for NonInteractive {
    async fn confirm_untrusted(&self, path: &Path, digest: &str) -> TrustDecision {
        tracing::warn!(path = %path.display(), digest, "untrusted binary and no way to ask");
        TrustDecision::Dismissed
    }
}

/// Question shown to the user for an untrusted binary
#[must_use]
pub fn untrusted_binary_message(path: &Path) -> String {
    format!(
        "The server binary {} is not trusted. Running the file poses a threat to your system's \
         security. Do you want to add this binary to the list of trusted binaries and run it?",
        path.display()
    )
}
