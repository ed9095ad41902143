use std::path::Path;

use async_trait::async_trait;
use console::Term;
use dialoguer::Confirm;
use xmlls::trust::{untrusted_binary_message, TrustDecision};
use xmlls::TrustPrompt;

/// Asks on the terminal whether an untrusted binary may run.
///
/// Without an attended terminal nothing is asked and the prompt counts as
/// dismissed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompt;

#[async_trait]
impl TrustPrompt for ConsolePrompt {
    async fn confirm_untrusted(&self, path: &Path, digest: &str) -> TrustDecision {
        if !console::user_attended_stderr() {
            tracing::warn!(path = %path.display(), digest, "untrusted binary and no terminal to ask on");
            return TrustDecision::Dismissed;
        }

        let question = format!("{}\nSHA-256: {digest}", untrusted_binary_message(path));
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new()
                .with_prompt(question)
                .default(false)
                .interact_on_opt(&Term::stderr())
        })
        .await;

        match answer {
            Ok(Ok(Some(true))) => TrustDecision::Trust,
            Ok(Ok(Some(false))) => TrustDecision::Decline,
            Ok(Ok(None)) => TrustDecision::Dismissed,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "trust prompt failed");
                TrustDecision::Dismissed
            }
            Err(e) => {
                tracing::warn!(error = %e, "trust prompt task failed");
                TrustDecision::Dismissed
            }
        }
    }
}
