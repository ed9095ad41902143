//! Decide whether a server binary may run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;
use tracing::{debug, warn};
use xmlls_core::BinaryDescriptor;

use crate::hash::digest_file;
use crate::manifest::expected_hash;
use crate::prompt::TrustPrompt;
use crate::store::TrustStore;

/// Checks a binary against the allow-list, the shipped manifest, and
/// finally the user.
///
/// One verifier covers one session: the user is asked at most once per
/// digest, and later verifications of that digest reuse the answer.
pub struct TrustVerifier {
    store: Arc<TrustStore>,
    prompt: Arc<dyn TrustPrompt>,
    binary_name: String,
    package_root: Option<PathBuf>,
    answers: Mutex<HashMap<String, Arc<OnceCell<bool>>>>,
    prompting: tokio::sync::Mutex<()>,
}

impl TrustVerifier {
    /// Verifier for binaries described by `descriptor`
    pub fn new(
        store: Arc<TrustStore>,
        prompt: Arc<dyn TrustPrompt>,
        descriptor: &BinaryDescriptor,
    ) -> Self {
        Self {
            store,
            prompt,
            binary_name: descriptor.name.clone(),
            package_root: None,
            answers: Mutex::new(HashMap::new()),
            prompting: tokio::sync::Mutex::new(()),
        }
    }

    /// Fallback directory searched for the hash manifest
    #[must_use]
    pub fn with_package_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.package_root = Some(root.into());
        self
    }

    /// The allow-list this verifier consults
    #[must_use]
    pub fn store(&self) -> &Arc<TrustStore> {
        &self.store
    }

    /// Returns true if the binary at `path` may run.
    ///
    /// Never fails: a binary that cannot be hashed is not trusted.
    pub async fn verify(&self, path: &Path) -> bool {
        let digest = match digest_file(path).await {
            Ok(digest) => digest,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot hash server binary");
                return false;
            }
        };
        debug!(path = %path.display(), digest = %digest, "hashed server binary");

        if self.store.contains(&digest).await {
            debug!(digest = %digest, "binary hash is user-trusted");
            return true;
        }

        if let Some(expected) =
            expected_hash(path, &self.binary_name, self.package_root.as_deref()).await
        {
            if expected == digest {
                debug!(digest = %digest, "binary hash matches shipped manifest");
                return true;
            }
            warn!(expected = %expected, actual = %digest, "binary hash does not match manifest");
        }

        self.ask(path, digest).await
    }

    async fn ask(&self, path: &Path, digest: String) -> bool {
        let cell = self
            .answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(digest.clone())
            .or_default()
            .clone();

        let digest = digest.as_str();
        *cell
            .get_or_init(|| async move {
                let _serialized = self.prompting.lock().await;
                let decision = self.prompt.confirm_untrusted(path, digest).await;
                if !decision.is_trusted() {
                    warn!(path = %path.display(), ?decision, "server binary not trusted");
                    return false;
                }
                if let Err(e) = self.store.add(digest).await {
                    warn!(error = %e, "could not persist trusted hash");
                }
                true
            })
            .await
    }
}
