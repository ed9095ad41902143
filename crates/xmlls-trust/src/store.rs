//! The user's allow-list of trusted binary digests.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use xmlls_core::{Result, XmlLsError};

/// File name of the persisted allow-list
pub const TRUST_FILE_NAME: &str = "trusted-hashes.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
struct TrustFile {
    #[serde(default)]
    trusted_hashes: Vec<String>,
}

/// Set of approved SHA-256 digests.
///
/// Digests are stored lowercase and never removed. Additions go through a
/// read-modify-write of the backing file under a lock, so concurrent
/// approvals within one process cannot lose each other.
#[derive(Debug)]
pub struct TrustStore {
    path: Option<PathBuf>,
    hashes: Mutex<BTreeSet<String>>,
}

impl TrustStore {
    /// Open the allow-list persisted at `path`; a missing file is empty
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let hashes = read_file(&path).await?;
        debug!(path = %path.display(), count = hashes.len(), "loaded trusted hashes");
        Ok(Self {
            path: Some(path),
            hashes: Mutex::new(hashes),
        })
    }

    /// Allow-list that lives only as long as this value
    pub fn in_memory<I, S>(hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            path: None,
            hashes: Mutex::new(hashes.into_iter().map(|h| normalize(h.as_ref())).collect()),
        }
    }

    /// Location of the backing file, if persisted
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns true if `digest` was approved
    pub async fn contains(&self, digest: &str) -> bool {
        self.hashes.lock().await.contains(&normalize(digest))
    }

    /// Approve `digest`.
    ///
    /// Returns false if it was already approved. The digest is kept for the
    /// lifetime of this store even if persisting fails.
    pub async fn add(&self, digest: &str) -> Result<bool> {
        let digest = normalize(digest);
        let mut hashes = self.hashes.lock().await;

        let Some(path) = &self.path else {
            return Ok(hashes.insert(digest));
        };

        // Entries written by another process since we loaded.
        let on_disk = read_file(path).await?;
        hashes.extend(on_disk.iter().cloned());
        let inserted = hashes.insert(digest.clone());

        if inserted || on_disk.len() != hashes.len() {
            write_file(path, &hashes).await?;
            info!(digest = %digest, path = %path.display(), "trusted binary hash");
        }
        Ok(inserted)
    }

    /// Every approved digest, sorted
    pub async fn hashes(&self) -> Vec<String> {
        self.hashes.lock().await.iter().cloned().collect()
    }
}

fn normalize(digest: &str) -> String {
    digest.trim().to_ascii_lowercase()
}

async fn read_file(path: &Path) -> Result<BTreeSet<String>> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(XmlLsError::io(path, e)),
    };
    let file: TrustFile = toml::from_str(&contents).map_err(|e| {
        XmlLsError::config(format!("invalid trust list {}: {e}", path.display()))
    })?;
    Ok(file.trusted_hashes.iter().map(|h| normalize(h)).collect())
}

async fn write_file(path: &Path, hashes: &BTreeSet<String>) -> Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| XmlLsError::io(dir, e))?;
    }
    let file = TrustFile {
        trusted_hashes: hashes.iter().cloned().collect(),
    };
    let contents = toml::to_string_pretty(&file)
        .map_err(|e| XmlLsError::config(format!("failed to serialize trust list: {e}")))?;

    let staged = path.with_extension("toml.tmp");
    tokio::fs::write(&staged, contents)
        .await
        .map_err(|e| XmlLsError::io(&staged, e))?;
    tokio::fs::rename(&staged, path)
        .await
        .map_err(|e| XmlLsError::io(path, e))
}
