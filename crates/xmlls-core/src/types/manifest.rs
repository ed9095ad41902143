use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Platform;
use crate::error::Result;

/// Download locations of the server binary, keyed by platform download key.
///
/// Mirrors the `binaryServerDownloadUrl` object of the package manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadManifest {
    /// Platform key (`linux`, `win32`, `osx-x86_64`, ...) to URL
    #[serde(default)]
    pub binary_server_download_url: BTreeMap<String, String>,
}

impl DownloadManifest {
    /// Parse a manifest from JSON; unrelated fields are ignored
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// URL for the given platform
    #[must_use]
    pub fn url_for(&self, platform: &Platform) -> Option<&str> {
        self.binary_server_download_url
            .get(&platform.download_key())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_package_manifest() {
        let json = r#"{
            "name": "vscode-xml",
            "binaryServerDownloadUrl": {
                "linux": "https://example.com/lemminx-linux.zip",
                "win32": "https://example.com/lemminx-win32.zip",
                "osx-x86_64": "https://example.com/lemminx-osx-x86_64.zip"
            }
        }"#;
        let manifest = DownloadManifest::from_json(json).unwrap();
        assert_eq!(
            manifest.url_for(&Platform::from_os("macos")),
            Some("https://example.com/lemminx-osx-x86_64.zip")
        );
        assert_eq!(manifest.url_for(&Platform::from_os("freebsd")), None);
    }

    #[test]
    fn missing_table_is_empty() {
        let manifest = DownloadManifest::from_json("{}").unwrap();
        assert!(manifest.binary_server_download_url.is_empty());
    }
}
