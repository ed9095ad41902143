//! Expected-hash manifests shipped next to the server binary.
//!
//! A manifest is a text file named `<binary name>.sha256` whose first token
//! is the hex digest, optionally followed by a file name.

use std::path::{Path, PathBuf};

use tracing::debug;
use xmlls_core::HASH_FILE_EXTENSION;

/// Extract the expected digest from manifest contents
#[must_use]
pub fn parse_manifest(contents: &str) -> Option<String> {
    contents
        .split_whitespace()
        .next()
        .map(str::to_ascii_lowercase)
}

/// Find the manifest for `binary_name`.
///
/// The directory holding the binary is searched first, then `package_root`.
pub fn locate_manifest(
    binary_path: &Path,
    binary_name: &str,
    package_root: Option<&Path>,
) -> Option<PathBuf> {
    let file_name = format!("{binary_name}.{HASH_FILE_EXTENSION}");
    binary_path
        .parent()
        .map(|dir| dir.join(&file_name))
        .into_iter()
        .chain(package_root.map(|root| root.join(&file_name)))
        .find(|candidate| candidate.is_file())
}

/// Read the expected digest for `binary_path`, if a manifest is available
pub async fn expected_hash(
    binary_path: &Path,
    binary_name: &str,
    package_root: Option<&Path>,
) -> Option<String> {
    let manifest = locate_manifest(binary_path, binary_name, package_root)?;
    match tokio::fs::read_to_string(&manifest).await {
        Ok(contents) => parse_manifest(&contents),
        Err(e) => {
            debug!(path = %manifest.display(), error = %e, "unreadable hash manifest");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_first_token() {
        assert_eq!(
            parse_manifest("ABCDEF0123 lemminx-linux\n").as_deref(),
            Some("abcdef0123")
        );
        assert_eq!(parse_manifest("  abc\n").as_deref(), Some("abc"));
        assert_eq!(parse_manifest(""), None);
    }

    #[test]
    fn binary_directory_wins_over_package_root() {
        let install = tempfile::tempdir().unwrap();
        let package = tempfile::tempdir().unwrap();
        let binary = install.path().join("lemminx-linux");
        std::fs::write(package.path().join("lemminx-linux.sha256"), "bbb").unwrap();

        assert_eq!(
            locate_manifest(&binary, "lemminx-linux", Some(package.path())),
            Some(package.path().join("lemminx-linux.sha256"))
        );

        std::fs::write(install.path().join("lemminx-linux.sha256"), "aaa").unwrap();
        assert_eq!(
            locate_manifest(&binary, "lemminx-linux", Some(package.path())),
            Some(install.path().join("lemminx-linux.sha256"))
        );
    }

    #[tokio::test]
    async fn missing_manifest_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("lemminx-linux");
        assert_eq!(expected_hash(&binary, "lemminx-linux", None).await, None);
    }
}
