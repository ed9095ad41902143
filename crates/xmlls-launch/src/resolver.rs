//! Locating the native server binary on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};
use walkdir::WalkDir;
use xmlls_core::{BinaryDescriptor, Notice, Notifier, Platform, Remediation, TracingNotifier};

/// Extensions of packaging artifacts that share the binary's name prefix
const PACKAGING_EXTENSIONS: [&str; 3] = ["jar", "zip", "sha256"];

/// Where a found binary came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarySource {
    /// The user-configured binary path
    UserOverride,
    /// The server installation directory
    Installed,
}

/// Outcome of looking for the server binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A binary exists; it still has to be verified before running
    Found {
        /// Path of the binary
        path: PathBuf,
        /// How it was found
        source: BinarySource,
    },
    /// Nothing on disk; download to `install_path`
    NeedsDownload {
        /// Canonical install location for this platform
        install_path: PathBuf,
    },
}

/// Decides whether a server binary exists locally, and where it belongs
#[derive(Clone)]
pub struct BinaryResolver {
    descriptor: BinaryDescriptor,
    server_home: PathBuf,
    override_path: Option<PathBuf>,
    notifier: Arc<dyn Notifier>,
}

impl BinaryResolver {
    /// Resolver for `platform` binaries installed under `server_home`
    pub fn new(platform: &Platform, server_home: impl Into<PathBuf>) -> Self {
        let server_home = server_home.into();
        Self {
            descriptor: BinaryDescriptor::new(platform, &server_home),
            server_home,
            override_path: None,
            notifier: Arc::new(TracingNotifier),
        }
    }

    /// Prefer the binary at `path`, when it exists
    #[must_use]
    pub fn with_override(mut self, path: Option<PathBuf>) -> Self {
        self.override_path = path;
        self
    }

    /// Where to report a missing override
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Naming and paths of the platform binary
    #[must_use]
    pub const fn descriptor(&self) -> &BinaryDescriptor {
        &self.descriptor
    }

    /// Directory searched for installed binaries
    #[must_use]
    pub fn server_home(&self) -> &Path {
        &self.server_home
    }

    /// Find the binary to run.
    ///
    /// An existing override is returned as-is. A missing override is reported
    /// and ignored. Otherwise the first file under the server home, in sorted
    /// order, whose name starts with the platform binary name and is not a
    /// packaging artifact wins.
    pub fn resolve(&self) -> Resolution {
        if let Some(path) = &self.override_path {
            if path.exists() {
                debug!(path = %path.display(), "using configured server binary");
                return Resolution::Found {
                    path: path.clone(),
                    source: BinarySource::UserOverride,
                };
            }
            warn!(path = %path.display(), "configured server binary does not exist");
            self.notifier.notify(
                Notice::warning(
                    "The specified XML language server binary could not be found. Using the default binary...",
                )
                .with_action(Remediation::OpenSettings("binary_path".to_string())),
            );
        }

        match self.find_installed() {
            Some(path) => {
                debug!(path = %path.display(), "found installed server binary");
                Resolution::Found {
                    path,
                    source: BinarySource::Installed,
                }
            }
            None => Resolution::NeedsDownload {
                install_path: self.descriptor.install_path.clone(),
            },
        }
    }

    fn find_installed(&self) -> Option<PathBuf> {
        if !self.server_home.is_dir() {
            return None;
        }
        WalkDir::new(&self.server_home)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .find(|path| self.is_server_binary(path))
    }

    fn is_server_binary(&self, path: &Path) -> bool {
        let named_like_binary = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&self.descriptor.name));
        let packaging = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| PACKAGING_EXTENSIONS.contains(&e));
        named_like_binary && !packaging
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use xmlls_core::Severity;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Notice>>);

    impl Notifier for Recorder {
        fn notify(&self, notice: Notice) {
            self.0.lock().unwrap().push(notice);
        }
    }

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    fn linux() -> Platform {
        Platform::from_os("linux")
    }

    #[test]
    fn empty_home_needs_download() {
        let home = tempfile::tempdir().unwrap();
        let resolver = BinaryResolver::new(&linux(), home.path());
        assert_eq!(
            resolver.resolve(),
            Resolution::NeedsDownload {
                install_path: home.path().join("lemminx-linux")
            }
        );
    }

    #[test]
    fn missing_home_needs_download() {
        let home = tempfile::tempdir().unwrap();
        let resolver = BinaryResolver::new(&linux(), home.path().join("server"));
        assert!(matches!(resolver.resolve(), Resolution::NeedsDownload { .. }));
    }

    #[test]
    fn packaging_artifacts_are_skipped() {
        let home = tempfile::tempdir().unwrap();
        touch(&home.path().join("lemminx-linux.sha256"));
        touch(&home.path().join("lemminx-linux.zip"));
        touch(&home.path().join("org.eclipse.lemminx-uber.jar"));
        let resolver = BinaryResolver::new(&linux(), home.path());
        assert!(matches!(resolver.resolve(), Resolution::NeedsDownload { .. }));

        touch(&home.path().join("nested").join("lemminx-linux-0.27.0"));
        assert_eq!(
            resolver.resolve(),
            Resolution::Found {
                path: home.path().join("nested").join("lemminx-linux-0.27.0"),
                source: BinarySource::Installed,
            }
        );
    }

    #[test]
    fn first_match_in_sorted_order_wins() {
        let home = tempfile::tempdir().unwrap();
        touch(&home.path().join("lemminx-linux-b"));
        touch(&home.path().join("lemminx-linux-a"));
        let resolver = BinaryResolver::new(&linux(), home.path());
        assert!(matches!(
            resolver.resolve(),
            Resolution::Found { path, .. } if path.ends_with("lemminx-linux-a")
        ));
    }

    #[test]
    fn existing_override_is_used_as_is() {
        let home = tempfile::tempdir().unwrap();
        let custom = home.path().join("custom-server");
        touch(&custom);
        let resolver = BinaryResolver::new(&linux(), home.path()).with_override(Some(custom.clone()));
        assert_eq!(
            resolver.resolve(),
            Resolution::Found {
                path: custom,
                source: BinarySource::UserOverride,
            }
        );
    }

    #[test]
    fn missing_override_warns_and_falls_through() {
        let home = tempfile::tempdir().unwrap();
        touch(&home.path().join("lemminx-linux"));
        let recorder = Arc::new(Recorder::default());
        let resolver = BinaryResolver::new(&linux(), home.path())
            .with_override(Some(home.path().join("gone")))
            .with_notifier(recorder.clone());

        assert!(matches!(
            resolver.resolve(),
            Resolution::Found { source: BinarySource::Installed, .. }
        ));
        let notices = recorder.0.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].severity, Severity::Warning);
    }
}
