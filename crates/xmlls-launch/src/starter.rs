//! Choosing between the native binary and the Java server.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use xmlls_core::{
    DownloadManifest, ExecutableSpec, Notice, Notifier, Platform, Remediation, Result,
    TracingNotifier, XmlLsError,
};
use xmlls_fetch::{ArchiveFetcher, CancellationToken};
use xmlls_trust::TrustVerifier;

use crate::jvm::JavaLauncher;
use crate::native::NativeLauncher;
use crate::requirements::{openjdk_download_link, RequirementsData};
use crate::resolver::{BinaryResolver, Resolution};

/// Which server flavour to launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchKind {
    /// Native binary
    Binary,
    /// Jar on a Java runtime
    Java,
}

impl LaunchKind {
    /// The binary runs when there is no Java, or when it is preferred and no
    /// Java extensions need loading.
    #[must_use]
    pub const fn choose(has_java: bool, prefer_binary: bool, has_extensions: bool) -> Self {
        if !has_java || (prefer_binary && !has_extensions) {
            Self::Binary
        } else {
            Self::Java
        }
    }
}

/// Launch preferences
#[derive(Debug, Clone, Copy, Default)]
pub struct StarterOptions {
    /// Use the binary even when Java is available
    pub prefer_binary: bool,
    /// Do not warn about extensions that need Java
    pub silence_extension_warning: bool,
}

/// Where the binary is downloaded from
#[derive(Debug, Clone, Default)]
pub enum DownloadSource {
    /// No download possible
    #[default]
    None,
    /// A fixed URL
    Url(String),
    /// Per-platform URLs
    Manifest(DownloadManifest),
}

/// Produces the [`ExecutableSpec`] for the server, acquiring and verifying
/// the native binary when that is the flavour to run.
pub struct ServerStarter {
    platform: Platform,
    resolver: BinaryResolver,
    fetcher: ArchiveFetcher,
    download: DownloadSource,
    verifier: Arc<TrustVerifier>,
    native: NativeLauncher,
    java: JavaLauncher,
    options: StarterOptions,
    notifier: Arc<dyn Notifier>,
}

impl ServerStarter {
    /// Assemble a starter from its collaborators
    pub fn new(
        resolver: BinaryResolver,
        fetcher: ArchiveFetcher,
        verifier: Arc<TrustVerifier>,
        native: NativeLauncher,
        java: JavaLauncher,
    ) -> Self {
        Self {
            platform: Platform::current(),
            resolver,
            fetcher,
            download: DownloadSource::None,
            verifier,
            native,
            java,
            options: StarterOptions::default(),
            notifier: Arc::new(TracingNotifier),
        }
    }

    /// Target platform, for download keys and links
    #[must_use]
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Where to download a missing binary from
    #[must_use]
    pub fn download(mut self, source: DownloadSource) -> Self {
        self.download = source;
        self
    }

    /// Launch preferences
    #[must_use]
    pub const fn options(mut self, options: StarterOptions) -> Self {
        self.options = options;
        self
    }

    /// Where notices go
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// The Java launcher, for session checks such as argument drift
    #[must_use]
    pub const fn java_launcher(&self) -> &JavaLauncher {
        &self.java
    }

    /// Produce the launch description.
    ///
    /// `requirements` is `None` when no usable Java runtime was found. A
    /// failed binary launch falls back to Java when it is available.
    pub async fn prepare_executable(
        &self,
        requirements: Option<&RequirementsData>,
        extension_jars: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Result<ExecutableSpec> {
        let has_java = requirements.is_some();
        let has_extensions = !extension_jars.is_empty();

        if has_extensions && !has_java && !self.options.silence_extension_warning {
            self.notifier.notify(
                Notice::warning(
                    "Extensions to the XML language server were detected, but no Java was found. \
                     In order to use these extensions, please install and configure a Java runtime \
                     (Java 11 or more recent).",
                )
                .with_action(self.jdk_link())
                .with_action(Remediation::OpenSettings("silence_extension_warning".to_string())),
            );
        }

        let kind = LaunchKind::choose(has_java, self.options.prefer_binary, has_extensions);
        info!(?kind, has_java, has_extensions, "preparing XML language server");

        let Some(requirements) = requirements else {
            return self.prepare_binary(cancel).await.map_err(|e| {
                self.report_binary_failure(&e, false);
                XmlLsError::config_with(
                    "Failed to launch binary XML language server and no Java is installed",
                    self.jdk_link(),
                )
            });
        };

        if kind == LaunchKind::Binary {
            match self.prepare_binary(cancel).await {
                Ok(spec) => return Ok(spec),
                Err(e) => self.report_binary_failure(&e, true),
            }
        }
        self.prepare_java(requirements, extension_jars)
    }

    /// Resolve, download if needed, verify, and describe the native binary
    pub async fn prepare_binary(&self, cancel: &CancellationToken) -> Result<ExecutableSpec> {
        let path = self.acquire_binary(cancel).await?;
        if !self.verifier.verify(&path).await {
            return Err(XmlLsError::UntrustedBinary { path });
        }
        Ok(self.native.prepare(&path))
    }

    /// Resolve the native binary, downloading it when nothing is on disk
    pub async fn acquire_binary(&self, cancel: &CancellationToken) -> Result<PathBuf> {
        match self.resolver.resolve() {
            Resolution::Found { path, .. } => Ok(path),
            Resolution::NeedsDownload { install_path } => {
                let url = self.download_url()?;
                self.fetcher.fetch(&url, &install_path, cancel).await
            }
        }
    }

    /// Describe the Java server; a missing jar is a configuration fault
    pub fn prepare_java(
        &self,
        requirements: &RequirementsData,
        extension_jars: &[PathBuf],
    ) -> Result<ExecutableSpec> {
        self.java.prepare(requirements, extension_jars).ok_or_else(|| {
            XmlLsError::config_with(
                "The XML language server jar could not be found",
                Remediation::OpenSettings("server_home".to_string()),
            )
        })
    }

    fn download_url(&self) -> Result<String> {
        let url = match &self.download {
            DownloadSource::None => None,
            DownloadSource::Url(url) => Some(url.as_str()),
            DownloadSource::Manifest(manifest) => manifest.url_for(&self.platform),
        };
        url.map(str::to_string).ok_or_else(|| {
            XmlLsError::config_with(
                format!(
                    "No download location for the {} server binary",
                    self.platform.download_key()
                ),
                Remediation::OpenSettings("download_url".to_string()),
            )
        })
    }

    fn report_binary_failure(&self, error: &XmlLsError, has_java: bool) {
        let follow_up = if has_java {
            "Falling back to the Java server."
        } else {
            "Cannot start XML language server, since Java is missing."
        };
        let message = format!("{error}. {follow_up}");
        warn!(error = %error, has_java, "binary XML language server unavailable");
        let mut notice = if error.is_aborted() {
            Notice::warning(message)
        } else {
            Notice::error(message)
        };
        // only reached with Java present when the binary was preferred
        if has_java {
            notice = notice.with_action(Remediation::FallBackToRuntime);
        }
        self.notifier.notify(notice);
    }

    fn jdk_link(&self) -> Remediation {
        Remediation::OpenUrl {
            label: "Get Java".to_string(),
            url: openjdk_download_link(&self.platform).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;
    use xmlls_core::Severity;
    use xmlls_trust::{NonInteractive, TrustStore};

    const HELLO_DIGEST: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Notice>>);

    impl Notifier for Recorder {
        fn notify(&self, notice: Notice) {
            self.0.lock().unwrap().push(notice);
        }
    }

    impl Recorder {
        fn severities(&self) -> Vec<Severity> {
            self.0.lock().unwrap().iter().map(|n| n.severity).collect()
        }
    }

    struct Fixture {
        home: tempfile::TempDir,
        recorder: Arc<Recorder>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                home: tempfile::tempdir().unwrap(),
                recorder: Arc::new(Recorder::default()),
            }
        }

        fn with_binary(self) -> Self {
            std::fs::write(self.home.path().join("lemminx-linux"), "hello world").unwrap();
            self
        }

        fn with_jar(self) -> Self {
            std::fs::write(self.home.path().join("org.eclipse.lemminx-uber.jar"), "").unwrap();
            self
        }

        fn starter(&self, trusted: &[&str], options: StarterOptions) -> ServerStarter {
            let platform = Platform::from_os("linux");
            let resolver = BinaryResolver::new(&platform, self.home.path());
            let verifier = TrustVerifier::new(
                Arc::new(TrustStore::in_memory(trusted.iter().copied())),
                Arc::new(NonInteractive),
                resolver.descriptor(),
            );
            let java = JavaLauncher::new(self.home.path(), self.home.path().join("dumps"))
                .platform(platform.clone());
            ServerStarter::new(
                resolver,
                ArchiveFetcher::new().unwrap(),
                Arc::new(verifier),
                NativeLauncher::new(""),
                java,
            )
            .platform(platform)
            .options(options)
            .notifier(self.recorder.clone())
        }
    }

    fn java() -> RequirementsData {
        RequirementsData {
            java_home: PathBuf::from("/opt/jdk"),
            java_version: 17,
        }
    }

    #[test]
    fn launch_kind_decision_table() {
        assert_eq!(LaunchKind::choose(false, false, false), LaunchKind::Binary);
        assert_eq!(LaunchKind::choose(false, false, true), LaunchKind::Binary);
        assert_eq!(LaunchKind::choose(true, false, false), LaunchKind::Java);
        assert_eq!(LaunchKind::choose(true, true, false), LaunchKind::Binary);
        assert_eq!(LaunchKind::choose(true, true, true), LaunchKind::Java);
    }

    #[tokio::test]
    async fn trusted_binary_without_java() {
        let f = Fixture::new().with_binary();
        let spec = f
            .starter(&[HELLO_DIGEST], StarterOptions::default())
            .prepare_executable(None, &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(spec.command, f.home.path().join("lemminx-linux"));
        assert!(f.recorder.severities().is_empty());
    }

    #[tokio::test]
    async fn untrusted_binary_falls_back_to_java() {
        let f = Fixture::new().with_binary().with_jar();
        let options = StarterOptions {
            prefer_binary: true,
            ..StarterOptions::default()
        };
        let spec = f
            .starter(&[], options)
            .prepare_executable(Some(&java()), &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(spec.command, Path::new("/opt/jdk/bin/java"));
        assert_eq!(f.recorder.severities(), [Severity::Error]);
        let notice = f.recorder.0.lock().unwrap()[0].clone();
        assert!(notice.message.ends_with("Falling back to the Java server."));
        assert_eq!(notice.actions, [Remediation::FallBackToRuntime]);
    }

    #[tokio::test]
    async fn binary_failure_without_java_is_configuration_fault() {
        let f = Fixture::new().with_binary();
        let err = f
            .starter(&[], StarterOptions::default())
            .prepare_executable(None, &[], &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "Failed to launch binary XML language server and no Java is installed"
        );
        assert_eq!(f.recorder.severities(), [Severity::Error]);
        assert!(f.recorder.0.lock().unwrap()[0].actions.is_empty());
    }

    #[tokio::test]
    async fn cancelled_download_is_a_warning() {
        let f = Fixture::new().with_jar();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let options = StarterOptions {
            prefer_binary: true,
            ..StarterOptions::default()
        };
        let spec = f
            .starter(&[], options)
            .download(DownloadSource::Url("http://127.0.0.1:9/lemminx.zip".to_string()))
            .prepare_executable(Some(&java()), &[], &cancel)
            .await
            .unwrap();

        assert_eq!(spec.command, Path::new("/opt/jdk/bin/java"));
        assert_eq!(f.recorder.severities(), [Severity::Warning]);
    }

    #[tokio::test]
    async fn extensions_without_java_warn_unless_silenced() {
        let f = Fixture::new().with_binary();
        let ext = [PathBuf::from("ext.jar")];

        f.starter(&[HELLO_DIGEST], StarterOptions::default())
            .prepare_executable(None, &ext, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(f.recorder.severities(), [Severity::Warning]);

        let silenced = StarterOptions {
            silence_extension_warning: true,
            ..StarterOptions::default()
        };
        f.starter(&[HELLO_DIGEST], silenced)
            .prepare_executable(None, &ext, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(f.recorder.severities().len(), 1);
    }

    #[tokio::test]
    async fn java_preferred_when_extensions_present() {
        let f = Fixture::new().with_binary().with_jar();
        let options = StarterOptions {
            prefer_binary: true,
            ..StarterOptions::default()
        };
        let spec = f
            .starter(&[HELLO_DIGEST], options)
            .prepare_executable(Some(&java()), &[PathBuf::from("ext.jar")], &CancellationToken::new())
            .await
            .unwrap();

        assert!(spec.args.last().is_some_and(|a| a == crate::jvm::SERVER_MAIN_CLASS));
    }

    #[tokio::test]
    async fn missing_download_location_is_reported() {
        let f = Fixture::new();
        let err = f
            .starter(&[], StarterOptions::default())
            .acquire_binary(&CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_configuration());
        assert!(err.to_string().contains("linux"));
    }

    #[tokio::test]
    async fn missing_jar_is_configuration_fault() {
        let f = Fixture::new();
        let err = f.starter(&[], StarterOptions::default()).prepare_java(&java(), &[]).unwrap_err();
        assert!(err.is_configuration());
    }
}
