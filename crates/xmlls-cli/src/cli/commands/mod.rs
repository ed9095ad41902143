//! Command implementations.

pub mod config;
pub mod fetch;
pub mod resolve;
pub mod run;
pub mod spec;
pub mod trust;
pub mod verify;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;
use xmlls::launch::{DebugMode, DownloadSource, RequirementsData, StarterOptions};
use xmlls::{
    ArchiveFetcher, BinaryResolver, CancellationToken, ExecutableSpec, JavaLauncher, JavaLocator,
    NativeLauncher, Notice, Notifier, Platform, ProgressReporter, ServerStarter, TrustStore,
    TrustVerifier,
};

use super::args::LaunchArgs;
use crate::config::{Config, Paths};
use crate::output::OutputFormat;
use crate::ui::{ConsoleNotifier, ConsolePrompt, DownloadBar};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded configuration
    pub config: Config,

    /// Files owned by the CLI
    pub paths: Paths,

    /// Output format
    pub output_format: OutputFormat,

    /// Verbose output
    pub verbose: bool,

    /// Cancelled when the user presses Ctrl-C
    pub interrupt: CancellationToken,
}

/// Token cancelled on the first Ctrl-C; a second one exits at once.
///
/// Cancelling lets downloads remove their staging files and a running
/// server be stopped cleanly.
pub fn interrupt_token() -> CancellationToken {
    let token = cancel_when(async { tokio::signal::ctrl_c().await.is_ok() });
    let forced = token.clone();
    tokio::spawn(async move {
        forced.cancelled().await;
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
    token
}

/// Token cancelled once `signal` resolves to true
fn cancel_when<F>(signal: F) -> CancellationToken
where
    F: Future<Output = bool> + Send + 'static,
{
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        if signal.await {
            debug!("interrupted, cancelling");
            cancel.cancel();
        }
    });
    token
}

impl Context {
    /// Where notices are shown.
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::new(ConsoleNotifier)
    }

    /// Host platform.
    pub fn platform(&self) -> Platform {
        Platform::current()
    }

    /// Server installation directory.
    pub fn server_home(&self) -> PathBuf {
        self.config.server_home(&self.paths)
    }

    /// Binary resolver honouring the `binary_path` override.
    pub fn resolver(&self) -> BinaryResolver {
        BinaryResolver::new(&self.platform(), self.server_home())
            .with_override(self.config.binary_path())
            .with_notifier(self.notifier())
    }

    /// Download URL for this platform, if one is configured.
    pub fn download_url(&self) -> Result<Option<String>> {
        Ok(match self.config.download_source()? {
            DownloadSource::None => None,
            DownloadSource::Url(url) => Some(url),
            DownloadSource::Manifest(manifest) => manifest.url_for(&self.platform()).map(str::to_string),
        })
    }

    /// Fetcher using the configured proxy.
    pub fn fetcher(&self, progress: Arc<dyn ProgressReporter>) -> Result<ArchiveFetcher> {
        Ok(ArchiveFetcher::builder()
            .proxy(self.config.proxy_settings()?)
            .progress(progress)
            .build()?)
    }

    /// The persisted trust list.
    pub async fn trust_store(&self) -> Result<Arc<TrustStore>> {
        Ok(Arc::new(TrustStore::open(&self.paths.trust_file).await?))
    }

    /// Verifier asking on the terminal.
    pub async fn verifier(&self, resolver: &BinaryResolver) -> Result<Arc<TrustVerifier>> {
        let verifier = TrustVerifier::new(
            self.trust_store().await?,
            Arc::new(ConsolePrompt),
            resolver.descriptor(),
        )
        .with_package_root(self.server_home());
        Ok(Arc::new(verifier))
    }

    /// Java runtime, or `None` when there is no usable one.
    ///
    /// A broken `java_home` setting is reported; a machine without Java is not.
    pub async fn requirements(&self) -> Option<RequirementsData> {
        let locator = JavaLocator::new(self.platform()).with_java_home(self.config.java_home());
        match locator.resolve().await {
            Ok(requirements) => Some(requirements),
            Err(e) if self.config.java_home.is_some() => {
                let mut notice = Notice::warning(e.to_string());
                if let Some(action) = e.remediation() {
                    notice = notice.with_action(action.clone());
                }
                self.notifier().notify(notice);
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "no usable Java runtime");
                None
            }
        }
    }

    /// Starter wired from the configuration.
    pub async fn starter(&self) -> Result<ServerStarter> {
        let resolver = self.resolver();
        let verifier = self.verifier(&resolver).await?;
        let proxy = self.config.proxy_settings()?;

        let native = NativeLauncher::new(self.config.binary_args.clone()).proxy(proxy.clone());
        let java = JavaLauncher::new(self.server_home(), self.paths.heap_dump_dir())
            .vmargs(self.config.vmargs.clone())
            .proxy(proxy)
            .debug(DebugMode::from_env())
            .notifier(self.notifier());
        let options = StarterOptions {
            prefer_binary: self.config.prefer_binary,
            silence_extension_warning: self.config.silence_extension_warning,
        };
        let progress = Arc::new(DownloadBar::new("Downloading XML language server"));

        Ok(ServerStarter::new(resolver, self.fetcher(progress)?, verifier, native, java)
            .platform(self.platform())
            .download(self.config.download_source()?)
            .options(options)
            .notifier(self.notifier()))
    }

    /// Build the launch description, restricted to one flavour when asked.
    pub async fn prepare(&self, launch: &LaunchArgs) -> Result<(ServerStarter, ExecutableSpec)> {
        let starter = self.starter().await?;
        let cancel = &self.interrupt;
        let extension_jars = self.config.extension_jars();

        let spec = if launch.binary {
            starter.prepare_binary(cancel).await?
        } else {
            let requirements = self.requirements().await;
            if launch.java {
                let requirements = requirements.ok_or_else(|| {
                    anyhow::anyhow!(
                        "No usable Java runtime found.\n\n\
                         Set one with:\n  \
                         xmlls config set java_home <PATH>"
                    )
                })?;
                starter.prepare_java(&requirements, &extension_jars)?
            } else {
                starter
                    .prepare_executable(requirements.as_ref(), &extension_jars, cancel)
                    .await?
            }
        };
        Ok((starter, spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn signal_cancels_the_token() {
        let token = cancel_when(async { true });
        tokio::time::timeout(Duration::from_secs(5), token.cancelled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failed_signal_listener_leaves_the_token_alone() {
        let token = cancel_when(async { false });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!token.is_cancelled());
    }
}
