//! Bootstrapper for the LemMinX XML language server.
//!
//! Finds or downloads the native server binary, checks its SHA-256 against
//! the user's trusted hashes, falls back to the Java server when needed and
//! keeps the chosen process running.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use xmlls::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> xmlls::Result<()> {
//!     let platform = Platform::current();
//!     let resolver = BinaryResolver::new(&platform, "/opt/xmlls/server");
//!     let store = Arc::new(TrustStore::open("/home/me/.config/xmlls/trusted-hashes.toml").await?);
//!     let verifier = TrustVerifier::new(store, Arc::new(NonInteractive), resolver.descriptor());
//!     let java = JavaLauncher::new("/opt/xmlls/server", "/tmp/xmlls");
//!
//!     let starter = ServerStarter::new(
//!         resolver,
//!         ArchiveFetcher::new()?,
//!         Arc::new(verifier),
//!         NativeLauncher::new(""),
//!         java,
//!     )
//!     .download(DownloadSource::Url("https://example.org/lemminx-linux.zip".into()));
//!
//!     let requirements = JavaLocator::new(platform).resolve().await.ok();
//!     let cancel = CancellationToken::new();
//!     let spec = starter.prepare_executable(requirements.as_ref(), &[], &cancel).await?;
//!
//!     let (supervisor, mut handle) = ServerSupervisor::builder(spec).build();
//!     tokio::spawn(supervisor.run());
//!     let channel = handle.next_channel().await;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Uses rustls for TLS
//! - `rustls` - Use rustls for TLS (recommended)
//! - `native-tls` - Use system native TLS

#![doc(html_root_url = "https://docs.rs/xmlls/0.1.0")]

// Re-export core types
pub use xmlls_core::*;

pub use xmlls_fetch as fetch;
pub use xmlls_launch as launch;
pub use xmlls_supervisor as supervisor;
pub use xmlls_trust as trust;

pub use xmlls_fetch::{ArchiveFetcher, ArchiveFetcherBuilder, NoProgress, ProgressReporter};
pub use xmlls_launch::{
    BinaryResolver, DownloadSource, JavaLauncher, JavaLocator, NativeLauncher, ServerStarter,
};
pub use xmlls_supervisor::{ServerState, ServerSupervisor, SupervisorHandle};
pub use xmlls_trust::{TrustPrompt, TrustStore, TrustVerifier};

// Re-export runtime for convenience
pub use tokio;
pub use tokio_util::sync::CancellationToken;

/// Everything needed to bootstrap a server in one import
pub mod prelude {
    pub use crate::{
        ArchiveFetcher, BinaryResolver, CancellationToken, DownloadSource, JavaLauncher,
        JavaLocator, NativeLauncher, Platform, ServerStarter, ServerSupervisor, TrustStore,
        TrustVerifier,
    };
    pub use xmlls_trust::NonInteractive;
}
