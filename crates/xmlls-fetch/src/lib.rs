//! Download of the LemMinX server binary.
//!
//! This crate provides the [`ArchiveFetcher`], which downloads the server
//! binary over HTTP(S) and installs it at its canonical path. The download
//! endpoint answers with either a single-entry zip archive or the raw binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use tokio_util::sync::CancellationToken;
//! use xmlls_fetch::ArchiveFetcher;
//!
//! let fetcher = ArchiveFetcher::builder().build()?;
//! let path = fetcher
//!     .fetch(url, &install_path, &CancellationToken::new())
//!     .await?;
//! ```

#![doc(html_root_url = "https://docs.rs/xmlls-fetch/0.1.0")]

mod extract;
mod fetcher;
mod progress;

pub use fetcher::{ArchiveFetcher, ArchiveFetcherBuilder, MAX_REDIRECTS};
pub use progress::{NoProgress, ProgressReporter};
pub use tokio_util::sync::CancellationToken;
pub use xmlls_core::{DownloadProgress, Result, XmlLsError};
