//! Core types and errors for the XML language server bootstrapper.
//!
//! This crate provides the foundational types shared by the other `xmlls`
//! crates:
//!
//! - **Types**: platform naming, executable specs, download manifests,
//!   download progress
//! - **Proxy**: host proxy settings and their renderings for child processes
//! - **Notices**: the [`Notifier`] capability used for user-facing messages
//! - **Errors**: one error taxonomy, [`XmlLsError`]
//!
//! # Example
//!
//! ```rust,ignore
//! use xmlls_core::{Platform, Result};
//!
//! fn install_name() -> Result<String> {
//!     let platform = Platform::current();
//!     Ok(platform.binary_file_name())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/xmlls-core/0.1.0")]

mod error;
mod notify;
pub mod proxy;
pub mod types;

pub use error::{Remediation, Result, XmlLsError};
pub use notify::{Notice, Notifier, Severity, TracingNotifier};
pub use proxy::{ProxyAuthorization, ProxySettings};
pub use types::*;
