//! Resolution and launch descriptions for the LemMinX XML language server.
//!
//! This crate decides *what* to run:
//!
//! - [`BinaryResolver`] finds the native binary on disk or names its install path
//! - [`JavaLocator`] finds a Java runtime and its version
//! - [`NativeLauncher`] and [`JavaLauncher`] turn either into an [`ExecutableSpec`]
//! - [`ServerStarter`] picks the flavour and falls back from the binary to Java
//!
//! # Example
//!
//! ```rust,ignore
//! use xmlls_launch::{JavaLocator, ServerStarter};
//!
//! let requirements = JavaLocator::new(platform).resolve().await.ok();
//! let spec = starter
//!     .prepare_executable(requirements.as_ref(), &extension_jars, &cancel)
//!     .await?;
//! ```
//!
//! [`ExecutableSpec`]: xmlls_core::ExecutableSpec

#![doc(html_root_url = "https://docs.rs/xmlls-launch/0.1.0")]

pub mod args;
pub mod jvm;
mod native;
pub mod requirements;
mod resolver;
mod starter;

pub use jvm::{DebugMode, JavaLauncher, SERVER_MAIN_CLASS};
pub use native::NativeLauncher;
pub use requirements::{JavaLocator, RequirementsData, MIN_JAVA_VERSION};
pub use resolver::{BinaryResolver, BinarySource, Resolution};
pub use starter::{DownloadSource, LaunchKind, ServerStarter, StarterOptions};
