//! # xmlls-cli
//!
//! Terminal host for the LemMinX XML language server.
//!
//! ## Features
//!
//! - **Install**: resolve or download the native server binary
//! - **Trust**: SHA-256 allow-list with an interactive confirmation prompt
//! - **Inspect**: print the exact command line the server would run with
//! - **Run**: supervise the server and bridge it to this process's stdio
//! - **Output formats**: pretty text or JSON

pub mod cli;
pub mod config;
pub mod output;
pub mod ui;

pub use cli::run;
