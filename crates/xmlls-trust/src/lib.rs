//! # xmlls-trust
//!
//! Trust verification of the server binary before it is ever executed.
//!
//! A binary runs only when its SHA-256 digest is
//!
//! - in the user's allow-list ([`TrustStore`]), or
//! - equal to the digest in the `<name>.sha256` manifest shipped with it, or
//! - explicitly approved by the user through a [`TrustPrompt`], in which case
//!   the digest joins the allow-list.
//!
//! ## Data Flow
//!
//! ```text
//! digest_file(binary)
//!   -> TrustStore::contains      -> trusted
//!   -> manifest next to binary / package root -> trusted on match
//!   -> TrustPrompt (once per digest per session)
//!        Trust     -> TrustStore::add -> trusted
//!        otherwise -> rejected
//! ```

#![doc(html_root_url = "https://docs.rs/xmlls-trust/0.1.0")]

pub mod hash;
pub mod manifest;
pub mod prompt;
pub mod store;
pub mod verify;

pub use prompt::{untrusted_binary_message, NonInteractive, TrustDecision, TrustPrompt};
pub use store::{TrustStore, TRUST_FILE_NAME};
pub use verify::TrustVerifier;
