//! Terminal renderings of the library's host capabilities.
//!
//! Everything here writes to stderr: under `xmlls run` stdout carries the
//! language server protocol.

mod notifier;
mod progress;
mod prompt;

pub use notifier::ConsoleNotifier;
pub use progress::DownloadBar;
pub use prompt::ConsolePrompt;
