//! User-facing notices.
//!
//! The host (an editor, or the `xmlls` CLI) decides how a notice is shown.
//! Library code only ever talks to a [`Notifier`].

use std::fmt;

use crate::error::Remediation;

/// How prominently a notice should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational
    Info,
    /// Recoverable problem
    Warning,
    /// Failure the user should act on
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A message for the user, with optional follow-up actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub severity: Severity,
    /// Message text
    pub message: String,
    /// Actions to offer next to the message
    pub actions: Vec<Remediation>,
}

impl Notice {
    /// An informational notice
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// A warning notice
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// An error notice
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            actions: Vec::new(),
        }
    }

    /// Attach an action
    #[must_use]
    pub fn with_action(mut self, action: Remediation) -> Self {
        self.actions.push(action);
        self
    }
}

/// Capability to surface notices to the user
pub trait Notifier: Send + Sync {
    /// Show a notice
    fn notify(&self, notice: Notice);
}

/// Notifier that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Info => tracing::info!(actions = notice.actions.len(), "{}", notice.message),
            Severity::Warning => tracing::warn!(actions = notice.actions.len(), "{}", notice.message),
            Severity::Error => tracing::error!(actions = notice.actions.len(), "{}", notice.message),
        }
    }
}
