use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for bootstrapper operations
pub type Result<T> = std::result::Result<T, XmlLsError>;

/// Errors that can occur while acquiring, verifying or running the server
#[derive(Error, Debug)]
pub enum XmlLsError {
    /// No runtime or server artifact could be resolved.
    ///
    /// User-actionable and never fatal to the host.
    #[error("{message}")]
    Configuration {
        /// What is missing or misconfigured
        message: String,
        /// Suggested way out for the user
        remediation: Option<Remediation>,
    },

    /// Network or extraction failure while downloading the server
    #[error("server binary download failed: {0}")]
    Download(String),

    /// Download endpoint answered with an unsupported status
    #[error("server binary download failed: status code {status}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
    },

    /// Downloaded archive does not hold exactly one entry
    #[error("expected exactly 1 file in the downloaded server archive, found {count}")]
    TooManyEntries {
        /// Number of entries found in the archive
        count: usize,
    },

    /// Download cancelled by the user
    #[error("XML language server download cancelled by user")]
    Aborted,

    /// The user declined (or dismissed) trusting the binary
    #[error("the binary XML language server {} is not trusted", path.display())]
    UntrustedBinary {
        /// Path of the rejected binary
        path: PathBuf,
    },

    /// The server crashed too often within the restart window
    #[error("the {name} language server crashed {crashes} times in the last {window_secs} seconds and will not be restarted")]
    CrashLoop {
        /// Display name of the server
        name: String,
        /// Number of crashes inside the window
        crashes: usize,
        /// Width of the window in seconds
        window_secs: u64,
    },

    /// Proxy settings are not in the expected format
    #[error("invalid proxy settings: {0}")]
    Proxy(String),

    /// Filesystem failure
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being accessed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An action offered to the user alongside an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remediation {
    /// Retry the launch with the managed runtime instead of the binary
    FallBackToRuntime,
    /// Open the settings entry with the given key
    OpenSettings(String),
    /// Open a link in a browser
    OpenUrl {
        /// Button label
        label: String,
        /// Target URL
        url: String,
    },
}

impl XmlLsError {
    /// Build a configuration fault without remediation
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            remediation: None,
        }
    }

    /// Build a configuration fault with a suggested remediation
    pub fn config_with(message: impl Into<String>, remediation: Remediation) -> Self {
        Self::Configuration {
            message: message.into(),
            remediation: Some(remediation),
        }
    }

    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Returns true if re-invoking the download may succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Download(_) | Self::HttpStatus { .. } | Self::TooManyEntries { .. }
        )
    }

    /// Returns true if the user cancelled; not to be reported as a failure
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Returns true for user-actionable configuration faults
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Proxy(_))
    }

    /// Returns true if the error ends the whole server session
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::CrashLoop { .. })
    }

    /// The action to offer the user, if any
    #[must_use]
    pub const fn remediation(&self) -> Option<&Remediation> {
        match self {
            Self::Configuration { remediation, .. } => remediation.as_ref(),
            _ => None,
        }
    }
}
