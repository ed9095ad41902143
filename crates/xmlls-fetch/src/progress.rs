use xmlls_core::DownloadProgress;

/// Receives download progress, once per received chunk
pub trait ProgressReporter: Send + Sync {
    /// A chunk was received
    fn report(&self, progress: DownloadProgress);

    /// The transfer ended, successfully or not
    fn finish(&self) {}
}

/// Reporter that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _progress: DownloadProgress) {}
}
