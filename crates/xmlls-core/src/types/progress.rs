use serde::Serialize;

/// One progress report for a running download
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DownloadProgress {
    /// Bytes received so far
    pub downloaded: u64,
    /// Declared content length, if the server sent one
    pub total: Option<u64>,
    /// Percentage complete, when `total` is known
    pub percent: Option<f64>,
    /// Percentage points gained since the previous report
    pub increment: f64,
}

/// Turns a stream of chunk sizes into [`DownloadProgress`] reports.
///
/// The increment is computed against the last reported percentage so that
/// summing every increment yields the current percentage.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    downloaded: u64,
    total: Option<u64>,
    reported_percent: f64,
}

impl ProgressTracker {
    /// Tracker for a body of `total` bytes (`None` or `Some(0)` if unknown)
    #[must_use]
    pub fn new(total: Option<u64>) -> Self {
        Self {
            downloaded: 0,
            total: total.filter(|t| *t > 0),
            reported_percent: 0.0,
        }
    }

    /// Account for a received chunk and produce the next report
    #[allow(clippy::cast_precision_loss)]
    pub fn advance(&mut self, chunk_len: usize) -> DownloadProgress {
        self.downloaded += chunk_len as u64;
        let percent = self
            .total
            .map(|total| 100.0 * self.downloaded as f64 / total as f64);
        let increment = percent.map_or(0.0, |p| p - self.reported_percent);
        self.reported_percent += increment;
        DownloadProgress {
            downloaded: self.downloaded,
            total: self.total,
            percent,
            increment,
        }
    }

    /// Bytes received so far
    #[must_use]
    pub const fn downloaded(&self) -> u64 {
        self.downloaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_sum_to_percent() {
        let mut tracker = ProgressTracker::new(Some(200));
        let first = tracker.advance(50);
        assert_eq!(first.percent, Some(25.0));
        assert!((first.increment - 25.0).abs() < f64::EPSILON);

        let second = tracker.advance(150);
        assert_eq!(second.percent, Some(100.0));
        assert!((second.increment - 75.0).abs() < f64::EPSILON);
        assert_eq!(second.downloaded, 200);
    }

    #[test]
    fn unknown_length_reports_bytes_only() {
        let mut tracker = ProgressTracker::new(Some(0));
        let p = tracker.advance(1024);
        assert_eq!(p.total, None);
        assert_eq!(p.percent, None);
        assert!(p.increment.abs() < f64::EPSILON);
        assert_eq!(tracker.downloaded(), 1024);
    }
}
