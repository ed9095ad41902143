use std::sync::Once;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use xmlls::{DownloadProgress, ProgressReporter};

/// Download progress bar on stderr
#[derive(Debug)]
pub struct DownloadBar {
    bar: ProgressBar,
    shown: Once,
}

impl DownloadBar {
    /// A bar labelled with `message`; it stays hidden until the first chunk.
    pub fn new(message: impl Into<String>) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_message(message.into());
        Self {
            bar,
            shown: Once::new(),
        }
    }

    fn show(&self, total: Option<u64>) {
        let template = if total.is_some() {
            "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})"
        } else {
            "{spinner:.green} {msg} {bytes} ({bytes_per_sec})"
        };
        let style = ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        self.bar.set_style(style);
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
    }
}

impl ProgressReporter for DownloadBar {
    fn report(&self, progress: DownloadProgress) {
        self.shown.call_once(|| self.show(progress.total));
        if let Some(total) = progress.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(progress.downloaded);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
