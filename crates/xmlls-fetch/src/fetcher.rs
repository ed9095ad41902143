//! HTTP download of the server binary.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client as HttpClient, Response, StatusCode};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;
use xmlls_core::{ProgressTracker, ProxySettings, Result, XmlLsError};

use crate::extract;
use crate::progress::{NoProgress, ProgressReporter};

/// Maximum number of `303 See Other` hops followed for one download
pub const MAX_REDIRECTS: usize = 10;

/// Content type announcing a zip archive
const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Default connect timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads the server binary and installs it at a target path
#[derive(Clone)]
pub struct ArchiveFetcher {
    inner: Arc<FetcherInner>,
}

struct FetcherInner {
    http: HttpClient,
    progress: Arc<dyn ProgressReporter>,
}

impl ArchiveFetcher {
    /// Create a fetcher with default settings
    pub fn new() -> Result<Self> {
        ArchiveFetcherBuilder::new().build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder() -> ArchiveFetcherBuilder {
        ArchiveFetcherBuilder::new()
    }

    /// Download `url` and install the server binary at `target`.
    ///
    /// A `200` with content type `application/zip` is extracted (the archive
    /// must hold exactly one entry); any other `200` body is the binary
    /// itself. `303` responses are followed. Every other status is an error.
    /// Cancelling `cancel` aborts the transfer with [`XmlLsError::Aborted`].
    /// No temporary file survives a failure, and `target` is only replaced
    /// once the new binary is complete.
    pub async fn fetch(
        &self,
        url: &str,
        target: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let result = self.download(url, target, cancel).await;
        self.inner.progress.finish();

        match &result {
            Ok(path) => info!(
                url,
                path = %path.display(),
                outcome = "succeeded",
                "server binary download finished"
            ),
            Err(e) if e.is_aborted() => {
                info!(url, outcome = "aborted", "server binary download cancelled");
            }
            Err(e) => warn!(url, outcome = "failed", error = %e, "server binary download failed"),
        }
        result
    }

    async fn download(&self, url: &str, target: &Path, cancel: &CancellationToken) -> Result<PathBuf> {
        let url = Url::parse(url).map_err(|e| XmlLsError::Download(format!("invalid URL {url}: {e}")))?;
        let response = self.open(url, cancel).await?;

        if let Some(dir) = target.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| XmlLsError::io(dir, e))?;
        }

        let target_path = target.to_path_buf();
        if is_zip(&response) {
            let archive = extract::staging_file(target, ".zip")?;
            self.stream_to(response, &archive, cancel).await?;
            debug!(archive = %archive.path().display(), "downloaded server archive");
            run_blocking(move || extract::install_from_zip(archive, &target_path)).await?;
        } else {
            let staged = extract::staging_file(target, "")?;
            self.stream_to(response, &staged, cancel).await?;
            run_blocking(move || extract::install(staged, &target_path)).await?;
        }

        Ok(target.to_path_buf())
    }

    /// Send the request, following `303` hops, until a `200` arrives
    async fn open(&self, url: Url, cancel: &CancellationToken) -> Result<Response> {
        let mut current = url;

        for _ in 0..=MAX_REDIRECTS {
            check_scheme(&current)?;
            debug!(url = %current, "GET request");

            let response = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(XmlLsError::Aborted),
                response = self.inner.http.get(current.clone()).send() => {
                    response.map_err(|e| XmlLsError::Download(e.to_string()))?
                }
            };

            match response.status() {
                StatusCode::OK => return Ok(response),
                StatusCode::SEE_OTHER => {
                    let location = response
                        .headers()
                        .get(LOCATION)
                        .and_then(|v| v.to_str().ok())
                        .ok_or_else(|| {
                            XmlLsError::Download("redirect without a Location header".to_string())
                        })?;
                    current = current.join(location).map_err(|e| {
                        XmlLsError::Download(format!("invalid redirect location {location}: {e}"))
                    })?;
                    debug!(location = %current, "following redirect");
                }
                status => {
                    return Err(XmlLsError::HttpStatus {
                        status: status.as_u16(),
                    })
                }
            }
        }

        Err(XmlLsError::Download(format!(
            "too many redirects (more than {MAX_REDIRECTS})"
        )))
    }

    /// Stream the response body into `staged`, reporting progress per chunk
    async fn stream_to(
        &self,
        response: Response,
        staged: &tempfile::NamedTempFile,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let path = staged.path();
        let handle = staged
            .as_file()
            .try_clone()
            .map_err(|e| XmlLsError::io(path, e))?;
        let mut file = tokio::fs::File::from_std(handle);

        let mut tracker = ProgressTracker::new(response.content_length());
        let mut stream = response.bytes_stream();

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(XmlLsError::Aborted),
                chunk = stream.next() => chunk,
            };
            let Some(chunk) = next else { break };
            let chunk = chunk.map_err(|e| XmlLsError::Download(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| XmlLsError::io(path, e))?;
            self.inner.progress.report(tracker.advance(chunk.len()));
        }

        file.flush().await.map_err(|e| XmlLsError::io(path, e))?;
        Ok(tracker.downloaded())
    }
}

fn check_scheme(url: &Url) -> Result<()> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(XmlLsError::Download(format!(
            "unsupported URL scheme '{other}' in {url}"
        ))),
    }
}

fn is_zip(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        == Some(ZIP_CONTENT_TYPE)
}

async fn run_blocking<F>(f: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| XmlLsError::Download(format!("installation task failed: {e}")))?
}

/// Builder for configuring an [`ArchiveFetcher`]
pub struct ArchiveFetcherBuilder {
    connect_timeout: Duration,
    timeout: Option<Duration>,
    user_agent: String,
    proxy: Option<ProxySettings>,
    progress: Arc<dyn ProgressReporter>,
}

impl ArchiveFetcherBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: None,
            user_agent: format!("xmlls/{}", env!("CARGO_PKG_VERSION")),
            proxy: None,
            progress: Arc::new(NoProgress),
        }
    }

    /// Set the connect timeout
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Bound the whole transfer, body included
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Route every request through a proxy
    #[must_use]
    pub fn proxy(mut self, proxy: Option<ProxySettings>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Receive progress reports
    #[must_use]
    pub fn progress(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress = reporter;
        self
    }

    /// Build the fetcher
    pub fn build(self) -> Result<ArchiveFetcher> {
        let mut http = HttpClient::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(&self.user_agent)
            .redirect(reqwest::redirect::Policy::none());

        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        if let Some(settings) = &self.proxy {
            let mut proxy = reqwest::Proxy::all(settings.url())
                .map_err(|e| XmlLsError::Proxy(e.to_string()))?;
            if let Some(auth) = &settings.auth {
                proxy = proxy.basic_auth(&auth.username, &auth.password);
            }
            debug!(host = %settings.host, port = %settings.port, "downloading through proxy");
            http = http.proxy(proxy);
        }

        let http = http
            .build()
            .map_err(|e| XmlLsError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(ArchiveFetcher {
            inner: Arc::new(FetcherInner {
                http,
                progress: self.progress,
            }),
        })
    }
}

impl Default for ArchiveFetcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
