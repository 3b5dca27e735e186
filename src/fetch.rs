//! Remote stylesheet fetching.
//!
//! - [`Fetcher`]: transport seam (HTTP in production, in-memory in tests)
//! - [`HttpFetcher`]: `reqwest` client
//! - [`FetchQueue`]: every fetch started during scanning, awaited as a
//!   single fail-fast barrier before any bundle is built

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::task::JoinSet;
use url::Url;

use crate::error::{FetchError, PackError};
use crate::hash::ContentHash;

/// Transport used to download remote stylesheets.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// HTTP client for remote stylesheets.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a 30s request timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("csspack/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let url = Url::parse(url)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

/// Turn a remote href into a fetchable URL.
///
/// Protocol-relative hrefs (`//cdn/x.css`) get `scheme:` prepended.
pub fn remote_url(href: &str, scheme: &str) -> String {
    if href.starts_with("//") {
        format!("{scheme}:{href}")
    } else {
        href.to_string()
    }
}

/// A completed remote fetch, ready to be written into the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedStyle {
    pub media: String,
    pub hash: ContentHash,
    pub url: String,
    pub content: String,
}

/// Barrier over every remote fetch issued during one run.
pub struct FetchQueue<F> {
    fetcher: Arc<F>,
    tasks: JoinSet<Result<FetchedStyle, PackError>>,
    issued: usize,
}

impl<F: Fetcher> FetchQueue<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self {
            fetcher,
            tasks: JoinSet::new(),
            issued: 0,
        }
    }

    /// Start fetching `url` for `(media, hash)`. Must run inside a tokio runtime.
    pub fn enqueue(&mut self, url: String, media: String, hash: ContentHash) {
        let fetcher = Arc::clone(&self.fetcher);
        self.issued += 1;
        self.tasks.spawn(async move {
            match fetcher.fetch(&url).await {
                Ok(content) => Ok(FetchedStyle {
                    media,
                    hash,
                    url,
                    content,
                }),
                Err(source) => Err(PackError::Fetch {
                    url,
                    media,
                    hash,
                    source,
                }),
            }
        });
    }

    /// Number of fetches started.
    pub fn issued(&self) -> usize {
        self.issued
    }

    /// Wait for every fetch. The first failure aborts the rest and is returned.
    ///
    /// Completes immediately when nothing was enqueued.
    pub async fn wait_all(mut self) -> Result<Vec<FetchedStyle>, PackError> {
        let mut fetched = Vec::with_capacity(self.issued);
        while let Some(joined) = self.tasks.join_next().await {
            match joined? {
                Ok(style) => fetched.push(style),
                Err(err) => {
                    self.tasks.abort_all();
                    return Err(err);
                }
            }
        }
        Ok(fetched)
    }
}
