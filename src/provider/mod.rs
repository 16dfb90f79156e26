//! Product-data providers.
//!
//! A provider hands out one [`ProviderSession`] per request. The session is
//! the scoped resource (a browser, a connection pool) and must be closed on
//! every exit path; [`fetch_product`] does that for callers.

pub mod http;
pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::error::{AppError, Result};

pub use http::HttpProvider;
pub use mock::MockProvider;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "product_name")]
    pub title: Option<String>,
    pub price: Option<f64>,
    pub discount: Option<String>,
    pub delivery_info: Option<String>,
    pub image_url: Option<String>,
}

impl ProductRecord {
    /// The image URL, if present and not blank.
    pub fn image(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
    }
}

#[async_trait]
pub trait ProductProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Acquires a retrieval session.
    async fn open(&self) -> Result<Box<dyn ProviderSession>>;
}

#[async_trait]
pub trait ProviderSession: Send {
    /// `Ok(None)` means the page was retrieved but held nothing usable.
    async fn fetch(&mut self, url: &str) -> Result<Option<ProductRecord>>;

    /// Releases the session.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Opens a session, fetches `url`, and closes the session exactly once
/// whatever the fetch outcome. Every failure is reported as a retrieval error.
pub async fn fetch_product(provider: &dyn ProductProvider, url: &str) -> Result<Option<ProductRecord>> {
    let session = provider.open().await.map_err(into_retrieval)?;
    debug!("Opened {} session", provider.name());
    let mut guard = SessionGuard::new(provider.name(), session);

    let outcome = guard.fetch(url).await;
    guard.close().await;

    outcome.map_err(into_retrieval)
}

/// Holds an open session until it is closed. If the holder is dropped first
/// (cancelled request, panic in `fetch`) the close runs on a spawned task.
struct SessionGuard {
    provider: String,
    session: Option<Box<dyn ProviderSession>>,
}

impl SessionGuard {
    fn new(provider: &str, session: Box<dyn ProviderSession>) -> Self {
        Self {
            provider: provider.to_string(),
            session: Some(session),
        }
    }

    async fn fetch(&mut self, url: &str) -> Result<Option<ProductRecord>> {
        match self.session.as_mut() {
            Some(session) => session.fetch(url).await,
            None => Err(AppError::Retrieval(format!("{} session already closed", self.provider))),
        }
    }

    async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            close_session(&self.provider, session).await;
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let provider = std::mem::take(&mut self.provider);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!("{} session abandoned before close, closing in background", provider);
                handle.spawn(async move {
                    close_session(&provider, session).await;
                });
            }
            Err(_) => warn!("{} session dropped outside a runtime, not closed", provider),
        }
    }
}

async fn close_session(provider: &str, session: Box<dyn ProviderSession>) {
    if let Err(e) = session.close().await {
        warn!("Failed to close {} session: {}", provider, e);
    } else {
        debug!("Closed {} session", provider);
    }
}

fn into_retrieval(err: AppError) -> AppError {
    match err {
        AppError::Retrieval(_) => err,
        other => AppError::Retrieval(other.to_string()),
    }
}
