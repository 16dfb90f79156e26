pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod provider;

use std::sync::Arc;
use classifier::{ImageClassifier, MockClassifier};
use config::{Config, ProviderKind};
use error::Result;
use provider::{HttpProvider, MockProvider, ProductProvider};

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn ProductProvider>,
    pub classifier: Arc<dyn ImageClassifier>,
}

impl AppState {
    /// Loads the classifier and builds the configured provider.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let classifier = MockClassifier::load(config).await?;
        let provider: Arc<dyn ProductProvider> = match config.provider {
            ProviderKind::Mock => Arc::new(MockProvider::new(config.mock_scrape_delay)),
            ProviderKind::Http => Arc::new(HttpProvider::new(config.fetch_timeout)),
        };

        Ok(Self {
            provider,
            classifier: Arc::new(classifier),
        })
    }
}
