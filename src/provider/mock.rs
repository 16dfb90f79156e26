use std::time::Duration;
use async_trait::async_trait;
use tracing::info;
use crate::error::Result;
use crate::provider::{ProductProvider, ProductRecord, ProviderSession};

pub const MOCK_TITLE: &str = "Mock Product - Casual T-Shirt or Sports Shoe";
pub const MOCK_IMAGE_URL: &str = "https://images.unsplash.com/photo-1583743814966-8936f5b7be1a?q=80&w=1000";

/// Returns the same product for every URL, after a simulated page load.
pub struct MockProvider {
    delay: Duration,
}

impl MockProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn record() -> ProductRecord {
        ProductRecord {
            title: Some(MOCK_TITLE.to_string()),
            price: Some(99.99),
            discount: Some("10%".to_string()),
            delivery_info: Some("Ships in 2 days".to_string()),
            image_url: Some(MOCK_IMAGE_URL.to_string()),
        }
    }
}

struct MockSession {
    delay: Duration,
}

#[async_trait]
impl ProductProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn open(&self) -> Result<Box<dyn ProviderSession>> {
        info!("Mock browser launched");
        Ok(Box::new(MockSession { delay: self.delay }))
    }
}

#[async_trait]
impl ProviderSession for MockSession {
    async fn fetch(&mut self, url: &str) -> Result<Option<ProductRecord>> {
        info!("Mock-scraping URL: {}", url);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Some(MockProvider::record()))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        info!("Mock browser closed");
        Ok(())
    }
}
