use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use tracing::{debug, info};
use crate::classifier::{ClassificationResult, ImageClassifier, Template};
use crate::config::Config;
use crate::error::{AppError, Result};

/// Picks the template returned for an image URL.
pub type TemplateSelector = Arc<dyn Fn(&str) -> Template + Send + Sync>;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const MODEL_LOAD_DELAY: Duration = Duration::from_millis(100);

/// Default selector: stable across runs and processes for the same URL.
pub fn hashed_selector() -> TemplateSelector {
    Arc::new(|image_url: &str| {
        let hash = image_url.bytes().fold(FNV_OFFSET, |acc, byte| {
            (acc ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        });
        if hash % 2 == 0 {
            Template::TShirt
        } else {
            Template::SportsShoes
        }
    })
}

pub fn always(template: Template) -> TemplateSelector {
    Arc::new(move |_: &str| template)
}

/// Stand-in for a vision model. Returns one of the fixed templates.
pub struct MockClassifier {
    model_name: String,
    delay: Duration,
    selector: TemplateSelector,
}

impl MockClassifier {
    /// Simulates the one-time model load done at process start.
    pub async fn load(config: &Config) -> Result<Self> {
        let model_name = config.classifier_model.trim();
        if model_name.is_empty() {
            return Err(AppError::Classification("No classifier model configured".to_string()));
        }

        info!("Initializing mock vision classifier");
        tokio::time::sleep(MODEL_LOAD_DELAY).await;

        let selector = match config.pinned_template {
            Some(template) => {
                info!("Classifier pinned to template {}", template);
                always(template)
            }
            None => hashed_selector(),
        };

        info!("Mock model '{}' is ready", model_name);
        Ok(Self {
            model_name: model_name.to_string(),
            delay: config.mock_classify_delay,
            selector,
        })
    }

    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            delay: Duration::ZERO,
            selector: hashed_selector(),
        }
    }

    pub fn with_selector(mut self, selector: TemplateSelector) -> Self {
        self.selector = selector;
        self
    }
}

#[async_trait]
impl ImageClassifier for MockClassifier {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn classify(&self, image_url: &str) -> Result<ClassificationResult> {
        debug!("Mock-classifying image from {}", image_url);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let template = (self.selector)(image_url);
        info!("Mock prediction: {}", template);
        Ok(template.result())
    }
}
