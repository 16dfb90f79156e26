//! Image classification.
//!
//! A classifier turns a product image URL into two attribute mappings: the
//! category-independent `global` attributes and the `categorySpecific` ones
//! whose keys depend on the inferred product category.

pub mod mock;
pub mod templates;

use std::collections::BTreeMap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::Result;

pub use mock::{MockClassifier, TemplateSelector};
pub use templates::Template;

pub type Attributes = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub global: Attributes,
    #[serde(rename = "categorySpecific")]
    pub category_specific: Attributes,
}

impl ClassificationResult {
    /// A result missing either mapping carries nothing a caller can use.
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() || self.category_specific.is_empty()
    }
}

#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// Name of the loaded model, reported by the health endpoint.
    fn model_name(&self) -> &str;

    async fn classify(&self, image_url: &str) -> Result<ClassificationResult>;
}
