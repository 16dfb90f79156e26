//! Request pipeline: fetch the product, classify its image, shape the reply.
//!
//! Validating -> FetchingProduct -> Classifying -> Done, with any failure
//! ending the request. There are no partial responses.

use std::fmt;
use tracing::{debug, info};
use crate::api::models::{ClassificationResponse, UrlPayload};
use crate::classifier::{ClassificationResult, ImageClassifier};
use crate::error::{AppError, Result};
use crate::provider::{fetch_product, ProductProvider};

pub const TITLE_PLACEHOLDER: &str = "Title not found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    FetchingProduct,
    Classifying,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::FetchingProduct => "fetching_product",
            Stage::Classifying => "classifying",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A failed request together with the stage it failed in.
#[derive(Debug)]
pub struct StageError {
    pub stage: Stage,
    pub error: AppError,
}

impl StageError {
    pub fn new(stage: Stage, error: AppError) -> Self {
        Self { stage, error }
    }

    fn at(stage: Stage) -> impl FnOnce(AppError) -> StageError {
        move |error| StageError { stage, error }
    }
}

/// Runs a validated URL through provider and classifier.
pub async fn classify_product(
    provider: &dyn ProductProvider,
    classifier: &dyn ImageClassifier,
    payload: &UrlPayload,
) -> std::result::Result<ClassificationResponse, StageError> {
    let url = payload.as_str();

    debug!(stage = %Stage::FetchingProduct, "Fetching product from {}", url);
    let record = fetch_product(provider, url)
        .await
        .map_err(StageError::at(Stage::FetchingProduct))?;

    let record = record.ok_or_else(no_content).map_err(StageError::at(Stage::FetchingProduct))?;
    let image_url = record
        .image()
        .ok_or_else(no_content)
        .map_err(StageError::at(Stage::FetchingProduct))?;
    let product_title = record.title().unwrap_or(TITLE_PLACEHOLDER).to_string();

    debug!(stage = %Stage::Classifying, "Classifying image {}", image_url);
    let classification = classify_image(classifier, image_url)
        .await
        .map_err(StageError::at(Stage::Classifying))?;

    info!(stage = %Stage::Done, "Classified '{}' from {}", product_title, url);
    Ok(ClassificationResponse {
        product_title,
        classified_attributes: classification.into(),
    })
}

async fn classify_image(
    classifier: &dyn ImageClassifier,
    image_url: &str,
) -> Result<ClassificationResult> {
    let result = classifier.classify(image_url).await.map_err(|e| match e {
        AppError::Unprocessable(_) | AppError::Classification(_) => e,
        other => AppError::Classification(other.to_string()),
    })?;

    if result.is_empty() {
        return Err(AppError::Unprocessable("Classification failed.".to_string()));
    }
    Ok(result)
}

fn no_content() -> AppError {
    AppError::Unprocessable(
        "Failed to scrape content or find an image at the provided URL.".to_string(),
    )
}
