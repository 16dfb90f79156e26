use serde::{Deserialize, Serialize};
use url::Url;
use crate::classifier::{Attributes, ClassificationResult};
use crate::error::{AppError, Result};

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// A request URL that passed validation: absolute, http(s), with a host.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlPayload {
    pub url: Url,
}

impl UrlPayload {
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let raw = raw
            .map(str::trim)
            .ok_or_else(|| AppError::Validation("url: field required".to_string()))?;
        if raw.is_empty() {
            return Err(AppError::Validation("url: must not be empty".to_string()));
        }

        let url = Url::parse(raw).map_err(|e| AppError::Validation(format!("url: invalid URL ({})", e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "url: scheme '{}' is not allowed, expected http or https",
                url.scheme()
            )));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(AppError::Validation("url: missing host".to_string()));
        }

        Ok(Self { url })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl TryFrom<ClassifyRequest> for UrlPayload {
    type Error = AppError;

    fn try_from(req: ClassifyRequest) -> Result<Self> {
        UrlPayload::parse(req.url.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedAttributes {
    pub global: Attributes,
    #[serde(rename = "categorySpecific")]
    pub category_specific: Attributes,
}

impl From<ClassificationResult> for ClassifiedAttributes {
    fn from(result: ClassificationResult) -> Self {
        Self {
            global: result.global,
            category_specific: result.category_specific,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResponse {
    pub product_title: String,
    pub classified_attributes: ClassifiedAttributes,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub provider: String,
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_absolute_http_urls() {
        let payload = UrlPayload::parse(Some(" https://example.com/product/123 ")).unwrap();
        assert_eq!(payload.as_str(), "https://example.com/product/123");
        assert!(UrlPayload::parse(Some("http://shop.local:8080/p?id=1")).is_ok());
    }

    #[test]
    fn rejects_malformed_urls_naming_the_field() {
        for raw in [
            None,
            Some(""),
            Some("   "),
            Some("not a url"),
            Some("/relative/path"),
            Some("example.com/product"),
            Some("ftp://example.com/file"),
            Some("mailto:someone@example.com"),
            Some("http://"),
        ] {
            let err = UrlPayload::parse(raw).unwrap_err();
            match err {
                AppError::Validation(msg) => assert!(msg.starts_with("url:"), "{}", msg),
                other => panic!("{:?} gave {:?}", raw, other),
            }
        }
    }

    #[test]
    fn response_uses_camel_case_keys() {
        let response = ClassificationResponse {
            product_title: "X".to_string(),
            classified_attributes: ClassifiedAttributes {
                global: Attributes::from([("Type".to_string(), "T-Shirts".to_string())]),
                category_specific: Attributes::from([("Brand".to_string(), "Uniqlo".to_string())]),
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "productTitle": "X",
                "classifiedAttributes": {
                    "global": {"Type": "T-Shirts"},
                    "categorySpecific": {"Brand": "Uniqlo"}
                }
            })
        );
    }
}
