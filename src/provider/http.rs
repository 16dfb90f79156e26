use std::collections::HashMap;
use std::time::Duration;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;
use crate::error::{AppError, Result};
use crate::provider::{ProductProvider, ProductRecord, ProviderSession};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Pages larger than this are refused rather than parsed.
pub const MAX_PAGE_BYTES: usize = 5 * 1024 * 1024;

const TITLE_KEYS: &[&str] = &["og:title", "twitter:title"];
const IMAGE_KEYS: &[&str] = &["og:image", "og:image:secure_url", "twitter:image"];
const PRICE_KEYS: &[&str] = &["product:price:amount", "og:price:amount"];

// Create static selectors to avoid recompiling them each time
static META_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta").expect("Failed to parse meta selector")
});

static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h1").expect("Failed to parse h1 selector")
});

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("title").expect("Failed to parse title selector")
});

static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("img[src]").expect("Failed to parse img selector")
});

/// Fetches the product page over plain HTTP and reads its metadata.
/// No JavaScript is executed.
pub struct HttpProvider {
    timeout: Duration,
    max_page_bytes: usize,
}

impl HttpProvider {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            max_page_bytes: MAX_PAGE_BYTES,
        }
    }

    pub fn with_max_page_bytes(mut self, max_page_bytes: usize) -> Self {
        self.max_page_bytes = max_page_bytes;
        self
    }
}

struct HttpSession {
    client: Client,
    max_page_bytes: usize,
}

#[async_trait]
impl ProductProvider for HttpProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn open(&self) -> Result<Box<dyn ProviderSession>> {
        let client = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .connect_timeout(self.timeout / 2)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Box::new(HttpSession {
            client,
            max_page_bytes: self.max_page_bytes,
        }))
    }
}

#[async_trait]
impl ProviderSession for HttpSession {
    async fn fetch(&mut self, url: &str) -> Result<Option<ProductRecord>> {
        let page_url = Url::parse(url).map_err(|e| AppError::Retrieval(format!("Invalid URL {}: {}", url, e)))?;

        info!("Fetching product page {}", page_url);
        let mut response = self.client.get(page_url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(AppError::Retrieval(format!("{} answered {}", page_url, status)));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_page_bytes as u64 {
                return Err(too_large(&page_url, self.max_page_bytes));
            }
        }

        // Redirects may have moved us; relative links resolve against the final URL.
        let final_url = response.url().clone();

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_page_bytes {
                return Err(too_large(&page_url, self.max_page_bytes));
            }
            body.extend_from_slice(&chunk);
        }
        let html = String::from_utf8_lossy(&body);
        debug!("Fetched {} bytes from {}", body.len(), final_url);

        Ok(extract_product(&html, &final_url))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        debug!("Dropping HTTP client");
        Ok(())
    }
}

fn too_large(page_url: &Url, limit: usize) -> AppError {
    AppError::Retrieval(format!("{} is larger than {} bytes", page_url, limit))
}

/// Reads title, image and price out of a product page.
/// Returns `None` when the page has neither a title nor an image.
pub fn extract_product(html: &str, page_url: &Url) -> Option<ProductRecord> {
    let document = Html::parse_document(html);
    let meta = collect_meta(&document);

    let title = first_meta(&meta, TITLE_KEYS)
        .or_else(|| first_text(&document, &H1_SELECTOR))
        .or_else(|| first_text(&document, &TITLE_SELECTOR));

    let image_url = first_meta(&meta, IMAGE_KEYS)
        .or_else(|| {
            document
                .select(&IMG_SELECTOR)
                .filter_map(|img| img.value().attr("src"))
                .map(str::trim)
                .find(|src| !src.is_empty() && !src.starts_with("data:"))
                .map(str::to_string)
        })
        .and_then(|src| resolve(page_url, &src));

    let price = first_meta(&meta, PRICE_KEYS).and_then(|raw| parse_price(&raw));

    if title.is_none() && image_url.is_none() {
        return None;
    }

    Some(ProductRecord {
        title,
        price,
        discount: None,
        delivery_info: None,
        image_url,
    })
}

fn collect_meta(document: &Html) -> HashMap<String, String> {
    let mut meta = HashMap::new();
    for element in document.select(&META_SELECTOR) {
        let value = element.value();
        let key = value
            .attr("property")
            .or_else(|| value.attr("name"))
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        let content = value.attr("content").unwrap_or("").trim();
        if key.is_empty() || content.is_empty() {
            continue;
        }
        meta.entry(key).or_insert_with(|| content.to_string());
    }
    meta
}

fn first_meta(meta: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| meta.get(*key).cloned())
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .find(|text| !text.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn resolve(page_url: &Url, src: &str) -> Option<String> {
    let resolved = page_url.join(src).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Parses a single amount such as `1,299.50`, `1.299,50` or `USD 19,99`.
/// Ranges and anything with more than one number give `None`.
fn parse_price(raw: &str) -> Option<f64> {
    let mut groups = raw
        .split(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .map(|group| group.trim_matches(|c| c == '.' || c == ','))
        .filter(|group| !group.is_empty());
    let amount = groups.next()?;
    if groups.next().is_some() {
        return None;
    }

    let normalized = match (amount.rfind('.'), amount.rfind(',')) {
        // Both present: whichever comes last is the decimal mark.
        (Some(dot), Some(comma)) if dot > comma => amount.replace(',', ""),
        (Some(_), Some(_)) => amount.replace('.', "").replacen(',', ".", 1),
        (None, Some(comma)) => {
            let decimals = amount.len() - comma - 1;
            if amount.matches(',').count() == 1 && decimals <= 2 {
                amount.replacen(',', ".", 1)
            } else {
                thousands_only(amount, ',')?
            }
        }
        (Some(_), None) if amount.matches('.').count() > 1 => thousands_only(amount, '.')?,
        _ => amount.to_string(),
    };

    if normalized.matches('.').count() > 1 {
        return None;
    }
    normalized.parse::<f64>().ok()
}

/// Strips a thousands separator, provided every group after the first has
/// exactly three digits.
fn thousands_only(amount: &str, separator: char) -> Option<String> {
    let mut parts = amount.split(separator);
    let head = parts.next()?;
    let mut digits = head.to_string();
    for part in parts {
        if part.len() != 3 {
            return None;
        }
        digits.push_str(part);
    }
    Some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::fetch_product;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn page_url() -> Url {
        Url::parse("https://shop.example.com/products/42").unwrap()
    }

    #[test]
    fn prefers_open_graph_tags() {
        let html = r#"<html><head>
            <title>Shop | Everything</title>
            <meta property="og:title" content="Linen Shirt">
            <meta property="og:image" content="https://cdn.example.com/shirt.jpg">
            <meta property="product:price:amount" content="1,299.50">
            </head><body><h1>Other heading</h1><img src="/logo.png"></body></html>"#;

        let record = extract_product(html, &page_url()).unwrap();
        assert_eq!(record.title(), Some("Linen Shirt"));
        assert_eq!(record.image(), Some("https://cdn.example.com/shirt.jpg"));
        assert_eq!(record.price, Some(1299.50));
    }

    #[test]
    fn falls_back_to_heading_and_first_image() {
        let html = r#"<html><head><title>Fallback title</title></head>
            <body><h1>  Running
                Shoe </h1>
            <img src="data:image/gif;base64,R0lGOD">
            <img src="../images/shoe.png"></body></html>"#;

        let record = extract_product(html, &page_url()).unwrap();
        assert_eq!(record.title(), Some("Running Shoe"));
        assert_eq!(record.image(), Some("https://shop.example.com/images/shoe.png"));
        assert_eq!(record.price, None);
    }

    #[test]
    fn page_without_title_or_image_is_empty() {
        let html = "<html><body><p>Nothing to see</p></body></html>";
        assert!(extract_product(html, &page_url()).is_none());
    }

    #[test]
    fn title_without_image_keeps_record() {
        let html = "<html><head><title>Only a title</title></head><body></body></html>";
        let record = extract_product(html, &page_url()).unwrap();
        assert_eq!(record.title(), Some("Only a title"));
        assert_eq!(record.image(), None);
    }

    #[tokio::test]
    async fn fetches_and_extracts_from_server() {
        let mock_server = MockServer::start().await;
        let html = r#"<html><head>
            <meta property="og:title" content="Canvas Sneaker">
            <meta name="twitter:image" content="/media/sneaker.jpg">
            </head><body></body></html>"#;

        Mock::given(method("GET"))
            .and(path("/p/sneaker"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(html.as_bytes()),
            )
            .mount(&mock_server)
            .await;

        let provider = HttpProvider::new(Duration::from_secs(5));
        let url = format!("{}/p/sneaker", mock_server.uri());
        let record = fetch_product(&provider, &url).await.unwrap().unwrap();

        assert_eq!(record.title(), Some("Canvas Sneaker"));
        assert_eq!(
            record.image(),
            Some(format!("{}/media/sneaker.jpg", mock_server.uri()).as_str())
        );
    }

    #[test]
    fn parses_price_formats() {
        assert_eq!(parse_price("99.99"), Some(99.99));
        assert_eq!(parse_price("1,299.50"), Some(1299.50));
        assert_eq!(parse_price("1.299,50"), Some(1299.50));
        assert_eq!(parse_price("19,99"), Some(19.99));
        assert_eq!(parse_price("1,299"), Some(1299.0));
        assert_eq!(parse_price("1.299.000"), Some(1_299_000.0));
        assert_eq!(parse_price("USD 49.00"), Some(49.0));
        assert_eq!(parse_price("49.00 €"), Some(49.0));
    }

    #[test]
    fn rejects_ambiguous_prices() {
        assert_eq!(parse_price("12.99 - 15.99"), None);
        assert_eq!(parse_price("1.2.3"), None);
        assert_eq!(parse_price("1,2,3"), None);
        assert_eq!(parse_price("free"), None);
        assert_eq!(parse_price(""), None);
    }

    #[tokio::test]
    async fn client_error_status_is_retrieval_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forbidden"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let provider = HttpProvider::new(Duration::from_secs(5));
        for page in ["forbidden", "gone"] {
            let url = format!("{}/{}", mock_server.uri(), page);
            let err = fetch_product(&provider, &url).await.unwrap_err();
            assert!(matches!(err, AppError::Retrieval(_)), "{} gave {:?}", page, err);
        }
    }

    #[tokio::test]
    async fn oversized_page_is_refused() {
        let mock_server = MockServer::start().await;
        let html = format!(
            "<html><head><title>Big</title></head><body>{}</body></html>",
            "x".repeat(4096)
        );
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(html.as_bytes()),
            )
            .mount(&mock_server)
            .await;

        let provider = HttpProvider::new(Duration::from_secs(5)).with_max_page_bytes(1024);
        let url = format!("{}/big", mock_server.uri());
        let err = fetch_product(&provider, &url).await.unwrap_err();
        assert!(matches!(&err, AppError::Retrieval(msg) if msg.contains("larger than")));

        let roomy = HttpProvider::new(Duration::from_secs(5));
        let record = fetch_product(&roomy, &url).await.unwrap().unwrap();
        assert_eq!(record.title(), Some("Big"));
    }

    #[tokio::test]
    async fn server_error_is_retrieval_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let provider = HttpProvider::new(Duration::from_secs(5));
        let url = format!("{}/busy", mock_server.uri());
        let err = fetch_product(&provider, &url).await.unwrap_err();
        assert!(matches!(err, AppError::Retrieval(_)));
    }
}
