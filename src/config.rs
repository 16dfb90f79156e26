use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use crate::classifier::Template;
use crate::error::{AppError, Result};

/// Which product-data provider serves `/api/classify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Mock,
    Http,
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(ProviderKind::Mock),
            "http" => Ok(ProviderKind::Http),
            other => Err(AppError::Config(format!("Unknown provider: {}", other))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Mock => write!(f, "mock"),
            ProviderKind::Http => write!(f, "http"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub provider: ProviderKind,
    pub fetch_timeout: Duration,
    pub mock_scrape_delay: Duration,
    pub classifier_model: String,
    pub mock_classify_delay: Duration,
    pub pinned_template: Option<Template>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            provider: ProviderKind::Mock,
            fetch_timeout: Duration::from_secs(10),
            mock_scrape_delay: Duration::from_millis(100),
            classifier_model: "mock/clip-model".to_string(),
            mock_classify_delay: Duration::from_millis(200),
            pinned_template: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to defaults
    /// for anything unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let host = lookup("HOST").unwrap_or_else(|| defaults.server_addr.ip().to_string());
        let port = lookup("PORT").unwrap_or_else(|| defaults.server_addr.port().to_string());
        let port = port.parse::<u16>().map_err(|e| AppError::Config(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::Config(format!("Invalid host address: {}", e)))?;

        let provider = match lookup("PROVIDER") {
            Some(raw) => raw.parse()?,
            None => defaults.provider,
        };

        let fetch_timeout = match lookup("FETCH_TIMEOUT_SECS") {
            Some(raw) => match parse_number("FETCH_TIMEOUT_SECS", &raw)? {
                0 => return Err(AppError::Config("FETCH_TIMEOUT_SECS must be at least 1".to_string())),
                secs => Duration::from_secs(secs),
            },
            None => defaults.fetch_timeout,
        };
        let mock_scrape_delay = match lookup("MOCK_SCRAPE_DELAY_MS") {
            Some(raw) => Duration::from_millis(parse_number("MOCK_SCRAPE_DELAY_MS", &raw)?),
            None => defaults.mock_scrape_delay,
        };
        let mock_classify_delay = match lookup("MOCK_CLASSIFY_DELAY_MS") {
            Some(raw) => Duration::from_millis(parse_number("MOCK_CLASSIFY_DELAY_MS", &raw)?),
            None => defaults.mock_classify_delay,
        };

        let classifier_model = lookup("CLASSIFIER_MODEL")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(defaults.classifier_model);

        let pinned_template = match lookup("CLASSIFIER_TEMPLATE") {
            Some(raw) if !raw.trim().is_empty() => Some(raw.parse()?),
            _ => None,
        };

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            provider,
            fetch_timeout,
            mock_scrape_delay,
            classifier_model,
            mock_classify_delay,
            pinned_template,
        })
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e)))
}
