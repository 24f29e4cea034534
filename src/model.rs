// Core structs: Source, Product, plus the error enums shared across modules.
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Marketplace listing family a candidate was harvested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    AmazonBestseller,
    ShopeeBestseller,
    AliexpressBestseller,
}

impl Source {
    /// Whether the source surfaces ranked bestseller listings. The scoring
    /// base applies only to sources that do.
    pub fn is_bestseller(self) -> bool {
        matches!(
            self,
            Source::AmazonBestseller | Source::ShopeeBestseller | Source::AliexpressBestseller
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Source::AmazonBestseller => "amazon_bestseller",
            Source::ShopeeBestseller => "shopee_bestseller",
            Source::AliexpressBestseller => "aliexpress_bestseller",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A harvested, scored, not-yet-annotated product record.
#[derive(Debug, Clone)]
pub struct Product {
    pub name: String,
    pub source: Source,
    /// Best-effort parse of a "N vendidos" style string; 0 when absent.
    pub sales_volume_signal: u32,
    /// Absent when the source page did not expose a price.
    pub price: Option<f64>,
    /// 1-based node position within the source's result list.
    pub original_rank: usize,
    /// Always within [0, 1], never NaN. Set once at harvest time; the
    /// aggregator's corroboration boost is the only later mutation.
    pub success_probability: f64,
    /// Source label plus evidence snippet. Display and audit only.
    pub trend_reason: String,
    pub harvested_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} fetching {url}")]
    BadStatus {
        status: reqwest::StatusCode,
        url: String,
    },
}

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("openai_api_key is not configured (config.json or OPENAI_API_KEY)")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("annotation service responded {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("annotation service returned no content")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("telegram api responded {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
