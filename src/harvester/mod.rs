// Source harvesters: each family fetches its listing pages concurrently and
// emits scored candidates. A harvest is total — page failures degrade to an
// empty result plus an error report, never to an aborted run.

pub mod aliexpress;
pub mod amazon;
pub mod fetcher;
pub mod shopee;

pub use aliexpress::AliexpressBest;
pub use amazon::AmazonBestsellers;
pub use fetcher::PageFetcher;
pub use shopee::ShopeeSearch;

use crate::model::{Product, Source};

/// Per-page/per-keyword diagnostic. Advisory only, never control flow.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub label: String,
    pub count: usize,
    pub error: Option<String>,
}

impl SourceReport {
    pub fn ok(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            count,
            error: None,
        }
    }

    pub fn failed(label: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            count: 0,
            error: Some(error.into()),
        }
    }
}

/// Everything one source family produced in a run.
#[derive(Debug, Default)]
pub struct Harvest {
    pub products: Vec<Product>,
    pub reports: Vec<SourceReport>,
}

/// Narrow capability interface for one candidate source family, so the
/// aggregator never touches markup assumptions and tests can substitute
/// canned sources.
#[async_trait::async_trait]
pub trait CandidateSource: Send + Sync {
    fn source(&self) -> Source;

    /// How many candidates of this family survive into the merge.
    fn prefix_cap(&self) -> usize;

    /// Fetches and extracts candidates. Must not fail: any page-level error
    /// is caught inside and reported through [`Harvest::reports`].
    async fn harvest(&self) -> Harvest;
}
