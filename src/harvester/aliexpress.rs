// AliExpress wholesale best-seller catalogs, falling back to a keyword search.
use crate::harvester::{CandidateSource, Harvest, PageFetcher, SourceReport};
use crate::model::{HarvestError, Product, Source};
use crate::normalizer::{is_valid_title, normalize_title};
use crate::scoring::success_probability;
use chrono::Utc;
use futures::future::join_all;
use scraper::{Html, Selector};
use tracing::{info, warn};

const CATEGORIES: &[(&str, &str)] = &[
    (
        "https://www.aliexpress.com/w/wholesale-kitchen-best-seller.html",
        "AliExpress Best Seller - Cozinha",
    ),
    (
        "https://www.aliexpress.com/w/wholesale-home-organization-best-seller.html",
        "AliExpress Best Seller - Organização",
    ),
    (
        "https://www.aliexpress.com/w/wholesale-beauty-best-seller.html",
        "AliExpress Best Seller - Beleza",
    ),
];

const TITLE_SELECTORS: &str = r#"div[class*="multi--title"], h1, h2, div[class*="card-title"], span[class*="title"], p[class*="title"]"#;

const MIN_HTML_LEN: usize = 1000;

pub struct AliexpressBest {
    fetcher: PageFetcher,
}

impl AliexpressBest {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    async fn harvest_category(&self, url: &str, reason: &str) -> Result<Vec<Product>, HarvestError> {
        let html = self.fetcher.fetch_page(url).await?;
        info!("📥 AliExpress HTML size: {} ({})", html.len(), url);

        let mut products = extract_candidates(&html, reason, "Bestseller");

        if products.is_empty() || html.len() < MIN_HTML_LEN {
            let keyword = fallback_keyword(reason);
            let fallback_url = format!(
                "https://www.aliexpress.com/wholesale?SearchText={}",
                urlencoding::encode(keyword)
            );
            let fallback_html = self.fetcher.fetch_page(&fallback_url).await?;
            info!(
                "📥 AliExpress fallback HTML size: {} ({})",
                fallback_html.len(),
                fallback_url
            );
            products.extend(extract_candidates(&fallback_html, reason, "Fallback"));
        }

        Ok(products)
    }
}

#[async_trait::async_trait]
impl CandidateSource for AliexpressBest {
    fn source(&self) -> Source {
        Source::AliexpressBestseller
    }

    fn prefix_cap(&self) -> usize {
        15
    }

    async fn harvest(&self) -> Harvest {
        let tasks = CATEGORIES
            .iter()
            .map(|(url, reason)| self.harvest_category(url, reason));
        let results = join_all(tasks).await;

        let mut harvest = Harvest::default();
        for ((_, reason), result) in CATEGORIES.iter().zip(results) {
            match result {
                Ok(products) => {
                    harvest.reports.push(SourceReport::ok(*reason, products.len()));
                    harvest.products.extend(products);
                }
                Err(e) => {
                    warn!("❌ AliExpress category failed ({}): {}", reason, e);
                    harvest.reports.push(SourceReport::failed(*reason, e.to_string()));
                }
            }
        }
        harvest
    }
}

/// The fallback search term is the last segment of the reason label
/// ("AliExpress Best Seller - Cozinha" → "Cozinha").
fn fallback_keyword(reason: &str) -> &str {
    reason
        .rsplit('-')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("kitchen")
}

/// The catalog markup changes often; anchors are walked and the first
/// title-shaped descendant wins, else the anchor's own title attribute.
pub fn extract_candidates(html: &str, reason: &str, evidence: &str) -> Vec<Product> {
    let document = Html::parse_document(html);
    let anchor_selector = Selector::parse("a").unwrap();
    let title_selector = Selector::parse(TITLE_SELECTORS).unwrap();

    let mut products = Vec::new();
    for (idx, anchor) in document.select(&anchor_selector).enumerate() {
        let raw = anchor
            .select(&title_selector)
            .next()
            .map(|node| node.text().collect::<String>())
            .unwrap_or_default();
        let raw = if raw.trim().is_empty() {
            anchor.value().attr("title").unwrap_or("").to_string()
        } else {
            raw
        };
        let title = normalize_title(&raw);
        if !is_valid_title(&title) {
            continue;
        }

        products.push(Product {
            name: title,
            source: Source::AliexpressBestseller,
            sales_volume_signal: 0,
            price: None,
            original_rank: idx + 1,
            success_probability: success_probability(Source::AliexpressBestseller, 0, None),
            trend_reason: format!("{reason} • {evidence}"),
            harvested_at: Utc::now(),
        });
    }
    products
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_titles_from_anchor_descendants_and_attributes() {
        let html = r#"
            <a href="/item/1"><div class="multi--titleText--abc">Mini Seladora de Embalagens</div></a>
            <a href="/item/2" title="Misturador de Leite Elétrico"><span class="price">$ 3.99</span></a>
            <a href="/item/3"><span class="other">x</span></a>
        "#;
        let products = extract_candidates(html, "AliExpress Best Seller - Cozinha", "Bestseller");
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Mini Seladora de Embalagens");
        assert_eq!(products[1].name, "Misturador de Leite Elétrico");
        assert_eq!(products[1].original_rank, 2);
    }

    #[test]
    fn fallback_keyword_is_last_label_segment() {
        assert_eq!(fallback_keyword("AliExpress Best Seller - Organização"), "Organização");
        assert_eq!(fallback_keyword("sem separador"), "sem separador");
    }
}
