// Shopee keyword searches ordered by sales, with a plain-search fallback.
use crate::harvester::{CandidateSource, Harvest, PageFetcher, SourceReport};
use crate::model::{HarvestError, Product, Source};
use crate::normalizer::{is_valid_title, normalize_title};
use crate::scoring::success_probability;
use chrono::Utc;
use futures::future::join_all;
use scraper::{Html, Selector};
use tracing::{info, warn};

const KEYWORDS: &[(&str, &str)] = &[
    ("cozinha", "Shopee Best-Seller - Cozinha"),
    ("utilidades domesticas", "Shopee Best-Seller - Utilidades Domésticas"),
    ("organizacao", "Shopee Best-Seller - Organização"),
    ("beleza", "Shopee Best-Seller - Beleza"),
];

const NAME_SELECTORS: &str = r#"div[data-sqe="name"], img[alt]"#;

/// A rendered result page shorter than this is assumed to be a bot wall or
/// an empty shell, and triggers the fallback query.
const MIN_HTML_LEN: usize = 1000;

pub struct ShopeeSearch {
    fetcher: PageFetcher,
}

impl ShopeeSearch {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    async fn harvest_keyword(&self, keyword: &str, reason: &str) -> Result<Vec<Product>, HarvestError> {
        let url = format!(
            "https://shopee.com.br/search?keyword={}&sortBy=sales",
            urlencoding::encode(keyword)
        );
        let html = self.fetcher.fetch_page(&url).await?;
        info!("📥 Shopee HTML size: {} ({})", html.len(), url);

        let mut products = extract_candidates(&html, reason, "Bestseller");

        if products.is_empty() || html.len() < MIN_HTML_LEN {
            let fallback_url = format!(
                "https://shopee.com.br/search?keyword={}",
                urlencoding::encode(keyword)
            );
            let fallback_html = self.fetcher.fetch_page(&fallback_url).await?;
            info!(
                "📥 Shopee fallback HTML size: {} ({})",
                fallback_html.len(),
                fallback_url
            );
            products.extend(extract_candidates(&fallback_html, reason, "Fallback"));
        }

        Ok(products)
    }
}

#[async_trait::async_trait]
impl CandidateSource for ShopeeSearch {
    fn source(&self) -> Source {
        Source::ShopeeBestseller
    }

    fn prefix_cap(&self) -> usize {
        15
    }

    async fn harvest(&self) -> Harvest {
        let tasks = KEYWORDS
            .iter()
            .map(|(keyword, reason)| self.harvest_keyword(keyword, reason));
        let results = join_all(tasks).await;

        let mut harvest = Harvest::default();
        for ((_, reason), result) in KEYWORDS.iter().zip(results) {
            match result {
                Ok(products) => {
                    harvest.reports.push(SourceReport::ok(*reason, products.len()));
                    harvest.products.extend(products);
                }
                Err(e) => {
                    warn!("❌ Shopee keyword failed ({}): {}", reason, e);
                    harvest.reports.push(SourceReport::failed(*reason, e.to_string()));
                }
            }
        }
        harvest
    }
}

/// Titles live either in the product-name div or in card image alt text.
pub fn extract_candidates(html: &str, reason: &str, evidence: &str) -> Vec<Product> {
    let document = Html::parse_document(html);
    let name_selector = Selector::parse(NAME_SELECTORS).unwrap();

    let mut products = Vec::new();
    for (idx, node) in document.select(&name_selector).enumerate() {
        let raw = node.text().collect::<String>();
        let raw = if raw.trim().is_empty() {
            node.value().attr("alt").unwrap_or("").to_string()
        } else {
            raw
        };
        let title = normalize_title(&raw);
        if !is_valid_title(&title) {
            continue;
        }

        products.push(Product {
            name: title,
            source: Source::ShopeeBestseller,
            sales_volume_signal: 0,
            price: None,
            original_rank: idx + 1,
            success_probability: success_probability(Source::ShopeeBestseller, 0, None),
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
    fn extracts_from_name_divs_and_alt_text() {
        let html = r#"
            <div data-sqe="name">Panela Elétrica Multiuso R$ 79,90</div>
            <img alt="Escova Secadora Profissional" src="x.jpg">
            <img alt="123" src="y.jpg">
        "#;
        let products = extract_candidates(html, "Shopee Best-Seller - Cozinha", "Bestseller");
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Panela Elétrica Multiuso");
        assert_eq!(products[1].name, "Escova Secadora Profissional");
        assert!(products[0].trend_reason.ends_with("Bestseller"));
        assert_eq!(products[0].success_probability, 0.6);
    }

    #[test]
    fn evidence_tag_marks_fallback_results() {
        let html = r#"<div data-sqe="name">Suporte Articulado Universal</div>"#;
        let products = extract_candidates(html, "Shopee Best-Seller - Beleza", "Fallback");
        assert_eq!(products[0].trend_reason, "Shopee Best-Seller - Beleza • Fallback");
    }
}
