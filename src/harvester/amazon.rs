// Amazon BR bestseller category pages.
use crate::harvester::{CandidateSource, Harvest, PageFetcher, SourceReport};
use crate::model::{HarvestError, Product, Source};
use crate::normalizer::{is_valid_title, normalize_title, parse_volume_signal};
use crate::scoring::success_probability;
use chrono::Utc;
use futures::future::join_all;
use scraper::{Html, Selector};
use tracing::{info, warn};

const CATEGORIES: &[(&str, &str)] = &[
    (
        "https://www.amazon.com.br/gp/bestsellers/kitchen",
        "Amazon Bestsellers - Cozinha",
    ),
    (
        "https://www.amazon.com.br/gp/bestsellers/home",
        "Amazon Bestsellers - Casa e Organização",
    ),
    (
        "https://www.amazon.com.br/gp/bestsellers/beauty",
        "Amazon Bestsellers - Beleza e Cuidados Pessoais",
    ),
];

const TITLE_SELECTORS: &str =
    "span.a-size-base, span.a-size-medium, div.p13n-sc-truncate, span.a-truncate-full";
const SALES_SELECTORS: &str =
    "span.a-size-small.social-proof-faceout-count-text, span.a-size-small.a-color-secondary";

pub struct AmazonBestsellers {
    fetcher: PageFetcher,
}

impl AmazonBestsellers {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    async fn harvest_category(&self, url: &str, reason: &str) -> Result<Vec<Product>, HarvestError> {
        let html = self.fetcher.fetch_page(url).await?;
        info!("📥 Amazon HTML size: {} ({})", html.len(), url);
        Ok(extract_candidates(&html, reason))
    }
}

#[async_trait::async_trait]
impl CandidateSource for AmazonBestsellers {
    fn source(&self) -> Source {
        Source::AmazonBestseller
    }

    fn prefix_cap(&self) -> usize {
        20
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
                    warn!("❌ Amazon category failed ({}): {}", reason, e);
                    harvest.reports.push(SourceReport::failed(*reason, e.to_string()));
                }
            }
        }
        harvest
    }
}

/// Walks the bestseller grid markup, pairing each title node with the sales
/// proof node at the same position. Invalid titles are skipped but keep their
/// node position in `original_rank`.
pub fn extract_candidates(html: &str, reason: &str) -> Vec<Product> {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse(TITLE_SELECTORS).unwrap();
    let sales_selector = Selector::parse(SALES_SELECTORS).unwrap();

    let sales_texts: Vec<String> = document
        .select(&sales_selector)
        .map(|node| normalize_title(&node.text().collect::<String>()))
        .collect();

    let mut products = Vec::new();
    for (idx, node) in document.select(&title_selector).enumerate() {
        let raw = node.text().collect::<String>();
        let raw = if raw.trim().is_empty() {
            node.value().attr("title").unwrap_or("").to_string()
        } else {
            raw
        };
        let title = normalize_title(&raw);
        if !is_valid_title(&title) {
            continue;
        }

        let sales_text = sales_texts.get(idx).cloned().unwrap_or_default();
        let volume = parse_volume_signal(&sales_text);
        let evidence = if sales_text.is_empty() {
            "sem prova"
        } else {
            sales_text.as_str()
        };

        products.push(Product {
            name: title,
            source: Source::AmazonBestseller,
            sales_volume_signal: volume,
            price: None,
            original_rank: idx + 1,
            success_probability: success_probability(Source::AmazonBestseller, volume, None),
            trend_reason: format!("{reason} • {evidence}"),
            harvested_at: Utc::now(),
        });
    }
    products
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <div id="zg">
            <span class="a-size-small social-proof-faceout-count-text">1.021 compras no mês passado</span>
            <span class="a-size-small a-color-secondary">300 compras no mês passado</span>
            <span class="a-size-base">Garrafa Térmica Inox 1L</span>
            <span class="a-size-base">12345</span>
            <div class="p13n-sc-truncate">Organizador de Gavetas Dobrável</div>
        </div>
    "#;

    #[test]
    fn extracts_valid_titles_with_paired_sales_proof() {
        let products = extract_candidates(FIXTURE, "Amazon Bestsellers - Cozinha");
        assert_eq!(products.len(), 2);

        let first = &products[0];
        assert_eq!(first.name, "Garrafa Térmica Inox 1L");
        assert_eq!(first.sales_volume_signal, 1021);
        assert_eq!(first.original_rank, 1);
        assert!(first.trend_reason.contains("1.021 compras"));
        assert_eq!(first.success_probability, 0.8);

        // the all-digit node is skipped, leaving a rank gap
        let second = &products[1];
        assert_eq!(second.name, "Organizador de Gavetas Dobrável");
        assert_eq!(second.original_rank, 3);
    }

    #[test]
    fn missing_sales_node_reads_as_no_proof() {
        let products = extract_candidates(FIXTURE, "Amazon Bestsellers - Cozinha");
        assert!(products[1].trend_reason.ends_with("sem prova"));
        assert_eq!(products[1].sales_volume_signal, 0);
        assert_eq!(products[1].success_probability, 0.6);
    }
}
