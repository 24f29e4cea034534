// Aggregator: runs every source family concurrently and reduces the harvest
// to a deduplicated, boosted, filtered, ranked candidate list.
use crate::harvester::{
    AliexpressBest, AmazonBestsellers, CandidateSource, PageFetcher, ShopeeSearch, SourceReport,
};
use crate::model::Product;
use crate::scoring::{VOLUME_THRESHOLD, clamp_probability};
use futures::future::join_all;
use std::collections::HashMap;
use tracing::info;

/// Hard cap on the run's output, regardless of the caller-requested limit.
/// Bounds annotation-service cost and channel message volume.
pub const MAX_PRODUCTS: usize = 10;

/// Applied when a second source independently reports the same name.
const CORROBORATION_BOOST: f64 = 0.1;

/// Provenance phrases accepted as a bestseller signal.
const BESTSELLER_SIGNALS: &[&str] = &[
    "+500",
    "500+",
    "+1000",
    "1000+",
    "1000",
    "mil+",
    "mais vendido",
    "best seller",
    "bestseller",
    "top 1",
    "top seller",
    "most wished",
];

#[derive(Debug)]
pub struct MiningDiagnostics {
    pub reports: Vec<SourceReport>,
    pub total_candidates: usize,
    pub filtered_count: usize,
}

#[derive(Debug)]
pub struct MiningOutcome {
    pub products: Vec<Product>,
    pub diagnostics: MiningDiagnostics,
}

pub struct Miner {
    sources: Vec<Box<dyn CandidateSource>>,
}

impl Miner {
    pub fn new(sources: Vec<Box<dyn CandidateSource>>) -> Self {
        Self { sources }
    }

    pub fn with_default_sources(fetcher: PageFetcher) -> Self {
        Self::new(vec![
            Box::new(AmazonBestsellers::new(fetcher.clone())),
            Box::new(ShopeeSearch::new(fetcher.clone())),
            Box::new(AliexpressBest::new(fetcher)),
        ])
    }

    /// Runs the full mining pass. Harvests are total, so the only way this
    /// returns an empty list is when no source produced a valid candidate.
    pub async fn run(&self, limit: usize) -> MiningOutcome {
        let harvests = join_all(self.sources.iter().map(|s| s.harvest())).await;

        let mut reports = Vec::new();
        let mut candidates = Vec::new();
        for (source, mut harvest) in self.sources.iter().zip(harvests) {
            info!(
                "⛏️ {}: {} candidates harvested",
                source.source(),
                harvest.products.len()
            );
            // bounded prefix per family, so no single source dominates the merge
            harvest.products.truncate(source.prefix_cap());
            candidates.extend(harvest.products);
            reports.append(&mut harvest.reports);
        }

        let merged = merge_candidates(candidates);
        let total_candidates = merged.len();
        let filtered = filter_bestsellers(&merged);
        let filtered_count = filtered.len();
        let products = select_products(merged, filtered, limit);

        info!(
            "⛏️ Mining done: {} merged, {} with bestseller signal, {} selected",
            total_candidates,
            filtered_count,
            products.len()
        );

        MiningOutcome {
            products,
            diagnostics: MiningDiagnostics {
                reports,
                total_candidates,
                filtered_count,
            },
        }
    }
}

/// Merges by case-insensitive exact name. The first occurrence wins the
/// identity; every later sighting boosts the kept entry's probability —
/// cross-source corroboration counts for more than any single source score.
pub fn merge_candidates(candidates: Vec<Product>) -> Vec<Product> {
    let mut merged: Vec<Product> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    for product in candidates {
        let key = product.name.to_lowercase();
        match index_by_name.get(&key) {
            Some(&idx) => {
                let entry = &mut merged[idx];
                entry.success_probability =
                    clamp_probability(entry.success_probability + CORROBORATION_BOOST);
            }
            None => {
                index_by_name.insert(key, merged.len());
                merged.push(product);
            }
        }
    }
    merged
}

/// Keeps candidates with a hard volume signal or a bestseller phrase in
/// their provenance.
pub fn filter_bestsellers(merged: &[Product]) -> Vec<Product> {
    merged
        .iter()
        .filter(|p| {
            if p.sales_volume_signal >= VOLUME_THRESHOLD {
                return true;
            }
            let reason = p.trend_reason.to_lowercase();
            BESTSELLER_SIGNALS.iter().any(|sig| reason.contains(sig))
        })
        .cloned()
        .collect()
}

/// The filtered set wins when non-empty, in first-seen order. When the filter
/// empties the set, the whole merged set ranked by probability is used
/// instead — the run never returns zero candidates when any were harvested.
pub fn select_products(merged: Vec<Product>, filtered: Vec<Product>, limit: usize) -> Vec<Product> {
    let mut chosen = if filtered.is_empty() {
        let mut all = merged;
        all.sort_by(|a, b| b.success_probability.total_cmp(&a.success_probability));
        all
    } else {
        filtered
    };
    chosen.truncate(limit.min(MAX_PRODUCTS));
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;
    use chrono::Utc;

    fn product(name: &str, source: Source, probability: f64, reason: &str, volume: u32) -> Product {
        Product {
            name: name.to_string(),
            source,
            sales_volume_signal: volume,
            price: None,
            original_rank: 1,
            success_probability: probability,
            trend_reason: reason.to_string(),
            harvested_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_names_merge_into_one_boosted_entry() {
        let merged = merge_candidates(vec![
            product("Garrafa Térmica", Source::AmazonBestseller, 0.6, "Amazon • sem prova", 0),
            product("garrafa térmica", Source::ShopeeBestseller, 0.6, "Shopee • Bestseller", 0),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, Source::AmazonBestseller);
        assert!((merged[0].success_probability - 0.7).abs() < 1e-9);
    }

    #[test]
    fn boost_is_clamped_to_one() {
        let merged = merge_candidates(vec![
            product("Organizador", Source::AmazonBestseller, 0.95, "a", 0),
            product("Organizador", Source::ShopeeBestseller, 0.6, "b", 0),
            product("Organizador", Source::AliexpressBestseller, 0.6, "c", 0),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].success_probability, 1.0);
    }

    #[test]
    fn filter_accepts_volume_or_signal_phrase() {
        let merged = vec![
            product("Com volume", Source::AmazonBestseller, 0.8, "Amazon • sem prova", 500),
            product("Com frase", Source::ShopeeBestseller, 0.6, "Shopee • Bestseller", 0),
            product("Sem nada", Source::AmazonBestseller, 0.6, "Amazon • sem prova", 10),
        ];
        let filtered = filter_bestsellers(&merged);
        let names: Vec<_> = filtered.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Com volume", "Com frase"]);
    }

    #[test]
    fn empty_filter_falls_back_to_merged_sorted_by_probability() {
        let merged = vec![
            product("Fraco", Source::AmazonBestseller, 0.6, "Amazon • sem prova", 0),
            product("Forte", Source::AmazonBestseller, 0.8, "Amazon • sem prova", 0),
        ];
        let filtered = filter_bestsellers(&merged);
        assert!(filtered.is_empty());

        let selected = select_products(merged, filtered, 10);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].name, "Forte");
        assert_eq!(selected[1].name, "Fraco");
    }

    #[test]
    fn output_is_hard_capped_at_ten() {
        let merged: Vec<Product> = (0..30)
            .map(|i| {
                product(
                    &format!("Produto número {i}"),
                    Source::ShopeeBestseller,
                    0.6,
                    "Shopee • Bestseller",
                    0,
                )
            })
            .collect();
        let filtered = filter_bestsellers(&merged);
        let selected = select_products(merged, filtered, 9999);
        assert_eq!(selected.len(), MAX_PRODUCTS);
    }

    #[test]
    fn requested_limit_below_cap_is_honored() {
        let merged: Vec<Product> = (0..8)
            .map(|i| {
                product(
                    &format!("Produto número {i}"),
                    Source::ShopeeBestseller,
                    0.6,
                    "Shopee • Bestseller",
                    0,
                )
            })
            .collect();
        let filtered = filter_bestsellers(&merged);
        let selected = select_products(merged, filtered, 3);
        assert_eq!(selected.len(), 3);
    }
}
