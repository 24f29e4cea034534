// notifier/telegram/format.rs
//
// Builds the channel messages: one per annotated product, with marketplace
// and trend deep links as inline buttons, plus one engagement trailer.

use crate::insight::{InsightReport, ProductInsight};
use crate::model::Product;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Each tier renders at most this many messages per run.
const TIER_CAP: usize = 5;

const LOW_TICKET_HEADER: &str = "🟢 ESCALA • R$ 15-50";
const HIGH_TICKET_HEADER: &str = "🔵 MARGEM • R$ 100-300";
const TRAILER: &str = "Receba os próximos alertas aqui no canal.";

/// Filler words dropped when deriving a compact search term.
const STOP_WORDS: &[&str] = &[
    "kit", "de", "da", "do", "das", "dos", "para", "com", "sem", "e",
];

/// EN→PT substitutions applied before tokenizing; "cellphone" must precede
/// "phone" so the compound wins.
static SIMPLIFY_SUBSTITUTIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        ("cellphone", "celular"),
        ("smartphone", "celular"),
        ("wireless", "sem fio"),
        ("phone", "celular"),
    ]
    .into_iter()
    .map(|(en, pt)| (Regex::new(&format!("(?i){en}")).unwrap(), pt))
    .collect()
});

#[derive(Debug, Clone)]
pub struct Button {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub text: String,
    /// At most two rows of at most two buttons; empty rows are omitted.
    pub buttons: Vec<Vec<Button>>,
}

struct SearchLinks {
    ali: String,
    shopee: String,
    amazon: String,
    trends: String,
}

/// Derives a 1–3 token search term: translate, strip diacritics, drop
/// punctuation and stop-words. Falls back to the leading words of the
/// original when filtering empties it.
fn simplify_term(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let mut normalized = name.to_string();
    for (pattern, pt) in SIMPLIFY_SUBSTITUTIONS.iter() {
        normalized = pattern.replace_all(&normalized, *pt).into_owned();
    }

    let cleaned: String = strip_diacritics(&normalized)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();

    let tokens: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|word| {
            let lower = word.to_lowercase();
            !STOP_WORDS.iter().any(|stop| *stop == lower)
        })
        .collect();

    let compact = tokens
        .iter()
        .take(3)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if !compact.is_empty() {
        return compact;
    }
    normalized
        .split_whitespace()
        .take(3)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Folds the accented characters seen in pt-BR titles; anything else
/// non-alphanumeric is dropped by the caller anyway.
fn strip_diacritics(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            'ñ' => 'n',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}

fn build_search_links(term: &str) -> SearchLinks {
    let encoded_name = urlencoding::encode(term).into_owned();
    let mut simplified = simplify_term(term);
    if simplified.is_empty() {
        simplified = term.to_string();
    }
    let encoded_simplified = urlencoding::encode(&simplified).into_owned();

    SearchLinks {
        ali: format!("https://pt.aliexpress.com/wholesale?SearchText={encoded_name}"),
        shopee: format!("https://shopee.com.br/search?keyword={encoded_simplified}"),
        amazon: format!("https://www.amazon.com.br/s?k={encoded_simplified}"),
        trends: format!(
            "https://trends.google.com/trends/explore?q={encoded_simplified}&geo=BR"
        ),
    }
}

/// Renders both annotation tiers into channel messages and appends the
/// engagement trailer. Entries with no resolvable display name are skipped
/// silently.
pub fn build_messages(products: &[Product], insight: &InsightReport) -> Vec<ChannelMessage> {
    let by_name: HashMap<String, &Product> = products
        .iter()
        .map(|p| (p.name.to_lowercase(), p))
        .collect();

    let mut messages = Vec::new();
    for (idx, item) in insight.low_ticket.iter().take(TIER_CAP).enumerate() {
        if let Some(msg) = build_message(item, idx, LOW_TICKET_HEADER, products, &by_name) {
            messages.push(msg);
        }
    }
    for (idx, item) in insight.high_ticket.iter().take(TIER_CAP).enumerate() {
        if let Some(msg) = build_message(item, idx, HIGH_TICKET_HEADER, products, &by_name) {
            messages.push(msg);
        }
    }

    messages.push(ChannelMessage {
        text: TRAILER.to_string(),
        buttons: Vec::new(),
    });
    messages
}

fn build_message(
    item: &ProductInsight,
    idx: usize,
    header: &str,
    products: &[Product],
    by_name: &HashMap<String, &Product>,
) -> Option<ChannelMessage> {
    let mut safe_name = item.name.trim().to_string();
    if safe_name.is_empty() {
        safe_name = products
            .get(idx)
            .map(|p| p.name.trim().to_string())
            .unwrap_or_default();
    }
    if safe_name.is_empty() {
        return None;
    }

    let links = build_search_links(&safe_name);

    let mut lines = vec![
        header.to_string(),
        format!("📦 {safe_name}"),
        format!("⭐ Potencial: {}/10", item.potential),
    ];

    // best-effort join back to the harvested candidate
    if let Some(candidate) = by_name.get(&safe_name.to_lowercase())
        && !candidate.trend_reason.is_empty()
    {
        lines.push(format!("📊 Evidência: {}", candidate.trend_reason));
    }

    push_if(&mut lines, "🚚 Vantagem Logística", &item.logistics_advantage);
    push_if(&mut lines, "💡 Motivo", &item.reason);
    push_if(&mut lines, "🚀 Copy", &item.copy);
    push_if(&mut lines, "💸 Preço de Venda Sugerido", &item.price_label);
    push_if(&mut lines, "📈 Margem por Venda", &item.margin_label);
    push_if(&mut lines, "💰 Potencial de Fat.", &item.revenue_label);

    let mut rows = Vec::new();
    let mut row = Vec::new();
    push_button(&mut row, "📦 AliExpress", &links.ali);
    push_button(&mut row, "🛍️ Shopee", &links.shopee);
    if !row.is_empty() {
        rows.push(row);
    }
    let mut row = Vec::new();
    push_button(&mut row, "🛒 Amazon BR", &links.amazon);
    push_button(&mut row, "📈 Google Trends", &links.trends);
    if !row.is_empty() {
        rows.push(row);
    }

    Some(ChannelMessage {
        text: lines.join("\n"),
        buttons: rows,
    })
}

fn push_if(lines: &mut Vec<String>, label: &str, value: &str) {
    if !value.is_empty() {
        lines.push(format!("{label}: {value}"));
    }
}

fn push_button(row: &mut Vec<Button>, text: &str, url: &str) {
    if !url.is_empty() {
        row.push(Button {
            text: text.to_string(),
            url: url.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;
    use chrono::Utc;

    fn insight(name: &str) -> ProductInsight {
        ProductInsight {
            name: name.to_string(),
            potential: 8.0,
            reason: "Alta procura".to_string(),
            copy: "Peça hoje.".to_string(),
            price_label: "R$ 49".to_string(),
            margin_label: "35%".to_string(),
            revenue_label: "R$ 20k/mês".to_string(),
            logistics_advantage: "Leve e compacto.".to_string(),
            aliexpress_link: String::new(),
            shopee_link: String::new(),
        }
    }

    fn product(name: &str) -> Product {
        Product {
            name: name.to_string(),
            source: Source::AmazonBestseller,
            sales_volume_signal: 800,
            price: None,
            original_rank: 1,
            success_probability: 0.8,
            trend_reason: "Amazon Bestsellers - Cozinha • 800 compras".to_string(),
            harvested_at: Utc::now(),
        }
    }

    #[test]
    fn simplify_drops_stop_words_accents_and_extra_tokens() {
        assert_eq!(
            simplify_term("Kit Organizador de Gavetas Dobrável Premium"),
            "Organizador Gavetas Dobravel"
        );
        assert_eq!(simplify_term("Smartphone Wireless"), "celular fio");
        assert_eq!(simplify_term(""), "");
    }

    #[test]
    fn messages_carry_two_button_rows() {
        let report = InsightReport {
            low_ticket: vec![insight("Garrafa Térmica")],
            high_ticket: vec![],
        };
        let messages = build_messages(&[product("Garrafa Térmica")], &report);
        assert_eq!(messages.len(), 2);

        let first = &messages[0];
        assert_eq!(first.buttons.len(), 2);
        assert_eq!(first.buttons[0].len(), 2);
        assert_eq!(first.buttons[1].len(), 2);
        assert!(first.buttons[0][0].url.contains("aliexpress"));
        assert!(first.buttons[1][1].url.contains("trends.google.com"));
        assert!(first.text.starts_with(LOW_TICKET_HEADER));
        assert!(first.text.contains("📦 Garrafa Térmica"));
        assert!(first.text.contains("⭐ Potencial: 8/10"));
    }

    #[test]
    fn joined_candidate_contributes_an_evidence_line() {
        let report = InsightReport {
            low_ticket: vec![insight("garrafa térmica")],
            high_ticket: vec![],
        };
        let messages = build_messages(&[product("Garrafa Térmica")], &report);
        assert!(messages[0].text.contains("📊 Evidência: Amazon Bestsellers"));

        let unmatched = InsightReport {
            low_ticket: vec![insight("Outro Produto")],
            high_ticket: vec![],
        };
        let messages = build_messages(&[product("Garrafa Térmica")], &unmatched);
        assert!(!messages[0].text.contains("📊 Evidência"));
    }

    #[test]
    fn empty_names_are_skipped_and_trailer_always_sent() {
        let report = InsightReport {
            low_ticket: vec![insight("   ")],
            high_ticket: vec![],
        };
        let messages = build_messages(&[], &report);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, TRAILER);
        assert!(messages[0].buttons.is_empty());
    }

    #[test]
    fn empty_annotation_name_falls_back_to_harvested_product() {
        let report = InsightReport {
            low_ticket: vec![insight("")],
            high_ticket: vec![],
        };
        let messages = build_messages(&[product("Panela Elétrica")], &report);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].text.contains("📦 Panela Elétrica"));
    }

    #[test]
    fn tiers_are_capped_at_five_each() {
        let report = InsightReport {
            low_ticket: (0..9).map(|i| insight(&format!("Produto A{i}"))).collect(),
            high_ticket: (0..9).map(|i| insight(&format!("Produto B{i}"))).collect(),
        };
        let messages = build_messages(&[], &report);
        // 5 + 5 + trailer
        assert_eq!(messages.len(), 11);
        assert!(messages[5].text.starts_with(HIGH_TICKET_HEADER));
    }
}
