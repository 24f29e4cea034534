// Title cleanup and validation for raw scraped text.
use once_cell::sync::Lazy;
use regex::Regex;

/// Terms that disqualify a listing for the channel's audience: electronics,
/// gadgets, subscriptions and gift cards.
const BLACKLIST: &[&str] = &[
    "cartão",
    "card",
    "assinatura",
    "amazon prime",
    "gift",
    "digital",
    "anuidade",
    "drone",
    "smartwatch",
    "headset",
    "gamer",
    "placa",
    "memória",
    "memoria",
    "processador",
    "projetor",
];

static BRL_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)R\$?\s*\d+(?:[.,]\d{1,3})*(?:,\d{2})?").unwrap());
static USD_AMOUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\s*\d+(?:[.,]\d+)?").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Cleans a raw scraped string into a display title: strips non-breaking
/// spaces and embedded currency amounts, collapses whitespace, trims.
/// Total and idempotent; may return an empty string.
pub fn normalize_title(raw: &str) -> String {
    let cleaned = raw.replace('\u{a0}', " ");
    let cleaned = BRL_AMOUNT.replace_all(&cleaned, " ");
    let cleaned = USD_AMOUNT.replace_all(&cleaned, " ");
    WHITESPACE.replace_all(&cleaned, " ").trim().to_string()
}

/// Hard filter applied right after normalization, before a candidate is built.
pub fn is_valid_title(title: &str) -> bool {
    let normalized = title.trim();
    if normalized.chars().count() < 6 {
        return false;
    }
    if normalized.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let lower = normalized.to_lowercase();
    !BLACKLIST.iter().any(|word| lower.contains(word))
}

/// Best-effort parse of a "1.234 vendidos" style string. Keeps the digits,
/// returns 0 when there are none, saturates on overflow.
pub fn parse_volume_signal(text: &str) -> u32 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    digits
        .parse::<u64>()
        .map(|n| n.min(u32::MAX as u64) as u32)
        .unwrap_or(u32::MAX)
}
