// Insight requester: builds the annotation prompt, calls the external
// service, and normalizes the semi-structured response into complete records.

pub mod client;
pub mod repair;

use crate::model::{InsightError, Product};
use client::OpenAiClient;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{info, warn};

/// At most this many candidates are embedded in the prompt.
const MAX_PROMPT_CANDIDATES: usize = 40;

/// At most this many entries are kept per annotation list.
const MAX_INSIGHTS: usize = 10;

const FALLBACK_NAME: &str = "Produto em alta";
const FALLBACK_POTENTIAL: f64 = 7.0;
const FALLBACK_REASON: &str = "Boa demanda identificada.";
const FALLBACK_COPY: &str = "Resolve sua dor em minutos — peça hoje.";
const FALLBACK_PRICE: &str = "R$ 99";
const FALLBACK_MARGIN: &str = "25-45%";
const FALLBACK_REVENUE: &str = "R$ 15k a R$ 40k/mês";
const FALLBACK_LOGISTICS: &str = "Leve, compacto e inquebrável para envios baratos.";

/// EN→PT product vocabulary, longest phrases first so compounds win.
static TERM_DICTIONARY: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        ("milk frother", "misturador de leite"),
        ("frother", "misturador"),
        ("vacuum sealer", "seladora a vácuo"),
        ("sealer", "selador"),
        ("wireless", "sem fio"),
        ("cellphone", "celular"),
        ("smartphone", "celular"),
    ]
    .into_iter()
    .map(|(en, pt)| {
        (
            Regex::new(&format!("(?i){}", regex::escape(en))).unwrap(),
            pt,
        )
    })
    .collect()
});

/// Per-candidate commentary from the annotation service. Fully populated
/// after normalization — no field is ever left empty.
#[derive(Debug, Clone)]
pub struct ProductInsight {
    pub name: String,
    /// 0–10 scale.
    pub potential: f64,
    pub reason: String,
    pub copy: String,
    pub price_label: String,
    pub margin_label: String,
    pub revenue_label: String,
    pub logistics_advantage: String,
    /// Derived locally from the resolved name, never trusted from upstream.
    pub aliexpress_link: String,
    pub shopee_link: String,
}

#[derive(Debug, Clone, Default)]
pub struct InsightReport {
    pub low_ticket: Vec<ProductInsight>,
    pub high_ticket: Vec<ProductInsight>,
}

pub struct InsightRequester {
    client: OpenAiClient,
}

impl InsightRequester {
    /// The key comes from config, falling back to the environment. Absence
    /// is fatal for this component only.
    pub fn new(api_key: Option<String>) -> Result<Self, InsightError> {
        let api_key = api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(InsightError::MissingApiKey)?;
        Ok(Self {
            client: OpenAiClient::new(api_key),
        })
    }

    pub async fn analyze(&self, products: &[Product]) -> Result<InsightReport, InsightError> {
        let prompt = build_prompt(products);
        let content = self.client.complete(&prompt).await?;
        info!("🧠 Annotation response: {} bytes", content.len());

        let parsed = repair::safe_parse(&content);
        let low_ticket = normalize_list(list_from(&parsed, &["low_ticket", "produtos", "top6"]));
        let high_ticket = normalize_list(list_from(&parsed, &["high_ticket"]));

        if low_ticket.is_empty() {
            warn!("🧠 low_ticket list came back empty or malformed");
        }
        info!(
            "🧠 Normalized {} low-ticket / {} high-ticket insights",
            low_ticket.len(),
            high_ticket.len()
        );

        Ok(InsightReport {
            low_ticket,
            high_ticket,
        })
    }
}

fn translate_term(value: &str) -> String {
    let mut out = value.to_string();
    for (pattern, pt) in TERM_DICTIONARY.iter() {
        out = pattern.replace_all(&out, *pt).into_owned();
    }
    out
}

fn build_prompt(products: &[Product]) -> String {
    let list = products
        .iter()
        .take(MAX_PROMPT_CANDIDATES)
        .enumerate()
        .map(|(idx, p)| {
            format!(
                "{}. Produto: {} | Fonte: {} | Prob: {}",
                idx + 1,
                translate_term(&p.name),
                p.source,
                p.success_probability
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    [
        "Especialista em Giro Rápido (Iniciantes). Foque em produtos úteis de R$ 15-89 com 500+ vendas.",
        "NÃO use blocos de código markdown. Retorne APENAS o objeto JSON puro.",
        "Use RIGIDAMENTE: \"n\" (nome do produto), \"t\" (ticket/preço), \"l\" (lucro), \"f\" (faturamento), \"c\" (copy curta), \"m\" (motivo), \"v\" (vantagem logística).",
        "A chave \"n\" deve conter o NOME do produto (ex: \"Misturador de Leite\"), e NÃO um número sequencial.",
        "Se faltar dado estatístico do minerador, calcule uma Probabilidade de Sucesso estimada entre 65% e 90% baseada na utilidade do produto; cozinha e limpeza devem receber valores mais altos.",
        "Proíba \"n/d\" em qualquer campo. Sempre preencha com uma estimativa coerente.",
        "Se a fonte for genérica, preencha o motivo com análise de mercado, ex: \"Alta procura por praticidade doméstica\" ou \"Tendência de viralização no TikTok (Cozinha Funcional)\".",
        "Barreira de Rejeição: drones, itens gamer, eletrônicos caros, projetores, gadgets complexos ou qualquer item que precise de manual complicado são proibidos.",
        "Critério TikTok 10s: se não limpa, não organiza ou não economiza tempo na cozinha, ignore.",
        "Priorize itens com sinal forte de volume (best-seller, 500+ vendas).",
        "Sanidade de idioma: nomes em português simples; evite termos em inglês salvo marca registrada. Use \"celular\", \"sem fio\", etc. Converta termos como \"Milk Frother\" para \"Misturador de Leite\" e \"Sealer\" para \"Selador\".",
        "Retorne apenas itens físicos práticos: limpeza inteligente, gadgets de cozinha que economizam tempo, organização de espaço, segurança doméstica simples.",
        "Estrutura de resposta (JSON puro): 10 itens em low_ticket, nenhum high_ticket. Formato: {\"low_ticket\":[{\"n\",\"t\",\"l\",\"f\",\"c\",\"m\",\"v\"}]}.",
        "Não invente links; o sistema gera. Sempre 10 itens em low_ticket.",
        "Dados candidatos:",
        list.as_str(),
    ]
    .join("\n")
}

/// Returns the first key that holds an array; legacy key names are accepted
/// for older response shapes.
fn list_from<'a>(parsed: &'a Map<String, Value>, keys: &[&str]) -> &'a [Value] {
    for key in keys {
        if let Some(Value::Array(items)) = parsed.get(*key) {
            return items;
        }
    }
    &[]
}

fn normalize_list(items: &[Value]) -> Vec<ProductInsight> {
    items.iter().take(MAX_INSIGHTS).map(normalize_item).collect()
}

/// Resolves one raw annotation entry into a complete record. Both the short
/// wire keys and the legacy long keys are honored; every absent or blank
/// field gets its deterministic fallback.
fn normalize_item(item: &Value) -> ProductInsight {
    let name = resolve_text(item, "n", "nome", FALLBACK_NAME);
    let encoded = urlencoding::encode(&name).into_owned();

    ProductInsight {
        potential: resolve_potential(item),
        reason: resolve_text(item, "m", "motivo", FALLBACK_REASON),
        copy: resolve_text(item, "c", "copy", FALLBACK_COPY),
        price_label: resolve_text(item, "t", "ticket_medio", FALLBACK_PRICE),
        margin_label: resolve_text(item, "l", "margem_lucro", FALLBACK_MARGIN),
        revenue_label: resolve_text(item, "f", "faturamento_estimado", FALLBACK_REVENUE),
        logistics_advantage: resolve_text(item, "v", "vantagem", FALLBACK_LOGISTICS),
        aliexpress_link: format!("https://pt.aliexpress.com/wholesale?SearchText={encoded}"),
        shopee_link: format!("https://shopee.com.br/search?keyword={encoded}"),
        name,
    }
}

fn resolve_text(item: &Value, short: &str, legacy: &str, fallback: &str) -> String {
    let resolved = match item.get(short).or_else(|| item.get(legacy)) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    if resolved.is_empty() {
        fallback.to_string()
    } else {
        resolved
    }
}

fn resolve_potential(item: &Value) -> f64 {
    let value = item.get("p").or_else(|| item.get("potencial"));
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(FALLBACK_POTENTIAL),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(FALLBACK_POTENTIAL),
        _ => FALLBACK_POTENTIAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn short_keys_resolve_with_links_derived_locally() {
        let item = json!({
            "n": "Misturador de Leite",
            "p": 9,
            "m": "Viral no TikTok",
            "c": "Espuma perfeita em segundos.",
            "t": "R$ 35",
            "l": "40%",
            "f": "R$ 20k/mês",
            "v": "Cabe em envelope.",
            "la": "https://evil.example/phish"
        });
        let insight = normalize_item(&item);
        assert_eq!(insight.name, "Misturador de Leite");
        assert_eq!(insight.potential, 9.0);
        assert_eq!(insight.price_label, "R$ 35");
        assert_eq!(
            insight.aliexpress_link,
            "https://pt.aliexpress.com/wholesale?SearchText=Misturador%20de%20Leite"
        );
        assert_eq!(
            insight.shopee_link,
            "https://shopee.com.br/search?keyword=Misturador%20de%20Leite"
        );
    }

    #[test]
    fn legacy_keys_are_honored() {
        let item = json!({"nome": "Selador de Embalagens", "potencial": "8", "motivo": "Alta procura"});
        let insight = normalize_item(&item);
        assert_eq!(insight.name, "Selador de Embalagens");
        assert_eq!(insight.potential, 8.0);
        assert_eq!(insight.reason, "Alta procura");
    }

    #[test]
    fn absent_fields_get_deterministic_fallbacks() {
        let insight = normalize_item(&json!({}));
        assert_eq!(insight.name, FALLBACK_NAME);
        assert_eq!(insight.potential, FALLBACK_POTENTIAL);
        assert_eq!(insight.reason, FALLBACK_REASON);
        assert_eq!(insight.copy, FALLBACK_COPY);
        assert_eq!(insight.price_label, FALLBACK_PRICE);
        assert_eq!(insight.margin_label, FALLBACK_MARGIN);
        assert_eq!(insight.revenue_label, FALLBACK_REVENUE);
        assert_eq!(insight.logistics_advantage, FALLBACK_LOGISTICS);
        assert!(!insight.aliexpress_link.is_empty());
    }

    #[test]
    fn blank_strings_are_treated_as_absent() {
        let insight = normalize_item(&json!({"n": "   ", "m": ""}));
        assert_eq!(insight.name, FALLBACK_NAME);
        assert_eq!(insight.reason, FALLBACK_REASON);
    }

    #[test]
    fn lists_are_capped_at_ten() {
        let items: Vec<Value> = (0..25).map(|i| json!({"n": format!("Produto {i}")})).collect();
        assert_eq!(normalize_list(&items).len(), MAX_INSIGHTS);
    }

    #[test]
    fn legacy_list_keys_are_accepted() {
        let parsed = repair::safe_parse(r#"{"produtos":[{"n":"Organizador de Gavetas"}]}"#);
        let list = list_from(&parsed, &["low_ticket", "produtos", "top6"]);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn prompt_translates_terms_and_caps_candidates() {
        assert_eq!(
            translate_term("Milk Frother Wireless"),
            "misturador de leite sem fio"
        );
        assert_eq!(translate_term("Vacuum Sealer"), "seladora a vácuo");

        let products: Vec<Product> = (0..60)
            .map(|i| Product {
                name: format!("Produto número {i}"),
                source: crate::model::Source::AmazonBestseller,
                sales_volume_signal: 0,
                price: None,
                original_rank: i + 1,
                success_probability: 0.6,
                trend_reason: "Amazon • sem prova".to_string(),
                harvested_at: chrono::Utc::now(),
            })
            .collect();
        let prompt = build_prompt(&products);
        assert!(prompt.contains("40. Produto: Produto número 39"));
        assert!(!prompt.contains("41. Produto:"));
    }
}
