//! Generative market analysis over a ranked result set, with a deterministic
//! fallback so a chat outage never fails an otherwise successful search.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::describe::format_mxn;
use crate::models::RankedProperty;

/// How many listings get a sample line in the prompt. The rest are only
/// represented through the aggregate numbers, keeping the prompt bounded no
/// matter how large the result set is.
const MAX_PROMPT_LISTINGS: usize = 5;

/// Output cap for the generated analysis; 2-3 Spanish sentences fit well
/// within this.
const MAX_ANALYSIS_TOKENS: u32 = 220;

/// Ask the chat model for a short Spanish market commentary on the results.
///
/// Callers are expected to recover from any error here with
/// [`fallback_summary`]; analysis must never sink a search that already has
/// results.
pub async fn generate(
    client: &reqwest::Client,
    config: &LlmConfig,
    query: &str,
    properties: &[RankedProperty],
) -> Result<String> {
    if properties.is_empty() {
        anyhow::bail!("No results to analyze");
    }

    let prompt = build_prompt(query, properties);

    let response = match config.provider.as_str() {
        "ollama" => call_ollama(client, config, &prompt).await?,
        "openai" => call_openai(client, config, &prompt).await?,
        other => anyhow::bail!("Unknown LLM provider: {other}"),
    };

    let text = response.trim();
    if text.is_empty() {
        anyhow::bail!("Chat model returned an empty analysis");
    }
    Ok(text.to_string())
}

/// Deterministic Spanish summary built purely from result statistics.
/// Used whenever the generative path fails or is disabled.
pub fn fallback_summary(properties: &[RankedProperty]) -> String {
    if properties.is_empty() {
        return "No se encontraron propiedades para analizar.".to_string();
    }

    let stats = ResultStats::from(properties);

    let price_part = if stats.min_price == stats.max_price {
        format!("un precio de {} MXN", format_mxn(stats.min_price))
    } else {
        format!(
            "precios entre {} y {} MXN (promedio {})",
            format_mxn(stats.min_price),
            format_mxn(stats.max_price),
            format_mxn(stats.mean_price),
        )
    };

    let zone_part = join_es(&stats.top_cities);

    if properties.len() == 1 {
        format!(
            "Se encontró 1 propiedad con {price_part}, ubicada en {zone_part}."
        )
    } else {
        format!(
            "Se encontraron {} propiedades con {price_part}, principalmente en {zone_part}.",
            properties.len(),
        )
    }
}

struct ResultStats {
    min_price: f64,
    max_price: f64,
    mean_price: f64,
    /// Up to three cities, most frequent first; ties keep result order.
    top_cities: Vec<String>,
    /// Distinct Spanish type labels in first-seen order.
    property_types: Vec<&'static str>,
}

impl ResultStats {
    fn from(properties: &[RankedProperty]) -> Self {
        let mut min_price = f64::MAX;
        let mut max_price = f64::MIN;
        let mut sum = 0.0;
        let mut cities: Vec<(String, usize)> = Vec::new();
        let mut property_types: Vec<&'static str> = Vec::new();

        for ranked in properties {
            let p = &ranked.property;
            min_price = min_price.min(p.price);
            max_price = max_price.max(p.price);
            sum += p.price;

            match cities.iter_mut().find(|(name, _)| *name == p.city) {
                Some((_, count)) => *count += 1,
                None => cities.push((p.city.clone(), 1)),
            }

            let label = p.property_type.label_es();
            if !property_types.contains(&label) {
                property_types.push(label);
            }
        }

        // Stable sort: equal counts stay in first-seen order
        cities.sort_by(|a, b| b.1.cmp(&a.1));

        Self {
            min_price,
            max_price,
            mean_price: sum / properties.len() as f64,
            top_cities: cities.into_iter().take(3).map(|(name, _)| name).collect(),
            property_types,
        }
    }
}

/// "Cancún", "Cancún y Tulum", "Cancún, Tulum y Mérida".
fn join_es(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} y {last}", init.join(", ")),
    }
}

/// Aggregate statistics plus a handful of sample lines. Full descriptions
/// never go into the prompt.
fn build_prompt(query: &str, properties: &[RankedProperty]) -> String {
    let stats = ResultStats::from(properties);

    let samples: String = properties
        .iter()
        .take(MAX_PROMPT_LISTINGS)
        .map(|r| {
            format!(
                "- {} ({}, {} MXN)\n",
                r.property.title,
                r.property.city,
                format_mxn(r.property.price)
            )
        })
        .collect();

    format!(
        "Eres un analista del mercado inmobiliario mexicano. Un usuario buscó: \"{query}\".\n\n\
         Resumen de los resultados:\n\
         - {count} propiedades encontradas\n\
         - Precios: {min} a {max} MXN (promedio {mean})\n\
         - Zonas principales: {zones}\n\
         - Tipos de propiedad: {types}\n\n\
         Algunos ejemplos:\n{samples}\n\
         Escribe un análisis breve en español (2-3 frases) sobre qué tan bien se ajustan \
         los resultados a la búsqueda y cómo se ve el mercado en esas zonas. \
         Responde SOLO con el análisis, sin listas ni markdown.",
        count = properties.len(),
        min = format_mxn(stats.min_price),
        max = format_mxn(stats.max_price),
        mean = format_mxn(stats.mean_price),
        zones = join_es(&stats.top_cities),
        types = stats.property_types.join(", "),
    )
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: u32,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Message,
}

async fn call_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    prompt: &str,
) -> Result<String> {
    let url = format!("{}/api/chat", config.base_url);

    let req = OllamaChatRequest {
        model: config.chat_model.clone(),
        messages: vec![Message {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        stream: false,
        options: OllamaOptions {
            num_predict: MAX_ANALYSIS_TOKENS,
        },
    };

    let resp = client
        .post(&url)
        .json(&req)
        .send()
        .await
        .context("Failed to call Ollama chat API for analysis")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Ollama chat API returned {status}: {body}");
    }

    let body: OllamaChatResponse = resp.json().await?;
    Ok(body.message.content)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: String,
}

async fn call_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    prompt: &str,
) -> Result<String> {
    let url = format!("{}/v1/chat/completions", config.base_url);
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = OpenAiChatRequest {
        model: config.chat_model.clone(),
        messages: vec![OpenAiMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        temperature: 0.3,
        max_tokens: MAX_ANALYSIS_TOKENS,
    };

    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&req)
        .send()
        .await
        .context("Failed to call OpenAI chat API for analysis")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI chat API returned {status}: {body}");
    }

    let body: OpenAiChatResponse = resp.json().await?;
    Ok(body
        .choices
        .first()
        .map(|c| c.message.content.clone())
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PropertyRecord, PropertyType};
    use chrono::Utc;

    fn ranked(id: &str, title: &str, city: &str, price: f64) -> RankedProperty {
        RankedProperty {
            property: PropertyRecord {
                id: id.to_string(),
                title: title.to_string(),
                description: String::new(),
                property_type: PropertyType::House,
                city: city.to_string(),
                state: "Quintana Roo".to_string(),
                neighborhood: None,
                price,
                bedrooms: 3,
                bathrooms: 2,
                area_m2: None,
                amenities: Vec::new(),
                features: Vec::new(),
                created_at: Utc::now(),
            },
            relevance_score: 0.9,
            match_reason: None,
        }
    }

    #[test]
    fn test_fallback_single_result() {
        let props = vec![ranked("p1", "Casa Sol", "Cancún", 2_500_000.0)];
        let summary = fallback_summary(&props);
        assert!(summary.contains("Se encontró 1 propiedad"));
        assert!(summary.contains("$2,500,000 MXN"));
        assert!(summary.contains("Cancún"));
    }

    #[test]
    fn test_fallback_price_range_and_mean() {
        let props = vec![
            ranked("p1", "A", "Cancún", 1_000_000.0),
            ranked("p2", "B", "Cancún", 2_000_000.0),
            ranked("p3", "C", "Tulum", 3_000_000.0),
        ];
        let summary = fallback_summary(&props);
        assert!(summary.contains("Se encontraron 3 propiedades"));
        assert!(summary.contains("entre $1,000,000 y $3,000,000 MXN"));
        assert!(summary.contains("promedio $2,000,000"));
        assert!(summary.contains("Cancún y Tulum"));
    }

    #[test]
    fn test_fallback_uniform_price_collapses_range() {
        let props = vec![
            ranked("p1", "A", "Mérida", 900_000.0),
            ranked("p2", "B", "Mérida", 900_000.0),
        ];
        let summary = fallback_summary(&props);
        assert!(summary.contains("un precio de $900,000 MXN"));
        assert!(!summary.contains("entre"));
    }

    #[test]
    fn test_fallback_caps_cities_at_three() {
        let props = vec![
            ranked("p1", "A", "Cancún", 1_000_000.0),
            ranked("p2", "B", "Cancún", 1_000_000.0),
            ranked("p3", "C", "Tulum", 1_000_000.0),
            ranked("p4", "D", "Mérida", 1_000_000.0),
            ranked("p5", "E", "Puebla", 1_000_000.0),
        ];
        let summary = fallback_summary(&props);
        assert!(summary.contains("Cancún, Tulum y Mérida"));
        assert!(!summary.contains("Puebla"));
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let props = vec![
            ranked("p1", "A", "Cancún", 1_500_000.0),
            ranked("p2", "B", "Tulum", 2_500_000.0),
        ];
        assert_eq!(fallback_summary(&props), fallback_summary(&props));
    }

    #[test]
    fn test_fallback_empty_results() {
        let summary = fallback_summary(&[]);
        assert!(summary.contains("No se encontraron"));
    }

    #[test]
    fn test_prompt_is_bounded_to_sample_listings() {
        let props: Vec<RankedProperty> = (0..20)
            .map(|i| ranked(&format!("p{i}"), &format!("Listing {i}"), "Cancún", 1_000_000.0))
            .collect();
        let prompt = build_prompt("casa en cancún", &props);
        assert!(prompt.contains("20 propiedades"));
        assert!(prompt.contains("Listing 0"));
        assert!(prompt.contains("Listing 4"));
        assert!(!prompt.contains("Listing 5"));
        assert!(prompt.contains("casa en cancún"));
        assert!(prompt.contains("Tipos de propiedad: Casa"));
    }

    #[test]
    fn test_prompt_skips_full_descriptions() {
        let mut prop = ranked("p1", "Casa Sol", "Cancún", 2_000_000.0);
        prop.property.description = "UNIQUE_MARKER_TEXT".repeat(10);
        let prompt = build_prompt("casa", &[prop]);
        assert!(!prompt.contains("UNIQUE_MARKER_TEXT"));
    }
}
