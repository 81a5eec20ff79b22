//! Prompts for snapshot generation and year search
//!
//! The model is asked for a single JSON object; [`extract_json`] tolerates
//! prose or code fences around it.

use crate::core::calendar::{format_year, Year};
use crate::core::types::Locale;

/// System prompt shared by every snapshot request
pub const SNAPSHOT_SYSTEM_PROMPT: &str = r##"You are an expert academic historian (PhD level).
You produce strictly accurate historical snapshots as pure JSON, with no commentary.

OUTPUT FORMAT (JSON only):
{
  "year": <integer, negative for BC>,
  "summary": "<one paragraph>",
  "civilizations": [{
    "name": "...", "lat": <number>, "lng": <number>, "radiusKm": <number>, "color": "#rrggbb",
    "overview": "...",
    "government": {"type": "...", "leaders": ["..."], "structure": "...", "parties": "..."},
    "society": {"population": "...", "economy": "...", "military": "...", "culture": "..."},
    "figures": [{"name": "...", "role": "...", "lifespan": "...", "impact": "...", "works": "..."}],
    "sources": ["..."]
  }],
  "interactions": [{
    "type": "conflict|trade|culture|diplomacy",
    "fromLat": <number>, "fromLng": <number>, "toLat": <number>, "toLng": <number>,
    "title": "...", "description": "...", "impact": "...", "participants": ["civilization name"]
  }],
  "relationships": {
    "description": "...",
    "nodes": [{"id": "...", "group": "person|nation|organization", "details": "..."}],
    "links": [{"source": "<node id>", "target": "<node id>", "label": "...", "type": "kinship|political|mentor|other"}]
  }
}"##;

/// System prompt for locating a year from free text
pub const SEARCH_SYSTEM_PROMPT: &str = r#"You map free-text historical queries to years.
Identify the single most significant historical year for the query.
Return JSON only: {"year": <integer, negative for BC>}"#;

fn language_instruction(locale: Locale) -> &'static str {
    match locale {
        Locale::English => "Respond in English.",
        Locale::Chinese => "Respond entirely in Chinese (Simplified). Keep JSON keys and the interaction type values in English.",
    }
}

/// User prompt for the snapshot of `year`
pub fn snapshot_prompt(year: Year, locale: Locale) -> String {
    format!(
        "Generate a strictly accurate historical snapshot for the year {label}.\n\
         The \"year\" field must be exactly {year}.\n\
         {language}\n\n\
         CRITICAL REQUIREMENTS:\n\
         1. Civilizations: identify the top 4-6 powers.\n\
            - lat/lng must be the capital or center of power.\n\
            - radiusKm must represent the effective area of control or influence. Do not exaggerate.\n\
            - Provide rigorous detail for government, society and culture.\n\
            - Provide 1-2 distinct academic sources (books or journals) for each civilization.\n\
         2. Interactions: identify 3-5 major geopolitical interactions (war, trade, diplomacy).\n\
         3. Figures: identify 5-8 key figures.\n\
         4. Graph: relationship graph (kinship, political, hostile, mentor). Every link endpoint must be a node id.\n\n\
         Return pure JSON.",
        label = format_year(year),
        year = year,
        language = language_instruction(locale),
    )
}

/// User prompt for year search
pub fn search_prompt(query: &str) -> String {
    format!("QUERY:\n{}\n\nReturn the year as JSON:", query.trim())
}

/// Extract JSON object from LLM response (handles surrounding text)
pub fn extract_json(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (start <= end).then(|| &response[start..=end])
}
