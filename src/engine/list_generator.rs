use rand::Rng;
use serde_json::Value;

use crate::engine::llm_client::TextGenerator;
use crate::engine::prompt_builder::PromptBuilder;
use crate::engine::synthesizer::embedded_json;
use crate::error::GenerationFailure;
use crate::model::config::GenerationConfig;
use crate::model::run::Category;

/// Asks the model for one category's candidates and trims them to `count`.
///
/// Fewer than `count` parsed items is degraded output, not an error: whatever
/// parsed is returned as is. No parsed items at all is a failure.
pub fn generate_list<G, R>(
    llm: &G,
    config: &GenerationConfig,
    category: Category,
    count: u32,
    rng: &mut R,
) -> Result<Vec<String>, GenerationFailure>
where
    G: TextGenerator + ?Sized,
    R: Rng + ?Sized,
{
    let prompt = PromptBuilder::candidate_list(config, category, count);
    log::debug!("{category} prompt:\n{prompt}");

    let raw = llm
        .generate(&prompt)
        .map_err(|source| GenerationFailure::Llm { category, source })?;

    let items = parse_candidates(&raw);
    if items.is_empty() {
        return Err(GenerationFailure::NoItems { category });
    }

    if items.len() < count as usize {
        log::warn!(
            "asked for {count} {}, model returned {}",
            category.plural(),
            items.len()
        );
    }

    Ok(sample_without_replacement(items, count as usize, rng))
}

/// Keeps `count` items chosen uniformly at random, without replacement.
///
/// Partial Fisher-Yates over the front of the vector: every `count`-subset
/// is equally likely and the result is in random order.
/// Returns everything when `count >= len`.
pub fn sample_without_replacement<T, R>(mut items: Vec<T>, count: usize, rng: &mut R) -> Vec<T>
where
    R: Rng + ?Sized,
{
    let len = items.len();
    if len <= count {
        return items;
    }

    for i in 0..count {
        let j = rng.gen_range(i..len);
        items.swap(i, j);
    }

    items.truncate(count);
    items
}

/* =========================
   Parsing
   ========================= */

/// Splits a free-text model reply into distinct candidate strings.
pub fn parse_candidates(raw: &str) -> Vec<String> {
    let items = match parse_json_array(raw) {
        Some(items) => items,
        None => parse_plain_text(raw),
    };

    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = clean_item(&item);
        if item.is_empty() {
            continue;
        }
        if out.iter().any(|seen| seen.eq_ignore_ascii_case(&item)) {
            continue;
        }
        out.push(item);
    }
    out
}

/// First embedded JSON array with usable items. An array with none (`[]`,
/// `[3]`) is only returned when nothing better follows it.
fn parse_json_array(raw: &str) -> Option<Vec<String>> {
    let mut empty = None;

    for value in embedded_json(raw, '[') {
        let Value::Array(values) = value else {
            continue;
        };
        let items = array_items(values);
        if !items.is_empty() {
            return Some(items);
        }
        if empty.is_none() {
            empty = Some(items);
        }
    }

    empty
}

fn array_items(values: Vec<Value>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            Value::Object(obj) => {
                let name = obj
                    .iter()
                    .find(|(k, _)| k.contains("name"))
                    .and_then(|(_, v)| v.as_str())?;
                let description = obj
                    .iter()
                    .find(|(k, _)| k.contains("description"))
                    .and_then(|(_, v)| v.as_str());
                Some(match description {
                    Some(d) if !d.trim().is_empty() => format!("{}: {}", name.trim(), d.trim()),
                    _ => name.to_string(),
                })
            }
            _ => None,
        })
        .collect()
}

fn parse_plain_text(raw: &str) -> Vec<String> {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("```"))
        .collect();

    if lines.len() == 1 {
        return lines[0]
            .split([',', ';'])
            .map(str::to_string)
            .collect();
    }

    lines.into_iter().map(str::to_string).collect()
}

fn clean_item(item: &str) -> String {
    let mut s = item.trim();

    // bullets
    s = s.trim_start_matches(['-', '*', '•']).trim_start();

    // numbering: "1." / "2)"
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &s[digits..];
        if let Some(r) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            s = r.trim_start();
        }
    }

    s.trim_matches(|c| c == '"' || c == '\'' || c == ',')
        .trim()
        .to_string()
}
