use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::TransformError;

/// Main `pokemon` row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PokemonMain {
    pub id: i64,
    pub name: String,
    pub is_evolved: bool,
}

/// One `pokemon_stats` row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatValue {
    pub stat_name: String,
    pub base_stat: i64,
}

/// One `evolution_links` row, stage is 1-based
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionLink {
    pub name: String,
    pub stage: i64,
}

/// A record ready for loading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformedPokemon {
    pub main: PokemonMain,
    pub types: Vec<String>,
    pub abilities: Vec<String>,
    pub stats: Vec<StatValue>,
    pub evolution_chain_identifier: String,
    pub evolution_links: Vec<EvolutionLink>,
}

/// Validate and reshape one raw record
pub fn transform_pokemon(record: &Value) -> Result<TransformedPokemon, TransformError> {
    let obj = record.as_object().ok_or(TransformError::NotAnObject)?;

    let raw_id = obj.get("id").ok_or(TransformError::MissingField("id"))?;
    let raw_name = obj.get("name").ok_or(TransformError::MissingField("name"))?;
    let raw_evolved = obj
        .get("is_evolved")
        .ok_or(TransformError::MissingField("is_evolved"))?;

    let id = raw_id.as_i64().ok_or(TransformError::InvalidField("id"))?;
    let name = raw_name
        .as_str()
        .ok_or(TransformError::InvalidField("name"))?
        .to_string();

    info!(id, %name, "Transforming Pokémon");

    let main = PokemonMain {
        id,
        name,
        is_evolved: is_truthy(raw_evolved),
    };

    let types = string_list(obj, "types", id);
    let abilities = string_list(obj, "abilities", id);

    let stats = match obj.get("stats") {
        Some(Value::Object(raw_stats)) => parse_stats(raw_stats),
        _ => return Err(TransformError::InvalidStats),
    };
    if stats.is_empty() {
        warn!(id, "No valid stats found");
    }

    let chain = match obj.get("evolution_chain") {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(TransformError::EmptyChain),
    };
    let evolution_links: Vec<EvolutionLink> = chain
        .iter()
        .filter_map(Value::as_str)
        .zip(1..)
        .map(|(name, stage)| EvolutionLink {
            name: name.to_string(),
            stage,
        })
        .collect();
    let evolution_chain_identifier = evolution_links
        .first()
        .map(|link| link.name.clone())
        .ok_or(TransformError::EmptyChain)?;

    info!(id, name = %main.name, "Successfully transformed Pokémon");

    Ok(TransformedPokemon {
        main,
        types,
        abilities,
        stats,
        evolution_chain_identifier,
        evolution_links,
    })
}

/// Read a list field, wrapping a lone scalar into a one-element list
fn string_list(obj: &Map<String, Value>, field: &str, id: i64) -> Vec<String> {
    match obj.get(field) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(v) if is_truthy(v) => {
            warn!(id, field, "Field is not a list, converting");
            scalar_text(v).into_iter().collect()
        }
        _ => Vec::new(),
    }
}

/// Numeric stats only, floats truncated; negative values are dropped
fn parse_stats(raw: &Map<String, Value>) -> Vec<StatValue> {
    let mut stats: Vec<StatValue> = raw
        .iter()
        .filter_map(|(name, value)| {
            let base_stat = match value {
                Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64))?,
                _ => return None,
            };
            (base_stat >= 0).then(|| StatValue {
                stat_name: name.clone(),
                base_stat,
            })
        })
        .collect();

    stats.sort_by(|a, b| a.stat_name.cmp(&b.stat_name));
    stats
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
