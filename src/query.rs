//! Read-only queries over a loaded store

use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags, OptionalExtension};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::transform::{EvolutionLink, StatValue};

/// A Pokémon rebuilt from the relational tables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PokemonRecord {
    pub id: i64,
    pub name: String,
    pub is_evolved: bool,
    pub types: Vec<String>,
    pub abilities: Vec<String>,
    pub stats: Vec<StatValue>,
    pub evolution_chain: Vec<EvolutionLink>,
}

/// Criteria for [`filter_names`]; unset fields do not filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PokemonFilter {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_evolved: Option<bool>,
    pub hp_min: Option<i64>,
    pub attack_min: Option<i64>,
    pub type_name: Option<String>,
}

pub fn open_read_only(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;
    Ok(conn)
}

/// All names in identifier order
pub fn list_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pokemon ORDER BY id")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()
        .context("Failed to list Pokémon")?;
    Ok(names)
}

/// Names matching every criterion set in `filter`, in identifier order
pub fn filter_names(conn: &Connection, filter: &PokemonFilter) -> Result<Vec<String>> {
    let mut sql = String::from(
        "SELECT DISTINCT p.name, p.id
         FROM pokemon p
         LEFT JOIN pokemon_stats s_hp ON p.id = s_hp.pokemon_id AND s_hp.stat_name = 'hp'
         LEFT JOIN pokemon_stats s_atk ON p.id = s_atk.pokemon_id AND s_atk.stat_name = 'attack'
         LEFT JOIN pokemon_types pt ON p.id = pt.pokemon_id
         WHERE 1=1",
    );
    let mut params: Vec<Value> = Vec::new();

    if let Some(evolved) = filter.is_evolved {
        sql.push_str(" AND p.is_evolved = ?");
        params.push(Value::Integer(i64::from(evolved)));
    }
    if let Some(hp_min) = filter.hp_min {
        sql.push_str(" AND s_hp.base_stat >= ?");
        params.push(Value::Integer(hp_min));
    }
    if let Some(attack_min) = filter.attack_min {
        sql.push_str(" AND s_atk.base_stat >= ?");
        params.push(Value::Integer(attack_min));
    }
    if let Some(type_name) = filter.type_name.as_deref().filter(|t| !t.is_empty()) {
        sql.push_str(" AND pt.type_name = ?");
        params.push(Value::Text(type_name.to_lowercase()));
    }
    sql.push_str(" ORDER BY p.id");

    let mut stmt = conn.prepare(&sql)?;
    let names = stmt
        .query_map(params_from_iter(params), |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()
        .context("Failed to filter Pokémon")?;
    Ok(names)
}

/// Full records whose name contains `name_fragment` and/or that have `type_name`
pub fn search(
    conn: &Connection,
    name_fragment: Option<&str>,
    type_name: Option<&str>,
) -> Result<Vec<PokemonRecord>> {
    let mut sql = String::from("SELECT id FROM pokemon WHERE 1=1");
    let mut params: Vec<Value> = Vec::new();

    if let Some(fragment) = name_fragment.filter(|s| !s.is_empty()) {
        sql.push_str(" AND name LIKE ?");
        params.push(Value::Text(format!("%{}%", fragment.to_lowercase())));
    }
    if let Some(type_name) = type_name.filter(|t| !t.is_empty()) {
        sql.push_str(" AND id IN (SELECT pokemon_id FROM pokemon_types WHERE type_name = ?)");
        params.push(Value::Text(type_name.to_lowercase()));
    }
    sql.push_str(" ORDER BY id");

    let mut stmt = conn.prepare(&sql)?;
    let ids = stmt
        .query_map(params_from_iter(params), |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()
        .context("Failed to search Pokémon")?;

    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(record) = get_pokemon(conn, id)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Rebuild one Pokémon, or `None` if the identifier is unknown
pub fn get_pokemon(conn: &Connection, id: i64) -> Result<Option<PokemonRecord>> {
    let main = conn
        .query_row(
            "SELECT id, name, is_evolved FROM pokemon WHERE id = ?1",
            [id],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, bool>(2)?)),
        )
        .optional()
        .with_context(|| format!("Failed to read Pokémon {}", id))?;

    let Some((id, name, is_evolved)) = main else {
        return Ok(None);
    };

    let types = column_list(
        conn,
        "SELECT type_name FROM pokemon_types WHERE pokemon_id = ?1 ORDER BY type_name",
        id,
    )?;
    let abilities = column_list(
        conn,
        "SELECT ability_name FROM pokemon_abilities WHERE pokemon_id = ?1 ORDER BY ability_name",
        id,
    )?;

    let mut stmt = conn.prepare(
        "SELECT stat_name, base_stat FROM pokemon_stats WHERE pokemon_id = ?1 ORDER BY stat_name",
    )?;
    let stats = stmt
        .query_map([id], |row| {
            Ok(StatValue {
                stat_name: row.get(0)?,
                base_stat: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    // The chain is found through the link row that names this Pokémon
    let mut stmt = conn.prepare(
        "SELECT el.pokemon_name, el.stage
         FROM evolution_links el
         WHERE el.chain_id = (
             SELECT chain_id FROM evolution_links WHERE pokemon_name = ?1 LIMIT 1
         )
         ORDER BY el.stage",
    )?;
    let evolution_chain = stmt
        .query_map([&name], |row| {
            Ok(EvolutionLink {
                name: row.get(0)?,
                stage: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Some(PokemonRecord {
        id,
        name,
        is_evolved,
        types,
        abilities,
        stats,
        evolution_chain,
    }))
}

/// Query-string boolean: true/false, 1/0, yes/no, on/off in any case
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        other => Err(de::Error::custom(format!("invalid boolean `{}`", other))),
    }
}

fn column_list(conn: &Connection, sql: &str, id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let values = stmt
        .query_map([id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(values)
}
