//! PokeAPI response shapes and the raw record handed to the transformer

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub struct NamedResource {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Link {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct TypeSlot {
    #[serde(rename = "type")]
    pub type_: NamedResource,
}

#[derive(Debug, Deserialize)]
pub struct AbilitySlot {
    pub ability: NamedResource,
}

#[derive(Debug, Deserialize)]
pub struct StatEntry {
    pub stat: NamedResource,
    pub base_stat: i64,
}

/// `GET /pokemon/{id}/`
#[derive(Debug, Deserialize)]
pub struct PokemonResponse {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub abilities: Vec<AbilitySlot>,
    #[serde(default)]
    pub stats: Vec<StatEntry>,
    pub species: Option<Link>,
}

/// `GET /pokemon-species/{id}/`
#[derive(Debug, Deserialize)]
pub struct SpeciesResponse {
    pub evolution_chain: Option<Link>,
}

/// Raw extracted record, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPokemon {
    pub id: i64,
    pub name: String,
    pub types: Vec<String>,
    pub abilities: Vec<String>,
    pub stats: BTreeMap<String, i64>,
    pub evolution_chain: Vec<String>,
    pub is_evolved: bool,
}

impl RawPokemon {
    /// Assemble the raw record; `is_evolved` follows from the chain root
    pub fn new(pokemon: PokemonResponse, evolution_chain: Vec<String>) -> Self {
        let is_evolved = evolution_chain
            .first()
            .is_some_and(|root| *root != pokemon.name);

        Self {
            id: pokemon.id,
            name: pokemon.name,
            types: pokemon.types.into_iter().map(|t| t.type_.name).collect(),
            abilities: pokemon.abilities.into_iter().map(|a| a.ability.name).collect(),
            stats: pokemon
                .stats
                .into_iter()
                .map(|s| (s.stat.name, s.base_stat))
                .collect(),
            evolution_chain,
            is_evolved,
        }
    }
}
