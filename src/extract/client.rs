use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, info, warn};

use super::chain::evolution_names;
use super::model::{PokemonResponse, RawPokemon, SpeciesResponse};
use super::PokemonSource;
use crate::config::ApiConfig;
use crate::error::{FetchError, FetchStage};

const USER_AGENT: &str = "pokeapi-to-sqlite";
const POKEMON_ENDPOINT: &str = "pokemon";

/// Blocking PokeAPI client, one request at a time
pub struct PokeApiClient {
    client: Client,
    base_url: String,
}

impl PokeApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn pokemon_url(&self, id: i64) -> String {
        format!("{}/{}/{}/", self.base_url, POKEMON_ENDPOINT, id)
    }

    /// Fetch a Pokémon, its species and its evolution chain
    pub fn fetch_pokemon(&self, id: i64) -> Result<RawPokemon, FetchError> {
        if id <= 0 {
            error!(id, "Invalid Pokémon ID, must be a positive integer");
            return Err(FetchError::InvalidId(id));
        }

        info!(id, "Fetching Pokémon data");
        let pokemon: PokemonResponse =
            self.get_typed(FetchStage::Pokemon, &self.pokemon_url(id))?;

        let species_url = match &pokemon.species {
            Some(link) if !link.url.is_empty() => link.url.clone(),
            _ => {
                warn!(id, "No species URL found");
                return Err(FetchError::MissingLink(FetchStage::Species));
            }
        };

        info!(id, url = %species_url, "Fetching species data");
        let species: SpeciesResponse = self.get_typed(FetchStage::Species, &species_url)?;

        let chain_url = match species.evolution_chain {
            Some(link) if !link.url.is_empty() => link.url,
            _ => {
                warn!(id, "No evolution chain URL found");
                return Err(FetchError::MissingLink(FetchStage::EvolutionChain));
            }
        };

        info!(id, url = %chain_url, "Fetching evolution chain");
        let chain_body = self.get_json(FetchStage::EvolutionChain, &chain_url)?;
        let evolution_chain = evolution_names(&chain_body);

        let raw = RawPokemon::new(pokemon, evolution_chain);
        info!(id, name = %raw.name, "Successfully fetched Pokémon");
        Ok(raw)
    }

    fn get_typed<T: DeserializeOwned>(&self, stage: FetchStage, url: &str) -> Result<T, FetchError> {
        let body = self.get_json(stage, url)?;
        serde_json::from_value(body).map_err(|source| {
            error!(%stage, url, error = %source, "Unexpected response shape");
            FetchError::Decode { stage, source }
        })
    }

    /// GET a URL and parse the body as JSON
    fn get_json(&self, stage: FetchStage, url: &str) -> Result<Value, FetchError> {
        let response = self.client.get(url).send().map_err(|source| {
            if source.is_timeout() {
                error!(%stage, url, "Request timed out");
            } else if source.is_connect() {
                error!(%stage, url, "Connection failed");
            } else {
                error!(%stage, url, error = %source, "Request failed");
            }
            FetchError::Request { stage, source }
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(%stage, url, %status, "HTTP error");
            return Err(FetchError::Status { stage, status });
        }

        let text = response
            .text()
            .map_err(|source| FetchError::Request { stage, source })?;

        serde_json::from_str(&text).map_err(|source| {
            error!(%stage, url, error = %source, "Failed to parse JSON response");
            FetchError::Decode { stage, source }
        })
    }
}

impl PokemonSource for PokeApiClient {
    fn fetch(&self, id: i64) -> Result<RawPokemon, FetchError> {
        self.fetch_pokemon(id)
    }
}
