pub mod chain;
pub mod client;
pub mod model;

pub use chain::*;
pub use client::*;
pub use model::*;

use crate::error::FetchError;

/// Source of raw Pokémon records, one identifier at a time
pub trait PokemonSource {
    fn fetch(&self, id: i64) -> Result<RawPokemon, FetchError>;
}
