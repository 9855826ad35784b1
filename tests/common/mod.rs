//! Shared PokeAPI mock for integration tests

#![allow(dead_code)]

use pokeapi_to_sqlite::config::ApiConfig;
use pokeapi_to_sqlite::extract::PokeApiClient;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct MockApi {
    // Dropped before the runtime that started it
    server: MockServer,
    runtime: Runtime,
}

impl MockApi {
    pub fn start() -> Self {
        let runtime = Runtime::new().expect("Failed to build runtime");
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.uri(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn client(&self) -> PokeApiClient {
        PokeApiClient::new(&self.api_config()).expect("Failed to build client")
    }

    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn mount_json(&self, url_path: &str, body: Value) {
        self.mount(
            Mock::given(method("GET"))
                .and(path(url_path))
                .respond_with(ResponseTemplate::new(200).set_body_json(body)),
        );
    }

    /// Pokémon 25, its species and chain 10 (pichu -> pikachu -> raichu)
    pub fn mount_pikachu(&self) {
        self.mount_json("/pokemon/25/", pikachu_body(&self.uri()));
        self.mount_json("/pokemon-species/25/", species_body(&self.uri()));
        self.mount_json("/evolution-chain/10/", chain_body());
    }
}

pub fn pikachu_body(base: &str) -> Value {
    json!({
        "id": 25,
        "name": "pikachu",
        "types": [{"slot": 1, "type": {"name": "electric", "url": format!("{base}/type/13/")}}],
        "abilities": [{"ability": {"name": "static", "url": format!("{base}/ability/9/")}, "is_hidden": false, "slot": 1}],
        "stats": [{"base_stat": 35, "effort": 0, "stat": {"name": "hp", "url": format!("{base}/stat/1/")}}],
        "species": {"name": "pikachu", "url": format!("{base}/pokemon-species/25/")}
    })
}

pub fn species_body(base: &str) -> Value {
    json!({
        "id": 25,
        "name": "pikachu",
        "evolution_chain": {"url": format!("{base}/evolution-chain/10/")}
    })
}

pub fn chain_body() -> Value {
    json!({
        "id": 10,
        "chain": {
            "species": {"name": "pichu", "url": ""},
            "evolves_to": [{
                "species": {"name": "pikachu", "url": ""},
                "evolves_to": [{
                    "species": {"name": "raichu", "url": ""},
                    "evolves_to": []
                }]
            }]
        }
    })
}
