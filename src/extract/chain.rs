use serde::Deserialize;
use serde_json::Value;
use tracing::error;

use super::model::NamedResource;

/// One node of an evolution-chain tree
#[derive(Debug, Deserialize)]
pub struct ChainLink {
    pub species: NamedResource,
    #[serde(default)]
    pub evolves_to: Vec<ChainLink>,
}

/// Flatten a chain tree into species names, parent before children,
/// each sibling subtree fully expanded before the next one
pub fn flatten_chain(root: &ChainLink) -> Vec<String> {
    let mut names = Vec::new();
    let mut stack = vec![root];

    while let Some(link) = stack.pop() {
        names.push(link.species.name.clone());
        // Reversed so the first sibling is popped first
        stack.extend(link.evolves_to.iter().rev());
    }

    names
}

/// Extract the ordered species names from an `/evolution-chain/` body.
///
/// A body without a well-formed `chain` tree yields an empty sequence.
pub fn evolution_names(body: &Value) -> Vec<String> {
    let Some(chain) = body.get("chain") else {
        error!("Evolution chain response has no 'chain' field");
        return Vec::new();
    };

    match ChainLink::deserialize(chain) {
        Ok(root) => flatten_chain(&root),
        Err(e) => {
            error!(error = %e, "Error parsing evolution chain");
            Vec::new()
        }
    }
}
