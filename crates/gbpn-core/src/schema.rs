//! On-disk format of the place graph: version gate and consistency repair on load.

use crate::graph::{PlaceGraph, PlaceId};
use anyhow::{Context, Result};

pub const CURRENT_VERSION: &str = "1.0.0";

/// Reject graphs written by an incompatible format version.
pub fn validate_version(graph: &PlaceGraph) -> Result<()> {
    if graph.version != CURRENT_VERSION {
        anyhow::bail!(
            "place graph version mismatch: expected {}, found {}",
            CURRENT_VERSION,
            graph.version
        );
    }
    Ok(())
}

/// Every place must be stored under its own id.
fn validate_ids(graph: &PlaceGraph) -> Result<()> {
    for (key, place) in &graph.places {
        if *key != place.id {
            anyhow::bail!("place {} is stored under id {}", place.id, key);
        }
    }
    Ok(())
}

pub fn to_json(graph: &PlaceGraph) -> Result<String> {
    serde_json::to_string_pretty(graph).context("failed to serialize place graph to JSON")
}

/// Deserialize a graph, then rebuild its (name, type) index and move the id
/// counter past every stored place so new places never reuse an id.
pub fn from_json(json: &str) -> Result<PlaceGraph> {
    let mut graph: PlaceGraph =
        serde_json::from_str(json).context("failed to deserialize place graph from JSON")?;
    validate_version(&graph)?;
    validate_ids(&graph)?;

    let next_free = graph
        .places
        .keys()
        .next_back()
        .map_or(1, |PlaceId(highest)| highest + 1);
    if graph.next_id < next_free {
        tracing::warn!(
            "place graph id counter {} is behind stored places; continuing at {}",
            graph.next_id,
            next_free
        );
        graph.next_id = next_free;
    }
    graph.rebuild_key_index();
    Ok(graph)
}
