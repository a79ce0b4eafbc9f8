//! The place graph file under `<project>/.gbpn/`.
//!
//! Saves go through a sibling temporary file and a rename, so an interrupted
//! save leaves the previous graph intact.

use crate::graph::PlaceGraph;
use crate::schema;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const GBPN_DIR: &str = ".gbpn";
const GRAPH_FILE: &str = "places.json";
const PARTIAL_FILE: &str = "places.json.partial";

pub fn gbpn_dir(project_root: &Path) -> PathBuf {
    project_root.join(GBPN_DIR)
}

pub fn graph_file(project_root: &Path) -> PathBuf {
    gbpn_dir(project_root).join(GRAPH_FILE)
}

pub fn graph_exists(project_root: &Path) -> bool {
    graph_file(project_root).exists()
}

pub fn load(project_root: &Path) -> Result<PlaceGraph> {
    let path = graph_file(project_root);
    let json = fs::read_to_string(&path)
        .with_context(|| format!("failed to read place graph from {}", path.display()))?;
    schema::from_json(&json).with_context(|| format!("invalid place graph in {}", path.display()))
}

/// Load the place graph, or start an empty one if none has been saved yet.
pub fn load_or_new(project_root: &Path) -> Result<PlaceGraph> {
    if graph_exists(project_root) {
        load(project_root)
    } else {
        Ok(PlaceGraph::new())
    }
}

/// Save a place graph. Refuses while a transaction is open, since its
/// changes could still be rolled back.
pub fn save(project_root: &Path, graph: &PlaceGraph) -> Result<()> {
    if let Some(description) = graph.open_transaction() {
        anyhow::bail!("cannot save while transaction '{}' is open", description);
    }

    let dir = gbpn_dir(project_root);
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;

    let json = schema::to_json(graph)?;
    let partial = dir.join(PARTIAL_FILE);
    fs::write(&partial, json)
        .with_context(|| format!("failed to write place graph to {}", partial.display()))?;
    let path = graph_file(project_root);
    fs::rename(&partial, &path)
        .with_context(|| format!("failed to replace {}", path.display()))?;

    Ok(())
}
