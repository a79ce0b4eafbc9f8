//! Integrity checks over a place graph.
//!
//! Detects violations of the graph invariants: duplicate (name, type) keys,
//! repeated parent links, links to missing or self parents, and repeated
//! alternative names.

use crate::graph::{LinkOrigin, PlaceGraph, PlaceId, PlaceType};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// A single integrity problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// Several places share one (name, type) key.
    DuplicateKey {
        name: String,
        place_type: PlaceType,
        places: Vec<PlaceId>,
    },
    /// A place links to the same parent twice with the same origin and span.
    DuplicateParentLink { place: PlaceId, parent: PlaceId },
    /// A link points at a place that does not exist.
    DanglingParent { place: PlaceId, parent: PlaceId },
    /// A place lists itself as a parent.
    SelfParent { place: PlaceId },
    DuplicateAlternativeName { place: PlaceId, name: String },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey {
                name,
                place_type,
                places,
            } => {
                let ids: Vec<String> = places.iter().map(ToString::to_string).collect();
                write!(
                    f,
                    "duplicate place '{}' ({}): {}",
                    name,
                    place_type,
                    ids.join(", ")
                )
            }
            Self::DuplicateParentLink { place, parent } => {
                write!(f, "{} links to parent {} more than once", place, parent)
            }
            Self::DanglingParent { place, parent } => {
                write!(f, "{} links to missing parent {}", place, parent)
            }
            Self::SelfParent { place } => write!(f, "{} lists itself as a parent", place),
            Self::DuplicateAlternativeName { place, name } => {
                write!(f, "{} repeats alternative name '{}'", place, name)
            }
        }
    }
}

/// Run every integrity check: duplicate keys first, then per-place issues in id order.
pub fn check(graph: &PlaceGraph) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();

    let mut by_key: BTreeMap<(&str, &PlaceType), Vec<PlaceId>> = BTreeMap::new();
    for place in graph.places.values() {
        by_key
            .entry((place.name.as_str(), &place.place_type))
            .or_default()
            .push(place.id);
    }
    for ((name, place_type), ids) in by_key {
        if ids.len() > 1 {
            issues.push(IntegrityIssue::DuplicateKey {
                name: name.to_string(),
                place_type: place_type.clone(),
                places: ids,
            });
        }
    }

    for place in graph.places.values() {
        // Direct links are unique per parent; lineage links per (parent, span).
        let mut direct = HashSet::new();
        let mut lineage = HashSet::new();
        for link in &place.parents {
            if link.parent == place.id {
                issues.push(IntegrityIssue::SelfParent { place: place.id });
            } else if !graph.places.contains_key(&link.parent) {
                issues.push(IntegrityIssue::DanglingParent {
                    place: place.id,
                    parent: link.parent,
                });
            }
            let fresh = match link.origin {
                LinkOrigin::Direct => direct.insert(link.parent),
                LinkOrigin::Lineage => lineage.insert((link.parent, link.span)),
            };
            if !fresh {
                issues.push(IntegrityIssue::DuplicateParentLink {
                    place: place.id,
                    parent: link.parent,
                });
            }
        }

        let mut names = HashSet::new();
        for name in &place.alternative_names {
            if !names.insert(name.as_str()) {
                issues.push(IntegrityIssue::DuplicateAlternativeName {
                    place: place.id,
                    name: name.clone(),
                });
            }
        }
    }

    issues
}
