//! Graph data model for the place hierarchy.

use crate::span::DateSpan;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Store-assigned place identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(pub u64);

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{:04}", self.0)
    }
}

/// Type classification of a place.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PlaceType {
    Country,
    Region,
    County,
    District,
    Parish,
    City,
    Town,
    Village,
    Hamlet,
    Locality,
    #[default]
    Unknown,
    /// A label with no dedicated variant, kept verbatim.
    Custom(String),
}

impl PlaceType {
    /// Map a free-text type label onto a place type (case-insensitive).
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "unknown" => Self::Unknown,
            "country" => Self::Country,
            "region" | "state" => Self::Region,
            "county" => Self::County,
            "district" => Self::District,
            "parish" | "civil parish" => Self::Parish,
            "city" => Self::City,
            "town" => Self::Town,
            "village" => Self::Village,
            "hamlet" => Self::Hamlet,
            "locality" => Self::Locality,
            _ => Self::Custom(trimmed.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Country => "Country",
            Self::Region => "Region",
            Self::County => "County",
            Self::District => "District",
            Self::Parish => "Parish",
            Self::City => "City",
            Self::Town => "Town",
            Self::Village => "Village",
            Self::Hamlet => "Hamlet",
            Self::Locality => "Locality",
            Self::Unknown => "Unknown",
            Self::Custom(label) => label,
        }
    }
}

impl fmt::Display for PlaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a parent link came to exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkOrigin {
    /// Added by `ensure` or by any means other than lineage assembly.
    #[default]
    Direct,
    /// Assembled from a source record's administrative lineage. Replaced
    /// wholesale each time the record is imported.
    Lineage,
}

/// A link from a place to one of its enclosing places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceRef {
    pub parent: PlaceId,
    /// `None` means always valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<DateSpan>,
    #[serde(default)]
    pub origin: LinkOrigin,
}

impl PlaceRef {
    /// An unbounded link, as made by `ensure`.
    pub fn direct(parent: PlaceId) -> Self {
        Self {
            parent,
            span: None,
            origin: LinkOrigin::Direct,
        }
    }

    pub fn lineage(parent: PlaceId, span: Option<DateSpan>) -> Self {
        Self {
            parent,
            span,
            origin: LinkOrigin::Lineage,
        }
    }

    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.span.is_none_or(|span| span.contains(date))
    }
}

/// Latitude and longitude as published by the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: String,
    pub longitude: String,
}

/// An external reference attached to a place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceUrl {
    /// Reference type tag, e.g. "GBPN URL".
    pub kind: String,
    pub path: String,
    pub description: String,
}

/// A place node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub place_type: PlaceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternative_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<PlaceUrl>,
    #[serde(default)]
    pub parents: Vec<PlaceRef>,
}

impl Place {
    pub fn new(id: PlaceId, name: impl Into<String>, place_type: PlaceType) -> Self {
        Self {
            id,
            name: name.into(),
            place_type,
            coordinates: None,
            alternative_names: Vec::new(),
            urls: Vec::new(),
            parents: Vec::new(),
        }
    }

    /// Whether any link of this place targets `parent`.
    pub fn has_parent(&self, parent: PlaceId) -> bool {
        self.parents.iter().any(|r| r.parent == parent)
    }

    /// Add an alternative name unless an equal one is present. Returns true if added.
    pub fn add_alternative_name(&mut self, name: &str) -> bool {
        if self.alternative_names.iter().any(|n| n == name) {
            return false;
        }
        self.alternative_names.push(name.to_string());
        true
    }

    /// Parent links valid on `date` (unbounded links are always valid).
    pub fn parents_at(&self, date: NaiveDate) -> impl Iterator<Item = &PlaceRef> {
        self.parents.iter().filter(move |r| r.is_valid_on(date))
    }
}

/// Aggregate statistics for the graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub total_places: usize,
    pub total_links: usize,
    /// Links assembled from record lineage (time-scoped or region fallback).
    pub lineage_links: usize,
    /// Gazetteer identifiers imported so far, sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imported_ids: Vec<String>,
}

/// Undo journal of the open transaction.
#[derive(Debug, Clone)]
pub(crate) struct Journal {
    pub(crate) description: String,
    pub(crate) next_id: u64,
    /// First pre-image of every place touched; `None` for places created inside.
    pub(crate) pre_images: HashMap<PlaceId, Option<Place>>,
}

/// The place graph: every place with all of its parent links across history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceGraph {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub metadata: GraphMetadata,
    pub places: BTreeMap<PlaceId, Place>,
    pub(crate) next_id: u64,
    /// Index: (name, type) → place. Rebuilt on load via `rebuild_key_index()`.
    #[serde(skip)]
    pub(crate) key_index: HashMap<(String, PlaceType), PlaceId>,
    #[serde(skip)]
    pub(crate) journal: Option<Journal>,
}

impl Default for PlaceGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaceGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            version: crate::schema::CURRENT_VERSION.to_string(),
            created_at: now,
            updated_at: now,
            metadata: GraphMetadata::default(),
            places: BTreeMap::new(),
            next_id: 1,
            key_index: HashMap::new(),
            journal: None,
        }
    }

    pub fn get(&self, id: PlaceId) -> Option<&Place> {
        self.places.get(&id)
    }

    /// Look up a place by exact (name, type) through the index.
    pub fn find_by_key(&self, name: &str, place_type: &PlaceType) -> Option<PlaceId> {
        self.key_index
            .get(&(name.to_string(), place_type.clone()))
            .copied()
    }

    /// All places with the given name, any type, in id order.
    pub fn find_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Place> + 'a {
        self.places.values().filter(move |p| p.name == name)
    }

    /// Places holding at least one link to `parent`, in id order.
    pub fn children_of(&self, parent: PlaceId) -> Vec<&Place> {
        self.places
            .values()
            .filter(|p| p.has_parent(parent))
            .collect()
    }

    /// Places without parents.
    pub fn roots(&self) -> Vec<&Place> {
        self.places
            .values()
            .filter(|p| p.parents.is_empty())
            .collect()
    }

    /// Parent links of `id` valid on `date`.
    pub fn parents_at(&self, id: PlaceId, date: NaiveDate) -> Vec<&PlaceRef> {
        self.places
            .get(&id)
            .map(|p| p.parents_at(date).collect())
            .unwrap_or_default()
    }

    /// Place counts per type label, sorted by label.
    pub fn count_by_type(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for place in self.places.values() {
            *counts.entry(place.place_type.label().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Record that a gazetteer identifier has been imported.
    pub fn note_imported_id(&mut self, gbpn_id: &str) {
        let ids = &mut self.metadata.imported_ids;
        if let Err(pos) = ids.binary_search_by(|probe| probe.as_str().cmp(gbpn_id)) {
            ids.insert(pos, gbpn_id.to_string());
        }
    }

    /// Recompute metadata from current state and rebuild the key index.
    pub fn refresh_metadata(&mut self) {
        self.metadata.total_places = self.places.len();
        self.metadata.total_links = self.places.values().map(|p| p.parents.len()).sum();
        self.metadata.lineage_links = self
            .places
            .values()
            .flat_map(|p| &p.parents)
            .filter(|r| r.origin == LinkOrigin::Lineage)
            .count();
        self.updated_at = Utc::now();
        self.rebuild_key_index();
    }

    /// Rebuild the (name, type) index. When duplicates exist the lowest id wins.
    pub fn rebuild_key_index(&mut self) {
        self.key_index.clear();
        for place in self.places.values() {
            self.key_index
                .entry((place.name.clone(), place.place_type.clone()))
                .or_insert(place.id);
        }
    }

    /// The open transaction's description, if any.
    pub fn open_transaction(&self) -> Option<&str> {
        self.journal.as_ref().map(|j| j.description.as_str())
    }
}
