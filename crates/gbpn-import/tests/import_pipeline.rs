//! End-to-end import behaviour against the in-memory place graph.

use chrono::NaiveDate;
use gbpn_core::config::GbpnConfig;
use gbpn_core::error::StoreError;
use gbpn_core::graph::{Place, PlaceGraph, PlaceId, PlaceRef, PlaceType};
use gbpn_core::integrity;
use gbpn_core::span::Era;
use gbpn_core::store::PlaceStore;
use gbpn_import::hierarchy::ROOT_NAME;
use gbpn_import::record::{GBPN_URL_KIND, fields};
use gbpn_import::{ImportError, Importer, SourceRecord};

fn appleby() -> SourceRecord {
    SourceRecord::new()
        .with(fields::GBPN_ID, "42")
        .with(fields::NAME_TYPE, "P")
        .with(fields::PLACE_NAME, "Appleby")
        .with(fields::TYPE, "Town")
        .with(fields::LATITUDE, "54.5775")
        .with(fields::LONGITUDE, "-2.4898")
        .with(fields::GBPN_URL, "https://gbnames.example/place/42")
        .with(fields::ALTERNATIVE_NAMES, "Appleby-in-Westmorland")
        .with(fields::REGION, "Cumbria")
        .with(fields::ADMIN_COUNTY, "Westmorland")
        .with(fields::DISTRICT, "")
        .with(fields::UNITARY_AUTHORITY, "Cumberland")
        .with(fields::CIVIL_PARISH, "Appleby CP")
}

fn strip_suffix_config() -> GbpnConfig {
    let mut config = GbpnConfig::default();
    config.preferences.strip_civil_parish_suffix = true;
    config
}

fn id_of(graph: &PlaceGraph, name: &str, place_type: PlaceType) -> PlaceId {
    graph
        .find_by_key(name, &place_type)
        .unwrap_or_else(|| panic!("missing {name} ({place_type})"))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_appleby_end_to_end() {
    let mut graph = PlaceGraph::new();
    let summary = Importer::new(&strip_suffix_config())
        .run_records(&mut graph, vec![appleby()], "42")
        .unwrap();

    assert_eq!(summary.records_processed, 1);
    assert_eq!(summary.places_created, 6);
    assert_eq!(graph.places.len(), 6);

    let root = id_of(&graph, ROOT_NAME, PlaceType::Country);
    let cumbria = id_of(&graph, "Cumbria", PlaceType::Region);
    let westmorland = id_of(&graph, "Westmorland", PlaceType::County);
    let cumberland = id_of(&graph, "Cumberland", PlaceType::County);
    let parish = id_of(&graph, "Appleby", PlaceType::Parish);
    let town = id_of(&graph, "Appleby", PlaceType::Town);

    assert!(graph.places[&root].parents.is_empty());
    assert_eq!(graph.places[&cumbria].parents, vec![PlaceRef::direct(root)]);
    assert_eq!(graph.places[&westmorland].parents, vec![PlaceRef::direct(cumbria)]);
    assert_eq!(graph.places[&cumberland].parents, vec![PlaceRef::direct(cumbria)]);
    assert_eq!(
        graph.places[&parish].parents,
        vec![PlaceRef::direct(westmorland), PlaceRef::direct(cumberland)]
    );
    assert_eq!(
        graph.places[&town].parents,
        vec![
            PlaceRef::lineage(parish, Some(Era::Administrative.span())),
            PlaceRef::lineage(parish, Some(Era::Modern.span())),
        ]
    );

    let place = &graph.places[&town];
    assert_eq!(place.coordinates.as_ref().unwrap().longitude, "-2.4898");
    assert_eq!(place.urls.len(), 1);
    assert_eq!(place.urls[0].kind, GBPN_URL_KIND);
    assert_eq!(place.alternative_names, vec!["Appleby-in-Westmorland"]);

    assert!(graph.parents_at(town, date(1850, 6, 1)).is_empty());
    assert_eq!(graph.parents_at(town, date(1900, 1, 1)).len(), 1);
    assert_eq!(graph.parents_at(town, date(2020, 1, 1)).len(), 1);
}

#[test]
fn test_second_run_leaves_graph_unchanged() {
    let importer = Importer::new(&strip_suffix_config());
    let mut graph = PlaceGraph::new();
    importer.run_records(&mut graph, vec![appleby()], "42").unwrap();
    let first = graph.places.clone();

    let summary = importer.run_records(&mut graph, vec![appleby()], "42").unwrap();
    assert_eq!(summary.records_processed, 1);
    assert_eq!(summary.places_created, 0);
    assert_eq!(summary.links_added, 0);
    assert_eq!(graph.places, first);
}

#[test]
fn test_no_duplicate_keys_across_many_records() {
    let records = vec![
        appleby(),
        appleby()
            .with(fields::PLACE_NAME, "Bongate")
            .with(fields::CIVIL_PARISH, "Bongate CP"),
        appleby()
            .with(fields::PLACE_NAME, "Drybeck")
            .with(fields::HISTORIC_COUNTY, "Westmorland/Cumberland/Westmorland"),
    ];
    let mut graph = PlaceGraph::new();
    let summary = Importer::new(&strip_suffix_config())
        .run_records(&mut graph, records, "42")
        .unwrap();

    assert_eq!(summary.records_processed, 3);
    assert!(integrity::check(&graph).is_empty());

    let appleby_parish = id_of(&graph, "Appleby", PlaceType::Parish);
    let bongate_parish = id_of(&graph, "Bongate", PlaceType::Parish);
    let westmorland = id_of(&graph, "Westmorland", PlaceType::County);
    let cumberland = id_of(&graph, "Cumberland", PlaceType::County);

    let appleby = id_of(&graph, "Appleby", PlaceType::Town);
    assert_eq!(
        graph.places[&appleby].parents,
        vec![
            PlaceRef::lineage(appleby_parish, Some(Era::Administrative.span())),
            PlaceRef::lineage(appleby_parish, Some(Era::Modern.span())),
        ]
    );
    let bongate = id_of(&graph, "Bongate", PlaceType::Town);
    assert_eq!(
        graph.places[&bongate].parents,
        vec![
            PlaceRef::lineage(bongate_parish, Some(Era::Administrative.span())),
            PlaceRef::lineage(bongate_parish, Some(Era::Modern.span())),
        ]
    );
    let drybeck = id_of(&graph, "Drybeck", PlaceType::Town);
    assert_eq!(
        graph.places[&drybeck].parents,
        vec![
            PlaceRef::lineage(westmorland, Some(Era::Historic.span())),
            PlaceRef::lineage(cumberland, Some(Era::Historic.span())),
            PlaceRef::lineage(appleby_parish, Some(Era::Administrative.span())),
            PlaceRef::lineage(appleby_parish, Some(Era::Modern.span())),
        ]
    );
}

#[test]
fn test_rows_sharing_an_id_keep_their_own_places() {
    let records = vec![
        appleby().with(fields::CIVIL_PARISH, "Appleby"),
        appleby()
            .with(fields::PLACE_NAME, "Bongate")
            .with(fields::CIVIL_PARISH, "Bongate"),
    ];
    let mut graph = PlaceGraph::new();
    let summary = Importer::default()
        .run_records(&mut graph, records, "42")
        .unwrap();
    assert_eq!(summary.records_processed, 2);

    let appleby = id_of(&graph, "Appleby", PlaceType::Town);
    let bongate = id_of(&graph, "Bongate", PlaceType::Town);
    assert_ne!(appleby, bongate);

    let parent_names = |id: PlaceId| -> Vec<String> {
        graph.places[&id]
            .parents
            .iter()
            .map(|link| graph.places[&link.parent].name.clone())
            .collect()
    };
    assert_eq!(parent_names(appleby), vec!["Appleby", "Appleby"]);
    assert_eq!(parent_names(bongate), vec!["Bongate", "Bongate"]);
}

#[test]
fn test_historic_split_links_each_county_before_1889() {
    let record = SourceRecord::new()
        .with(fields::GBPN_ID, "7")
        .with(fields::NAME_TYPE, "p")
        .with(fields::PLACE_NAME, "Sedbergh")
        .with(fields::HISTORIC_COUNTY, "Yorkshire/Lancashire/Yorkshire");
    let mut graph = PlaceGraph::new();
    Importer::default()
        .run_records(&mut graph, vec![record], "7")
        .unwrap();

    let subject = id_of(&graph, "Sedbergh", PlaceType::Unknown);
    let yorkshire = id_of(&graph, "Yorkshire", PlaceType::County);
    let lancashire = id_of(&graph, "Lancashire", PlaceType::County);
    assert_eq!(
        graph.places[&subject].parents,
        vec![
            PlaceRef::lineage(yorkshire, Some(Era::Historic.span())),
            PlaceRef::lineage(lancashire, Some(Era::Historic.span())),
        ]
    );
    assert_eq!(graph.count_by_type()["County"], 2);
}

#[test]
fn test_region_only_record_falls_back_to_region() {
    let record = SourceRecord::new()
        .with(fields::GBPN_ID, "9")
        .with(fields::NAME_TYPE, "P")
        .with(fields::PLACE_NAME, "Nowhere")
        .with(fields::REGION, "Cumbria");
    let mut graph = PlaceGraph::new();
    Importer::default()
        .run_records(&mut graph, vec![record], "9")
        .unwrap();

    assert_eq!(graph.places.len(), 3);
    let region = id_of(&graph, "Cumbria", PlaceType::Region);
    let subject = id_of(&graph, "Nowhere", PlaceType::Unknown);
    assert_eq!(
        graph.places[&subject].parents,
        vec![PlaceRef::lineage(region, None)]
    );
}

#[test]
fn test_invalid_target_touches_nothing() {
    let mut graph = PlaceGraph::new();
    for target in ["", "4x2"] {
        let err = Importer::default()
            .run_records(&mut graph, vec![appleby()], target)
            .unwrap_err();
        assert!(matches!(err, ImportError::InvalidTarget(_)));
    }
    assert!(graph.places.is_empty());
}

#[test]
fn test_only_primary_rows_of_target_are_imported() {
    let records = vec![
        appleby().with(fields::NAME_TYPE, "A"),
        appleby().with(fields::GBPN_ID, "420"),
        appleby(),
    ];
    let mut graph = PlaceGraph::new();
    let summary = Importer::default()
        .run_records(&mut graph, records, "42")
        .unwrap();
    assert_eq!(summary.records_processed, 1);

    let empty = Importer::default()
        .run_records(&mut graph, Vec::new(), "42")
        .unwrap();
    assert_eq!(empty.records_processed, 0);
}

#[test]
fn test_hierarchy_can_be_disabled() {
    let mut config = GbpnConfig::default();
    config.preferences.hierarchy_enabled = false;
    let mut graph = PlaceGraph::new();
    Importer::new(&config)
        .run_records(&mut graph, vec![appleby()], "42")
        .unwrap();

    assert_eq!(graph.places.len(), 1);
    let town = id_of(&graph, "Appleby", PlaceType::Town);
    assert!(graph.places[&town].parents.is_empty());
    assert_eq!(graph.places[&town].urls.len(), 1);
}

#[test]
fn test_existing_direct_links_survive_rebuild() {
    let mut graph = PlaceGraph::new();
    let town = graph.create("Appleby", PlaceType::Town).unwrap();
    let castle = graph.create("Appleby Castle", PlaceType::Locality).unwrap();
    graph.add_parent_link_if_absent(town, castle).unwrap();

    let importer = Importer::new(&strip_suffix_config());
    importer.run_records(&mut graph, vec![appleby()], "42").unwrap();
    importer.run_records(&mut graph, vec![appleby()], "42").unwrap();

    let parents = &graph.places[&town].parents;
    assert_eq!(parents[0], PlaceRef::direct(castle));
    assert_eq!(parents.len(), 3);
}

#[test]
fn test_reimport_with_changed_lineage_replaces_old_links() {
    let importer = Importer::new(&strip_suffix_config());
    let mut graph = PlaceGraph::new();
    importer.run_records(&mut graph, vec![appleby()], "42").unwrap();

    let moved = appleby().with(fields::UNITARY_AUTHORITY, "Westmorland and Furness");
    importer.run_records(&mut graph, vec![moved], "42").unwrap();

    let town = id_of(&graph, "Appleby", PlaceType::Town);
    let parish = id_of(&graph, "Appleby", PlaceType::Parish);
    let links = &graph.places[&town].parents;
    assert_eq!(links.len(), 2);
    assert!(links.iter().all(|l| l.parent == parish));
    let authority = id_of(&graph, "Westmorland and Furness", PlaceType::County);
    assert!(graph.places[&parish].has_parent(authority));
}

#[test]
fn test_subject_is_resolved_by_name_and_type() {
    let importer = Importer::default();
    let mut graph = PlaceGraph::new();
    let untyped = graph.create("Appleby", PlaceType::Unknown).unwrap();

    importer.run_records(&mut graph, vec![appleby()], "42").unwrap();

    // A Town row does not adopt the untyped place of the same name
    let town = id_of(&graph, "Appleby", PlaceType::Town);
    assert_ne!(town, untyped);
    assert!(graph.places[&untyped].urls.is_empty());
    assert_eq!(graph.places[&town].urls.len(), 1);

    // Untyped rows do pick it up and stay untyped
    importer
        .run_records(&mut graph, vec![appleby().with(fields::TYPE, "")], "42")
        .unwrap();
    assert_eq!(graph.places[&untyped].place_type, PlaceType::Unknown);
    assert_eq!(graph.places[&untyped].urls.len(), 1);
}

/// A store that fails creating one particular place.
struct FailingStore {
    inner: PlaceGraph,
    poison: &'static str,
}

impl PlaceStore for FailingStore {
    fn places(&self) -> Box<dyn Iterator<Item = &Place> + '_> {
        self.inner.places()
    }

    fn get(&self, id: PlaceId) -> Option<&Place> {
        PlaceStore::get(&self.inner, id)
    }

    fn create(&mut self, name: &str, place_type: PlaceType) -> Result<PlaceId, StoreError> {
        if name == self.poison {
            return Err(StoreError::Backend(format!("cannot write {name}")));
        }
        self.inner.create(name, place_type)
    }

    fn add_parent_link_if_absent(
        &mut self,
        id: PlaceId,
        parent: PlaceId,
    ) -> Result<bool, StoreError> {
        self.inner.add_parent_link_if_absent(id, parent)
    }

    fn commit_place(&mut self, place: Place) -> Result<(), StoreError> {
        self.inner.commit_place(place)
    }

    fn begin(&mut self, description: &str) -> Result<(), StoreError> {
        self.inner.begin(description)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.inner.commit()
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.inner.rollback()
    }
}

#[test]
fn test_failed_record_rolls_back_and_reports_committed_count() {
    let mut store = FailingStore {
        inner: PlaceGraph::new(),
        poison: "Furness",
    };
    let records = vec![
        appleby(),
        appleby()
            .with(fields::PLACE_NAME, "Ulverston")
            .with(fields::REGION, "Lancashire North")
            .with(fields::ADMIN_COUNTY, "Furness"),
        appleby().with(fields::PLACE_NAME, "Kirkby Thore"),
    ];
    let before_failure = {
        let mut graph = PlaceGraph::new();
        Importer::default()
            .run_records(&mut graph, vec![appleby()], "42")
            .unwrap();
        graph.places
    };

    let err = Importer::default()
        .run_records(&mut store, records, "42")
        .unwrap_err();

    assert_eq!(err.processed(), Some(1));
    assert!(matches!(
        &err,
        ImportError::Record { place, source: StoreError::Backend(_), .. } if place == "Ulverston"
    ));
    assert_eq!(store.inner.places, before_failure);
    assert!(store.inner.open_transaction().is_none());
    assert!(store.inner.find_by_key("Kirkby Thore", &PlaceType::Town).is_none());
}
