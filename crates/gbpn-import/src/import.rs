//! Import orchestration: one transaction per matching gazetteer record.

use crate::error::ImportError;
use crate::hierarchy::HierarchyBuilder;
use crate::merge::AttributeMerger;
use crate::record::SourceRecord;
use crate::resolver;
use crate::source;
use crate::upsert::{UpsertStats, Upserter};
use gbpn_core::config::GbpnConfig;
use gbpn_core::error::StoreError;
use gbpn_core::graph::{LinkOrigin, PlaceRef, PlaceType};
use gbpn_core::store::PlaceStore;
use std::path::Path;
use tracing::{debug, info, warn};

/// Summary of an import run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Matching records fully committed.
    pub records_processed: usize,
    pub places_created: usize,
    pub links_added: usize,
}

impl ImportSummary {
    fn absorb(&mut self, stats: UpsertStats) {
        self.records_processed += 1;
        self.places_created += stats.places_created;
        self.links_added += stats.links_added;
    }
}

/// Imports the primary-name records of one gazetteer identifier into a place store.
#[derive(Debug, Clone)]
pub struct Importer {
    merger: AttributeMerger,
    builder: HierarchyBuilder,
    hierarchy_enabled: bool,
}

impl Default for Importer {
    fn default() -> Self {
        Self::new(&GbpnConfig::default())
    }
}

/// A target must be a non-empty string of ASCII digits.
pub fn validate_target(target: &str) -> Result<(), ImportError> {
    if target.is_empty() || !target.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ImportError::InvalidTarget(target.to_string()));
    }
    Ok(())
}

impl Importer {
    pub fn new(config: &GbpnConfig) -> Self {
        Self {
            merger: AttributeMerger::from_config(config),
            builder: HierarchyBuilder::from_config(config),
            hierarchy_enabled: config.preferences.hierarchy_enabled,
        }
    }

    /// Read `path` as a gazetteer CSV and import the rows for `target`.
    ///
    /// The target is checked before the file is opened.
    pub fn run_source<S: PlaceStore + ?Sized>(
        &self,
        store: &mut S,
        path: &Path,
        target: &str,
    ) -> Result<ImportSummary, ImportError> {
        validate_target(target)?;
        let records = source::read_records(path)?;
        self.import_rows(store, records, target)
    }

    /// Import already-decoded records.
    pub fn run_records<S, I>(
        &self,
        store: &mut S,
        records: I,
        target: &str,
    ) -> Result<ImportSummary, ImportError>
    where
        S: PlaceStore + ?Sized,
        I: IntoIterator<Item = SourceRecord>,
    {
        self.run(store, records.into_iter().map(Ok), target)
    }

    /// Import every record whose identifier is `target` and whose name type is primary.
    ///
    /// Each record is committed on its own. When a record fails to decode or to
    /// apply, the run stops; records committed before it stay and the error
    /// carries their count.
    pub fn run<S, I>(
        &self,
        store: &mut S,
        records: I,
        target: &str,
    ) -> Result<ImportSummary, ImportError>
    where
        S: PlaceStore + ?Sized,
        I: IntoIterator<Item = Result<SourceRecord, csv::Error>>,
    {
        validate_target(target)?;
        self.import_rows(store, records, target)
    }

    fn import_rows<S, I>(
        &self,
        store: &mut S,
        records: I,
        target: &str,
    ) -> Result<ImportSummary, ImportError>
    where
        S: PlaceStore + ?Sized,
        I: IntoIterator<Item = Result<SourceRecord, csv::Error>>,
    {
        info!("Importing GBPN ID {}", target);

        let mut summary = ImportSummary::default();
        for record in records {
            let record = record.map_err(|source| {
                warn!("Stopped at an unreadable row: {}", source);
                ImportError::Row {
                    processed: summary.records_processed,
                    source,
                }
            })?;
            if record.gbpn_id() != target || !record.is_primary_name() {
                continue;
            }
            let name = record.place_name();
            if name.is_empty() {
                warn!("Skipping GBPN ID {} record without a place name", target);
                continue;
            }

            store.begin(&format!("Handle GBPN place: {} ({})", name, target))?;
            let mut upserter = Upserter::new(&mut *store);
            let result = self.import_record(&mut upserter, &record);
            let stats = upserter.stats();

            match result.and_then(|()| store.commit()) {
                Ok(()) => summary.absorb(stats),
                Err(source) => {
                    if let Err(e) = store.rollback() {
                        warn!("Rollback of '{}' failed: {}", name, e);
                    }
                    warn!("Rolled back '{}': {}", name, source);
                    return Err(ImportError::Record {
                        place: name.to_string(),
                        processed: summary.records_processed,
                        source,
                    });
                }
            }
        }

        info!(
            "Imported {} record(s) for GBPN ID {}: {} place(s) created, {} link(s) added",
            summary.records_processed, target, summary.places_created, summary.links_added
        );
        Ok(summary)
    }

    fn import_record<S: PlaceStore + ?Sized>(
        &self,
        upserter: &mut Upserter<'_, S>,
        record: &SourceRecord,
    ) -> Result<(), StoreError> {
        let subject = upserter.ensure(
            record.place_name(),
            PlaceType::from_label(record.type_label()),
            None,
        )?;

        let stored = upserter
            .store()
            .get(subject)
            .cloned()
            .ok_or(StoreError::NotFound(subject))?;
        let mut place = stored.clone();
        let outcome = self.merger.merge(&mut place, record);
        if outcome.type_set
            && resolver::find_place(upserter.store(), &place.name, &place.place_type)
                .is_some_and(|holder| holder != subject)
        {
            debug!(
                " - Kept '{}' untyped: a {} of that name already exists",
                place.name, place.place_type
            );
            place.place_type = stored.place_type.clone();
        }
        if place != stored {
            upserter.store_mut().commit_place(place)?;
        }

        if !self.hierarchy_enabled {
            return Ok(());
        }

        let lineage = self.builder.build(upserter, record, subject)?;
        let stored = upserter
            .store()
            .get(subject)
            .cloned()
            .ok_or(StoreError::NotFound(subject))?;
        let mut parents: Vec<PlaceRef> = stored
            .parents
            .iter()
            .filter(|link| link.origin == LinkOrigin::Direct)
            .cloned()
            .collect();
        parents.extend(lineage);
        if parents != stored.parents {
            let mut place = stored;
            place.parents = parents;
            upserter.store_mut().commit_place(place)?;
        }
        Ok(())
    }
}
