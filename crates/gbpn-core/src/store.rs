//! The place store contract and its in-memory implementation.
//!
//! Importers only talk to a [`PlaceStore`]. Mutations made between [`PlaceStore::begin`]
//! and [`PlaceStore::commit`] form one unit of work that [`PlaceStore::rollback`]
//! undoes completely. Outside a transaction every mutation applies immediately.

use crate::error::StoreError;
use crate::graph::{Journal, Place, PlaceGraph, PlaceId, PlaceRef, PlaceType};
use std::collections::HashMap;

/// Query/mutate interface over a place graph.
pub trait PlaceStore {
    /// Enumerate all places.
    fn places(&self) -> Box<dyn Iterator<Item = &Place> + '_>;

    fn get(&self, id: PlaceId) -> Option<&Place>;

    /// Exact, case-sensitive (name, type) lookup. The default scans `places()` and
    /// returns the first match; stores with an index should override it.
    fn find_by_key(&self, name: &str, place_type: &PlaceType) -> Option<PlaceId> {
        self.places()
            .find(|p| p.name == name && p.place_type == *place_type)
            .map(|p| p.id)
    }

    /// Create a place with no parents. Fails if the (name, type) key is taken.
    fn create(&mut self, name: &str, place_type: PlaceType) -> Result<PlaceId, StoreError>;

    /// Append an unbounded link to `parent` unless `id` already links to it.
    /// Returns true if a link was added.
    fn add_parent_link_if_absent(
        &mut self,
        id: PlaceId,
        parent: PlaceId,
    ) -> Result<bool, StoreError>;

    /// Persist a modified place, replacing the stored version.
    fn commit_place(&mut self, place: Place) -> Result<(), StoreError>;

    fn begin(&mut self, description: &str) -> Result<(), StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    fn rollback(&mut self) -> Result<(), StoreError>;
}

impl PlaceGraph {
    /// Save the pre-image of `id` into the open journal, once per transaction.
    fn journal_touch(&mut self, id: PlaceId) {
        if let Some(journal) = self.journal.as_mut() {
            journal
                .pre_images
                .entry(id)
                .or_insert_with(|| self.places.get(&id).cloned());
        }
    }

    fn key_holder(&self, name: &str, place_type: &PlaceType) -> Option<PlaceId> {
        PlaceGraph::find_by_key(self, name, place_type)
    }
}

impl PlaceStore for PlaceGraph {
    fn places(&self) -> Box<dyn Iterator<Item = &Place> + '_> {
        Box::new(self.places.values())
    }

    fn get(&self, id: PlaceId) -> Option<&Place> {
        self.places.get(&id)
    }

    fn find_by_key(&self, name: &str, place_type: &PlaceType) -> Option<PlaceId> {
        self.key_holder(name, place_type)
    }

    fn create(&mut self, name: &str, place_type: PlaceType) -> Result<PlaceId, StoreError> {
        if let Some(existing) = self.key_holder(name, &place_type) {
            return Err(StoreError::DuplicateKey {
                name: name.to_string(),
                place_type,
                existing,
            });
        }
        let id = PlaceId(self.next_id);
        self.next_id += 1;
        self.journal_touch(id);
        self.key_index
            .insert((name.to_string(), place_type.clone()), id);
        self.places.insert(id, Place::new(id, name, place_type));
        Ok(id)
    }

    fn add_parent_link_if_absent(
        &mut self,
        id: PlaceId,
        parent: PlaceId,
    ) -> Result<bool, StoreError> {
        if !self.places.contains_key(&parent) {
            return Err(StoreError::NotFound(parent));
        }
        match self.places.get(&id) {
            None => return Err(StoreError::NotFound(id)),
            Some(place) if place.has_parent(parent) => return Ok(false),
            Some(_) => {}
        }
        self.journal_touch(id);
        if let Some(place) = self.places.get_mut(&id) {
            place.parents.push(PlaceRef::direct(parent));
        }
        Ok(true)
    }

    fn commit_place(&mut self, place: Place) -> Result<(), StoreError> {
        let Some(stored) = self.places.get(&place.id) else {
            return Err(StoreError::NotFound(place.id));
        };
        let old_key = (stored.name.clone(), stored.place_type.clone());
        let new_key = (place.name.clone(), place.place_type.clone());
        if old_key != new_key {
            if let Some(existing) = self.key_holder(&new_key.0, &new_key.1)
                && existing != place.id
            {
                return Err(StoreError::DuplicateKey {
                    name: new_key.0,
                    place_type: new_key.1,
                    existing,
                });
            }
            if self.key_index.get(&old_key) == Some(&place.id) {
                self.key_index.remove(&old_key);
            }
            self.key_index.insert(new_key, place.id);
        }
        self.journal_touch(place.id);
        self.places.insert(place.id, place);
        Ok(())
    }

    fn begin(&mut self, description: &str) -> Result<(), StoreError> {
        if let Some(journal) = &self.journal {
            return Err(StoreError::TransactionActive(journal.description.clone()));
        }
        self.journal = Some(Journal {
            description: description.to_string(),
            next_id: self.next_id,
            pre_images: HashMap::new(),
        });
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.journal.take().is_none() {
            return Err(StoreError::NoTransaction);
        }
        self.updated_at = chrono::Utc::now();
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        let journal = self.journal.take().ok_or(StoreError::NoTransaction)?;
        for (id, pre_image) in journal.pre_images {
            match pre_image {
                Some(place) => {
                    self.places.insert(id, place);
                }
                None => {
                    self.places.remove(&id);
                }
            }
        }
        self.next_id = journal.next_id;
        self.rebuild_key_index();
        tracing::debug!("rolled back transaction '{}'", journal.description);
        Ok(())
    }
}
