//! Idempotent get-or-create-and-link of places.

use crate::resolver;
use gbpn_core::error::StoreError;
use gbpn_core::graph::{PlaceId, PlaceType};
use gbpn_core::store::PlaceStore;
use tracing::debug;

/// Mutations performed by an [`Upserter`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpsertStats {
    pub places_created: usize,
    pub links_added: usize,
}

/// Ensures places exist under the requested parents without duplicating either.
pub struct Upserter<'s, S: PlaceStore + ?Sized> {
    store: &'s mut S,
    stats: UpsertStats,
}

impl<'s, S: PlaceStore + ?Sized> Upserter<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self {
            store,
            stats: UpsertStats::default(),
        }
    }

    /// Return the place with this (name, type), creating it if needed.
    ///
    /// An existing place gains an unbounded link to `parent` if it has none yet;
    /// it is never duplicated, even when requested under a different parent.
    pub fn ensure(
        &mut self,
        name: &str,
        place_type: PlaceType,
        parent: Option<PlaceId>,
    ) -> Result<PlaceId, StoreError> {
        if let Some(id) = resolver::find_place(&*self.store, name, &place_type) {
            if let Some(parent) = parent
                && parent != id
                && self.store.add_parent_link_if_absent(id, parent)?
            {
                self.stats.links_added += 1;
                debug!(" - Linked existing place '{}' ({}) to {}", name, place_type, parent);
            }
            return Ok(id);
        }

        debug!(" - Created place '{}' ({})", name, place_type);
        let id = self.store.create(name, place_type)?;
        self.stats.places_created += 1;
        if let Some(parent) = parent
            && self.store.add_parent_link_if_absent(id, parent)?
        {
            self.stats.links_added += 1;
        }
        Ok(id)
    }

    pub fn store(&self) -> &S {
        &*self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut *self.store
    }

    pub fn stats(&self) -> UpsertStats {
        self.stats
    }
}
