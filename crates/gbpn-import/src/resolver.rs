//! PlaceKey resolution: find an existing place equivalent to a request.

use gbpn_core::graph::{PlaceId, PlaceType};
use gbpn_core::store::PlaceStore;

/// Find the place with exactly this (name, type). Case-sensitive, no side effects.
pub fn find_place<S: PlaceStore + ?Sized>(
    store: &S,
    name: &str,
    place_type: &PlaceType,
) -> Option<PlaceId> {
    store.find_by_key(name, place_type)
}
