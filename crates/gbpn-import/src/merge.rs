//! Add-only merging of record attributes into a place.

use crate::record::{GBPN_URL_KIND, SourceRecord, fields, reference_description};
use gbpn_core::config::GbpnConfig;
use gbpn_core::graph::{Coordinates, Place, PlaceType, PlaceUrl};
use tracing::debug;

/// What a merge changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub type_set: bool,
    pub coordinates_set: bool,
    pub url_added: bool,
    pub names_added: usize,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        self.type_set || self.coordinates_set || self.url_added || self.names_added > 0
    }
}

/// Merges type, coordinates, reference URL and alternative names without
/// overwriting anything already set.
#[derive(Debug, Clone)]
pub struct AttributeMerger {
    alternative_names_enabled: bool,
}

impl Default for AttributeMerger {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AttributeMerger {
    pub fn new(alternative_names_enabled: bool) -> Self {
        Self {
            alternative_names_enabled,
        }
    }

    pub fn from_config(config: &GbpnConfig) -> Self {
        Self::new(config.preferences.alternative_names_enabled)
    }

    pub fn merge(&self, place: &mut Place, record: &SourceRecord) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        if place.place_type == PlaceType::Unknown {
            let place_type = PlaceType::from_label(record.type_label());
            if place_type != PlaceType::Unknown {
                debug!(" - Set type '{}' on '{}'", place_type, place.name);
                place.place_type = place_type;
                outcome.type_set = true;
            }
        }

        if place.coordinates.is_none()
            && let Some((latitude, longitude)) = record.coordinates()
        {
            debug!(" - Set coordinates {}, {} on '{}'", latitude, longitude, place.name);
            place.coordinates = Some(Coordinates {
                latitude: latitude.to_string(),
                longitude: longitude.to_string(),
            });
            outcome.coordinates_set = true;
        }

        if let Some(url) = record.url() {
            let description = reference_description(record.gbpn_id());
            let known = place.urls.iter().filter(|u| u.kind == GBPN_URL_KIND).any(|u| {
                u.description == description || u.path == url
            });
            if !known {
                debug!(" - Added reference {} to '{}'", url, place.name);
                place.urls.push(PlaceUrl {
                    kind: GBPN_URL_KIND.to_string(),
                    path: url.to_string(),
                    description,
                });
                outcome.url_added = true;
            }
        }

        if self.alternative_names_enabled {
            for name in record.alternative_names() {
                if place.add_alternative_name(name) {
                    debug!(" - Added alternative name '{}' to '{}'", name, place.name);
                    outcome.names_added += 1;
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbpn_core::graph::PlaceId;

    fn appleby_record() -> SourceRecord {
        SourceRecord::new()
            .with(fields::GBPN_ID, "42")
            .with(fields::TYPE, "Town")
            .with(fields::LATITUDE, "54.5775")
            .with(fields::LONGITUDE, "-2.4898")
            .with(fields::GBPN_URL, "https://gbnames.example/place/42")
            .with(fields::ALTERNATIVE_NAMES, "Appleby-in-Westmorland, Aplebi")
    }

    #[test]
    fn test_merge_into_fresh_place() {
        let mut place = Place::new(PlaceId(1), "Appleby", PlaceType::Unknown);
        let outcome = AttributeMerger::default().merge(&mut place, &appleby_record());

        assert_eq!(
            outcome,
            MergeOutcome {
                type_set: true,
                coordinates_set: true,
                url_added: true,
                names_added: 2,
            }
        );
        assert_eq!(place.place_type, PlaceType::Town);
        assert_eq!(place.urls[0].description, reference_description("42"));
        assert_eq!(place.alternative_names, vec!["Appleby-in-Westmorland", "Aplebi"]);
    }

    #[test]
    fn test_merge_twice_changes_nothing() {
        let merger = AttributeMerger::default();
        let mut place = Place::new(PlaceId(1), "Appleby", PlaceType::Unknown);
        merger.merge(&mut place, &appleby_record());
        let snapshot = place.clone();

        let outcome = merger.merge(&mut place, &appleby_record());
        assert!(!outcome.changed());
        assert_eq!(place, snapshot);
    }

    #[test]
    fn test_existing_values_are_never_overwritten() {
        let mut place = Place::new(PlaceId(1), "Appleby", PlaceType::Village);
        place.coordinates = Some(Coordinates {
            latitude: "1".into(),
            longitude: "2".into(),
        });
        AttributeMerger::default().merge(&mut place, &appleby_record());
        assert_eq!(place.place_type, PlaceType::Village);
        assert_eq!(place.coordinates.as_ref().unwrap().latitude, "1");
    }

    #[test]
    fn test_half_coordinates_are_ignored() {
        let mut place = Place::new(PlaceId(1), "Appleby", PlaceType::Town);
        let record = SourceRecord::new().with(fields::LATITUDE, "54.5775");
        AttributeMerger::default().merge(&mut place, &record);
        assert!(place.coordinates.is_none());
    }

    #[test]
    fn test_same_url_under_other_description_not_duplicated() {
        let mut place = Place::new(PlaceId(1), "Appleby", PlaceType::Town);
        place.urls.push(PlaceUrl {
            kind: GBPN_URL_KIND.into(),
            path: "https://gbnames.example/place/42".into(),
            description: "hand-entered".into(),
        });
        let outcome = AttributeMerger::default().merge(&mut place, &appleby_record());
        assert!(!outcome.url_added);
        assert_eq!(place.urls.len(), 1);
    }

    #[test]
    fn test_alternative_names_can_be_disabled() {
        let mut place = Place::new(PlaceId(1), "Appleby", PlaceType::Town);
        let outcome = AttributeMerger::new(false).merge(&mut place, &appleby_record());
        assert_eq!(outcome.names_added, 0);
        assert!(place.alternative_names.is_empty());
    }
}
