//! Source records: one decoded gazetteer row keyed by column header.

use serde::Deserialize;
use std::collections::HashMap;

/// Column headers of the gazetteer export.
pub mod fields {
    pub const GBPN_ID: &str = "GBPNID";
    /// `P` for the primary name of a place; other values mark aliases and cross-references.
    pub const NAME_TYPE: &str = "NameType";
    pub const PLACE_NAME: &str = "PlaceName";
    pub const GBPN_URL: &str = "GBPN_URL";
    pub const LATITUDE: &str = "Lat";
    pub const LONGITUDE: &str = "Lng";
    pub const TYPE: &str = "Type";
    /// Comma-separated.
    pub const ALTERNATIVE_NAMES: &str = "Alternative_Name";
    pub const REGION: &str = "Region";
    /// Slash-separated when several historic counties applied at once.
    pub const HISTORIC_COUNTY: &str = "HistCounty";
    pub const ADMIN_COUNTY: &str = "AdCounty";
    pub const DISTRICT: &str = "District";
    pub const UNITARY_AUTHORITY: &str = "UniAuth";
    pub const CIVIL_PARISH: &str = "CivilParish";
}

/// Name type marking a place's primary name.
pub const PRIMARY_NAME_TYPE: &str = "P";

/// Reference type tag for gazetteer URLs.
pub const GBPN_URL_KIND: &str = "GBPN URL";

/// Description identifying the gazetteer reference of one place.
pub fn reference_description(gbpn_id: &str) -> String {
    format!("Gazetteer of British Place Names (ID: {gbpn_id})")
}

/// One row of the gazetteer. Missing fields read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "HashMap<String, String>")]
pub struct SourceRecord {
    fields: HashMap<String, String>,
}

impl From<HashMap<String, String>> for SourceRecord {
    fn from(row: HashMap<String, String>) -> Self {
        row.into_iter().collect()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for SourceRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let fields = iter
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim_start_matches('\u{feff}').to_string(), v.into()))
            .collect();
        Self { fields }
    }
}

impl SourceRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<String>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// Raw value of a field, empty if the column is missing.
    pub fn raw(&self, field: &str) -> &str {
        self.fields.get(field).map_or("", String::as_str)
    }

    /// Trimmed value of a field, `None` when missing or blank.
    pub fn field(&self, field: &str) -> Option<&str> {
        let value = self.raw(field).trim();
        (!value.is_empty()).then_some(value)
    }

    pub fn gbpn_id(&self) -> &str {
        self.raw(fields::GBPN_ID).trim()
    }

    pub fn is_primary_name(&self) -> bool {
        self.raw(fields::NAME_TYPE)
            .trim()
            .eq_ignore_ascii_case(PRIMARY_NAME_TYPE)
    }

    pub fn place_name(&self) -> &str {
        self.raw(fields::PLACE_NAME).trim()
    }

    pub fn type_label(&self) -> &str {
        self.raw(fields::TYPE).trim()
    }

    /// Latitude and longitude, only when both are present.
    pub fn coordinates(&self) -> Option<(&str, &str)> {
        Some((self.field(fields::LATITUDE)?, self.field(fields::LONGITUDE)?))
    }

    pub fn url(&self) -> Option<&str> {
        self.field(fields::GBPN_URL)
    }

    /// Comma-separated alternative names, trimmed, empty segments dropped.
    pub fn alternative_names(&self) -> impl Iterator<Item = &str> {
        self.raw(fields::ALTERNATIVE_NAMES)
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}
