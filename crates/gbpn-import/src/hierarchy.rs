//! Administrative hierarchy assembly.
//!
//! Every record is placed under a fixed topology rooted at the United Kingdom:
//!
//! ```text
//! United Kingdom
//! └── Region
//!     ├── Historic county            (before 1889)
//!     ├── Administrative county      (1889 to 1974)
//!     │   └── District
//!     │       └── Civil parish
//!     └── Unitary authority          (after 1974)
//!         └── Civil parish
//! ```
//!
//! Intermediate places are linked with unbounded links through the [`Upserter`];
//! only the subject place gets era-scoped links.

use crate::record::{SourceRecord, fields};
use crate::upsert::Upserter;
use gbpn_core::config::{GbpnConfig, HierarchyConfig};
use gbpn_core::error::StoreError;
use gbpn_core::graph::{PlaceId, PlaceRef, PlaceType};
use gbpn_core::span::Era;
use gbpn_core::store::PlaceStore;
use tracing::debug;

/// Name of the root country place.
pub const ROOT_NAME: &str = "United Kingdom";

const CIVIL_PARISH_SUFFIX: &str = " CP";

/// Builds the lineage of one record and returns the subject's era-scoped links.
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuilder {
    tiers: HierarchyConfig,
    strip_civil_parish_suffix: bool,
}

/// Places resolved for one record, per tier.
#[derive(Debug, Default)]
struct Lineage {
    historic: Vec<PlaceId>,
    admin_county: Option<PlaceId>,
    district: Option<PlaceId>,
    admin_parish: Option<PlaceId>,
    unitary_authority: Option<PlaceId>,
    modern_parish: Option<PlaceId>,
}

impl HierarchyBuilder {
    pub fn new(tiers: HierarchyConfig, strip_civil_parish_suffix: bool) -> Self {
        Self {
            tiers,
            strip_civil_parish_suffix,
        }
    }

    pub fn from_config(config: &GbpnConfig) -> Self {
        Self::new(
            config.hierarchy.clone(),
            config.preferences.strip_civil_parish_suffix,
        )
    }

    /// Ensure the record's administrative places and return the links the
    /// subject should hold, in tier order.
    pub fn build<S: PlaceStore + ?Sized>(
        &self,
        upserter: &mut Upserter<'_, S>,
        record: &SourceRecord,
        subject: PlaceId,
    ) -> Result<Vec<PlaceRef>, StoreError> {
        let root = upserter.ensure(ROOT_NAME, PlaceType::Country, None)?;
        let anchor = match record.field(fields::REGION) {
            Some(region) => upserter.ensure(region, PlaceType::Region, Some(root))?,
            None => root,
        };

        let mut lineage = Lineage::default();

        if self.tiers.historic
            && let Some(raw) = record.field(fields::HISTORIC_COUNTY)
        {
            for county in split_historic_counties(raw) {
                lineage
                    .historic
                    .push(upserter.ensure(county, PlaceType::County, Some(anchor))?);
            }
        }

        if self.tiers.administrative
            && let Some(county) = record.field(fields::ADMIN_COUNTY)
        {
            let county = upserter.ensure(county, PlaceType::County, Some(anchor))?;
            lineage.admin_county = Some(county);
            if let Some(district) = record.field(fields::DISTRICT) {
                lineage.district =
                    Some(upserter.ensure(district, PlaceType::District, Some(county))?);
            }
        }

        if self.tiers.modern
            && let Some(authority) = record.field(fields::UNITARY_AUTHORITY)
        {
            lineage.unitary_authority =
                Some(upserter.ensure(authority, PlaceType::County, Some(anchor))?);
        }

        if self.tiers.civil_parish
            && let Some(raw) = record.field(fields::CIVIL_PARISH)
        {
            let parish = normalize_parish_name(raw, self.strip_civil_parish_suffix);
            if !parish.is_empty() {
                if let Some(parent) = lineage.district.or(lineage.admin_county) {
                    lineage.admin_parish =
                        Some(upserter.ensure(parish, PlaceType::Parish, Some(parent))?);
                }
                if let Some(parent) = lineage.unitary_authority {
                    lineage.modern_parish =
                        Some(upserter.ensure(parish, PlaceType::Parish, Some(parent))?);
                }
            }
        }

        let mut links: Vec<PlaceRef> = lineage
            .historic
            .iter()
            .map(|&county| PlaceRef::lineage(county, Some(Era::Historic.span())))
            .collect();
        if let Some(deepest) = lineage
            .admin_parish
            .or(lineage.district)
            .or(lineage.admin_county)
        {
            links.push(PlaceRef::lineage(deepest, Some(Era::Administrative.span())));
        }
        if let Some(deepest) = lineage.modern_parish.or(lineage.unitary_authority) {
            links.push(PlaceRef::lineage(deepest, Some(Era::Modern.span())));
        }
        if links.is_empty() && anchor != root {
            links.push(PlaceRef::lineage(anchor, None));
        }

        // A subject that is itself one of its own administrative places keeps no self link.
        links.retain(|link| link.parent != subject);

        debug!(" - Built {} lineage link(s) for {}", links.len(), subject);
        Ok(links)
    }
}

/// Split a slash-separated historic county field: trimmed, empties dropped,
/// duplicates removed keeping the first occurrence.
pub fn split_historic_counties(raw: &str) -> Vec<&str> {
    let mut counties: Vec<&str> = Vec::new();
    for county in raw.split('/').map(str::trim) {
        if !county.is_empty() && !counties.contains(&county) {
            counties.push(county);
        }
    }
    counties
}

/// Trim a civil parish name and optionally strip a trailing ` CP`.
pub fn normalize_parish_name(raw: &str, strip_suffix: bool) -> &str {
    let name = raw.trim();
    if strip_suffix {
        name.strip_suffix(CIVIL_PARISH_SUFFIX)
            .map_or(name, str::trim_end)
    } else {
        name
    }
}
