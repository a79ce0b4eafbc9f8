//! Gazetteer import pipeline: resolve, upsert, merge, and build time-scoped hierarchies.
//!
//! One record flows through the [`import::Importer`]: its subject place is resolved or
//! created, attributes are merged by [`merge::AttributeMerger`], and
//! [`hierarchy::HierarchyBuilder`] ensures the administrative places above it through
//! the idempotent [`upsert::Upserter`] before assigning era-scoped parent links.

pub mod error;
pub mod hierarchy;
pub mod import;
pub mod merge;
pub mod record;
pub mod resolver;
pub mod source;
pub mod upsert;

pub use error::ImportError;
pub use import::{ImportSummary, Importer};
pub use record::SourceRecord;
