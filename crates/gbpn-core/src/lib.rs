//! Core types and storage for the GBPN place graph.
//!
//! Provides the place data model ([`graph::PlaceGraph`]), time-scoped parent links
//! ([`span::DateSpan`]), the [`store::PlaceStore`] contract with per-record
//! transactions, JSON persistence, configuration, and integrity checking.

pub mod config;
pub mod error;
pub mod graph;
pub mod integrity;
pub mod schema;
pub mod span;
pub mod storage;
pub mod store;
