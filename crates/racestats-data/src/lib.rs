//! Data ingestion layer for racestats.
//!
//! Discovers and parses session and championship files under a data root and
//! runs the aggregation pipeline over the whole corpus.

pub mod analysis;
pub mod reader;

pub use racestats_core as core;
