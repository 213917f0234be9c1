//! GeoJSON reading and writing for checked feature collections.
//!
//! The checks operate on in-memory collections; this crate is the
//! external reader/writer that moves them on and off disk. Only the
//! subset of GeoJSON the checks produce and consume is supported:
//! feature collections of single and multi geometries with scalar
//! properties.

#![forbid(unsafe_code)]

mod geojson;

pub use geojson::{GeoJsonError, read_collection, write_collection};
