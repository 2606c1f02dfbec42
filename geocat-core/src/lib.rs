#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

//! Basic building blocks of the geocat map catalog API.
//!
//! The crate owns the catalog model (workspaces, layers, styles and maps),
//! the [`catalog::Catalog`] facade with its in-memory implementation,
//! the spatial reference registry and envelope arithmetic.

/// Catalog model and storage facade
pub mod catalog;

/// Spatial reference systems
pub mod crs;

mod envelope;
pub use envelope::{Envelope, ReferencedEnvelope};

mod data_dir;
pub use data_dir::DataDir;
