#![forbid(unsafe_code)]

//! REST API exposing the maps (layer groups), layers and workspaces of a
//! geospatial catalog as JSON.
//!
//! The [`codec`] module turns catalog entries into JSON documents and back,
//! the [`srv`] module wires the controllers into an actix-web server, and
//! [`config`] reads the YAML file that seeds the catalog.

pub mod codec;
pub mod config;
pub mod logging;
pub mod srv;

mod error;
pub use error::{GeocatError, GeocatResult};
