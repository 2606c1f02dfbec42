//! Command line arguments and the YAML configuration file.

pub mod args;
pub mod env;
pub mod file;
