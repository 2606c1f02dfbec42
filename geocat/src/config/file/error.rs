use std::io;
use std::path::PathBuf;

use geocat_core::catalog::CatalogError;
use geocat_core::crs::CrsError;

pub type ConfigFileResult<T> = Result<T, ConfigFileError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigFileError {
    #[error("Unable to load config file {1}: {0}")]
    ConfigLoadError(#[source] io::Error, PathBuf),

    #[error("Unable to parse config file {1}: {0}")]
    ConfigParseError(#[source] subst::yaml::Error, PathBuf),

    #[error("Unable to serialize the configuration: {0}")]
    ConfigSerializeError(#[source] serde_yaml::Error),

    #[error("Unable to write config file {1}: {0}")]
    ConfigWriteError(#[source] io::Error, PathBuf),

    #[error("Data directory {0} is not a directory")]
    InvalidDataDir(PathBuf),

    #[error("Unable to seed the catalog: {0}")]
    CatalogSeedError(#[source] CatalogError),

    #[error("Map {0} uses spatial reference {1}: {2}")]
    InvalidMapSrs(String, String, #[source] CrsError),

    #[error("Map {0} has an entry that must name exactly one of 'layer' or 'group'")]
    InvalidMapEntry(String),
}

impl From<CatalogError> for ConfigFileError {
    fn from(e: CatalogError) -> Self {
        Self::CatalogSeedError(e)
    }
}
