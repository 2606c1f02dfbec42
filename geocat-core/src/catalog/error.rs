//! Error types for catalog lookups and mutations.

/// A convenience [`Result`] for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur while looking up or mutating catalog entries.
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Workspace with the given name does not exist
    #[error("No such workspace {0}")]
    NoSuchWorkspace(String),

    /// Map with the given workspace and name does not exist
    #[error("No such map {0}:{1}")]
    NoSuchMap(String, String),

    /// Layer reference could not be resolved
    #[error("No such layer: {0}")]
    NoSuchLayer(String),

    /// Store with the given workspace and name does not exist
    #[error("No such store {0}:{1}")]
    NoSuchStore(String, String),

    /// Style reference could not be resolved
    #[error("No such style: {0}")]
    NoSuchStyle(String),

    /// A map with the same name is already registered in the workspace
    #[error("Map {0}:{1} already exists")]
    DuplicateMap(String, String),

    /// A layer is listed more than once in a map
    #[error("Layer {1} appears more than once in map {0}")]
    DuplicateMapLayer(String, String),

    /// A map cannot be removed while another map nests it
    #[error("Map {0} is nested in map {1}")]
    MapInUse(String, String),

    /// A map was saved without being added first
    #[error("Map {0}:{1} has not been added to the catalog")]
    NotPersisted(String, String),

    /// Duplicate registration of a workspace, layer or style
    #[error("{0} {1} is already registered")]
    AlreadyRegistered(&'static str, String),
}

impl CatalogError {
    /// True for lookup failures of a named entry.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NoSuchWorkspace(_)
                | Self::NoSuchMap(..)
                | Self::NoSuchLayer(_)
                | Self::NoSuchStore(..)
                | Self::NoSuchStyle(_)
        )
    }
}
