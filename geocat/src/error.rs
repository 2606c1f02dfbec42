use std::io;

use geocat_core::catalog::CatalogError;

use crate::config::file::ConfigFileError;

/// A convenience [`Result`] for the geocat crate.
pub type GeocatResult<T> = Result<T, GeocatError>;

#[derive(thiserror::Error, Debug)]
pub enum GeocatError {
    #[error("Unable to bind to {1}: {0}")]
    BindingError(#[source] io::Error, String),

    #[error(transparent)]
    ConfigFileError(#[from] ConfigFileError),

    #[error(transparent)]
    CatalogError(#[from] CatalogError),

    #[error(transparent)]
    WebError(#[from] actix_web::Error),

    #[error(transparent)]
    IoError(#[from] io::Error),
}
