use std::error::Error;
use std::iter;
use std::num::ParseIntError;

use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use geocat_core::catalog::CatalogError;
use serde::Serialize;
use tracing::{debug, error};

use crate::codec::CodecError;

/// A convenience [`Result`] for request handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of a request, rendered as the JSON error envelope.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Invalid value of the {0} parameter: {1}")]
    InvalidParameter(&'static str, #[source] ParseIntError),

    #[error(transparent)]
    Payload(#[from] JsonPayloadError),
}

impl ApiError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::Catalog(e) if e.is_not_found())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_not_found() {
            debug!("{self}");
        } else {
            error!("{self}");
        }
        HttpResponse::build(self.status_code()).json(error_json(Some(self)))
    }
}

/// The error envelope: `{message, cause, trace}`.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorJson {
    pub message: String,
    pub cause: Option<Vec<String>>,
    pub trace: Option<String>,
}

/// Describes an error and its chain of sources.
///
/// `message` is the first non-empty message in the chain, `cause` lists every
/// message from the outermost error inwards.
#[must_use]
pub fn error_json(err: Option<&(dyn Error + 'static)>) -> ErrorJson {
    let Some(err) = err else {
        return ErrorJson {
            message: "Unknown error".to_string(),
            cause: None,
            trace: None,
        };
    };
    let cause: Vec<String> = iter::successors(Some(err), |&e| e.source())
        .map(ToString::to_string)
        .collect();
    let message = cause
        .iter()
        .find(|msg| !msg.is_empty())
        .cloned()
        .unwrap_or_else(|| err.to_string());
    ErrorJson {
        message,
        cause: Some(cause),
        trace: Some(format!("{err:?}")),
    }
}

/// Routes JSON body extraction failures into the error envelope.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::from(err).into()
}
