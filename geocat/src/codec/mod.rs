//! Conversion of catalog entries to JSON documents and back.
//!
//! Encoders never fail on spatial reference problems: an identifier that
//! cannot be resolved is logged and left out of the document. Decoders fail
//! only on structurally invalid input.

use serde_json::Value;

mod bounds;
pub use bounds::BoundsJson;

mod date;
pub use date::{DateJson, HTTP_DATE_FORMAT, encode_date, pretty_relative};

mod layer;
pub use layer::{AttributeJson, LayerBoundsJson, LayerJson, SchemaJson, encode_layer};

mod map;
pub use map::{LayerRef, MapEncoder, MapJson, MapLayerJson, MapUpdate, NewMap};

mod proj;
pub use proj::{ProjInput, ProjJson, decode_proj, encode_proj};

mod workspace;
pub use workspace::{WorkspaceJson, encode_workspace};

/// A convenience [`Result`] for request body decoding.
pub type CodecResult<T> = Result<T, CodecError>;

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Expected a JSON array, got {0}")]
    NotAnArray(&'static str),

    #[error("Invalid map name '{0}': must not be empty or contain '/', '\\' or '..'")]
    InvalidName(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(#[source] serde_json::Error),
}

/// Name of a JSON value's type, for error messages.
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
