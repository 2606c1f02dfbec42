use std::borrow::Cow;

use geocat_core::crs::{Crs, CrsRegistry};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The `proj` block: identifier, classification and unit of a spatial reference.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjJson {
    pub srs: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<&'static str>,
    pub unit: Option<&'static str>,
}

/// A spatial reference as sent by clients: either the identifier itself or a
/// `proj` block carrying it in `srs`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ProjInput {
    Srs(String),
    Proj { srs: String },
    Other(serde_json::Value),
}

impl ProjInput {
    #[must_use]
    pub fn srs(&self) -> Option<&str> {
        match self {
            Self::Srs(srs) | Self::Proj { srs } => Some(srs.as_str()),
            Self::Other(_) => None,
        }
    }
}

/// Encodes a spatial reference given as an object, an identifier, or both.
///
/// The missing half is derived from the other one when possible.
#[must_use]
pub fn encode_proj(crs: Option<&Crs>, srs: Option<&str>, registry: &CrsRegistry) -> ProjJson {
    let srs = match (srs, crs) {
        (Some(srs), _) => Some(srs.to_string()),
        (None, Some(crs)) => registry
            .lookup_identifier(crs)
            .map_err(|e| warn!("Unable to determine srs from crs {crs}: {e}"))
            .ok(),
        (None, None) => None,
    };

    let crs = match (crs, &srs) {
        (Some(crs), _) => Some(Cow::Borrowed(crs)),
        (None, Some(srs)) => registry
            .decode(srs)
            .map_err(|e| warn!("Unable to determine crs from srs {srs}: {e}"))
            .ok()
            .map(Cow::Owned),
        (None, None) => None,
    };

    ProjJson {
        srs,
        kind: crs.as_deref().map(|crs| crs.kind.as_str()),
        unit: crs.as_deref().map(unit_name),
    }
}

/// Unit of the first axis as reported by the API: `ft`, `m` or `degrees`.
fn unit_name(crs: &Crs) -> &'static str {
    match crs.unit.as_deref() {
        Some("ft" | "feets") => "ft",
        _ if crs.is_projected() => "m",
        _ => "degrees",
    }
}

/// Decodes the spatial reference of a request, falling back to WGS 84.
#[must_use]
pub fn decode_proj(input: Option<&ProjInput>, registry: &CrsRegistry) -> Crs {
    let Some(input) = input else {
        return Crs::wgs84();
    };
    match input.srs() {
        Some(srs) => registry.decode(srs).unwrap_or_else(|e| {
            warn!("Unrecognized proj {srs}, using WGS 84: {e}");
            Crs::wgs84()
        }),
        None => {
            warn!("Unrecognized proj {input:?}, using WGS 84");
            Crs::wgs84()
        }
    }
}
