use serde::{Deserialize, Serialize};

use crate::crs::Crs;

/// An axis-aligned rectangle in some coordinate space.
///
/// Serialized with the cardinal names used by the JSON API,
/// i.e. `west`, `south`, `east` and `north`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Minimum x
    #[serde(rename = "west")]
    pub min_x: f64,
    /// Minimum y
    #[serde(rename = "south")]
    pub min_y: f64,
    /// Maximum x
    #[serde(rename = "east")]
    pub max_x: f64,
    /// Maximum y
    #[serde(rename = "north")]
    pub max_y: f64,
}

impl Envelope {
    /// Creates an envelope from two x and two y ordinates.
    ///
    /// The argument order is `x1, x2, y1, y2`, and each pair is normalized
    /// so that a reversed pair still produces a valid rectangle.
    #[must_use]
    pub fn new(x1: f64, x2: f64, y1: f64, y2: f64) -> Self {
        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    /// The whole world in geographic longitude/latitude degrees.
    #[must_use]
    pub fn world() -> Self {
        Self::new(-180.0, 180.0, -90.0, 90.0)
    }

    /// Arithmetic mean of the extents on each axis.
    #[must_use]
    pub fn centre(&self) -> (f64, f64) {
        (
            f64::midpoint(self.min_x, self.max_x),
            f64::midpoint(self.min_y, self.max_y),
        )
    }
}

/// An [`Envelope`] together with the spatial reference its numbers are expressed in.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencedEnvelope {
    /// The extents
    #[serde(flatten)]
    pub envelope: Envelope,
    /// The spatial reference, if known
    pub crs: Option<Crs>,
}

impl ReferencedEnvelope {
    /// Attaches a spatial reference to an envelope.
    #[must_use]
    pub fn new(envelope: Envelope, crs: Option<Crs>) -> Self {
        Self { envelope, crs }
    }

    /// The spatial reference, if known.
    #[must_use]
    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }
}
