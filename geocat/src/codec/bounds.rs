use geocat_core::Envelope;
use serde::{Deserialize, Serialize};

/// The `bbox` block: four extents plus the derived centre.
///
/// `center` is output only and ignored when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsJson {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
    #[serde(default, skip_deserializing)]
    pub center: [f64; 2],
}

impl From<&Envelope> for BoundsJson {
    fn from(bbox: &Envelope) -> Self {
        let (x, y) = bbox.centre();
        Self {
            west: bbox.min_x,
            south: bbox.min_y,
            east: bbox.max_x,
            north: bbox.max_y,
            center: [x, y],
        }
    }
}

impl BoundsJson {
    /// The envelope described by the four extents.
    #[must_use]
    pub fn to_envelope(&self) -> Envelope {
        Envelope::new(self.west, self.east, self.south, self.north)
    }
}
