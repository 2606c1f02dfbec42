//! Spatial reference systems known to the catalog.
//!
//! This is a descriptive registry only: it knows how to turn an identifier such
//! as `EPSG:3857` into a [`Crs`] (name, classification, axis unit) and back.
//! No coordinate transformation is performed anywhere in geocat.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

/// A convenience [`Result`] for spatial reference lookups.
pub type CrsResult<T> = Result<T, CrsError>;

/// Errors raised while decoding or identifying a spatial reference.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CrsError {
    /// The authority part (e.g. `ESRI`) is not supported
    #[error("Unsupported authority in spatial reference '{0}'")]
    UnknownAuthority(String),

    /// The string could not be parsed as an identifier at all
    #[error("Unable to parse spatial reference '{0}'")]
    Malformed(String),

    /// The code is well-formed but not registered
    #[error("No code \"{0}\" found in the spatial reference registry")]
    UnknownCode(String),

    /// A reference system without an identifier could not be matched
    #[error("No identifier found for spatial reference '{0}'")]
    NoIdentifier(String),
}

/// Classification of a spatial reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrsKind {
    /// Planar coordinates, usually in metres or feet
    Projected,
    /// Longitude/latitude coordinates on an ellipsoid
    Geographic,
    /// Anything else: geocentric, vertical, engineering, compound
    #[default]
    Other,
}

impl CrsKind {
    /// Name used in the JSON API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Projected => "projected",
            Self::Geographic => "geographic",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for CrsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coordinate reference system description.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    /// Human readable name, e.g. `WGS 84 / Pseudo-Mercator`
    pub name: String,
    /// Authority identifier, e.g. `EPSG:3857`
    pub identifier: Option<String>,
    /// Classification of the system
    #[serde(default, rename = "type")]
    pub kind: CrsKind,
    /// Unit symbol of the first axis, e.g. `m`, `ft` or `°`
    pub unit: Option<String>,
}

impl Crs {
    /// The default geographic reference system, WGS 84 longitude/latitude.
    #[must_use]
    pub fn wgs84() -> Self {
        Self {
            name: "WGS 84".to_string(),
            identifier: Some("EPSG:4326".to_string()),
            kind: CrsKind::Geographic,
            unit: Some("°".to_string()),
        }
    }

    /// True for planar systems.
    #[must_use]
    pub fn is_projected(&self) -> bool {
        self.kind == CrsKind::Projected
    }

    /// True for longitude/latitude systems.
    #[must_use]
    pub fn is_geographic(&self) -> bool {
        self.kind == CrsKind::Geographic
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identifier {
            Some(id) => write!(f, "{} ({id})", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A user supplied addition to the registry, usually read from the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrsDefinition {
    /// EPSG code
    pub code: u32,
    /// Human readable name
    pub name: String,
    /// Classification
    #[serde(default, rename = "type")]
    pub kind: CrsKind,
    /// Unit symbol of the first axis
    #[serde(default)]
    pub unit: Option<String>,
}

/// Identifier of the OGC longitude/latitude system, registered apart from EPSG codes.
const CRS84: &str = "CRS:84";

/// Registry of spatial references addressable by EPSG code.
#[derive(Debug, Clone)]
pub struct CrsRegistry {
    codes: BTreeMap<u32, Crs>,
}

impl Default for CrsRegistry {
    fn default() -> Self {
        let mut registry = Self {
            codes: BTreeMap::new(),
        };
        for (code, name, kind, unit) in BUILTIN {
            registry.insert(*code, (*name).to_string(), *kind, Some(*unit));
        }
        for zone in 1..=60_u32 {
            let name = format!("WGS 84 / UTM zone {zone}N");
            registry.insert(32600 + zone, name, CrsKind::Projected, Some("m"));
            let name = format!("WGS 84 / UTM zone {zone}S");
            registry.insert(32700 + zone, name, CrsKind::Projected, Some("m"));
        }
        registry
    }
}

const BUILTIN: &[(u32, &str, CrsKind, &str)] = &[
    (4326, "WGS 84", CrsKind::Geographic, "°"),
    (4269, "NAD83", CrsKind::Geographic, "°"),
    (4258, "ETRS89", CrsKind::Geographic, "°"),
    (4283, "GDA94", CrsKind::Geographic, "°"),
    (3857, "WGS 84 / Pseudo-Mercator", CrsKind::Projected, "m"),
    (900_913, "Google Mercator", CrsKind::Projected, "m"),
    (3395, "WGS 84 / World Mercator", CrsKind::Projected, "m"),
    (3035, "ETRS89-extended / LAEA Europe", CrsKind::Projected, "m"),
    (27700, "OSGB 1936 / British National Grid", CrsKind::Projected, "m"),
    (26915, "NAD83 / UTM zone 15N", CrsKind::Projected, "m"),
    (2227, "NAD83 / California zone 3 (ftUS)", CrsKind::Projected, "ft"),
    (2263, "NAD83 / New York Long Island (ftUS)", CrsKind::Projected, "ft"),
    (4978, "WGS 84 (geocentric)", CrsKind::Other, "m"),
    (5714, "MSL height", CrsKind::Other, "m"),
];

impl CrsRegistry {
    fn insert(&mut self, code: u32, name: String, kind: CrsKind, unit: Option<&str>) {
        self.codes.insert(
            code,
            Crs {
                name,
                identifier: Some(format!("EPSG:{code}")),
                kind,
                unit: unit.map(ToString::to_string),
            },
        );
    }

    /// Adds or replaces a registry entry.
    pub fn register(&mut self, def: CrsDefinition) {
        if self.codes.contains_key(&def.code) {
            info!("Overriding spatial reference EPSG:{} with {}", def.code, def.name);
        }
        self.insert(def.code, def.name, def.kind, def.unit.as_deref());
    }

    /// Number of registered EPSG codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns true if no EPSG code is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Decodes an identifier into a spatial reference.
    ///
    /// Accepted forms include `EPSG:4326`, `epsg:4326`, `4326`,
    /// `urn:ogc:def:crs:EPSG::4326`, `http://www.opengis.net/def/crs/EPSG/0/4326`,
    /// `http://www.opengis.net/gml/srs/epsg.xml#4326` and `CRS:84`.
    pub fn decode(&self, srs: &str) -> CrsResult<Crs> {
        let code = match parse_identifier(srs)? {
            Identifier::Crs84 => {
                return Ok(Crs {
                    name: "WGS 84 (lon/lat)".to_string(),
                    identifier: Some(CRS84.to_string()),
                    ..Crs::wgs84()
                });
            }
            Identifier::Epsg(code) => code,
        };
        self.codes
            .get(&code)
            .cloned()
            .ok_or_else(|| CrsError::UnknownCode(format!("EPSG:{code}")))
    }

    /// Finds the identifier of a spatial reference.
    ///
    /// Uses the identifier the reference carries, and otherwise looks for a
    /// registered system with the same name.
    pub fn lookup_identifier(&self, crs: &Crs) -> CrsResult<String> {
        if let Some(id) = &crs.identifier {
            return Ok(id.clone());
        }
        self.codes
            .values()
            .find(|known| known.name.eq_ignore_ascii_case(&crs.name))
            .and_then(|known| known.identifier.clone())
            .ok_or_else(|| CrsError::NoIdentifier(crs.name.clone()))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Identifier {
    Epsg(u32),
    Crs84,
}

fn parse_identifier(srs: &str) -> CrsResult<Identifier> {
    let trimmed = srs.trim();
    let lower = trimmed.to_ascii_lowercase();
    if matches!(
        lower.as_str(),
        "crs:84" | "ogc:crs84" | "urn:ogc:def:crs:ogc:1.3:crs84" | "urn:ogc:def:crs:ogc::crs84"
    ) {
        return Ok(Identifier::Crs84);
    }

    let code = if let Some(rest) = lower.strip_prefix("epsg:") {
        rest
    } else if let Some(rest) = lower
        .strip_prefix("urn:ogc:def:crs:")
        .or_else(|| lower.strip_prefix("urn:x-ogc:def:crs:"))
    {
        // urn:ogc:def:crs:EPSG:{version}:{code}, the version may be empty
        let mut parts = rest.split(':');
        match parts.next() {
            Some("epsg") => parts.next_back().unwrap_or_default(),
            _ => return Err(CrsError::UnknownAuthority(trimmed.to_string())),
        }
    } else if let Some(rest) = lower.strip_prefix("http://www.opengis.net/def/crs/") {
        match rest.split_once('/') {
            Some(("epsg", tail)) => tail.rsplit('/').next().unwrap_or_default(),
            _ => return Err(CrsError::UnknownAuthority(trimmed.to_string())),
        }
    } else if let Some(rest) = lower.strip_prefix("http://www.opengis.net/gml/srs/epsg.xml#") {
        rest
    } else if lower.contains(':') {
        return Err(CrsError::UnknownAuthority(trimmed.to_string()));
    } else {
        lower.as_str()
    };

    code.parse::<u32>()
        .map(Identifier::Epsg)
        .map_err(|_| CrsError::Malformed(trimmed.to_string()))
}
