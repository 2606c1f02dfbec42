use std::fmt;

use chrono::{DateTime, Utc};
use geocat_core::catalog::{Catalog, CatalogResult, Map, Metadata, Published, PublishedInfo as _};
use geocat_core::crs::CrsRegistry;
use geocat_core::{DataDir, ReferencedEnvelope};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::codec::date::encode_metadata;
use crate::codec::{
    BoundsJson, CodecError, CodecResult, DateJson, ProjInput, ProjJson, decode_proj, encode_proj,
    json_type,
};

/// A map (layer group) as returned by the API.
///
/// The list form leaves `layers` out.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapJson {
    pub name: String,
    pub workspace: String,
    #[serialize_always]
    pub title: Option<String>,
    #[serialize_always]
    #[serde(rename = "abstract")]
    pub description: Option<String>,
    pub proj: ProjJson,
    pub bbox: BoundsJson,
    pub layer_count: usize,
    pub created: Option<DateJson>,
    pub modified: Option<DateJson>,
    pub layers: Option<Vec<MapLayerJson>>,
}

/// One member of a map in the detail form.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapLayerJson {
    pub name: String,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub description: Option<String>,
    /// Name of the resource behind a layer
    pub resource: Option<String>,
    pub workspace: Option<String>,
    /// Mode of a nested group
    pub group: Option<&'static str>,
    pub layer_count: Option<usize>,
}

/// Encodes maps against a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct MapEncoder<'a> {
    crs: &'a CrsRegistry,
    data_dir: Option<&'a DataDir>,
    now: DateTime<Utc>,
}

impl<'a> MapEncoder<'a> {
    #[must_use]
    pub fn new(crs: &'a CrsRegistry, data_dir: Option<&'a DataDir>, now: DateTime<Utc>) -> Self {
        Self { crs, data_dir, now }
    }

    /// The list form of a map.
    #[must_use]
    pub fn summary(&self, map: &Map) -> MapJson {
        let mut metadata = map.metadata.clone();
        if metadata.modified.is_none() {
            metadata.modified = self
                .data_dir
                .and_then(|dir| dir.map_last_modified(&map.workspace, &map.name));
        }
        let (created, modified) = encode_metadata(&metadata, self.now);

        MapJson {
            name: map.name.clone(),
            workspace: map.workspace.clone(),
            title: map.title.clone(),
            description: map.description.clone(),
            proj: encode_proj(map.bounds.crs(), None, self.crs),
            bbox: BoundsJson::from(&map.bounds.envelope),
            layer_count: map.entries.len(),
            created,
            modified,
            layers: None,
        }
    }

    /// The detail form of a map, members listed top-most first.
    pub fn detail(&self, map: &Map, catalog: &dyn Catalog) -> CatalogResult<MapJson> {
        let layers = map
            .entries
            .iter()
            .rev()
            .map(|entry| catalog.resolve_member(&entry.member).map(|p| member(&p)))
            .collect::<CatalogResult<_>>()?;
        Ok(MapJson {
            layers: Some(layers),
            ..self.summary(map)
        })
    }
}

fn member(published: &Published) -> MapLayerJson {
    let json = MapLayerJson {
        name: published.name().to_string(),
        title: published.title().map(ToString::to_string),
        description: published.description().map(ToString::to_string),
        resource: None,
        workspace: None,
        group: None,
        layer_count: None,
    };
    match published {
        Published::Layer(layer) => MapLayerJson {
            resource: Some(layer.resource.name.clone()),
            workspace: Some(
                layer
                    .resource
                    .store
                    .as_ref()
                    .map_or_else(|| layer.workspace.clone(), |store| store.workspace.clone()),
            ),
            ..json
        },
        Published::NestedGroup(group) => MapLayerJson {
            group: Some(group.mode.as_str()),
            workspace: Some(group.workspace.clone()),
            layer_count: Some(group.entries.len()),
            ..json
        },
    }
}

fn object_keys(body: &Value) -> CodecResult<Vec<String>> {
    match body {
        Value::Object(obj) => Ok(obj.keys().cloned().collect()),
        other => Err(CodecError::NotAnObject(json_type(other))),
    }
}

/// A map name is used as a single path segment of the data directory.
fn check_name(name: &str) -> CodecResult<()> {
    if name.trim().is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        Err(CodecError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

/// Body of a map creation request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewMap {
    pub name: String,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub description: Option<String>,
    pub proj: Option<ProjInput>,
    pub bbox: BoundsJson,
}

impl NewMap {
    pub fn decode(body: Value) -> CodecResult<Self> {
        object_keys(&body)?;
        let map: Self = serde_json::from_value(body).map_err(CodecError::InvalidBody)?;
        check_name(&map.name)?;
        Ok(map)
    }

    /// Builds an unsaved single-mode map, WGS 84 unless `proj` names a known system.
    #[must_use]
    pub fn into_map(self, workspace: &str, registry: &CrsRegistry, now: DateTime<Utc>) -> Map {
        let crs = decode_proj(self.proj.as_ref(), registry);
        let bounds = ReferencedEnvelope::new(self.bbox.to_envelope(), Some(crs));
        let mut map = Map::new(workspace, self.name, bounds);
        map.title = self.title;
        map.description = self.description;
        map.metadata = Metadata {
            created: Some(now),
            modified: Some(now),
            change: None,
        };
        map
    }
}

/// `None` when the key is absent, `Some(None)` when it is explicitly `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of a map update. Only keys present in the body are applied.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MapUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, rename = "abstract", deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub proj: Option<ProjInput>,
    pub bbox: Option<BoundsJson>,
    /// Explicit change note replacing the generated one
    pub change: Option<String>,
    #[serde(skip)]
    keys: Vec<String>,
}

impl MapUpdate {
    pub fn decode(body: Value) -> CodecResult<Self> {
        let keys = object_keys(&body)?;
        let update: Self = serde_json::from_value(body).map_err(CodecError::InvalidBody)?;
        if let Some(name) = &update.name {
            check_name(name)?;
        }
        Ok(Self { keys, ..update })
    }

    /// Keys of the request body, in the order they were sent.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Overwrites the fields present in the update and stamps the modification.
    ///
    /// Bounds change only when both `proj` and `bbox` are given.
    pub fn apply(self, map: &mut Map, registry: &CrsRegistry, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            map.name = name;
        }
        if let Some(title) = self.title {
            map.title = title;
        }
        if let Some(description) = self.description {
            map.description = description;
        }
        if let (Some(proj), Some(bbox)) = (&self.proj, &self.bbox) {
            let crs = decode_proj(Some(proj), registry);
            map.bounds = ReferencedEnvelope::new(bbox.to_envelope(), Some(crs));
        }
        map.metadata.modified = Some(now);
        map.metadata.change = Some(
            self.change
                .unwrap_or_else(|| format!("modified [{}]", self.keys.join(", "))),
        );
    }
}

/// One element of a layer reordering request.
///
/// Keeps the element as sent so that failures can quote it.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRef {
    pub name: Option<String>,
    pub workspace: Option<String>,
    raw: Value,
}

impl LayerRef {
    /// Decodes the body of a layer reordering request, an array of `{name, workspace?}`.
    pub fn decode_list(body: Value) -> CodecResult<Vec<Self>> {
        match body {
            Value::Array(items) => Ok(items.into_iter().map(Self::from).collect()),
            other => Err(CodecError::NotAnArray(json_type(&other))),
        }
    }
}

impl From<Value> for LayerRef {
    fn from(raw: Value) -> Self {
        let field = |key: &str| raw.get(key).and_then(Value::as_str).map(ToString::to_string);
        Self {
            name: field("name"),
            workspace: field("workspace"),
            raw,
        }
    }
}

impl fmt::Display for LayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
