use chrono::{DateTime, Utc};
use geocat_core::catalog::{
    Catalog as _, CatalogError, GroupMode, Layer, Map, MapEntry, MemberRef, MemoryCatalog,
    Metadata, Style, Workspace,
};
use geocat_core::crs::{Crs, CrsRegistry};
use geocat_core::{Envelope, ReferencedEnvelope};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::file::{
    ConfigFileError, ConfigFileResult, ConfigurationLivecycleHooks, UnrecognizedKeys,
    UnrecognizedValues, copy_unrecognized_keys_from_config,
};

/// The `catalog` section: everything the in-memory catalog starts with.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Workspace the `default` alias resolves to, the first workspace if not set
    pub default_workspace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<Workspace>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<Style>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<Layer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maps: Vec<MapConfig>,
    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

/// A map (layer group) as written in the config file.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub name: String,
    pub workspace: String,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub description: Option<String>,
    #[serde(default)]
    pub mode: GroupMode,
    /// Spatial reference of `bounds`, WGS 84 if not set
    pub srs: Option<String>,
    /// Declared bounds, the whole world if not set
    pub bounds: Option<Envelope>,
    /// Members, bottom-most first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<MapEntryConfig>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

/// One member of a configured map. Exactly one of `layer` and `group` must be set.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEntryConfig {
    pub layer: Option<String>,
    pub group: Option<String>,
    /// Workspace of the member, the map's workspace if not set
    pub workspace: Option<String>,
    /// Style to render the member with, the layer's default style if not set
    pub style: Option<String>,
}

impl ConfigurationLivecycleHooks for CatalogConfig {
    fn get_unrecognized_keys(&self) -> UnrecognizedKeys {
        let mut keys = UnrecognizedKeys::new();
        copy_unrecognized_keys_from_config(&mut keys, "", &self.unrecognized);
        for map in &self.maps {
            let prefix = format!("maps.{}.", map.name);
            copy_unrecognized_keys_from_config(&mut keys, &prefix, &map.unrecognized);
        }
        keys
    }
}

impl CatalogConfig {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.default_workspace.is_none()
            && self.workspaces.is_empty()
            && self.styles.is_empty()
            && self.layers.is_empty()
            && self.maps.is_empty()
    }

    /// Builds the in-memory catalog, validating every reference.
    ///
    /// Maps may nest maps declared later in the file.
    pub fn seed(&self, registry: &CrsRegistry) -> ConfigFileResult<MemoryCatalog> {
        let catalog = MemoryCatalog::new();
        for workspace in &self.workspaces {
            catalog.add_workspace(workspace.clone())?;
        }
        if let Some(name) = &self.default_workspace {
            catalog.set_default_workspace(name)?;
        }
        for style in &self.styles {
            catalog.add_style(style.clone())?;
        }
        for layer in &self.layers {
            catalog.add_layer(with_resource_crs(layer.clone(), registry))?;
        }
        for map in &self.maps {
            catalog.add_map(map.to_map(&catalog, registry)?)?;
        }
        for map in &self.maps {
            for entry in &map.layers {
                if let Some(group) = &entry.group {
                    let workspace = entry.workspace.as_ref().unwrap_or(&map.workspace);
                    if catalog.map(workspace, group).is_none() {
                        return Err(CatalogError::NoSuchMap(workspace.clone(), group.clone()).into());
                    }
                }
            }
        }
        info!(
            "Catalog seeded with {} workspaces, {} layers and {} maps",
            self.workspaces.len(),
            self.layers.len(),
            self.maps.len()
        );
        Ok(catalog)
    }
}

/// Fills in the resource's spatial reference from its declared identifier.
fn with_resource_crs(mut layer: Layer, registry: &CrsRegistry) -> Layer {
    if layer.resource.crs.is_none() {
        if let Some(srs) = &layer.resource.srs {
            match registry.decode(srs) {
                Ok(crs) => layer.resource.crs = Some(crs),
                Err(e) => warn!("Layer {}: {e}", layer.prefixed_name()),
            }
        }
    }
    layer
}

impl MapConfig {
    fn to_map(&self, catalog: &MemoryCatalog, registry: &CrsRegistry) -> ConfigFileResult<Map> {
        let crs = match &self.srs {
            Some(srs) => registry.decode(srs).map_err(|e| {
                ConfigFileError::InvalidMapSrs(self.prefixed_name(), srs.clone(), e)
            })?,
            None => Crs::wgs84(),
        };
        let bounds = ReferencedEnvelope::new(self.bounds.unwrap_or_else(Envelope::world), Some(crs));

        let mut map = Map::new(&self.workspace, &self.name, bounds);
        map.title.clone_from(&self.title);
        map.description.clone_from(&self.description);
        map.mode = self.mode;
        map.metadata = Metadata {
            created: self.created,
            modified: self.modified,
            change: None,
        };
        map.entries = self
            .layers
            .iter()
            .map(|entry| entry.to_entry(self, catalog))
            .collect::<ConfigFileResult<_>>()?;
        Ok(map)
    }

    fn prefixed_name(&self) -> String {
        format!("{}:{}", self.workspace, self.name)
    }
}

impl MapEntryConfig {
    fn to_entry(&self, map: &MapConfig, catalog: &MemoryCatalog) -> ConfigFileResult<MapEntry> {
        if let Some(style) = &self.style {
            if catalog.style(style).is_none() {
                return Err(CatalogError::NoSuchStyle(style.clone()).into());
            }
        }
        match (&self.layer, &self.group) {
            (Some(name), None) => {
                let layer = match &self.workspace {
                    Some(ws) => catalog.layer(Some(ws.as_str()), name),
                    None => catalog
                        .layer(Some(map.workspace.as_str()), name)
                        .or_else(|| catalog.layer(None, name)),
                }
                .ok_or_else(|| CatalogError::NoSuchLayer(name.clone()))?;
                Ok(MapEntry {
                    style: self.style.clone().or(layer.default_style),
                    member: MemberRef::Layer {
                        workspace: layer.workspace,
                        name: layer.name,
                    },
                })
            }
            (None, Some(name)) => Ok(MapEntry {
                member: MemberRef::NestedGroup {
                    workspace: self.workspace.clone().unwrap_or_else(|| map.workspace.clone()),
                    name: name.clone(),
                },
                style: self.style.clone(),
            }),
            _ => Err(ConfigFileError::InvalidMapEntry(map.prefixed_name())),
        }
    }
}
