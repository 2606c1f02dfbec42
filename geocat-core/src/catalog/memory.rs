use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use itertools::Itertools as _;
use tracing::{info, warn};

use super::{Catalog, CatalogError, CatalogResult, Layer, Map, MemberRef, Style, Workspace};

/// Thread-safe catalog kept entirely in memory.
///
/// Maps are keyed by the identifier assigned in [`Catalog::add_map`], so a
/// saved map may change its name. Map mutations are serialized.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    workspaces: DashMap<String, Workspace>,
    default_workspace: RwLock<Option<String>>,
    /// keyed by (workspace, name)
    layers: DashMap<(String, String), Layer>,
    styles: DashMap<String, Style>,
    maps: DashMap<String, Map>,
    next_id: AtomicU64,
    write_lock: Mutex<()>,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a workspace. The first registered workspace becomes the default.
    pub fn add_workspace(&self, workspace: Workspace) -> CatalogResult<()> {
        match self.workspaces.entry(workspace.name.clone()) {
            Entry::Occupied(v) => Err(CatalogError::AlreadyRegistered(
                "Workspace",
                v.key().clone(),
            )),
            Entry::Vacant(v) => {
                info!("Configured workspace {}", workspace.name);
                let mut default = self
                    .default_workspace
                    .write()
                    .unwrap_or_else(PoisonError::into_inner);
                if default.is_none() {
                    *default = Some(workspace.name.clone());
                }
                v.insert(workspace);
                Ok(())
            }
        }
    }

    /// Makes an existing workspace the default one.
    pub fn set_default_workspace(&self, name: &str) -> CatalogResult<()> {
        if !self.workspaces.contains_key(name) {
            return Err(CatalogError::NoSuchWorkspace(name.to_string()));
        }
        *self
            .default_workspace
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(name.to_string());
        Ok(())
    }

    /// Registers a layer in an existing workspace.
    pub fn add_layer(&self, layer: Layer) -> CatalogResult<()> {
        if !self.workspaces.contains_key(&layer.workspace) {
            return Err(CatalogError::NoSuchWorkspace(layer.workspace.clone()));
        }
        if let Some(store) = &layer.resource.store {
            if !self.workspaces.contains_key(&store.workspace) {
                return Err(CatalogError::NoSuchStore(
                    store.workspace.clone(),
                    store.name.clone(),
                ));
            }
        }
        if let Some(style) = &layer.default_style {
            if !self.styles.contains_key(style) {
                return Err(CatalogError::NoSuchStyle(style.clone()));
            }
        }
        match self.layers.entry((layer.workspace.clone(), layer.name.clone())) {
            Entry::Occupied(_) => Err(CatalogError::AlreadyRegistered(
                "Layer",
                layer.prefixed_name(),
            )),
            Entry::Vacant(v) => {
                info!("Configured layer {}", layer.prefixed_name());
                v.insert(layer);
                Ok(())
            }
        }
    }

    /// Registers a style.
    pub fn add_style(&self, style: Style) -> CatalogResult<()> {
        match self.styles.entry(style.name.clone()) {
            Entry::Occupied(v) => Err(CatalogError::AlreadyRegistered("Style", v.key().clone())),
            Entry::Vacant(v) => {
                info!("Configured style {} from {}", style.name, style.filename);
                v.insert(style);
                Ok(())
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn id_of(&self, workspace: &str, name: &str) -> Option<String> {
        self.maps
            .iter()
            .find(|m| m.workspace == workspace && m.name == name)
            .map(|m| m.key().clone())
    }

    /// `workspace:name` of the first other map nesting the map stored under `id`.
    fn nested_in(&self, id: &str) -> Option<String> {
        let (workspace, name) = self
            .maps
            .get(id)
            .map(|m| (m.workspace.clone(), m.name.clone()))?;
        self.maps
            .iter()
            .filter(|m| m.key() != id)
            .find(|m| m.entries.iter().any(|e| is_group(&e.member, &workspace, &name)))
            .map(|m| format!("{}:{}", m.workspace, m.name))
    }

    /// Points nested group entries of every other map at the new name of a map.
    fn rename_nested(&self, id: &str, workspace: &str, name: &str, renamed: &Map) {
        for mut parent in self.maps.iter_mut().filter(|m| m.key() != id) {
            let (parent_ws, parent_name) = (parent.workspace.clone(), parent.name.clone());
            for entry in &mut parent.entries {
                if is_group(&entry.member, workspace, name) {
                    info!(
                        "Map {parent_ws}:{parent_name} now nests {}:{} instead of {workspace}:{name}",
                        renamed.workspace, renamed.name
                    );
                    entry.member = MemberRef::NestedGroup {
                        workspace: renamed.workspace.clone(),
                        name: renamed.name.clone(),
                    };
                }
            }
        }
    }

    fn validate(map: &Map) -> CatalogResult<()> {
        match map.duplicate_member() {
            Some(layer) => Err(CatalogError::DuplicateMapLayer(
                format!("{}:{}", map.workspace, map.name),
                layer.to_string(),
            )),
            None => Ok(()),
        }
    }
}

impl Catalog for MemoryCatalog {
    fn workspace(&self, name: &str) -> Option<Workspace> {
        self.workspaces.get(name).map(|v| v.value().clone())
    }

    fn default_workspace(&self) -> Option<Workspace> {
        let default = self
            .default_workspace
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        default.and_then(|name| self.workspace(&name))
    }

    fn workspaces(&self) -> Vec<Workspace> {
        self.workspaces
            .iter()
            .map(|v| v.value().clone())
            .sorted_by(|a, b| a.name.cmp(&b.name))
            .collect()
    }

    fn layer(&self, workspace: Option<&str>, name: &str) -> Option<Layer> {
        if let Some(ws) = workspace {
            return self
                .layers
                .get(&(ws.to_string(), name.to_string()))
                .map(|v| v.value().clone());
        }
        if let Some(default) = self.default_workspace() {
            if let Some(layer) = self.layer(Some(default.name.as_str()), name) {
                return Some(layer);
            }
        }
        self.layers
            .iter()
            .filter(|v| v.name == name)
            .map(|v| v.value().clone())
            .min_by(|a, b| a.workspace.cmp(&b.workspace))
    }

    fn style(&self, name: &str) -> Option<Style> {
        self.styles.get(name).map(|v| v.value().clone())
    }

    fn map(&self, workspace: &str, name: &str) -> Option<Map> {
        self.maps
            .iter()
            .find(|m| m.workspace == workspace && m.name == name)
            .map(|m| m.value().clone())
    }

    fn maps(&self, workspace: &str) -> Vec<Map> {
        self.maps
            .iter()
            .filter(|m| m.workspace == workspace)
            .map(|m| m.value().clone())
            .sorted_by(|a, b| a.name.cmp(&b.name))
            .collect()
    }

    fn add_map(&self, mut map: Map) -> CatalogResult<Map> {
        let _guard = self.lock();
        if !self.workspaces.contains_key(&map.workspace) {
            return Err(CatalogError::NoSuchWorkspace(map.workspace.clone()));
        }
        if self.id_of(&map.workspace, &map.name).is_some() {
            return Err(CatalogError::DuplicateMap(map.workspace, map.name));
        }
        Self::validate(&map)?;
        let id = format!("map-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        info!("Added map {}:{} as {id}", map.workspace, map.name);
        map.id = Some(id.clone());
        self.maps.insert(id, map.clone());
        Ok(map)
    }

    fn save_map(&self, map: &Map) -> CatalogResult<()> {
        let _guard = self.lock();
        let Some(id) = map.id.as_ref().filter(|id| self.maps.contains_key(*id)) else {
            return Err(CatalogError::NotPersisted(
                map.workspace.clone(),
                map.name.clone(),
            ));
        };
        if let Some(other) = self.id_of(&map.workspace, &map.name) {
            if &other != id {
                return Err(CatalogError::DuplicateMap(
                    map.workspace.clone(),
                    map.name.clone(),
                ));
            }
        }
        Self::validate(map)?;
        let previous = self
            .maps
            .get(id)
            .map(|m| (m.workspace.clone(), m.name.clone()));
        if let Some((workspace, name)) = previous {
            if workspace != map.workspace || name != map.name {
                self.rename_nested(id, &workspace, &name, map);
            }
        }
        self.maps.insert(id.clone(), map.clone());
        Ok(())
    }

    fn remove_map(&self, map: &Map) -> CatalogResult<()> {
        let _guard = self.lock();
        let id = map
            .id
            .clone()
            .or_else(|| self.id_of(&map.workspace, &map.name));
        if let Some(id) = &id {
            if let Some(parent) = self.nested_in(id) {
                return Err(CatalogError::MapInUse(
                    format!("{}:{}", map.workspace, map.name),
                    parent,
                ));
            }
        }
        match id.and_then(|id| self.maps.remove(&id)) {
            Some((id, removed)) => {
                info!("Removed map {}:{} ({id})", removed.workspace, removed.name);
                Ok(())
            }
            None => {
                warn!("Attempted to remove unknown map {}:{}", map.workspace, map.name);
                Err(CatalogError::NoSuchMap(
                    map.workspace.clone(),
                    map.name.clone(),
                ))
            }
        }
    }
}

fn is_group(member: &MemberRef, workspace: &str, name: &str) -> bool {
    matches!(
        member,
        MemberRef::NestedGroup { workspace: ws, name: n } if ws == workspace && n == name
    )
}
