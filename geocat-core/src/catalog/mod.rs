//! The catalog facade.
//!
//! All catalog state is owned by an implementation of [`Catalog`]. Callers look
//! entries up by name, receive owned snapshots, and write changes back with
//! [`Catalog::save_map`]. Nothing outside the implementation keeps a reference
//! into catalog storage.

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;

use tracing::debug;

mod error;
pub use error::{CatalogError, CatalogResult};

mod memory;
pub use memory::MemoryCatalog;

mod model;
pub use model::*;

/// Workspace path alias resolving to the configured default workspace.
pub const DEFAULT_WORKSPACE_ALIAS: &str = "default";

/// A [`Catalog`] shared between server workers and request handlers.
pub type SharedCatalog = Arc<dyn Catalog>;

/// Lookup, add, remove and save access to catalog entries.
///
/// Implementations serialize their own mutations; every method call is atomic
/// with respect to the others, and concurrent saves are last-writer-wins.
pub trait Catalog: Send + Sync + Debug {
    /// Workspace by exact name.
    fn workspace(&self, name: &str) -> Option<Workspace>;

    /// The configured default workspace.
    fn default_workspace(&self) -> Option<Workspace>;

    /// All workspaces, ordered by name.
    fn workspaces(&self) -> Vec<Workspace>;

    /// Layer by name. Without a workspace, the default workspace is searched
    /// first and then all other workspaces in name order.
    fn layer(&self, workspace: Option<&str>, name: &str) -> Option<Layer>;

    /// Style by name.
    fn style(&self, name: &str) -> Option<Style>;

    /// Map by workspace and name.
    fn map(&self, workspace: &str, name: &str) -> Option<Map>;

    /// All maps of a workspace regardless of mode, in catalog iteration order.
    fn maps(&self, workspace: &str) -> Vec<Map>;

    /// Adds a new map and returns it with its assigned identifier.
    fn add_map(&self, map: Map) -> CatalogResult<Map>;

    /// Replaces a previously added map, matched by identifier.
    fn save_map(&self, map: &Map) -> CatalogResult<()>;

    /// Removes a previously added map.
    fn remove_map(&self, map: &Map) -> CatalogResult<()>;

    /// Resolves a workspace name, honoring the [`DEFAULT_WORKSPACE_ALIAS`].
    fn find_workspace(&self, name: &str) -> CatalogResult<Workspace> {
        let ws = if name == DEFAULT_WORKSPACE_ALIAS {
            self.default_workspace()
        } else {
            self.workspace(name)
        };
        ws.ok_or_else(|| CatalogError::NoSuchWorkspace(name.to_string()))
    }

    /// Resolves a map by workspace and name.
    fn find_map(&self, workspace: &str, name: &str) -> CatalogResult<Map> {
        let ws = self.find_workspace(workspace)?;
        self.map(&ws.name, name).ok_or_else(|| {
            debug!("Map {workspace}:{name} was requested but does not exist");
            CatalogError::NoSuchMap(workspace.to_string(), name.to_string())
        })
    }

    /// Resolves the member of a map entry into an owned snapshot.
    fn resolve_member(&self, member: &MemberRef) -> CatalogResult<Published> {
        match member {
            MemberRef::Layer { workspace, name } => self
                .layer(Some(workspace.as_str()), name)
                .map(Published::Layer)
                .ok_or_else(|| CatalogError::NoSuchLayer(member.to_string())),
            MemberRef::NestedGroup { workspace, name } => self
                .map(workspace, name)
                .map(Published::NestedGroup)
                .ok_or_else(|| CatalogError::NoSuchMap(workspace.clone(), name.clone())),
        }
    }

    /// All leaf layers of a map in storage order, nested groups expanded in place.
    ///
    /// A group that (directly or indirectly) contains itself is expanded only once.
    fn flatten_layers(&self, map: &Map) -> CatalogResult<Vec<Layer>> {
        let mut layers = Vec::new();
        let mut visited = HashSet::new();
        visited.insert((map.workspace.clone(), map.name.clone()));
        collect_layers(self, map, &mut visited, &mut layers)?;
        Ok(layers)
    }
}

fn collect_layers<C: Catalog + ?Sized>(
    catalog: &C,
    map: &Map,
    visited: &mut HashSet<(String, String)>,
    layers: &mut Vec<Layer>,
) -> CatalogResult<()> {
    for entry in &map.entries {
        match catalog.resolve_member(&entry.member)? {
            Published::Layer(layer) => layers.push(layer),
            Published::NestedGroup(group) => {
                if visited.insert((group.workspace.clone(), group.name.clone())) {
                    collect_layers(catalog, &group, visited, layers)?;
                }
            }
        }
    }
    Ok(())
}
