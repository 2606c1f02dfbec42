use actix_web::web::{Data, Json, Path, Query};
use actix_web::{HttpResponse, route};
use chrono::Utc;
use geocat_core::catalog::{
    Catalog, CatalogError, CatalogResult, GroupMode, Map, MapEntry, MemberRef,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::codec::{LayerJson, LayerRef, MapEncoder, MapJson, MapUpdate, NewMap, encode_layer};
use crate::config::file::ServerState;
use crate::srv::error::{ApiError, ApiResult};

/// Number of maps per page when `page` is given without `pagesize`.
pub const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Deserialize)]
struct WorkspacePath {
    workspace: String,
}

#[derive(Deserialize)]
struct MapPath {
    workspace: String,
    name: String,
}

/// Paging parameters of the map listing, kept as text so that bad values
/// surface through the error envelope.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub pagesize: Option<String>,
}

impl ListQuery {
    /// `(offset, count)` when a page was requested.
    fn paging(&self) -> ApiResult<Option<(usize, usize)>> {
        let parse = |name, value: Option<&str>| {
            value
                .map(|v| v.trim().parse::<usize>())
                .transpose()
                .map_err(|e| ApiError::InvalidParameter(name, e))
        };
        let size = parse("pagesize", self.pagesize.as_deref())?.unwrap_or(DEFAULT_PAGE_SIZE);
        Ok(parse("page", self.page.as_deref())?.map(|page| (page.saturating_mul(size), size)))
    }
}

fn encoder(state: &ServerState) -> MapEncoder<'_> {
    MapEncoder::new(&state.crs, state.data_dir.as_deref(), Utc::now())
}

/// Single-mode maps of a workspace in catalog order.
fn list_json(
    state: &ServerState,
    workspace: &str,
    paging: Option<(usize, usize)>,
) -> Vec<MapJson> {
    let encoder = encoder(state);
    let maps = state
        .catalog
        .maps(workspace)
        .into_iter()
        .filter(|map| map.mode == GroupMode::Single);
    let (offset, count) = paging.unwrap_or((0, usize::MAX));
    maps.skip(offset)
        .take(count)
        .map(|map| encoder.summary(&map))
        .collect()
}

#[route("/api/maps/{workspace}", method = "GET")]
#[allow(clippy::unused_async)]
pub(crate) async fn list_maps(
    path: Path<WorkspacePath>,
    query: Query<ListQuery>,
    state: Data<ServerState>,
) -> ApiResult<HttpResponse> {
    let paging = query.paging()?;
    let workspace = state.catalog.find_workspace(&path.workspace)?;
    Ok(HttpResponse::Ok().json(list_json(&state, &workspace.name, paging)))
}

#[route("/api/maps/{workspace}", method = "POST")]
#[allow(clippy::unused_async)]
pub(crate) async fn create_map(
    path: Path<WorkspacePath>,
    body: Json<Value>,
    state: Data<ServerState>,
) -> ApiResult<HttpResponse> {
    let workspace = state.catalog.find_workspace(&path.workspace)?;
    let map =
        NewMap::decode(body.into_inner())?.into_map(&workspace.name, &state.crs, Utc::now());
    let map = state.catalog.add_map(map)?;
    info!("Created map {}:{}", map.workspace, map.name);
    let json = encoder(&state).detail(&map, state.catalog.as_ref())?;
    Ok(HttpResponse::Created().json(json))
}

#[route("/api/maps/{workspace}/{name}", method = "GET")]
#[allow(clippy::unused_async)]
pub(crate) async fn get_map(
    path: Path<MapPath>,
    state: Data<ServerState>,
) -> ApiResult<HttpResponse> {
    let map = state.catalog.find_map(&path.workspace, &path.name)?;
    let json = encoder(&state).detail(&map, state.catalog.as_ref())?;
    Ok(HttpResponse::Ok().json(json))
}

#[route("/api/maps/{workspace}/{name}", method = "PUT", method = "PATCH")]
#[allow(clippy::unused_async)]
pub(crate) async fn update_map(
    path: Path<MapPath>,
    body: Json<Value>,
    state: Data<ServerState>,
) -> ApiResult<HttpResponse> {
    let mut map = state.catalog.find_map(&path.workspace, &path.name)?;
    let update = MapUpdate::decode(body.into_inner())?;
    update.apply(&mut map, &state.crs, Utc::now());
    state.catalog.save_map(&map)?;
    info!(
        "Updated map {}:{}, {}",
        map.workspace,
        map.name,
        map.metadata.change.as_deref().unwrap_or_default()
    );
    let json = encoder(&state).detail(&map, state.catalog.as_ref())?;
    Ok(HttpResponse::Ok().json(json))
}

#[route("/api/maps/{workspace}/{name}", method = "DELETE")]
#[allow(clippy::unused_async)]
pub(crate) async fn delete_map(
    path: Path<MapPath>,
    state: Data<ServerState>,
) -> ApiResult<HttpResponse> {
    let map = state.catalog.find_map(&path.workspace, &path.name)?;
    state.catalog.remove_map(&map)?;
    info!("Deleted map {}:{}", map.workspace, map.name);
    Ok(HttpResponse::Ok().json(list_json(&state, &map.workspace, None)))
}

#[route("/api/maps/{workspace}/{name}/layers", method = "GET")]
#[allow(clippy::unused_async)]
pub(crate) async fn get_map_layers(
    path: Path<MapPath>,
    state: Data<ServerState>,
) -> ApiResult<HttpResponse> {
    let map = state.catalog.find_map(&path.workspace, &path.name)?;
    let now = Utc::now();
    let layers: Vec<LayerJson> = state
        .catalog
        .flatten_layers(&map)?
        .iter()
        .map(|layer| encode_layer(layer, &state.crs, now))
        .collect();
    Ok(HttpResponse::Ok().json(layers))
}

#[route("/api/maps/{workspace}/{name}/layers", method = "PUT")]
#[allow(clippy::unused_async)]
pub(crate) async fn put_map_layers(
    path: Path<MapPath>,
    body: Json<Value>,
    state: Data<ServerState>,
) -> ApiResult<HttpResponse> {
    let mut map = state.catalog.find_map(&path.workspace, &path.name)?;
    let refs = LayerRef::decode_list(body.into_inner())?;
    map.entries = reorder_entries(state.catalog.as_ref(), &map, &refs)?;
    state.catalog.save_map(&map)?;
    info!(
        "Reordered {} layers of map {}:{}",
        map.entries.len(),
        map.workspace,
        map.name
    );
    Ok(HttpResponse::Ok().finish())
}

/// Builds the new entry list of a map from a top-most first request.
///
/// Members already in the map keep their style, new layers get their default
/// style. The request is processed last to first and the entries are stored
/// in that order.
fn reorder_entries(
    catalog: &dyn Catalog,
    map: &Map,
    refs: &[LayerRef],
) -> CatalogResult<Vec<MapEntry>> {
    refs.iter()
        .rev()
        .map(|layer_ref| {
            let existing = layer_ref.name.as_deref().and_then(|name| {
                map.entries
                    .iter()
                    .find(|entry| entry.member.name() == name)
            });
            if let Some(entry) = existing {
                return Ok(entry.clone());
            }
            let layer = layer_ref
                .name
                .as_deref()
                .and_then(|name| catalog.layer(layer_ref.workspace.as_deref(), name))
                .ok_or_else(|| CatalogError::NoSuchLayer(layer_ref.to_string()))?;
            Ok(MapEntry {
                style: layer.default_style,
                member: MemberRef::Layer {
                    workspace: layer.workspace,
                    name: layer.name,
                },
            })
        })
        .collect()
}
