use actix_web::web::{Data, Path};
use actix_web::{HttpResponse, route};

use crate::codec::{WorkspaceJson, encode_workspace};
use crate::config::file::ServerState;
use crate::srv::error::ApiResult;

fn default_name(state: &ServerState) -> Option<String> {
    state.catalog.default_workspace().map(|ws| ws.name)
}

#[route("/api/workspaces", method = "GET")]
#[allow(clippy::unused_async)]
pub(crate) async fn list_workspaces(state: Data<ServerState>) -> ApiResult<HttpResponse> {
    let default = default_name(&state);
    let workspaces: Vec<WorkspaceJson> = state
        .catalog
        .workspaces()
        .iter()
        .map(|ws| encode_workspace(ws, default.as_ref() == Some(&ws.name)))
        .collect();
    Ok(HttpResponse::Ok().json(workspaces))
}

#[route("/api/workspaces/{name}", method = "GET")]
#[allow(clippy::unused_async)]
pub(crate) async fn get_workspace(
    path: Path<String>,
    state: Data<ServerState>,
) -> ApiResult<HttpResponse> {
    let workspace = state.catalog.find_workspace(&path)?;
    let is_default = default_name(&state).as_ref() == Some(&workspace.name);
    Ok(HttpResponse::Ok().json(encode_workspace(&workspace, is_default)))
}
