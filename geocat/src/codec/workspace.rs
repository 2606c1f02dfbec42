use geocat_core::catalog::Workspace;
use serde::Serialize;

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceJson {
    pub name: String,
    pub uri: Option<String>,
    /// True for the workspace the `default` alias resolves to
    pub default: bool,
}

#[must_use]
pub fn encode_workspace(workspace: &Workspace, is_default: bool) -> WorkspaceJson {
    WorkspaceJson {
        name: workspace.name.clone(),
        uri: workspace.uri.clone(),
        default: is_default,
    }
}
