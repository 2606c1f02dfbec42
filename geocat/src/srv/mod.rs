mod error;
pub use error::{ApiError, ApiResult, ErrorJson, error_json, json_error_handler};

mod maps;
pub use maps::{DEFAULT_PAGE_SIZE, ListQuery};

mod server;
pub use server::{new_server, router};

mod workspaces;
