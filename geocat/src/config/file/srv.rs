use serde::{Deserialize, Serialize};

use crate::config::file::{ConfigurationLivecycleHooks, UnrecognizedKeys};

pub const KEEP_ALIVE_DEFAULT: u64 = 75;
pub const LISTEN_ADDRESSES_DEFAULT: &str = "0.0.0.0:8080";

/// HTTP server settings, flattened into the top level of the config file.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SrvConfig {
    /// Connection keep alive timeout in seconds
    pub keep_alive: Option<u64>,
    /// Socket address to bind
    pub listen_addresses: Option<String>,
    /// Number of web server workers, defaults to the number of CPUs
    pub worker_processes: Option<usize>,
}

impl ConfigurationLivecycleHooks for SrvConfig {
    fn get_unrecognized_keys(&self) -> UnrecognizedKeys {
        UnrecognizedKeys::new()
    }
}
