use std::ffi::OsStr;
use std::fs::File;
use std::io::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use geocat_core::DataDir;
use geocat_core::catalog::SharedCatalog;
use geocat_core::crs::{CrsDefinition, CrsRegistry};
use serde::{Deserialize, Serialize};
use subst::VariableMap;
use tracing::{info, warn};

use crate::config::file::srv::SrvConfig;
use crate::config::file::{
    CatalogConfig, ConfigFileError, ConfigFileResult, ConfigurationLivecycleHooks,
    UnrecognizedKeys, UnrecognizedValues, copy_unrecognized_keys_from_config,
};

/// Everything the request handlers share.
#[derive(Debug, Clone)]
pub struct ServerState {
    pub catalog: SharedCatalog,
    pub crs: Arc<CrsRegistry>,
    pub data_dir: Option<Arc<DataDir>>,
}

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub srv: SrvConfig,

    /// Configuration directory used to look up modification dates of maps
    pub data_dir: Option<PathBuf>,

    /// Spatial references added to the built-in registry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crs: Vec<CrsDefinition>,

    /// Initial catalog content
    #[serde(default, skip_serializing_if = "CatalogConfig::is_empty")]
    pub catalog: CatalogConfig,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

impl Config {
    /// Validates the config and warns about keys that were not understood.
    pub fn finalize(&mut self) -> ConfigFileResult<UnrecognizedKeys> {
        let mut res = self.srv.get_unrecognized_keys();
        copy_unrecognized_keys_from_config(&mut res, "", &self.unrecognized);

        self.catalog.finalize()?;
        res.extend(self.catalog.get_unrecognized_keys_with_prefix("catalog."));

        if let Some(dir) = &self.data_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(ConfigFileError::InvalidDataDir(dir.clone()));
            }
        }

        for key in &res {
            warn!(
                "Ignoring unrecognized configuration key '{key}'. Please check your configuration file for typos."
            );
        }
        if self.catalog.workspaces.is_empty() {
            warn!("No workspaces are configured, every request will fail with 404");
        }
        Ok(res)
    }

    /// Builds the shared server state: the spatial reference registry and the seeded catalog.
    pub fn resolve(&self) -> ConfigFileResult<ServerState> {
        let mut registry = CrsRegistry::default();
        for def in &self.crs {
            registry.register(def.clone());
        }
        info!("{} spatial references are available", registry.len());

        let catalog = self.catalog.seed(&registry)?;
        let data_dir = self.data_dir.as_ref().map(|dir| {
            info!("Using data directory {}", dir.display());
            Arc::new(DataDir::new(dir))
        });

        Ok(ServerState {
            catalog: Arc::new(catalog),
            crs: Arc::new(registry),
            data_dir,
        })
    }

    pub fn save_to_file(&self, file_name: &Path) -> ConfigFileResult<()> {
        let yaml = serde_yaml::to_string(&self).map_err(ConfigFileError::ConfigSerializeError)?;
        if file_name.as_os_str() == OsStr::new("-") {
            info!("Current system configuration:");
            println!("\n\n{yaml}\n");
            Ok(())
        } else {
            info!(
                "Saving config to {}, use --config to load it",
                file_name.display()
            );
            File::create(file_name)
                .map_err(|e| ConfigFileError::ConfigWriteError(e, file_name.to_path_buf()))?
                .write_all(yaml.as_bytes())
                .map_err(|e| ConfigFileError::ConfigWriteError(e, file_name.to_path_buf()))?;
            Ok(())
        }
    }
}

/// Reads and parses a config file, substituting `${VAR}` references from `env`.
pub fn read_config<'a, M>(file_name: &Path, env: &'a M) -> ConfigFileResult<Config>
where
    M: VariableMap<'a>,
    M::Value: AsRef<str>,
{
    let mut file =
        File::open(file_name).map_err(|e| ConfigFileError::ConfigLoadError(e, file_name.into()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| ConfigFileError::ConfigLoadError(e, file_name.into()))?;
    parse_config(&contents, env, file_name)
}

pub fn parse_config<'a, M>(contents: &str, env: &'a M, file_name: &Path) -> ConfigFileResult<Config>
where
    M: VariableMap<'a>,
    M::Value: AsRef<str>,
{
    subst::yaml::from_str(contents, env)
        .map_err(|e| ConfigFileError::ConfigParseError(e, file_name.into()))
}
