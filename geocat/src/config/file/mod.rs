use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

mod catalog;
pub use catalog::{CatalogConfig, MapConfig, MapEntryConfig};

mod main;
pub use main::*;

pub mod srv;

mod error;
pub use error::{ConfigFileError, ConfigFileResult};

/// Values present in a config section that no field consumed.
pub type UnrecognizedValues = BTreeMap<String, serde_yaml::Value>;

/// Dotted paths of unrecognized config keys.
pub type UnrecognizedKeys = BTreeSet<String>;

/// Hooks every config section implements.
///
/// `finalize` is always called before `get_unrecognized_keys`.
pub trait ConfigurationLivecycleHooks: Clone + Debug + Default + PartialEq + Send {
    /// Applies defaults and validates the section.
    fn finalize(&mut self) -> ConfigFileResult<()> {
        Ok(())
    }

    /// Keys present in the file that this section does not understand.
    fn get_unrecognized_keys(&self) -> UnrecognizedKeys;

    /// Same as [`Self::get_unrecognized_keys`], with every key prefixed.
    fn get_unrecognized_keys_with_prefix(&self, prefix: &str) -> UnrecognizedKeys {
        self.get_unrecognized_keys()
            .into_iter()
            .map(|key| format!("{prefix}{key}"))
            .collect()
    }
}

pub fn copy_unrecognized_keys_from_config(
    result: &mut UnrecognizedKeys,
    prefix: &str,
    unrecognized: &UnrecognizedValues,
) {
    result.extend(unrecognized.keys().map(|k| format!("{prefix}{k}")));
}
