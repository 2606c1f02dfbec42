//! Environment variables available to `${VAR}` substitution in the config file.
//!
//! [`OsEnv`] reads the process environment, [`FauxEnv`] is a fixed map for tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::env;
use std::ffi::OsString;

use subst::VariableMap;
use tracing::warn;

/// Environment access usable both by `subst` and by CLI fallbacks.
pub trait Env<'a>: VariableMap<'a> {
    /// Raw value of a variable.
    fn var_os(&self, key: &str) -> Option<OsString>;

    /// Value of a variable, `None` with a warning if it is not valid UTF-8.
    #[must_use]
    fn get_env_str(&self, key: &str) -> Option<String> {
        let value = self.var_os(key)?;
        value
            .into_string()
            .map_err(|v| {
                warn!(
                    "Environment variable {key} has invalid unicode. Lossy representation: {}",
                    v.to_string_lossy()
                );
            })
            .ok()
    }

    /// True if the variable is set but was never substituted into the config.
    #[must_use]
    fn has_unused_var(&self, key: &str) -> bool;
}

/// The process environment. Remembers which variables were substituted.
#[derive(Debug, Default)]
pub struct OsEnv(RefCell<HashSet<String>>);

impl Env<'_> for OsEnv {
    fn var_os(&self, key: &str) -> Option<OsString> {
        env::var_os(key)
    }

    fn has_unused_var(&self, key: &str) -> bool {
        !self.0.borrow().contains(key) && env::var_os(key).is_some()
    }
}

impl<'a> VariableMap<'a> for OsEnv {
    type Value = String;

    fn get(&'a self, key: &str) -> Option<Self::Value> {
        self.0.borrow_mut().insert(key.to_string());
        env::var(key).ok()
    }
}

/// A fixed set of variables.
#[derive(Debug, Default)]
pub struct FauxEnv(pub HashMap<&'static str, OsString>);

impl<'a> VariableMap<'a> for FauxEnv {
    type Value = String;

    fn get(&'a self, key: &str) -> Option<Self::Value> {
        self.0.get(key).map(|s| s.to_string_lossy().to_string())
    }
}

impl Env<'_> for FauxEnv {
    fn var_os(&self, key: &str) -> Option<OsString> {
        self.0.get(key).cloned()
    }

    fn has_unused_var(&self, key: &str) -> bool {
        self.var_os(key).is_some()
    }
}
