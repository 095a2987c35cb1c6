//! Configuration of the type resolution caches.
//!
//! By default, the config is created with opinionated default values, which can then be overwritten
//! by environment variables prefixed with `SPRINGTIME_` or `springtime.json` file.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_ENV_PREFIX: &str = "SPRINGTIME";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "springtime.json";

/// Default upper bound of live entries in the resolvable type cache.
pub const DEFAULT_RESOLVABLE_TYPE_CACHE_CAPACITY: usize = 256;

/// Type resolution configuration.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CoreConfig {
    /// Should composite types provided by fields and method parameters be wrapped in persistable
    /// proxies. Closed-world deployments, which never persist types, can turn this off.
    pub type_wrapping_enabled: bool,

    /// Maximum number of live entries in the resolvable type cache. Entries which are no longer
    /// referenced are purged when the limit is reached; types are not cached when the cache is
    /// full of live entries.
    pub resolvable_type_cache_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            type_wrapping_enabled: true,
            resolvable_type_cache_capacity: DEFAULT_RESOLVABLE_TYPE_CACHE_CAPACITY,
        }
    }
}

impl From<OptionalCoreConfig> for CoreConfig {
    fn from(value: OptionalCoreConfig) -> Self {
        let default = Self::default();
        Self {
            type_wrapping_enabled: value
                .type_wrapping_enabled
                .unwrap_or(default.type_wrapping_enabled),
            resolvable_type_cache_capacity: value
                .resolvable_type_cache_capacity
                .unwrap_or(default.resolvable_type_cache_capacity),
        }
    }
}

impl CoreConfig {
    /// Reads the config from [CONFIG_FILE] and the environment, filling missing values with
    /// defaults.
    pub fn init_from_environment() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(CONFIG_ENV_PREFIX))
            .build()
            .and_then(|config| config.try_deserialize::<OptionalCoreConfig>())
            .map(|config| config.into())
    }
}

#[derive(Deserialize, Default)]
struct OptionalCoreConfig {
    type_wrapping_enabled: Option<bool>,
    resolvable_type_cache_capacity: Option<usize>,
}

#[cfg(test)]
mod tests {
    use crate::config::{CoreConfig, OptionalCoreConfig, DEFAULT_RESOLVABLE_TYPE_CACHE_CAPACITY};

    #[test]
    fn should_fill_missing_values_with_defaults() {
        let config: CoreConfig = OptionalCoreConfig {
            type_wrapping_enabled: Some(false),
            resolvable_type_cache_capacity: None,
        }
        .into();

        assert!(!config.type_wrapping_enabled);
        assert_eq!(
            config.resolvable_type_cache_capacity,
            DEFAULT_RESOLVABLE_TYPE_CACHE_CAPACITY
        );
        assert_eq!(
            CoreConfig::from(OptionalCoreConfig::default()),
            CoreConfig::default()
        );
    }
}
