//! Bean factory configuration.
//!
//! Like [CoreConfig](springtime_core::config::CoreConfig), the defaults can be overwritten by
//! environment variables prefixed with `SPRINGTIME_` or the
//! [springtime.json](springtime_core::config::CONFIG_FILE) file.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use springtime_core::config::CONFIG_FILE;

const CONFIG_ENV_PREFIX: &str = "SPRINGTIME";

#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BeanFactoryConfig {
    /// Should registering a bean with an already registered name replace the previous
    /// definition, instead of failing.
    pub allow_definition_overriding: bool,
}

impl Default for BeanFactoryConfig {
    fn default() -> Self {
        Self {
            allow_definition_overriding: true,
        }
    }
}

impl From<OptionalBeanFactoryConfig> for BeanFactoryConfig {
    fn from(value: OptionalBeanFactoryConfig) -> Self {
        let default = Self::default();
        Self {
            allow_definition_overriding: value
                .allow_definition_overriding
                .unwrap_or(default.allow_definition_overriding),
        }
    }
}

impl BeanFactoryConfig {
    pub fn init_from_environment() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(CONFIG_ENV_PREFIX))
            .build()
            .and_then(|config| config.try_deserialize::<OptionalBeanFactoryConfig>())
            .map(|config| config.into())
    }

    pub fn with_definition_overriding(mut self, allow_definition_overriding: bool) -> Self {
        self.allow_definition_overriding = allow_definition_overriding;
        self
    }
}

#[derive(Deserialize, Default)]
struct OptionalBeanFactoryConfig {
    allow_definition_overriding: Option<bool>,
}
