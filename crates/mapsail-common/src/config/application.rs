use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::config::MAPSAIL_ENV_VAR_PREFIX;
use crate::error::{CommonError, CommonResult};

const DEFAULT_CONFIG: &str = include_str!("default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub python: PythonConfig,
}

impl AppConfig {
    /// Loads the configuration from the built-in defaults,
    /// overridden by `MAPSAIL__`-prefixed environment variables.
    /// Nested keys are separated by `__` (e.g. `MAPSAIL__PYTHON__TRACEBACK_LIMIT`).
    pub fn load() -> CommonResult<Self> {
        Figment::from(Toml::string(DEFAULT_CONFIG))
            .admerge(
                Env::prefixed(MAPSAIL_ENV_VAR_PREFIX).map(|p| p.as_str().replace("__", ".").into()),
            )
            .extract()
            .map_err(|e| CommonError::invalid(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonConfig {
    pub traceback_limit: usize,
}
