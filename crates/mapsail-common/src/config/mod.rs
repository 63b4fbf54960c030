mod application;

pub use application::*;

/// The prefix of environment variables that override the default configuration.
pub const MAPSAIL_ENV_VAR_PREFIX: &str = "MAPSAIL__";
