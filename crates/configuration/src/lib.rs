use crate::error::ConfigError;
use std::collections::HashMap;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{AllowList, AppEnvironment, ExecutionMode, Settings};

use settings::{
    DEFAULT_ALLOWED_ORIGINS, DEFAULT_BODY_LIMIT_BYTES, DEFAULT_BIND_HOST,
    DEFAULT_MONGO_CONNECT_TIMEOUT_SECS, DEFAULT_MONGO_URI, DEFAULT_PORT,
};

/// Loads the application settings from the process environment.
///
/// A `.env` file in the working directory is loaded first when present;
/// variables already set in the environment win over the file.
pub fn load_settings() -> Result<Settings, ConfigError> {
    dotenvy::dotenv().ok();
    build_settings(None)
}

/// Loads the application settings from an explicit variable map instead of
/// the process environment. Keys use the environment spelling (`MONGO_URI`).
pub fn load_settings_from(vars: HashMap<String, String>) -> Result<Settings, ConfigError> {
    build_settings(Some(vars))
}

fn build_settings(source: Option<HashMap<String, String>>) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("bind_host", DEFAULT_BIND_HOST)?
        .set_default("allowed_origins", DEFAULT_ALLOWED_ORIGINS.join(","))?
        .set_default("mongo_uri", DEFAULT_MONGO_URI)?
        .set_default("app_env", "development")?
        .set_default("body_limit_bytes", DEFAULT_BODY_LIMIT_BYTES as i64)?
        .set_default(
            "mongo_connect_timeout_secs",
            DEFAULT_MONGO_CONNECT_TIMEOUT_SECS as i64,
        )?
        // An empty variable counts as unset, so the defaults above apply.
        .add_source(config::Environment::default().ignore_empty(true).source(source))
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    validate(&settings)?;

    Ok(settings)
}

fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if settings.mongo_uri.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "MONGO_URI must not be blank".to_string(),
        ));
    }
    if settings.body_limit_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "BODY_LIMIT_BYTES must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
