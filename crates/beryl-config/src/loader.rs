//! Environment-over-defaults configuration loading.

use serde::{Serialize, de::DeserializeOwned};

use crate::ConfigError;

/// Loads a configuration struct by layering the process environment on top
/// of the given defaults.
///
/// Environment keys are matched case-insensitively against field names
/// (`DELAY_MS` binds to `delay_ms`), with values parsed into their target
/// types. Unknown variables are ignored.
pub fn load_from_env<T>(defaults: &T) -> Result<T, ConfigError>
where
    T: Serialize + DeserializeOwned,
{
    let config = config::Config::builder()
        .add_source(config::Config::try_from(defaults)?)
        .add_source(config::Environment::default().try_parsing(true))
        .build()?;

    Ok(config.try_deserialize()?)
}
