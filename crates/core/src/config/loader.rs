use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Plain environment variables accepted for credentials, mapped onto config keys.
const LEGACY_ENV: [(&str, &str); 3] = [
    ("TMDB_API_KEY", "tmdb.api_key"),
    ("TRANSMISSION_USERNAME", "torrent_client.transmission.username"),
    ("TRANSMISSION_PASSWORD", "torrent_client.transmission.password"),
];

fn legacy_key(key: &str) -> Option<&'static str> {
    LEGACY_ENV
        .iter()
        .find(|(env, _)| env.eq_ignore_ascii_case(key))
        .map(|(_, mapped)| *mapped)
}

/// Load configuration from file with environment variable overrides.
///
/// Precedence, lowest first: the TOML file, the plain credential variables
/// (`TMDB_API_KEY`, `TRANSMISSION_USERNAME`, `TRANSMISSION_PASSWORD`), then
/// `EPISODARR_`-prefixed variables using `__` as the section separator
/// (e.g. `EPISODARR_SOURCES__TORZNAB__API_KEY`).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let legacy_names: Vec<&str> = LEGACY_ENV.iter().map(|(env, _)| *env).collect();

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::raw().only(&legacy_names).map(|key| {
            match legacy_key(key.as_str()) {
                Some(mapped) => mapped.into(),
                None => key.as_str().to_string().into(),
            }
        }))
        .merge(Env::prefixed("EPISODARR_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
