//! Application-level configuration loading: optional JSON file, then `.env` and
//! process environment overrides.

use std::{env, fs, io::ErrorKind, path::PathBuf, str::FromStr, time::Duration};

use jsonwebtoken::Algorithm;
use rand::{Rng, distr::Alphanumeric};
use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MEDAPP_BACK_CONFIG_PATH";

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TOKEN_MINUTES: u64 = 1440;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_MONGO_DB: &str = "medapp";
const GENERATED_SECRET_LEN: usize = 64;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// TCP port bound on all interfaces.
    pub port: u16,
    /// HMAC secret used to sign access tokens.
    pub secret_key: String,
    /// HMAC algorithm used to sign access tokens.
    pub algorithm: Algorithm,
    /// Lifetime of an access token.
    pub access_token_ttl: Duration,
    /// Directory holding uploaded photos.
    pub upload_dir: PathBuf,
    /// Largest accepted upload body, in bytes.
    pub max_upload_bytes: usize,
    /// MongoDB connection string; the in-memory store is used when absent.
    pub mongo_uri: Option<String>,
    /// MongoDB database name.
    pub mongo_db: String,
}

impl AppConfig {
    /// Load the configuration from disk and the environment, falling back to
    /// built-in defaults for anything missing or malformed.
    pub fn load() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            info!(path = %path.display(), "loaded environment from .env file");
        }

        let raw = read_config_file(&resolve_config_path());
        Self::from_sources(raw, |key| env::var(key).ok())
    }

    /// Merge a parsed config file with environment lookups (environment wins).
    pub fn from_sources(raw: RawConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = env_parsed(&lookup, "PORT")
            .or(raw.port)
            .unwrap_or(DEFAULT_PORT);

        let secret_key = lookup("SECRET_KEY")
            .or(raw.secret_key)
            .filter(|secret| !secret.is_empty())
            .unwrap_or_else(|| {
                warn!("SECRET_KEY is not set; generated an ephemeral signing secret");
                generate_secret()
            });

        let algorithm = lookup("ALGORITHM")
            .or(raw.algorithm)
            .and_then(|name| match parse_algorithm(&name) {
                Some(algorithm) => Some(algorithm),
                None => {
                    warn!(algorithm = %name, "unsupported token algorithm; using HS256");
                    None
                }
            })
            .unwrap_or(Algorithm::HS256);

        let minutes = env_parsed(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES")
            .or(raw.access_token_expire_minutes)
            .unwrap_or(DEFAULT_TOKEN_MINUTES);

        let upload_dir = lookup("UPLOAD_DIR")
            .or(raw.upload_dir)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR));

        let max_upload_bytes = env_parsed(&lookup, "MAX_UPLOAD_BYTES")
            .or(raw.max_upload_bytes)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let mongo_uri = lookup("MONGO_URI")
            .or(raw.mongo_uri)
            .filter(|uri| !uri.is_empty());

        let mongo_db = lookup("MONGO_DB")
            .or(raw.mongo_db)
            .filter(|db| !db.is_empty())
            .unwrap_or_else(|| DEFAULT_MONGO_DB.to_owned());

        Self {
            port,
            secret_key,
            algorithm,
            access_token_ttl: Duration::from_secs(minutes.saturating_mul(60)),
            upload_dir,
            max_upload_bytes,
            mongo_uri,
            mongo_db,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_sources(RawConfig::default(), |_| None)
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
pub struct RawConfig {
    /// See [`AppConfig::port`].
    pub port: Option<u16>,
    /// See [`AppConfig::secret_key`].
    pub secret_key: Option<String>,
    /// Algorithm name such as `HS256`.
    pub algorithm: Option<String>,
    /// Token lifetime in minutes.
    pub access_token_expire_minutes: Option<u64>,
    /// See [`AppConfig::upload_dir`].
    pub upload_dir: Option<String>,
    /// See [`AppConfig::max_upload_bytes`].
    pub max_upload_bytes: Option<usize>,
    /// See [`AppConfig::mongo_uri`].
    pub mongo_uri: Option<String>,
    /// See [`AppConfig::mongo_db`].
    pub mongo_db: Option<String>,
}

fn read_config_file(path: &PathBuf) -> RawConfig {
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
            Ok(raw) => {
                info!(path = %path.display(), "loaded configuration file");
                raw
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse config; falling back to defaults"
                );
                RawConfig::default()
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(
                path = %path.display(),
                "config file not found; using environment and built-in defaults"
            );
            RawConfig::default()
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "failed to read config; falling back to defaults"
            );
            RawConfig::default()
        }
    }
}

/// Parse an environment value, logging and ignoring malformed input.
fn env_parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let value = lookup(key)?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(key, value = %value, "ignoring malformed environment value");
            None
        }
    }
}

/// Only the HMAC family is accepted since tokens are signed with a shared secret.
fn parse_algorithm(name: &str) -> Option<Algorithm> {
    match Algorithm::from_str(name.trim()) {
        Ok(algorithm @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Some(algorithm),
        _ => None,
    }
}

fn generate_secret() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect()
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_sources() {
        let config = AppConfig::from_sources(RawConfig::default(), lookup(&[]));
        assert_eq!(config.port, 8000);
        assert_eq!(config.algorithm, Algorithm::HS256);
        assert_eq!(config.access_token_ttl, Duration::from_secs(1440 * 60));
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.secret_key.len(), GENERATED_SECRET_LEN);
        assert!(config.mongo_uri.is_none());
        assert_eq!(config.mongo_db, "medapp");
    }

    #[test]
    fn environment_overrides_file() {
        let raw = RawConfig {
            port: Some(9000),
            secret_key: Some("from-file".into()),
            mongo_db: Some("file_db".into()),
            ..RawConfig::default()
        };
        let config = AppConfig::from_sources(
            raw,
            lookup(&[
                ("PORT", "8123"),
                ("ALGORITHM", "HS512"),
                ("ACCESS_TOKEN_EXPIRE_MINUTES", "5"),
                ("MONGO_URI", "mongodb://db:27017"),
            ]),
        );
        assert_eq!(config.port, 8123);
        assert_eq!(config.secret_key, "from-file");
        assert_eq!(config.algorithm, Algorithm::HS512);
        assert_eq!(config.access_token_ttl, Duration::from_secs(300));
        assert_eq!(config.mongo_uri.as_deref(), Some("mongodb://db:27017"));
        assert_eq!(config.mongo_db, "file_db");
    }

    #[test]
    fn malformed_values_fall_back() {
        let config = AppConfig::from_sources(
            RawConfig::default(),
            lookup(&[("PORT", "not-a-port"), ("ALGORITHM", "RS256")]),
        );
        assert_eq!(config.port, 8000);
        assert_eq!(config.algorithm, Algorithm::HS256);
    }
}
