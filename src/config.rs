use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Disease Detector";
pub const SERVICE_NAME: &str = "disease-detector";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Listen port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 5000;

/// Largest accepted `/predict` request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Artifact directory when `DISEASE_DETECTOR_MODEL_DIR` is unset.
pub const DEFAULT_MODEL_DIR: &str = "models";

/// Artifact file names inside the model directory.
pub const CLASSIFIER_FILE: &str = "disease_model.json";
pub const SYMPTOM_ENCODER_FILE: &str = "symptom_encoder.json";
pub const DISEASE_ENCODER_FILE: &str = "disease_encoder.json";

pub const ENV_PORT: &str = "PORT";
pub const ENV_HOST: &str = "DISEASE_DETECTOR_HOST";
pub const ENV_MODEL_DIR: &str = "DISEASE_DETECTOR_MODEL_DIR";
pub const ENV_ALIASES: &str = "DISEASE_DETECTOR_ALIASES";
pub const ENV_STRICT_ALIASES: &str = "DISEASE_DETECTOR_STRICT_ALIASES";

/// Tracing filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "disease_detector_lib=info,tower_http=info"
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {name} value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    pub model_dir: PathBuf,
    /// Alias table override. `None` uses the built-in table.
    pub alias_file: Option<PathBuf>,
    /// Refuse to start when an alias points at a token the encoder doesn't know.
    pub strict_aliases: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            alias_file: None,
            strict_aliases: false,
        }
    }
}

impl ServiceConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let port = match get(ENV_PORT) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: ENV_PORT,
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.port,
        };

        let host = match get(ENV_HOST) {
            Some(raw) => raw.parse::<IpAddr>().map_err(|e| ConfigError::Invalid {
                name: ENV_HOST,
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.host,
        };

        let strict_aliases = match get(ENV_STRICT_ALIASES) {
            Some(raw) => parse_flag(&raw).ok_or_else(|| ConfigError::Invalid {
                name: ENV_STRICT_ALIASES,
                value: raw.clone(),
                reason: "expected one of 1, 0, true, false, yes, no".into(),
            })?,
            None => defaults.strict_aliases,
        };

        Ok(Self {
            host,
            port,
            model_dir: get(ENV_MODEL_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            alias_file: get(ENV_ALIASES).map(PathBuf::from),
            strict_aliases,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn classifier_path(&self) -> PathBuf {
        self.model_dir.join(CLASSIFIER_FILE)
    }

    pub fn symptom_encoder_path(&self) -> PathBuf {
        self.model_dir.join(SYMPTOM_ENCODER_FILE)
    }

    pub fn disease_encoder_path(&self) -> PathBuf {
        self.model_dir.join(DISEASE_ENCODER_FILE)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
