//! Process-wide application state.
//!
//! `CoreState` is built once at startup, wrapped in `Arc`, and handed to
//! the router. Nothing in it is mutated afterwards, so request handlers
//! share it without locks.

use thiserror::Error;

use crate::artifacts::{ArtifactError, ArtifactSet};
use crate::config::{ConfigError, ServiceConfig};
use crate::pipeline::{AliasError, AliasTable, Predictor};

/// Anything that prevents the service from starting.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Alias table error: {0}")]
    Alias(#[from] AliasError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

pub struct CoreState {
    predictor: Predictor,
}

impl CoreState {
    pub fn new(predictor: Predictor) -> Self {
        Self { predictor }
    }

    /// Load artifacts and aliases described by `config`.
    pub fn load(config: &ServiceConfig) -> Result<Self, StartupError> {
        let artifacts = ArtifactSet::load(config)?;

        let aliases = match &config.alias_file {
            Some(path) => {
                let table = AliasTable::from_file(path)?;
                tracing::info!(
                    path = %path.display(),
                    version = table.version,
                    entries = table.len(),
                    "Alias table loaded"
                );
                table
            }
            None => AliasTable::builtin(),
        };

        let (aliases, stale) = aliases.validated(artifacts.symptoms(), config.strict_aliases)?;
        tracing::info!(
            version = aliases.version,
            entries = aliases.len(),
            pruned_targets = stale.len(),
            strict = config.strict_aliases,
            "Alias table validated against vocabulary"
        );

        Ok(Self::new(Predictor::new(artifacts, aliases)))
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }
}
