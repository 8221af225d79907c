//! Error types for scene loading and engine configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal failure to turn raw bytes into a [`SceneDocument`](crate::scene::SceneDocument).
///
/// No partial result is ever produced alongside a `ParseError`; callers must
/// reject the input.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid scene JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid GLB container: {0}")]
    Container(#[from] gltf::Error),

    #[error("malformed scene structure: {reason}")]
    MalformedStructure { reason: String },

    #[error("cyclic node graph detected at node {node}")]
    CyclicGraph { node: usize },
}

impl ParseError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ParseError::MalformedStructure {
            reason: reason.into(),
        }
    }
}

/// Failure to load or validate an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failure to construct an [`Analyzer`](crate::analysis::Analyzer).
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid size label pattern: {0}")]
    Pattern(#[from] regex::Error),
}
