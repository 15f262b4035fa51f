use thiserror::Error;

/// Configuration-load failures.
///
/// These are the only errors the crate surfaces: a missing or malformed
/// movement-model row is a content authoring mistake with no safe runtime
/// fallback, so it fails at load. Simulation-path code never returns errors;
/// missing collaborators are guard-checked and skipped frame by frame.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid movement model YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("unknown profile key: {key}")]
    UnknownKey { key: String },

    #[error("missing movement profile row: {mode}.{stance}")]
    MissingProfile { mode: String, stance: String },

    #[error("invalid movement profile {profile}: {reason}")]
    InvalidProfile { profile: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
