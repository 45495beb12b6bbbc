//! Error types of the autoscaler core.

use thiserror::Error;

/// Errors returned by node group operations, the instance resolver and the
/// cloud service backends.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CloudProviderError {
    /// Bad caller input, e.g. a non-positive resize delta.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation would breach the group's min/max bounds.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// The operation would violate an invariant of the group.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Opaque failure reported by the cloud backend.
    #[error("provider error: {0}")]
    Provider(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The group does not support this capability.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

pub type CloudProviderResult<T> = Result<T, CloudProviderError>;

/// Errors raised while loading the autoscaler configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("can't parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid node group spec {0:?}, expected min:max:name")]
    InvalidNodeGroupSpec(String),

    #[error("unknown expander {0:?}")]
    UnknownExpander(String),

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}
