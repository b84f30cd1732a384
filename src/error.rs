use thiserror::Error;

use crate::ConfigError;
use crate::parse::ParseError;

/// Unified error type covering configuration, parsing, and I/O.
///
/// Returned by convenience methods like
/// [`ConditionSet::load()`](crate::ConditionSet::load).
#[derive(Debug, Error)]
pub enum PrereqError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}
