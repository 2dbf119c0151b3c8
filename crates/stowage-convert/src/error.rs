use std::error::Error as StdError;

use thiserror::Error;

use crate::tag::TypeTag;

/// Boxed underlying codec error.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors raised while converting between typed values and bytes.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The value could not be encoded.
    #[error("failed to serialize {tag}: {source}")]
    Serialize {
        tag: TypeTag,
        #[source]
        source: BoxError,
    },

    /// The stored bytes could not be decoded into the requested type.
    #[error("failed to deserialize {tag}: {source}")]
    Deserialize {
        tag: TypeTag,
        #[source]
        source: BoxError,
    },

    /// The stored data has the wrong top-level shape for the tag
    /// (e.g. a scalar blob read through a list tag).
    #[error("shape mismatch for {tag}: found {found}")]
    ShapeMismatch { tag: TypeTag, found: String },
}

impl ConvertError {
    pub(crate) fn serialize(tag: &TypeTag, source: impl Into<BoxError>) -> Self {
        Self::Serialize {
            tag: tag.clone(),
            source: source.into(),
        }
    }

    pub(crate) fn deserialize(tag: &TypeTag, source: impl Into<BoxError>) -> Self {
        Self::Deserialize {
            tag: tag.clone(),
            source: source.into(),
        }
    }
}

/// Result alias for converter operations.
pub type ConvertResult<T> = Result<T, ConvertError>;
