//! Constructor helpers for `StrataError`.
//!
//! The compile pipeline passes errors around as `Arc<StrataError>`; these
//! helpers keep call sites to a single expression.

use std::sync::Arc;

use super::StrataError;

impl StrataError {
    /// Wrap a decoder failure with the record and extension identity.
    #[must_use]
    pub fn decoding(
        name: impl Into<String>,
        extension: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Arc<Self> {
        Arc::new(Self::Decoding {
            name: name.into(),
            extension: extension.into(),
            source: source.into(),
        })
    }

    /// Build an encoding failure for the given format.
    #[must_use]
    pub fn encoding(format: impl Into<String>, message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::Encoding {
            format: format.into(),
            message: message.into(),
        })
    }

    /// Build an invalid-input error from a description.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::InvalidInput {
            message: message.into(),
        })
    }

    /// Build a not-found error for a key path.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::NotFound { key: key.into() })
    }

    /// Build a type-mismatch error for a key path.
    #[must_use]
    pub fn type_mismatch(key: impl Into<String>, message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::TypeMismatch {
            key: key.into(),
            message: message.into(),
        })
    }

    /// Wrap a fatal filesystem error with the path that triggered it.
    #[must_use]
    pub fn file(path: impl Into<String>, source: std::io::Error) -> Arc<Self> {
        Arc::new(Self::File {
            path: path.into(),
            source,
        })
    }
}
