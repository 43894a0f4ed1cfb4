//! Primary error enum for configuration compilation flows.

use thiserror::Error;

/// Errors that can occur while collecting, compiling or rendering
/// configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StrataError {
    /// A decoder rejected the bytes of a record.
    #[error("decoding error for extension '{extension}' processing '{name}': {source}")]
    Decoding {
        /// Record name (usually the file base name) that failed to decode.
        name: String,
        /// Extension used to select the decoder.
        extension: String,
        /// Underlying error reported by the decoder.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An encoder failed to render the compiled tree.
    #[error("encoding error for format '{format}': {message}")]
    Encoding {
        /// Extension of the encoder that failed.
        format: String,
        /// Human-readable description of the failure.
        message: String,
    },

    /// A read operation was attempted before the first successful compile.
    #[error("the compile() function must be called first")]
    NotCompiled,

    /// No codec is registered for the requested extension.
    #[error("no codec found for extension '{extension}'")]
    CodecNotFound {
        /// The extension that had no registered codec.
        extension: String,
    },

    /// An option argument was malformed (empty record name, empty delimiter).
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Explanation of what was malformed.
        message: String,
    },

    /// A source declared as an exact file is absent.
    #[error("required configuration file missing: '{path}'")]
    FileMissing {
        /// The missing path.
        path: String,
    },

    /// An extension was registered twice in the same registry.
    #[error("duplicate found: extension '{extension}' is already registered")]
    DuplicateFound {
        /// The doubly-registered extension.
        extension: String,
    },

    /// A key path lookup missed.
    #[error("not found: '{key}'")]
    NotFound {
        /// The key path that missed.
        key: String,
    },

    /// A shape conflict during fetch, merge or documentation unification.
    #[error("type mismatch at '{key}': {message}")]
    TypeMismatch {
        /// Key path where the conflicting shapes met.
        key: String,
        /// Description of the conflicting shapes.
        message: String,
    },

    /// Variable expansion kept producing changes past its iteration budget.
    #[error("expansion did not converge for '{origin}' within {maximum} passes")]
    ExpansionNotConverged {
        /// Origin label of the last directive that still produced changes.
        origin: String,
        /// The exhausted pass budget.
        maximum: usize,
    },

    /// A fatal filesystem error while collecting records.
    #[error("filesystem error at '{path}': {source}")]
    File {
        /// Path that triggered the failure.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The struct-decoding layer rejected the raw projection.
    #[error("failed to deserialize '{key}': {source}")]
    Deserialize {
        /// Key path of the subtree that was being extracted.
        key: String,
        /// Underlying serde error.
        #[source]
        source: Box<serde_json::Error>,
    },
}
