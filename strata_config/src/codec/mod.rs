//! Decoder and encoder seams plus the registries that hold them.
//!
//! Registries are plain values constructed by the caller and owned by a
//! single configuration; there is no process-wide registration. Extensions
//! are matched case-insensitively and registering the same extension twice
//! is an error.

mod json;
#[cfg(feature = "toml")]
mod toml;

pub use json::JsonCodec;
#[cfg(feature = "toml")]
pub use toml::TomlDecoder;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{StrataError, StrataResult};
use crate::tree::Node;

/// Boxed error type returned across the codec boundary.
pub type CodecError = Box<dyn std::error::Error + Send + Sync>;

/// Context handed to a decoder for a single record.
#[derive(Debug, Clone)]
pub struct DecodeContext {
    /// Record name, usually the file base name.
    pub filename: String,
    /// Key delimiter in effect for the configuration being compiled.
    pub delimiter: String,
}

/// Common surface of decoders and encoders: the extensions they handle.
pub trait Codec {
    /// File extensions (without the leading dot) this codec handles.
    fn extensions(&self) -> Vec<String>;
}

/// Maps raw bytes to a configuration tree. Implementations must be
/// deterministic.
pub trait Decoder: Codec + Send + Sync {
    /// Decode `data` into a tree, annotating origins with the context's
    /// filename where position data is available.
    ///
    /// # Errors
    ///
    /// Any error is wrapped by the caller into a decoding failure carrying
    /// the record and extension identity.
    fn decode(&self, ctx: &DecodeContext, data: &[u8]) -> Result<Node, CodecError>;
}

/// Maps a compiled tree back to bytes.
pub trait Encoder: Codec + Send + Sync {
    /// Encode the untyped projection of a tree; no comments.
    ///
    /// # Errors
    ///
    /// Returns an error when the projection cannot be represented in the
    /// target format.
    fn encode(&self, raw: &serde_json::Value) -> Result<Vec<u8>, CodecError>;

    /// Encode a tree including its origin annotations, for formats that can
    /// carry them.
    ///
    /// # Errors
    ///
    /// Returns an error when the format cannot represent origin comments.
    fn encode_extended(&self, tree: &Node) -> Result<Vec<u8>, CodecError>;
}

/// A by-extension lookup table over decoders or encoders.
pub struct CodecRegistry<C: ?Sized> {
    codecs: BTreeMap<String, Arc<C>>,
}

impl<C: ?Sized> Clone for CodecRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            codecs: self.codecs.clone(),
        }
    }
}

impl<C: Codec + ?Sized> CodecRegistry<C> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            codecs: BTreeMap::new(),
        }
    }

    /// Register a codec under every extension it declares.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::DuplicateFound`] when one of the extensions is
    /// already taken.
    pub fn register(&mut self, codec: Arc<C>) -> StrataResult<()> {
        for ext in codec.extensions() {
            let ext = normalize(&ext);
            if self.codecs.contains_key(&ext) {
                return Err(Arc::new(StrataError::DuplicateFound { extension: ext }));
            }
            self.codecs.insert(ext, Arc::clone(&codec));
        }
        Ok(())
    }

    /// Find the codec registered for `ext`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::CodecNotFound`] when no codec handles `ext`.
    pub fn find(&self, ext: &str) -> StrataResult<Arc<C>> {
        let ext = normalize(ext);
        self.codecs.get(&ext).cloned().ok_or_else(|| {
            Arc::new(StrataError::CodecNotFound { extension: ext })
        })
    }

    /// All registered extensions, sorted.
    #[must_use]
    pub fn extensions(&self) -> Vec<String> {
        self.codecs.keys().cloned().collect()
    }
}

impl<C: Codec + ?Sized> Default for CodecRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> std::fmt::Debug for CodecRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("extensions", &self.codecs.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Registry of decoders keyed by extension.
pub type DecoderRegistry = CodecRegistry<dyn Decoder>;
/// Registry of encoders keyed by extension.
pub type EncoderRegistry = CodecRegistry<dyn Encoder>;

fn normalize(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::{Codec, DecodeContext, Decoder, DecoderRegistry, JsonCodec};
    use crate::error::StrataError;
    use crate::tree::{Node, Origin};

    struct FakeDecoder;

    impl Codec for FakeDecoder {
        fn extensions(&self) -> Vec<String> {
            vec!["json".to_owned()]
        }
    }

    impl Decoder for FakeDecoder {
        fn decode(&self, _: &DecodeContext, _: &[u8]) -> Result<Node, super::CodecError> {
            Ok(Node::from_raw(&json!({}), &Origin::named("fake")))
        }
    }

    #[test]
    fn duplicate_extensions_are_rejected() {
        let mut reg = DecoderRegistry::new();
        reg.register(Arc::new(JsonCodec::new()))
            .unwrap_or_else(|e| panic!("register failed: {e}"));
        let err = reg
            .register(Arc::new(FakeDecoder))
            .err()
            .unwrap_or_else(|| panic!("expected duplicate error"));
        assert!(matches!(&*err, StrataError::DuplicateFound { extension } if extension == "json"));
    }

    #[test]
    fn lookup_normalizes_dots_and_case() {
        let mut reg = DecoderRegistry::new();
        reg.register(Arc::new(JsonCodec::new()))
            .unwrap_or_else(|e| panic!("register failed: {e}"));
        assert!(reg.find(".JSON").is_ok());
    }

    #[test]
    fn missing_extension_is_codec_not_found() {
        let reg = DecoderRegistry::new();
        let err = reg
            .find("ini")
            .err()
            .unwrap_or_else(|| panic!("expected miss"));
        assert!(matches!(&*err, StrataError::CodecNotFound { extension } if extension == "ini"));
    }
}
