//! Built-in JSON codec backed by `serde_json`.

use serde_json::Value as RawValue;

use super::{Codec, CodecError, DecodeContext, Decoder, Encoder};
use crate::tree::{Node, Origin};

/// JSON decoder and encoder.
///
/// Decoded origins carry the record name only; `serde_json` does not expose
/// positions for successfully parsed values. Origin-aware encoding is not
/// supported because JSON has no comment syntax.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create the codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Codec for JsonCodec {
    fn extensions(&self) -> Vec<String> {
        vec!["json".to_owned()]
    }
}

impl Decoder for JsonCodec {
    fn decode(&self, ctx: &DecodeContext, data: &[u8]) -> Result<Node, CodecError> {
        let raw: RawValue = serde_json::from_slice(data)?;
        Ok(Node::from_raw(&raw, &Origin::named(&ctx.filename)))
    }
}

impl Encoder for JsonCodec {
    fn encode(&self, raw: &RawValue) -> Result<Vec<u8>, CodecError> {
        let mut out = serde_json::to_vec_pretty(raw)?;
        out.push(b'\n');
        Ok(out)
    }

    fn encode_extended(&self, _tree: &Node) -> Result<Vec<u8>, CodecError> {
        Err("json cannot carry origin comments".into())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DecodeContext, Decoder, Encoder, JsonCodec};
    use crate::tree::{Node, Origin};

    fn ctx() -> DecodeContext {
        DecodeContext {
            filename: "cfg.json".to_owned(),
            delimiter: ".".to_owned(),
        }
    }

    #[test]
    fn decode_then_encode_round_trips() {
        let codec = JsonCodec::new();
        let tree = Node::from_raw(
            &json!({"a": {"b": [1, 2]}, "s": "text", "f": 1.5}),
            &Origin::named("cfg.json"),
        );

        let encoded = codec
            .encode(&tree.to_raw())
            .unwrap_or_else(|e| panic!("encode failed: {e}"));
        let decoded = codec
            .decode(&ctx(), &encoded)
            .unwrap_or_else(|e| panic!("decode failed: {e}"));

        assert_eq!(decoded.to_raw(), tree.to_raw());
    }

    #[test]
    fn decode_failures_surface_the_parser_error() {
        let err = JsonCodec::new()
            .decode(&ctx(), b"{not json")
            .err()
            .unwrap_or_else(|| panic!("expected parse failure"));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn extended_encoding_is_unsupported() {
        let tree = Node::from_raw(&json!({}), &Origin::named("cfg.json"));
        assert!(JsonCodec::new().encode_extended(&tree).is_err());
    }
}
