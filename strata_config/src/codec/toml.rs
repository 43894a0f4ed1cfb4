//! Built-in TOML decoder backed by the `toml` crate.

use std::collections::BTreeMap;

use toml::Value as TomlValue;

use super::{Codec, CodecError, DecodeContext, Decoder};
use crate::tree::{Kind, Node, Number, Origin, Scalar};

/// TOML decoder. Datetimes are carried as strings; interpretation is left to
/// typed extraction.
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlDecoder;

impl TomlDecoder {
    /// Create the decoder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Codec for TomlDecoder {
    fn extensions(&self) -> Vec<String> {
        vec!["toml".to_owned()]
    }
}

impl Decoder for TomlDecoder {
    fn decode(&self, ctx: &DecodeContext, data: &[u8]) -> Result<Node, CodecError> {
        let text = std::str::from_utf8(data)?;
        let value: TomlValue = toml::from_str(text)?;
        Ok(convert(&value, &Origin::named(&ctx.filename)))
    }
}

fn convert(value: &TomlValue, origin: &Origin) -> Node {
    let kind = match value {
        TomlValue::String(s) => Kind::Scalar(Scalar::String(s.clone())),
        TomlValue::Integer(i) => Kind::Scalar(Scalar::Number(Number::from_text(i.to_string()))),
        TomlValue::Float(f) => Kind::Scalar(Scalar::Number(Number::from_text(f.to_string()))),
        TomlValue::Boolean(b) => Kind::Scalar(Scalar::Bool(*b)),
        TomlValue::Datetime(dt) => Kind::Scalar(Scalar::String(dt.to_string())),
        TomlValue::Array(items) => {
            Kind::Array(items.iter().map(|v| convert(v, origin)).collect())
        }
        TomlValue::Table(entries) => {
            let children: BTreeMap<String, Node> = entries
                .iter()
                .map(|(k, v)| (k.clone(), convert(v, origin)))
                .collect();
            Kind::Map(children)
        }
    };

    Node {
        kind,
        origins: vec![origin.clone()],
        secret: false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DecodeContext, Decoder, TomlDecoder};

    #[test]
    fn tables_arrays_and_scalars_decode() {
        let ctx = DecodeContext {
            filename: "app.toml".to_owned(),
            delimiter: ".".to_owned(),
        };
        let data = br#"
name = "svc"
port = 8080

[limits]
rates = [1, 2, 3]
"#;

        let tree = TomlDecoder::new()
            .decode(&ctx, data)
            .unwrap_or_else(|e| panic!("decode failed: {e}"));
        assert_eq!(
            tree.to_raw(),
            json!({"name": "svc", "port": 8080, "limits": {"rates": [1, 2, 3]}})
        );
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let ctx = DecodeContext {
            filename: "app.toml".to_owned(),
            delimiter: ".".to_owned(),
        };
        assert!(TomlDecoder::new().decode(&ctx, b"= broken").is_err());
    }
}
