//! Documentation objects supplied alongside the configuration.
//!
//! A documentation tree is independent of any compiled configuration: it
//! describes the intended shape (type tags, doc text, deprecation and
//! optionality) and is zipped against the compiled tree at render time.
//!
//! The JSON form uses reserved child names for array-element, map-key,
//! map-value and embedded-struct documentation; these are parsed into the
//! [`DocKey`] tags so context checks stay exhaustive.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::de::{Deserializer, Error as _};

/// Type tag of a documentation node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocType {
    /// Root of a documentation tree.
    Root,
    /// A structure with named fields.
    Struct,
    /// A map with homogeneous keys and values.
    Map,
    /// An ordered array.
    Array,
    /// A scalar kind, e.g. `string`, `int` or `bool`.
    Named(String),
}

impl Default for DocType {
    fn default() -> Self {
        Self::Struct
    }
}

impl DocType {
    fn parse(text: &str) -> Self {
        match text {
            "<root>" => Self::Root,
            "<struct>" | "" => Self::Struct,
            "<map>" => Self::Map,
            "<array>" => Self::Array,
            other => Self::Named(other.trim_matches(['<', '>']).to_owned()),
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("<root>"),
            Self::Struct => f.write_str("<struct>"),
            Self::Map => f.write_str("<map>"),
            Self::Array => f.write_str("<array>"),
            Self::Named(name) => write!(f, "<{name}>"),
        }
    }
}

impl<'de> Deserialize<'de> for DocType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text))
    }
}

/// Child name in a documentation tree: an ordinary field name or one of the
/// reserved roles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DocKey {
    /// Documentation for array elements (reserved name `<array>`).
    ArrayElement,
    /// Documentation for map keys (reserved name `<key>`).
    MapKey,
    /// Documentation for map values (reserved name `<value>`).
    MapValue,
    /// Documentation for an embedded structure (reserved name `<embedded>`).
    Embedded,
    /// An ordinary named child.
    Named(String),
}

impl DocKey {
    /// Parse a JSON child name, mapping the reserved names onto their tags.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text {
            "<array>" => Self::ArrayElement,
            "<key>" => Self::MapKey,
            "<value>" => Self::MapValue,
            "<embedded>" => Self::Embedded,
            other => Self::Named(other.to_owned()),
        }
    }
}

impl<'de> Deserialize<'de> for DocKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        if text.is_empty() {
            return Err(D::Error::custom("documentation child names must be non-empty"));
        }
        Ok(Self::parse(&text))
    }
}

/// A node of the documentation tree.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DocNode {
    /// Free-text documentation; newlines delimit rendered lines.
    #[serde(rename = "Doc")]
    pub doc: String,
    /// The declared type of the documented value.
    #[serde(rename = "Type")]
    pub type_tag: DocType,
    /// Whether the value is deprecated; rendered as a banner.
    #[serde(rename = "Deprecated")]
    pub deprecated: bool,
    /// Whether the value may be absent.
    #[serde(rename = "Optional")]
    pub optional: bool,
    /// Named children plus any reserved-role children.
    #[serde(rename = "Children")]
    pub children: BTreeMap<DocKey, DocNode>,
}

impl DocNode {
    /// Compose the human-readable type description.
    ///
    /// Arrays render as `array of <element>`; maps render as
    /// `map with key <k> -> value <v>` followed by indented key/value doc
    /// lines with continuations aligned under their text.
    #[must_use]
    pub fn type_string(&self) -> String {
        match &self.type_tag {
            DocType::Array => {
                let element = self
                    .children
                    .get(&DocKey::ArrayElement)
                    .map_or_else(|| DocType::Array.to_string(), Self::type_string);
                format!("array of {element}")
            }
            DocType::Map => self.map_type_string(),
            other => other.to_string(),
        }
    }

    fn map_type_string(&self) -> String {
        let key = self.children.get(&DocKey::MapKey);
        let value = self.children.get(&DocKey::MapValue);
        if key.is_none() && value.is_none() {
            return DocType::Map.to_string();
        }

        let key_type = key.map_or_else(|| DocType::Map.to_string(), |k| k.type_tag.to_string());
        let value_type = value.map_or_else(
            || DocType::Map.to_string(),
            |v| first_line(&v.type_string()).to_owned(),
        );

        let mut lines = vec![format!("map with key {key_type} -> value {value_type}")];
        if let Some(k) = key {
            push_role_doc(&mut lines, "key", &key_type, &k.doc);
        }
        if let Some(v) = value {
            push_role_doc(&mut lines, "value", &value_type, &v.doc);
        }
        lines.join("\n")
    }
}

fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or(text)
}

/// Append `  key(<type>) doc…` lines with continuation lines aligned under
/// the start of the doc text.
fn push_role_doc(lines: &mut Vec<String>, role: &str, type_text: &str, doc: &str) {
    if doc.is_empty() {
        return;
    }
    let prefix = format!("  {role}({type_text}) ");
    let pad = " ".repeat(prefix.len());
    for (i, line) in doc.split('\n').enumerate() {
        if i == 0 {
            lines.push(format!("{prefix}{line}"));
        } else {
            lines.push(format!("{pad}{line}"));
        }
    }
}

/// Merge `overlay` into `base`: children take the union (recursing on shared
/// names); the overlay wins for the type tag, non-empty doc text and set
/// flags.
#[must_use]
pub fn merge_docs(mut base: DocNode, overlay: DocNode) -> DocNode {
    if !overlay.doc.is_empty() {
        base.doc = overlay.doc;
    }
    base.type_tag = overlay.type_tag;
    base.deprecated = base.deprecated || overlay.deprecated;
    base.optional = base.optional || overlay.optional;

    for (key, child) in overlay.children {
        let merged = match base.children.remove(&key) {
            Some(existing) => merge_docs(existing, child),
            None => child,
        };
        base.children.insert(key, merged);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::{DocKey, DocNode, DocType, merge_docs};

    fn parse(json: &str) -> DocNode {
        serde_json::from_str(json).unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    #[test]
    fn json_reserved_names_become_tags() {
        let doc = parse(
            r#"{
                "Type": "<map>",
                "Children": {
                    "<key>": {"Type": "<string>", "Doc": "Metric name"},
                    "<value>": {"Type": "<int>", "Doc": "Metric threshold value"},
                    "plain": {"Type": "<bool>"}
                }
            }"#,
        );

        assert_eq!(doc.type_tag, DocType::Map);
        assert!(doc.children.contains_key(&DocKey::MapKey));
        assert!(doc.children.contains_key(&DocKey::MapValue));
        assert!(doc.children.contains_key(&DocKey::Named("plain".to_owned())));
    }

    #[test]
    fn array_type_string_names_the_element() {
        let doc = parse(
            r#"{
                "Type": "<array>",
                "Children": {"<array>": {"Type": "<string>"}}
            }"#,
        );
        assert_eq!(doc.type_string(), "array of <string>");
    }

    #[test]
    fn map_type_string_documents_key_and_value() {
        let doc = parse(
            r#"{
                "Type": "<map>",
                "Children": {
                    "<key>": {"Type": "<string>", "Doc": "Metric name"},
                    "<value>": {"Type": "<int>", "Doc": "Metric threshold value"}
                }
            }"#,
        );
        assert_eq!(
            doc.type_string(),
            "map with key <string> -> value <int>\n  key(<string>) Metric name\n  value(<int>) Metric threshold value"
        );
    }

    #[test]
    fn multiline_role_docs_align_continuations() {
        let doc = parse(
            r#"{
                "Type": "<map>",
                "Children": {
                    "<key>": {"Type": "<string>", "Doc": "Service name identifier\n(e.g., 'api')"}
                }
            }"#,
        );
        let text = doc.type_string();
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines[1], "  key(<string>) Service name identifier");
        assert_eq!(lines[2], "                (e.g., 'api')");
    }

    #[test]
    fn doc_trees_merge_by_union() {
        let server = parse(
            r#"{"Type": "<root>", "Children": {"Server": {"Type": "<map>", "Doc": "server"}}}"#,
        );
        let database = parse(
            r#"{"Type": "<root>", "Children": {"Database": {"Type": "<map>", "Doc": "db"}}}"#,
        );

        let merged = merge_docs(server, database);
        assert_eq!(merged.type_tag, DocType::Root);
        assert_eq!(merged.children.len(), 2);
    }

    #[test]
    fn unknown_scalar_types_round_trip_in_angle_brackets() {
        let doc = parse(r#"{"Type": "<uint32>"}"#);
        assert_eq!(doc.type_tag.to_string(), "<uint32>");
    }
}
