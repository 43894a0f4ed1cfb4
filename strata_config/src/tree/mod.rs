//! The canonical in-memory representation of a configuration value.
//!
//! A [`Node`] is exactly one of three shapes: a scalar, a map of named
//! children, or an ordered array. Every node carries a list of [`Origin`]
//! entries describing where its value came from; origins accumulate as
//! values participate in merges and are used for diagnostics only, never for
//! ordering or merge decisions.

pub(crate) mod merge;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::Value as RawValue;

use crate::error::{StrataError, StrataResult};

/// Marker substituted for secret values by [`Node::to_redacted`].
pub const REDACTED: &str = "REDACTED";

/// Provenance of a configuration value: source name plus position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// Source name, typically a file base name or a record name.
    pub file: String,
    /// One-based line number, zero when the source has no position data.
    pub line: u32,
    /// One-based column number, zero when the source has no position data.
    pub col: u32,
}

impl Origin {
    /// Build an origin with no position information.
    #[must_use]
    pub fn named(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: 0,
            col: 0,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 && self.col == 0 {
            write!(f, "{}", self.file)
        } else {
            write!(f, "{}:{}[{}]", self.file, self.line, self.col)
        }
    }
}

/// A number kept in its exact textual form.
///
/// Integers round-trip exactly through the text; floats are stored using the
/// shortest representation that round-trips through `f64`. Interpretation is
/// deferred until typed extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Number {
    text: String,
}

impl Number {
    /// Build a number from its textual form.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The exact textual form of the number.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Project into a JSON number, falling back to a string when the text is
    /// not expressible as one (for example an overly large literal).
    #[must_use]
    pub fn to_raw(&self) -> RawValue {
        match serde_json::Number::from_str(&self.text) {
            Ok(n) => RawValue::Number(n),
            Err(_) => RawValue::String(self.text.clone()),
        }
    }
}

/// A leaf value, uninterpreted until typed extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// An explicit null (or the zero value of an empty node).
    Null,
    /// A boolean.
    Bool(bool),
    /// A number preserved in textual form.
    Number(Number),
    /// A string.
    String(String),
}

impl Scalar {
    /// Render the scalar as a string suitable for encoding.
    ///
    /// This is the single conversion point for turning leaf values into
    /// text: numbers render their preserved textual form, booleans render
    /// `true`/`false` and null renders as the empty string.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.text().to_owned(),
            Self::String(s) => s.clone(),
        }
    }
}

/// The shape of a [`Node`].
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    /// A leaf value.
    Scalar(Scalar),
    /// String-keyed children; keys are unique, insertion order irrelevant.
    Map(BTreeMap<String, Node>),
    /// Ordered children; duplicates allowed.
    Array(Vec<Node>),
}

impl Kind {
    fn name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Map(_) => "map",
            Self::Array(_) => "array",
        }
    }
}

/// A configuration tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) kind: Kind,
    pub(crate) origins: Vec<Origin>,
    pub(crate) secret: bool,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            kind: Kind::Scalar(Scalar::Null),
            origins: Vec::new(),
            secret: false,
        }
    }
}

impl Node {
    /// Build a scalar leaf with a single origin.
    #[must_use]
    pub fn scalar(value: Scalar, origin: Origin) -> Self {
        Self {
            kind: Kind::Scalar(value),
            origins: vec![origin],
            secret: false,
        }
    }

    /// Build a map node with a single origin.
    #[must_use]
    pub fn map(children: BTreeMap<String, Self>, origin: Origin) -> Self {
        Self {
            kind: Kind::Map(children),
            origins: vec![origin],
            secret: false,
        }
    }

    /// Build an array node with a single origin.
    #[must_use]
    pub fn array(children: Vec<Self>, origin: Origin) -> Self {
        Self {
            kind: Kind::Array(children),
            origins: vec![origin],
            secret: false,
        }
    }

    /// The shape of this node.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Origins recorded for this node, in accumulation order.
    #[must_use]
    pub fn origins(&self) -> &[Origin] {
        &self.origins
    }

    /// Mark this subtree as secret so [`Self::to_redacted`] replaces its
    /// leaves.
    pub fn mark_secret(&mut self) {
        self.secret = true;
    }

    /// Mark every scalar leaf of this subtree as secret. Interior nodes stay
    /// unmarked so merging with non-secret records does not taint their
    /// siblings.
    pub(crate) fn mark_secret_leaves(&mut self) {
        match &mut self.kind {
            Kind::Scalar(_) => self.secret = true,
            Kind::Map(entries) => {
                for child in entries.values_mut() {
                    child.mark_secret_leaves();
                }
            }
            Kind::Array(items) => {
                for child in items.iter_mut() {
                    child.mark_secret_leaves();
                }
            }
        }
    }

    /// A node is empty iff it is a zero-value scalar with no children and no
    /// origins. Decoded `null` values carry an origin and are not empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::Scalar(Scalar::Null)) && self.origins.is_empty()
    }

    /// Construct a tree from raw decoded data without loss of numeric
    /// precision. Every node is annotated with `origin`.
    #[must_use]
    pub fn from_raw(raw: &RawValue, origin: &Origin) -> Self {
        let kind = match raw {
            RawValue::Null => Kind::Scalar(Scalar::Null),
            RawValue::Bool(b) => Kind::Scalar(Scalar::Bool(*b)),
            RawValue::Number(n) => Kind::Scalar(Scalar::Number(Number::from_text(n.to_string()))),
            RawValue::String(s) => Kind::Scalar(Scalar::String(s.clone())),
            RawValue::Array(items) => {
                Kind::Array(items.iter().map(|v| Self::from_raw(v, origin)).collect())
            }
            RawValue::Object(entries) => Kind::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_raw(v, origin)))
                    .collect(),
            ),
        };

        Self {
            kind,
            origins: vec![origin.clone()],
            secret: false,
        }
    }

    /// Produce the untyped projection handed to the struct-decoding layer.
    /// Origins and secret markers are stripped.
    #[must_use]
    pub fn to_raw(&self) -> RawValue {
        match &self.kind {
            Kind::Scalar(Scalar::Null) => RawValue::Null,
            Kind::Scalar(Scalar::Bool(b)) => RawValue::Bool(*b),
            Kind::Scalar(Scalar::Number(n)) => n.to_raw(),
            Kind::Scalar(Scalar::String(s)) => RawValue::String(s.clone()),
            Kind::Array(items) => RawValue::Array(items.iter().map(Self::to_raw).collect()),
            Kind::Map(entries) => RawValue::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_raw()))
                    .collect(),
            ),
        }
    }

    /// Navigate map and array levels by splitting `key` on `delimiter`.
    ///
    /// Map levels are addressed by key, array levels by numeric index. An
    /// empty `key` returns the node itself.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::NotFound`] when a segment is absent and
    /// [`StrataError::TypeMismatch`] when a segment addresses a node of the
    /// wrong shape.
    pub fn fetch(&self, key: &str, delimiter: &str) -> StrataResult<&Self> {
        if key.is_empty() {
            return Ok(self);
        }

        let mut current = self;
        let mut walked: Vec<&str> = Vec::new();
        for part in key.split(delimiter) {
            walked.push(part);
            let at = walked.join(delimiter);
            current = match &current.kind {
                Kind::Map(entries) => entries
                    .get(part)
                    .ok_or_else(|| StrataError::not_found(&at))?,
                Kind::Array(items) => {
                    let idx: usize = part.parse().map_err(|_| {
                        StrataError::type_mismatch(&at, "array indices must be numeric")
                    })?;
                    items.get(idx).ok_or_else(|| StrataError::not_found(&at))?
                }
                Kind::Scalar(_) => {
                    return Err(StrataError::type_mismatch(
                        &at,
                        "cannot descend into a scalar",
                    ));
                }
            };
        }

        Ok(current)
    }

    /// Produce a copy with secret leaves replaced by [`REDACTED`] without
    /// mutating the source.
    #[must_use]
    pub fn to_redacted(&self) -> Self {
        self.redact_into(false)
    }

    fn redact_into(&self, force: bool) -> Self {
        let secret = force || self.secret;
        let kind = match &self.kind {
            Kind::Scalar(s) => {
                if secret && !matches!(s, Scalar::Null) {
                    Kind::Scalar(Scalar::String(REDACTED.to_owned()))
                } else {
                    Kind::Scalar(s.clone())
                }
            }
            Kind::Map(entries) => Kind::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.redact_into(secret)))
                    .collect(),
            ),
            Kind::Array(items) => Kind::Array(items.iter().map(|v| v.redact_into(secret)).collect()),
        };

        Self {
            kind,
            origins: self.origins.clone(),
            secret: self.secret,
        }
    }
}

#[cfg(test)]
mod tests;
