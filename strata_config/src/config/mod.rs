//! The top-level configuration aggregate.
//!
//! A [`Config`] owns its sources, codec registries and the compiled tree.
//! Every public operation that touches the compiled tree serializes behind
//! one mutex, acquired for the duration of the call and released on every
//! exit path. Compile failures never partially apply: the previously
//! compiled tree stays in place until a compile succeeds.

mod builder;
mod options;

pub use builder::ConfigBuilder;
pub use options::{ExpandOption, MarshalOption, SourceOption, UnmarshalOption, YamlRenderOptions};

use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::codec::{DecodeContext, DecoderRegistry, EncoderRegistry};
use crate::docs::{DocNode, DocType};
use crate::error::{StrataError, StrataResult};
use crate::expand::{Directive, expand_tree};
use crate::source::{FileGroup, Record, RecordKind, filegroups_to_records};
use crate::sort::RecordSort;
use crate::tree::merge::merge;
use crate::tree::{Node, Origin};
use crate::unified::calc_unified;
use options::{MarshalSettings, is_optional};

/// Accumulated, immutable-once-built inputs of a configuration.
pub(crate) struct Settings {
    pub delimiter: String,
    pub sort: RecordSort,
    pub decoders: DecoderRegistry,
    pub encoders: EncoderRegistry,
    pub filegroups: Vec<FileGroup>,
    pub defaults: Vec<Record>,
    pub values: Vec<Record>,
    pub expansions: Vec<Directive>,
    pub docs: Option<DocNode>,
}

pub(crate) struct Inner {
    pub settings: Settings,
    pub tree: Node,
    pub compiled_at: Option<SystemTime>,
    pub records: Vec<String>,
}

/// A compiled, queryable configuration.
pub struct Config {
    pub(crate) inner: Mutex<Inner>,
}

/// Read-only view of the configuration merged so far, handed to deferred
/// buffer producers during compilation.
pub struct PartialConfig<'a> {
    tree: &'a Node,
    delimiter: &'a str,
}

impl PartialConfig<'_> {
    /// Extract a typed value from the partially merged configuration.
    ///
    /// # Errors
    ///
    /// Same contract as [`Config::unmarshal`].
    pub fn unmarshal<T>(&self, key: &str, opts: &[UnmarshalOption]) -> StrataResult<T>
    where
        T: DeserializeOwned + Default,
    {
        extract(self.tree, key, self.delimiter, is_optional(opts))
    }
}

impl Config {
    /// Start building a configuration.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Collect, sort, merge and expand all sources into the compiled tree.
    ///
    /// # Errors
    ///
    /// Any collection, decoding, merge or expansion failure aborts the call
    /// and leaves a previously compiled tree untouched.
    pub fn compile(&self) -> StrataResult<()> {
        let mut inner = self.lock();
        let outcome = compile_settings(&inner.settings, false)?;
        inner.tree = outcome.tree;
        inner.records = outcome.records;
        inner.compiled_at = Some(SystemTime::now());
        debug!(records = ?inner.records, "configuration compiled");
        Ok(())
    }

    /// Record names that contributed to the last compile, in merge order.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::NotCompiled`] before the first successful
    /// compile.
    pub fn records(&self) -> StrataResult<Vec<String>> {
        let inner = self.lock();
        if inner.compiled_at.is_none() {
            return Err(StrataError::NotCompiled.into());
        }
        Ok(inner.records.clone())
    }

    /// Extract the subtree at `key` into a typed value. Use [`crate::ROOT`]
    /// for the whole tree.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::NotCompiled`] before the first compile,
    /// [`StrataError::NotFound`] / [`StrataError::TypeMismatch`] for bad
    /// keys (unless marked optional) and [`StrataError::Deserialize`] when
    /// the struct-decoding layer rejects the projection.
    pub fn unmarshal<T>(&self, key: &str, opts: &[UnmarshalOption]) -> StrataResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let inner = self.lock();
        if inner.compiled_at.is_none() {
            return Err(StrataError::NotCompiled.into());
        }
        extract(&inner.tree, key, &inner.settings.delimiter, is_optional(opts))
    }

    /// Render the compiled tree.
    ///
    /// With [`MarshalOption::IncludeDocumentation`] the built-in annotated
    /// renderer combines the documentation tree with the compiled values;
    /// otherwise the encoder registered for the selected format produces
    /// the output.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::NotCompiled`] before the first compile,
    /// [`StrataError::CodecNotFound`] when no encoder fits, and
    /// [`StrataError::Encoding`] when the encoder rejects the tree.
    pub fn marshal(&self, opts: &[MarshalOption]) -> StrataResult<Vec<u8>> {
        let inner = self.lock();
        if inner.compiled_at.is_none() {
            return Err(StrataError::NotCompiled.into());
        }

        let settings = MarshalSettings::from_options(
            opts,
            inner.settings.encoders.extensions().into_iter().next(),
        );

        let mut tree = if settings.only_defaults {
            compile_settings(&inner.settings, true)?.tree
        } else {
            inner.tree.clone()
        };
        if settings.redact {
            tree = tree.to_redacted();
        }
        if tree.is_empty() {
            // Encoders may render an explicit null for an empty tree;
            // produce nothing instead.
            return Ok(Vec::new());
        }

        if settings.with_docs {
            return marshal_documented(&inner.settings, &tree, &settings);
        }

        let Some(format) = settings.format else {
            return Err(StrataError::CodecNotFound {
                extension: String::new(),
            }
            .into());
        };
        let encoder = inner.settings.encoders.find(&format)?;
        let result = if settings.with_origins {
            encoder.encode_extended(&tree)
        } else {
            encoder.encode(&tree.to_raw())
        };
        result.map_err(|e| StrataError::encoding(&format, e.to_string()))
    }
}

fn marshal_documented(
    settings: &Settings,
    tree: &Node,
    marshal: &MarshalSettings,
) -> StrataResult<Vec<u8>> {
    let docs = settings.docs.clone().unwrap_or_else(|| DocNode {
        type_tag: DocType::Root,
        ..DocNode::default()
    });

    // Presets come from a defaults-only compile so the header can show what
    // a value would have been without any value records.
    let presets = if !marshal.only_defaults && !settings.defaults.is_empty() {
        Some(compile_settings(settings, true)?.tree)
    } else {
        None
    };

    let unified = calc_unified(Some(&docs), Some(tree), presets.as_ref(), marshal.with_origins)?;
    Ok(marshal.renderer.encode(&unified).into_bytes())
}

struct CompileOutcome {
    tree: Node,
    records: Vec<String>,
}

fn compile_settings(settings: &Settings, only_defaults: bool) -> StrataResult<CompileOutcome> {
    let mut merged = Node::default();
    let mut records = Vec::new();

    // Default records apply strictly in declaration order.
    for record in &settings.defaults {
        let tree = eval_record(record, &merged, settings)?;
        merged = merge(merged, tree)?;
    }

    if !only_defaults {
        let collected =
            filegroups_to_records(&settings.filegroups, &settings.delimiter, &settings.decoders)?;
        let mut pending: Vec<&Record> = collected.iter().chain(settings.values.iter()).collect();
        // The sort is stable: records with equal names keep the relative
        // order of their sources.
        pending.sort_by(|a, b| settings.sort.compare(&a.name, &b.name));

        for record in pending {
            let tree = eval_record(record, &merged, settings)?;
            records.push(record.name.clone());
            merged = merge(merged, tree)?;
        }
    }

    expand_tree(&mut merged, &settings.expansions)?;

    Ok(CompileOutcome {
        tree: merged,
        records,
    })
}

fn eval_record(record: &Record, partial: &Node, settings: &Settings) -> StrataResult<Node> {
    let mut tree = match &record.kind {
        RecordKind::Tree(tree) => tree.clone(),
        RecordKind::Buffer(data) => decode_named(&record.name, data, settings)?,
        RecordKind::BufferFn(producer) => {
            let mut view = partial.clone();
            expand_tree(&mut view, &settings.expansions)?;
            let partial_config = PartialConfig {
                tree: &view,
                delimiter: &settings.delimiter,
            };
            let data = producer(&record.name, &partial_config).map_err(|e| {
                StrataError::decoding(&record.name, extension_of(&record.name), e)
            })?;
            decode_named(&record.name, &data, settings)?
        }
        RecordKind::Value { key, raw } => {
            let origin = Origin::named(&record.name);
            let mut node = Node::from_raw(raw, &origin);
            if !key.is_empty() {
                for part in key.rsplit(settings.delimiter.as_str()) {
                    let children =
                        std::collections::BTreeMap::from([(part.to_owned(), node)]);
                    node = Node::map(children, origin.clone());
                }
            }
            node
        }
    };

    if record.secret {
        tree.mark_secret_leaves();
    }
    Ok(tree)
}

fn decode_named(name: &str, data: &[u8], settings: &Settings) -> StrataResult<Node> {
    let extension = extension_of(name);
    let decoder = settings.decoders.find(extension)?;
    let ctx = DecodeContext {
        filename: name.to_owned(),
        delimiter: settings.delimiter.clone(),
    };
    decoder
        .decode(&ctx, data)
        .map_err(|e| StrataError::decoding(name, extension, e))
}

fn extension_of(name: &str) -> &str {
    name.rsplit_once('.').map_or("", |(_, ext)| ext)
}

fn extract<T>(tree: &Node, key: &str, delimiter: &str, optional: bool) -> StrataResult<T>
where
    T: DeserializeOwned + Default,
{
    let node = if key.is_empty() {
        tree
    } else {
        match tree.fetch(key, delimiter) {
            Ok(node) => node,
            Err(e) if optional && matches!(&*e, StrataError::NotFound { .. }) => {
                return Ok(T::default());
            }
            Err(e) => return Err(e),
        }
    };

    serde_json::from_value(node.to_raw()).map_err(|e| {
        std::sync::Arc::new(StrataError::Deserialize {
            key: key.to_owned(),
            source: Box::new(e),
        })
    })
}

#[cfg(test)]
mod tests;
