//! Builder assembling a [`Config`](super::Config) from sources, codecs and
//! pipeline options.
//!
//! Malformed arguments are recorded as they are supplied and reported by
//! [`ConfigBuilder::build`], so construction chains stay fluent.

use std::sync::Arc;

use camino::Utf8PathBuf;
use serde::Serialize;

use super::{Config, Inner, Settings};
use crate::codec::{CodecError, Decoder, DecoderRegistry, Encoder, EncoderRegistry, JsonCodec};
use crate::docs::{DocNode, DocType, merge_docs};
use crate::error::{StrataError, StrataResult};
use crate::expand::{DEFAULT_MAXIMUM, Directive, EnvExpander, Expander};
use crate::source::{FileGroup, Filesystem, Record, RecordKind};
use crate::sort::RecordSort;
use super::{ExpandOption, PartialConfig, SourceOption};

/// Builds a [`Config`]. Obtained from [`Config::builder`].
pub struct ConfigBuilder {
    settings: Settings,
    errors: Vec<Arc<StrataError>>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create an empty builder with a `.` key delimiter and natural record
    /// ordering.
    #[must_use]
    pub fn new() -> Self {
        Self {
            settings: Settings {
                delimiter: ".".to_owned(),
                sort: RecordSort::default(),
                decoders: DecoderRegistry::new(),
                encoders: EncoderRegistry::new(),
                filegroups: Vec::new(),
                defaults: Vec::new(),
                values: Vec::new(),
                expansions: Vec::new(),
                docs: None,
            },
            errors: Vec::new(),
        }
    }

    /// Set the delimiter used to split key paths.
    #[must_use]
    pub fn key_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            self.errors
                .push(StrataError::invalid_input("a non-empty delimiter must be specified"));
            return self;
        }
        self.settings.delimiter = delimiter;
        self
    }

    /// Set the ordering applied to value records before merging.
    #[must_use]
    pub fn sort_records(mut self, sort: RecordSort) -> Self {
        self.settings.sort = sort;
        self
    }

    /// Register a decoder for the extensions it declares.
    #[must_use]
    pub fn with_decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        if let Err(e) = self.settings.decoders.register(decoder) {
            self.errors.push(e);
        }
        self
    }

    /// Register an encoder for the extensions it declares.
    #[must_use]
    pub fn with_encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        if let Err(e) = self.settings.encoders.register(encoder) {
            self.errors.push(e);
        }
        self
    }

    /// Register the built-in codecs: JSON (decode and encode) and, when the
    /// `toml` feature is enabled, TOML (decode).
    #[must_use]
    pub fn with_default_codecs(self) -> Self {
        let builder = self
            .with_decoder(Arc::new(JsonCodec::new()))
            .with_encoder(Arc::new(JsonCodec::new()));
        #[cfg(feature = "toml")]
        let builder = builder.with_decoder(Arc::new(crate::codec::TomlDecoder::new()));
        builder
    }

    /// Add a group of files to examine for configuration.
    #[must_use]
    pub fn add_file_group(mut self, group: FileGroup) -> Self {
        self.settings.filegroups.push(group);
        self
    }

    /// Add an exact file that must exist and must decode.
    #[must_use]
    pub fn add_file(self, fs: Arc<dyn Filesystem>, path: impl Into<Utf8PathBuf>) -> Self {
        self.add_file_group(FileGroup::exact(fs, path))
    }

    /// Add a buffer of bytes decoded by the extension of `record_name`.
    /// The record name also establishes sort order relative to other
    /// records.
    #[must_use]
    pub fn add_buffer(
        self,
        record_name: impl Into<String>,
        data: impl Into<Vec<u8>>,
        opts: &[SourceOption],
    ) -> Self {
        let data = data.into();
        self.push_record(record_name.into(), RecordKind::Buffer(data), opts)
    }

    /// Add a deferred buffer: `producer` runs at compile time with the
    /// record name and a view of the configuration merged so far (already
    /// expanded), and must return bytes decodable by the extension of
    /// `record_name`.
    #[must_use]
    pub fn add_buffer_with<F>(
        self,
        record_name: impl Into<String>,
        producer: F,
        opts: &[SourceOption],
    ) -> Self
    where
        F: Fn(&str, &PartialConfig<'_>) -> Result<Vec<u8>, CodecError> + Send + Sync + 'static,
    {
        self.push_record(
            record_name.into(),
            RecordKind::BufferFn(Box::new(producer)),
            opts,
        )
    }

    /// Add a serializable value placed at `key` ([`crate::ROOT`] for the
    /// whole tree).
    #[must_use]
    pub fn add_value<T: Serialize>(
        mut self,
        record_name: impl Into<String>,
        key: impl Into<String>,
        value: &T,
        opts: &[SourceOption],
    ) -> Self {
        let record_name = record_name.into();
        match serde_json::to_value(value) {
            Ok(raw) => self.push_record(
                record_name,
                RecordKind::Value {
                    key: key.into(),
                    raw,
                },
                opts,
            ),
            Err(e) => {
                self.errors.push(StrataError::invalid_input(format!(
                    "value for record '{record_name}' cannot be serialized: {e}"
                )));
                self
            }
        }
    }

    fn push_record(mut self, name: String, kind: RecordKind, opts: &[SourceOption]) -> Self {
        if name.is_empty() {
            self.errors.push(StrataError::invalid_input(
                "a record name with length > 0 must be specified",
            ));
            return self;
        }

        let mut is_default = false;
        let mut secret = false;
        for opt in opts {
            match opt {
                SourceOption::AsDefault => is_default = true,
                SourceOption::AsSecret => secret = true,
            }
        }

        let record = Record { name, kind, secret };
        if is_default {
            self.settings.defaults.push(record);
        } else {
            self.settings.values.push(record);
        }
        self
    }

    /// Add a variable-expansion directive with the given provider.
    /// Directives are evaluated in the order they are added.
    #[must_use]
    pub fn expand(mut self, provider: impl Expander + 'static, opts: &[ExpandOption]) -> Self {
        let mut directive = Directive {
            origin: String::new(),
            start: "${".to_owned(),
            end: "}".to_owned(),
            maximum: DEFAULT_MAXIMUM,
            provider: Arc::new(provider),
        };

        for opt in opts {
            match opt {
                ExpandOption::WithOrigin(origin) => directive.origin = origin.clone(),
                ExpandOption::WithDelimiters(start, end) => {
                    if !start.is_empty() {
                        directive.start = start.clone();
                    }
                    if !end.is_empty() {
                        directive.end = end.clone();
                    }
                }
                ExpandOption::WithMaximum(max) => {
                    directive.maximum = if *max == 0 { DEFAULT_MAXIMUM } else { *max };
                }
            }
        }

        self.settings.expansions.push(directive);
        self
    }

    /// Add environment-variable expansion with the origin label
    /// `environment`.
    #[must_use]
    pub fn expand_env(self, opts: &[ExpandOption]) -> Self {
        let mut full = vec![ExpandOption::WithOrigin("environment".to_owned())];
        full.extend_from_slice(opts);
        self.expand(EnvExpander, &full)
    }

    /// Add a documentation tree; multiple trees merge by union.
    #[must_use]
    pub fn add_docs(mut self, docs: DocNode) -> Self {
        self.settings.docs = Some(match self.settings.docs.take() {
            Some(existing) => merge_docs(existing, docs),
            None => docs,
        });
        self
    }

    /// Add a documentation tree from its JSON form. The root object must be
    /// typed `<root>`.
    #[must_use]
    pub fn add_docs_json(mut self, data: &[u8]) -> Self {
        match serde_json::from_slice::<DocNode>(data) {
            Ok(docs) if docs.type_tag == DocType::Root => self.add_docs(docs),
            Ok(_) => {
                self.errors.push(StrataError::invalid_input(
                    "documentation root must be typed <root>",
                ));
                self
            }
            Err(e) => {
                self.errors.push(StrataError::invalid_input(format!(
                    "documentation is not valid JSON: {e}"
                )));
                self
            }
        }
    }

    /// Validate the accumulated options and produce the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while the builder was assembled.
    pub fn build(self) -> StrataResult<Config> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }

        Ok(Config {
            inner: std::sync::Mutex::new(Inner {
                settings: self.settings,
                tree: crate::tree::Node::default(),
                compiled_at: None,
                records: Vec::new(),
            }),
        })
    }
}
