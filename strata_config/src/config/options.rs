//! Per-category option variants and their dispatch into settings.
//!
//! Each public operation accepts a closed set of options for its category;
//! a single dispatch function per category folds them into the effective
//! settings, later options overriding earlier ones.

use crate::render::Renderer;

/// Options for buffer and value sources.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SourceOption {
    /// Apply this record before all sorted value records, in declaration
    /// order.
    AsDefault,
    /// Mark the record's leaves as secret so marshalling can redact them.
    AsSecret,
}

/// Options adjusting a variable-expansion directive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExpandOption {
    /// Origin label recorded on values this directive expands.
    WithOrigin(String),
    /// Start and end delimiters; empty strings fall back to `${` and `}`.
    WithDelimiters(String, String),
    /// Maximum number of passes before expansion is declared divergent.
    /// Zero falls back to the default budget.
    WithMaximum(usize),
}

/// Options for typed extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum UnmarshalOption {
    /// A missing key yields the type's default value instead of an error.
    Optional,
    /// A missing key is an error (the default behaviour).
    Required,
}

pub(crate) fn is_optional(opts: &[UnmarshalOption]) -> bool {
    opts.iter().fold(false, |_, opt| match opt {
        UnmarshalOption::Optional => true,
        UnmarshalOption::Required => false,
    })
}

/// Layout options for the built-in YAML-like renderer. Zero fields use the
/// conventional defaults (wrap at 80, comments at column 80, two-space
/// indents).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YamlRenderOptions {
    /// Maximum line length before values wrap.
    pub max_line_length: usize,
    /// Column at which trailing comments start.
    pub trailing_comment_column: usize,
    /// Spaces per indentation level.
    pub spaces_per_indent: usize,
}

impl YamlRenderOptions {
    fn to_renderer(self) -> Renderer {
        Renderer {
            max_line_length: if self.max_line_length == 0 {
                80
            } else {
                self.max_line_length
            },
            trailing_comment_column: if self.trailing_comment_column == 0 {
                80
            } else {
                self.trailing_comment_column
            },
            spaces_per_indent: if self.spaces_per_indent == 0 {
                2
            } else {
                self.spaces_per_indent
            },
        }
    }
}

/// Options for rendering the compiled tree.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum MarshalOption {
    /// Replace secret leaves with a fixed marker.
    RedactSecrets(bool),
    /// Include origin annotations in the output.
    IncludeOrigins(bool),
    /// Render documentation comments with the built-in renderer.
    IncludeDocumentation(bool),
    /// Render the defaults-only tree instead of the fully compiled one.
    OnlyDefaults(bool),
    /// Select the encoder by extension instead of the first registered one.
    FormatAs(String),
    /// Configure the built-in renderer used by the documentation path.
    YamlRender(YamlRenderOptions),
}

#[derive(Debug, Clone)]
pub(crate) struct MarshalSettings {
    pub redact: bool,
    pub with_origins: bool,
    pub with_docs: bool,
    pub only_defaults: bool,
    pub format: Option<String>,
    pub renderer: Renderer,
}

impl MarshalSettings {
    pub(crate) fn from_options(opts: &[MarshalOption], default_format: Option<String>) -> Self {
        let mut settings = Self {
            redact: false,
            with_origins: false,
            with_docs: false,
            only_defaults: false,
            format: default_format,
            renderer: Renderer::default(),
        };

        for opt in opts {
            match opt {
                MarshalOption::RedactSecrets(on) => settings.redact = *on,
                MarshalOption::IncludeOrigins(on) => settings.with_origins = *on,
                MarshalOption::IncludeDocumentation(on) => settings.with_docs = *on,
                MarshalOption::OnlyDefaults(on) => settings.only_defaults = *on,
                MarshalOption::FormatAs(ext) => settings.format = Some(ext.clone()),
                MarshalOption::YamlRender(layout) => settings.renderer = layout.to_renderer(),
            }
        }
        settings
    }
}
