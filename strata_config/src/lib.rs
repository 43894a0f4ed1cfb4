//! Core crate for the Strata configuration compiler.
//!
//! Configuration fragments are collected from files, buffers and
//! programmatically supplied values, decoded into a common tree, merged in
//! a deterministic order, optionally expanded, and exposed for typed
//! extraction or annotated re-serialization.
//!
//! ```rust
//! use serde::Deserialize;
//! use strata_config::{Config, SourceOption};
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct Server {
//!     host: String,
//!     port: u16,
//! }
//!
//! # fn main() -> strata_config::StrataResult<()> {
//! let cfg = Config::builder()
//!     .with_default_codecs()
//!     .add_buffer(
//!         "defaults.json",
//!         r#"{"server": {"host": "localhost", "port": 80}}"#,
//!         &[SourceOption::AsDefault],
//!     )
//!     .add_buffer("10-site.json", r#"{"server": {"port": 8443}}"#, &[])
//!     .build()?;
//! cfg.compile()?;
//!
//! let server: Server = cfg.unmarshal("server", &[])?;
//! assert_eq!(server.port, 8443);
//! assert_eq!(server.host, "localhost");
//! # Ok(())
//! # }
//! ```

pub mod codec;
mod config;
pub mod docs;
mod error;
mod expand;
mod render;
mod sort;
mod source;
mod tree;
mod unified;

pub use config::{
    Config, ConfigBuilder, ExpandOption, MarshalOption, PartialConfig, SourceOption,
    UnmarshalOption, YamlRenderOptions,
};
pub use error::{StrataError, StrataResult};
pub use expand::Expander;
pub use sort::{RecordSort, float_cmp, natural_cmp};
pub use source::{DirFs, FileGroup, Filesystem, MemFs, standard_locations};
pub use tree::{Kind, Node, Number, Origin, REDACTED, Scalar};

/// Key addressing the whole configuration tree in
/// [`Config::unmarshal`] and [`ConfigBuilder::add_value`].
pub const ROOT: &str = "";
