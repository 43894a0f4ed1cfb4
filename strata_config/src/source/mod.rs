//! Configuration sources and the records they produce.
//!
//! Each source contributes zero or more named records. File groups decode
//! matched files, buffers carry bytes decoded by the extension of their
//! record name, and values carry data serialized from Rust structures.

mod filegroup;
pub(crate) mod fsys;

pub use filegroup::FileGroup;
pub(crate) use filegroup::filegroups_to_records;
pub use fsys::{DirFs, Filesystem, MemFs};

use std::sync::Arc;

use camino::Utf8PathBuf;

use crate::codec::CodecError;
use crate::config::PartialConfig;
use crate::error::{StrataError, StrataResult};
use crate::tree::Node;

/// Deferred buffer producer: receives the record name and a view of the
/// configuration merged so far.
pub(crate) type BufferProducer =
    Box<dyn Fn(&str, &PartialConfig<'_>) -> Result<Vec<u8>, CodecError> + Send + Sync>;

/// A named configuration fragment contributed by one source.
pub(crate) struct Record {
    pub name: String,
    pub kind: RecordKind,
    pub secret: bool,
}

pub(crate) enum RecordKind {
    /// Already decoded (file group entries).
    Tree(Node),
    /// Raw bytes decoded at compile time by the record name's extension.
    Buffer(Vec<u8>),
    /// Bytes produced at compile time with access to the partial
    /// configuration, then decoded like [`RecordKind::Buffer`].
    BufferFn(BufferProducer),
    /// A raw value placed at a key path.
    Value {
        key: String,
        raw: serde_json::Value,
    },
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            RecordKind::Tree(_) => "tree",
            RecordKind::Buffer(_) => "buffer",
            RecordKind::BufferFn(_) => "buffer-fn",
            RecordKind::Value { .. } => "value",
        };
        f.debug_struct("Record")
            .field("name", &self.name)
            .field("kind", &kind)
            .field("secret", &self.secret)
            .finish()
    }
}

/// Build the conventional search chain for an application's configuration:
/// the working directory, then the user's configuration directory, then the
/// system-wide `/etc/<app_name>` directory.
///
/// Each group halts the chain once it yields a record, giving the usual
/// local-overrides-user-overrides-system precedence.
///
/// # Errors
///
/// Returns [`StrataError::InvalidInput`] when `app_name` is empty or
/// contains a path separator.
pub fn standard_locations(app_name: &str) -> StrataResult<Vec<FileGroup>> {
    if app_name.is_empty() || app_name.contains(['/', '\\']) {
        return Err(StrataError::invalid_input(
            "application name must be non-empty and free of path separators",
        ));
    }

    let mut groups = vec![FileGroup::new(Arc::new(DirFs::new("."))).halt_on_records()];

    if let Some(config_dir) = dirs::config_dir() {
        if let Ok(dir) = Utf8PathBuf::from_path_buf(config_dir) {
            groups.push(
                FileGroup::new(Arc::new(DirFs::new(dir.join(app_name)))).halt_on_records(),
            );
        }
    }

    groups.push(
        FileGroup::new(Arc::new(DirFs::new(Utf8PathBuf::from(format!(
            "/etc/{app_name}"
        )))))
        .halt_on_records(),
    );

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::standard_locations;
    use crate::error::StrataError;

    #[test]
    fn standard_locations_rejects_path_separators() {
        let err = standard_locations("foo/bar")
            .err()
            .unwrap_or_else(|| panic!("expected invalid input"));
        assert!(matches!(&*err, StrataError::InvalidInput { .. }));
    }

    #[test]
    fn standard_locations_chains_at_least_two_groups() {
        let groups = standard_locations("example")
            .unwrap_or_else(|e| panic!("build failed: {e}"));
        assert!(groups.len() >= 2);
        assert!(groups.iter().all(super::FileGroup::halts));
    }
}
