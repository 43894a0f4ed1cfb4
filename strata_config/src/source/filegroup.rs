//! File groups: a filesystem plus path patterns to enumerate into records.

use std::io;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use super::fsys::Filesystem;
use super::{Record, RecordKind};
use crate::codec::{DecodeContext, DecoderRegistry};
use crate::error::{StrataError, StrataResult};

/// A declared combination of a filesystem and path patterns to enumerate
/// into records.
///
/// Paths may be exact files, directories or glob patterns. Entries whose
/// extension has no registered decoder are skipped silently unless the group
/// requires an exact file.
#[derive(Clone)]
pub struct FileGroup {
    fs: Arc<dyn Filesystem>,
    paths: Vec<Utf8PathBuf>,
    recurse: bool,
    exact_file: bool,
    halt: bool,
    format_override: Option<String>,
}

impl std::fmt::Debug for FileGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileGroup")
            .field("paths", &self.paths)
            .field("recurse", &self.recurse)
            .field("exact_file", &self.exact_file)
            .field("halt", &self.halt)
            .field("format_override", &self.format_override)
            .finish_non_exhaustive()
    }
}

impl FileGroup {
    /// Create a group over `fs`. With no paths added, the group examines the
    /// filesystem root.
    #[must_use]
    pub fn new(fs: Arc<dyn Filesystem>) -> Self {
        Self {
            fs,
            paths: Vec::new(),
            recurse: false,
            exact_file: false,
            halt: false,
            format_override: None,
        }
    }

    /// Create a group for one exact file that must exist.
    #[must_use]
    pub fn exact(fs: Arc<dyn Filesystem>, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            fs,
            paths: vec![path.into()],
            recurse: false,
            exact_file: true,
            halt: false,
            format_override: None,
        }
    }

    /// Append a path (exact file, directory or glob pattern).
    #[must_use]
    pub fn path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.paths.push(path.into());
        self
    }

    /// Examine directories recursively.
    #[must_use]
    pub fn recurse(mut self) -> Self {
        self.recurse = true;
        self
    }

    /// Stop processing subsequent groups once this group yields at least one
    /// record, enabling first-match-wins precedence between locations.
    #[must_use]
    pub fn halt_on_records(mut self) -> Self {
        self.halt = true;
        self
    }

    /// Decode every matched entry with the codec for `extension` instead of
    /// each entry's own extension.
    #[must_use]
    pub fn format(mut self, extension: impl Into<String>) -> Self {
        self.format_override = Some(extension.into());
        self
    }

    pub(crate) fn halts(&self) -> bool {
        self.halt
    }

    /// Enumerate and decode every matched entry into records.
    pub(crate) fn to_records(
        &self,
        delimiter: &str,
        decoders: &DecoderRegistry,
    ) -> StrataResult<Vec<Record>> {
        let files = self.enumerate()?;
        let mut records = Vec::with_capacity(files.len());
        for file in files {
            if let Some(record) = self.to_record(&file, delimiter, decoders)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn enumerate(&self) -> StrataResult<Vec<Utf8PathBuf>> {
        let paths = if self.paths.is_empty() {
            vec![Utf8PathBuf::from(".")]
        } else {
            self.paths.clone()
        };

        let mut files = Vec::new();
        for path in paths {
            if !self.exact_file && is_glob(&path) {
                self.enumerate_glob(&path, &mut files)?;
            } else {
                self.enumerate_path(&path, &mut files)?;
            }
        }
        files.sort();
        Ok(files)
    }

    fn enumerate_glob(&self, pattern: &Utf8Path, out: &mut Vec<Utf8PathBuf>) -> StrataResult<()> {
        let matcher = globset::GlobBuilder::new(pattern.as_str())
            .literal_separator(true)
            .build()
            .map_err(|e| StrataError::invalid_input(format!("glob '{pattern}': {e}")))?
            .compile_matcher();

        let base = glob_base(pattern);
        let candidates = match self.fs.enumerate(&base, true) {
            Ok(candidates) => candidates,
            Err(e) if recoverable(&e) => return Ok(()),
            Err(e) => return Err(StrataError::file(base, e)),
        };

        out.extend(candidates.into_iter().filter(|c| matcher.is_match(c)));
        Ok(())
    }

    fn enumerate_path(&self, path: &Utf8Path, out: &mut Vec<Utf8PathBuf>) -> StrataResult<()> {
        match self.fs.is_dir(path) {
            Ok(true) => {
                if self.exact_file {
                    return Err(StrataError::invalid_input(format!(
                        "'{path}' is a directory, not a file"
                    )));
                }
                match self.fs.enumerate(path, self.recurse) {
                    Ok(found) => out.extend(found),
                    Err(e) if recoverable(&e) => {}
                    Err(e) => return Err(StrataError::file(path.to_string(), e)),
                }
            }
            Ok(false) => out.push(path.to_owned()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if self.exact_file {
                    return Err(Arc::new(StrataError::FileMissing {
                        path: path.to_string(),
                    }));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {}
            Err(e) => return Err(StrataError::file(path.to_string(), e)),
        }
        Ok(())
    }

    fn to_record(
        &self,
        file: &Utf8Path,
        delimiter: &str,
        decoders: &DecoderRegistry,
    ) -> StrataResult<Option<Record>> {
        let basename = file.file_name().unwrap_or(file.as_str()).to_owned();
        let extension = self
            .format_override
            .clone()
            .unwrap_or_else(|| file.extension().unwrap_or("").to_owned());

        let decoder = match decoders.find(&extension) {
            Ok(decoder) => decoder,
            Err(e) => {
                if self.exact_file {
                    // No failures allowed for a required exact file.
                    return Err(e);
                }
                debug!(file = %file, extension = %extension, "no decoder, skipping entry");
                return Ok(None);
            }
        };

        let data = match self.fs.read(file) {
            Ok(data) => data,
            // The file vanished between enumerate and open, or cannot be
            // read; both yield zero records.
            Err(e) if recoverable(&e) => return Ok(None),
            Err(e) => return Err(StrataError::file(file.to_string(), e)),
        };

        let ctx = DecodeContext {
            filename: basename.clone(),
            delimiter: delimiter.to_owned(),
        };
        let tree = decoder
            .decode(&ctx, &data)
            .map_err(|e| StrataError::decoding(&basename, &extension, e))?;

        debug!(record = %basename, "decoded configuration record");
        Ok(Some(Record {
            name: basename,
            kind: RecordKind::Tree(tree),
            secret: false,
        }))
    }
}

/// Convert an ordered list of file groups into records, honouring each
/// group's halt flag.
pub(crate) fn filegroups_to_records(
    groups: &[FileGroup],
    delimiter: &str,
    decoders: &DecoderRegistry,
) -> StrataResult<Vec<Record>> {
    let mut records = Vec::new();
    for group in groups {
        let found = group.to_records(delimiter, decoders)?;
        let stop = group.halts() && !found.is_empty();
        records.extend(found);
        if stop {
            debug!("halt requested and records found, skipping remaining groups");
            break;
        }
    }
    Ok(records)
}

fn is_glob(path: &Utf8Path) -> bool {
    path.as_str().contains(['*', '?', '[', '{'])
}

/// The non-glob directory prefix of a pattern.
fn glob_base(pattern: &Utf8Path) -> Utf8PathBuf {
    let mut base = Utf8PathBuf::new();
    for component in pattern.components() {
        let text = component.as_str();
        if text.contains(['*', '?', '[', '{']) {
            break;
        }
        base.push(text);
    }
    if base.as_str().is_empty() {
        Utf8PathBuf::from(".")
    } else {
        base
    }
}

fn recoverable(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    )
}
