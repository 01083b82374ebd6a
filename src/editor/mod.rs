//! Text editor
//!
//! Bounded viewing and exact-match replacement over single files inside the
//! project root. Every operation resolves its path through [`Sandbox`]
//! before touching the file, and refuses binary content.

pub mod replace;
pub mod view;

pub use replace::{replace_in_file, EditKind, EditReport};
pub use view::{view_file, FileView, ViewRange};

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::fs::is_probably_binary;
use crate::security_audit::log_sandbox_violation;

/// Resolves caller-supplied paths against a fixed project root
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
    binary_probe_bytes: usize,
}

impl Sandbox {
    /// Create a sandbox rooted at the canonical form of `root`
    pub fn new(root: &Path) -> Result<Self> {
        Ok(Self {
            root: root.canonicalize()?,
            binary_probe_bytes: crate::fs::BINARY_PROBE_BYTES,
        })
    }

    pub fn with_binary_probe(mut self, bytes: usize) -> Self {
        self.binary_probe_bytes = bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `file_path` to an existing regular file inside the root
    ///
    /// Relative paths are joined onto the root. The result is canonicalized,
    /// so symlinks and `..` cannot be used to leave the root.
    pub fn resolve(&self, file_path: &str) -> Result<PathBuf> {
        if file_path.trim().is_empty() {
            return Err(Error::invalid_argument(
                "file_path",
                "must be a non-empty string.",
            ));
        }

        let requested = Path::new(file_path);
        let joined = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.root.join(requested)
        };
        let resolved = joined
            .canonicalize()
            .unwrap_or_else(|_| normalize_lexically(&joined));

        if !resolved.starts_with(&self.root) {
            log_sandbox_violation(file_path);
            return Err(Error::PathOutsideRoot {
                path: resolved,
                root: self.root.clone(),
            });
        }
        if !resolved.exists() {
            return Err(Error::FileNotFound { path: resolved });
        }
        if !resolved.is_file() {
            return Err(Error::NotAFile { path: resolved });
        }
        Ok(resolved)
    }

    /// Reject files that look binary; `action` names the operation in the error
    pub(crate) fn ensure_text(&self, path: &Path, action: &'static str) -> Result<()> {
        if is_probably_binary(path, self.binary_probe_bytes) {
            return Err(Error::BinaryFile {
                path: path.to_path_buf(),
                action,
            });
        }
        Ok(())
    }
}

/// Read a resolved file as UTF-8 text
pub(crate) fn load_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|_| Error::Decode {
        path: path.to_path_buf(),
    })
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Replace `path` with `content` through a temporary file in the same directory
///
/// The original is untouched unless the rename succeeds.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Characters `[start, end)` of `text`
pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let byte_at = |idx: usize| {
        text.char_indices()
            .nth(idx)
            .map_or(text.len(), |(byte, _)| byte)
    };
    let start = byte_at(start);
    let end = byte_at(end).max(start);
    &text[start..end]
}
