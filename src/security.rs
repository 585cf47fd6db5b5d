//! Path confinement for file reads.
//!
//! Every read goes through [`DataRoot`]: the caller's relative path is joined
//! onto the canonical root, the result is canonicalized, and only targets equal
//! to or below the root are touched.

use crate::errors::{AppError, AppResult};
use anyhow::Context;
use serde::Serialize;
use std::borrow::Cow;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

pub const SEED_FILE: &str = "hello.txt";
pub const SEED_CONTENTS: &str = "Hello from the hosted MCP server!\n";

/// The canonical directory all file reads are confined to.
#[derive(Debug, Clone)]
pub struct DataRoot {
    root: PathBuf,
}

/// A successful confined read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContents {
    /// Path relative to the root, `.` for the root itself.
    pub path: String,
    /// Length of `contents` in characters.
    pub size: usize,
    pub contents: String,
    /// Set when invalid UTF-8 was replaced with U+FFFD.
    #[serde(skip_serializing_if = "is_false")]
    pub lossy: bool,
}

fn is_false(b: &bool) -> bool { !*b }

impl DataRoot {
    /// Creates `dir` if needed, canonicalizes it and writes the seed file when
    /// absent. Safe to call concurrently from several processes.
    pub fn prepare(dir: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("creating data root {}", dir.display()))?;
        let root = dunce::canonicalize(dir).with_context(|| format!("canonicalizing data root {}", dir.display()))?;
        seed(&root).context("writing seed file")?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path { &self.root }

    /// Resolves `relative` and decides whether it stays inside the root.
    pub fn resolve(&self, relative: &str) -> AppResult<PathBuf> {
        let joined = join_under(&self.root, relative);
        let target = resolve_lenient(&joined).map_err(|e| {
            tracing::warn!(error = %e, "path did not resolve");
            AppError::FileUnreadable(e.to_string())
        })?;
        if target.starts_with(&self.root) {
            Ok(target)
        } else {
            Err(AppError::PathOutsideRoot)
        }
    }

    /// Reads a regular file below the root.
    pub fn read(&self, relative: &str) -> AppResult<FileContents> {
        let target = self.resolve(relative)?;
        let meta = fs::metadata(&target).map_err(|e| fs_error(e, relative))?;
        if !meta.is_file() {
            return Err(AppError::FileNotFound(relative.to_string()));
        }
        let bytes = fs::read(&target).map_err(|e| fs_error(e, relative))?;
        let (contents, lossy) = match String::from_utf8_lossy(&bytes) {
            Cow::Borrowed(s) => (s.to_string(), false),
            Cow::Owned(s) => (s, true),
        };
        Ok(FileContents {
            path: self.display_relative(&target),
            size: contents.chars().count(),
            contents,
            lossy,
        })
    }

    fn display_relative(&self, target: &Path) -> String {
        let rel = target.strip_prefix(&self.root).unwrap_or(Path::new(""));
        if rel.as_os_str().is_empty() {
            ".".to_string()
        } else {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        }
    }
}

fn seed(root: &Path) -> io::Result<()> {
    match fs::OpenOptions::new().write(true).create_new(true).open(root.join(SEED_FILE)) {
        Ok(mut file) => file.write_all(SEED_CONTENTS.as_bytes()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

/// Joins `relative` onto `root` without interpreting `..`. Root and prefix
/// components are dropped so absolute input cannot replace the root.
fn join_under(root: &Path, relative: &str) -> PathBuf {
    let mut joined = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {}
            other => joined.push(other.as_os_str()),
        }
    }
    joined
}

/// Maximum symlinks followed while resolving one request.
const MAX_SYMLINK_HOPS: usize = 40;

enum Step {
    Anchor(PathBuf),
    Parent,
    Name(OsString),
}

fn push_steps(stack: &mut Vec<Step>, path: &Path) {
    let mut anchor = PathBuf::new();
    let mut steps = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => anchor.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => steps.push(Step::Parent),
            Component::Normal(name) => steps.push(Step::Name(name.to_os_string())),
        }
    }
    stack.extend(steps.into_iter().rev());
    if !anchor.as_os_str().is_empty() {
        stack.push(Step::Anchor(anchor));
    }
}

/// Resolves `path` one component at a time, following every symlink even when
/// its target does not exist. Components that do not exist are kept as-is, so
/// a missing file still resolves to where it would live.
fn resolve_lenient(path: &Path) -> io::Result<PathBuf> {
    let mut stack = Vec::new();
    push_steps(&mut stack, path);
    let mut resolved = PathBuf::new();
    let mut hops = 0;
    while let Some(step) = stack.pop() {
        match step {
            Step::Anchor(anchor) => resolved = anchor,
            Step::Parent => { resolved.pop(); }
            Step::Name(name) => {
                let candidate = resolved.join(&name);
                let is_link = fs::symlink_metadata(&candidate).map(|m| m.file_type().is_symlink()).unwrap_or(false);
                if !is_link {
                    resolved = candidate;
                    continue;
                }
                hops += 1;
                if hops > MAX_SYMLINK_HOPS {
                    return Err(io::Error::other("too many levels of symbolic links"));
                }
                // relative targets resolve against the link's directory, which is `resolved`
                push_steps(&mut stack, &fs::read_link(&candidate)?);
            }
        }
    }
    Ok(resolved)
}

fn fs_error(err: io::Error, relative: &str) -> AppError {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory | io::ErrorKind::InvalidInput => {
            AppError::FileNotFound(relative.to_string())
        }
        kind => AppError::FileUnreadable(kind.to_string()),
    }
}
