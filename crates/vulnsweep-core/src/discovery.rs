use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use anyhow::{bail, Result};
use tracing::warn;
use walkdir::WalkDir;

/// File name suffixes treated as source code when no override is configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".cpp", ".c", ".h", ".hpp", ".java", ".py", ".js", ".ts", ".cc", ".html", ".css", ".go",
    ".rs", ".php", ".rb", ".swift", ".kt",
];

/// Allow-list of file name suffixes; matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    suffixes: BTreeSet<String>,
}

impl ExtensionSet {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.suffixes
            .iter()
            .any(|suffix| file_name.ends_with(suffix.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.suffixes.iter().map(String::as_str)
    }
}

impl Default for ExtensionSet {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter().copied())
    }
}

/// A source file selected for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the scanned root, as shown in reports.
    pub relative_path: String,
}

/// Walks a directory tree and yields files whose names match the allow-list.
#[derive(Debug, Clone)]
pub struct FileDiscoverer {
    root: PathBuf,
    extensions: ExtensionSet,
}

impl FileDiscoverer {
    /// Fails when `root` is not an existing directory.
    pub fn new(root: impl Into<PathBuf>, extensions: ExtensionSet) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            bail!("source directory not found: '{}'", root.display());
        }
        Ok(Self { root, extensions })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the tree in filesystem order. Unreadable entries are logged and skipped.
    ///
    /// Symlinks to regular files are yielded; symlinked directories are not entered.
    pub fn files(&self) -> impl Iterator<Item = SourceFile> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| {
                entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
            })
            .filter(|entry| self.extensions.matches(&entry.file_name().to_string_lossy()))
            .map(|entry| {
                let path = entry.into_path();
                let relative_path = path
                    .strip_prefix(&self.root)
                    .unwrap_or(path.as_path())
                    .display()
                    .to_string();
                SourceFile {
                    path,
                    relative_path,
                }
            })
    }
}
