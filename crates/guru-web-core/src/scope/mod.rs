//! The set of files visible through the web interface.

pub mod loader;

pub use loader::{GoListLoader, LoadedScope, PackageInfo};

/// Sorted, de-duplicated list of absolute file paths pulled into the analysis
/// scope at startup. Immutable once built.
///
/// Membership is exact string equality against an entry. Prefixes, parent
/// directories and siblings of an entry are never members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeIndex {
    files: Vec<String>,
}

impl ScopeIndex {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut files: Vec<String> = paths.into_iter().map(Into::into).collect();
        files.sort_unstable();
        files.dedup();
        Self { files }
    }

    /// Whether `path` is byte-for-byte one of the indexed files.
    pub fn contains(&self, path: &str) -> bool {
        self.files
            .binary_search_by(|entry| entry.as_str().cmp(path))
            .is_ok()
    }

    /// All indexed files in ascending order.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
