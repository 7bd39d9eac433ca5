use std::cmp::Ordering;
use std::ffi::OsStr;
use std::path::PathBuf;

/// A sorted file on disk, either a spilled buffer or the output of a merge.
#[derive(Clone, Debug)]
pub(crate) struct RunFile {
    path: PathBuf,
    rows: usize,
}

impl RunFile {
    pub(crate) fn new(path: PathBuf, rows: usize) -> RunFile {
        RunFile {
            path,
            rows,
        }
    }

    pub(crate) fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Data rows, the header excluded.
    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    pub(crate) fn file_name(&self) -> &OsStr {
        self.path.file_name().unwrap_or(self.path.as_os_str())
    }
}

impl Eq for RunFile {}

impl PartialEq<Self> for RunFile {
    fn eq(&self, other: &Self) -> bool {
        self.file_name().eq(other.file_name())
    }
}

impl PartialOrd<Self> for RunFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RunFile {
    fn cmp(&self, other: &Self) -> Ordering {
        self.file_name().cmp(other.file_name())
    }
}
