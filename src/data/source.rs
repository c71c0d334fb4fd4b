//! Where an input table comes from.

use crate::error::Result;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

/// Location of a tab-delimited input.
///
/// Callers decide once, at the boundary, whether they hold a path or
/// in-memory text; the readers never sniff the argument type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A file on disk.
    Path(PathBuf),
    /// Text already held in memory.
    Text(String),
}

impl Source {
    /// Source backed by a file.
    pub fn path<P: AsRef<Path>>(path: P) -> Self {
        Source::Path(path.as_ref().to_path_buf())
    }

    /// Source backed by a string.
    pub fn text(text: impl Into<String>) -> Self {
        Source::Text(text.into())
    }

    /// Human-readable description for log messages.
    pub fn describe(&self) -> String {
        match self {
            Source::Path(path) => format!("{:?}", path),
            Source::Text(_) => "<in-memory text>".to_string(),
        }
    }

    pub(crate) fn open(&self) -> Result<Box<dyn Read + '_>> {
        Ok(match self {
            Source::Path(path) => Box::new(File::open(path)?),
            Source::Text(text) => Box::new(Cursor::new(text.as_bytes())),
        })
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        assert_eq!(Source::path("data/table.tsv").describe(), "\"data/table.tsv\"");
        assert_eq!(Source::text("id\tx\n").describe(), "<in-memory text>");
    }

    #[test]
    fn test_open_text() {
        let mut buf = String::new();
        Source::text("a\tb\n").open().unwrap().read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "a\tb\n");
        assert!(Source::path("/nonexistent/qurro/table.tsv").open().is_err());
    }
}
