//! Resource path validation
//!
//! Resource paths are sent verbatim in the `path` query parameter. They are
//! either absolute (`/dir/file.txt`) or carry a namespace prefix
//! (`disk:/`, `app:/`, `trash:/`). Malformed paths are rejected locally.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Namespaces understood by the API
const PREFIXES: [&str; 3] = ["disk:", "app:", "trash:"];

/// A validated resource path on the disk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiskPath {
    raw: String,
}

impl DiskPath {
    /// Validate and wrap a resource path
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::Validation("Path cannot be empty".into()));
        }

        if path.chars().any(char::is_control) {
            return Err(Error::Validation(format!(
                "Path '{}' contains control characters",
                path.escape_debug()
            )));
        }

        let rest = match PREFIXES.iter().find(|p| path.starts_with(*p)) {
            Some(prefix) => &path[prefix.len()..],
            None => path,
        };

        if !rest.starts_with('/') {
            return Err(Error::Validation(format!(
                "Path '{path}' must be absolute (e.g. /dir/file or disk:/dir/file)"
            )));
        }

        if rest.split('/').any(|segment| segment == "..") {
            return Err(Error::Validation(format!(
                "Path '{path}' must not contain '..' segments"
            )));
        }

        Ok(Self {
            raw: path.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the path ends with a slash (directory semantics)
    pub fn is_dir(&self) -> bool {
        self.raw.ends_with('/')
    }

    /// Last path segment, if any
    pub fn file_name(&self) -> Option<&str> {
        self.raw
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty() && !name.ends_with(':'))
    }

    /// Join a child path component
    pub fn join(&self, child: &str) -> Result<Self> {
        let base = self.raw.trim_end_matches('/');
        let child = child.trim_start_matches('/');
        Self::parse(&format!("{base}/{child}"))
    }
}

impl FromStr for DiskPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DiskPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for DiskPath {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}
