//! Byte range header values for partial transfers
//!
//! Only single ranges are supported; that is all the upload and download
//! endpoints accept.

use std::fmt;

use crate::error::{Error, Result};

/// `Content-Range` value for a partial upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRange {
    /// Bytes `start..=end` of a resource of `total` bytes ("bytes x-y/total")
    Inclusive { start: u64, end: u64, total: u64 },

    /// No bytes remain; only the total is announced ("bytes */total")
    Unsatisfied { total: u64 },
}

impl ContentRange {
    /// Range covering everything from `offset` to the end of a `total`-byte source
    ///
    /// Fails when `offset` lies beyond the end of the source.
    pub fn from_offset(offset: u64, total: u64) -> Result<Self> {
        if offset > total {
            return Err(Error::Validation(format!(
                "offset {offset} is beyond the end of the source ({total} bytes)"
            )));
        }
        if offset == total {
            Ok(ContentRange::Unsatisfied { total })
        } else {
            Ok(ContentRange::Inclusive {
                start: offset,
                end: total - 1,
                total,
            })
        }
    }
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ContentRange::Inclusive { start, end, total } => {
                write!(f, "bytes {start}-{end}/{total}")
            }
            ContentRange::Unsatisfied { total } => write!(f, "bytes */{total}"),
        }
    }
}

/// `Range` value requesting everything from an offset ("bytes=x-")
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeFrom(pub u64);

impl fmt::Display for RangeFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bytes={}-", self.0)
    }
}
