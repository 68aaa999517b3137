use serde::{Deserialize, Serialize};

use seam_common::cal_slice_count;

/// One unit of read work: a byte range of one file, or the whole file when
/// it fits inside a single slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slice {
    /// The file fits in one slice; the reader fetches it without a range.
    Full { path: String },
    /// A byte range of a larger file. For every range except the first the
    /// offset is pulled back one byte (and the length grown by one) so the
    /// reader can test whether the logical start lands on a record
    /// boundary.
    Range {
        path: String,
        offset: u64,
        length: u64,
        total: u64,
    },
}

impl Slice {
    pub fn path(&self) -> &str {
        match self {
            Slice::Full { path } => path,
            Slice::Range { path, .. } => path,
        }
    }

    /// The partition point this slice is responsible for, before the
    /// one-byte pullback.
    pub fn logical_offset(&self) -> u64 {
        match self {
            Slice::Full { .. } => 0,
            Slice::Range { offset: 0, .. } => 0,
            Slice::Range { offset, .. } => offset + 1,
        }
    }

    pub fn reaches_end(&self) -> bool {
        match self {
            Slice::Full { .. } => true,
            Slice::Range { offset, length, total, .. } => offset + length == *total,
        }
    }
}

/// Split a file of `length` bytes into independently readable slices of at
/// most `slice_size` logical bytes. Pure arithmetic, no I/O.
pub fn plan_slices(path: &str, length: u64, slice_size: u64) -> Vec<Slice> {
    debug_assert!(slice_size > 0, "slice size must be positive");
    if length <= slice_size {
        return vec![Slice::Full { path: path.to_string() }];
    }

    let mut slices = Vec::with_capacity(cal_slice_count(length, slice_size) as usize);
    let mut logical = 0u64;
    while logical < length {
        let stride = slice_size.min(length - logical);
        if logical == 0 {
            slices.push(Slice::Range {
                path: path.to_string(),
                offset: 0,
                length: stride,
                total: length,
            });
        } else {
            // Grab the byte immediately before the partition point so the
            // reader can tell whether the slice starts on a record
            // boundary.
            slices.push(Slice::Range {
                path: path.to_string(),
                offset: logical - 1,
                length: stride + 1,
                total: length,
            });
        }
        logical += stride;
    }
    slices
}
