use serde::{Deserialize, Serialize};
use snafu::ensure;

use seam_common::DEFAULT_SLICE_SIZE;
use seam_utils::readable_size::ReadableSize;

use crate::err::{EmptyPathSnafu, InvalidDelimiterSnafu, InvalidSliceSizeSnafu, Result};
use crate::format::Format;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// File or directory to process; usually a directory holding many
    /// files.
    pub path: String,
    /// Byte size of one read slice.
    pub size: ReadableSize,
    /// Record separator; a single byte.
    pub delimiter: String,
    pub format: Format,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            size: ReadableSize(DEFAULT_SLICE_SIZE),
            delimiter: "\n".to_string(),
            format: Format::default(),
        }
    }
}

impl ReaderConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.path.is_empty(), EmptyPathSnafu);
        ensure!(self.size.as_bytes() > 0, InvalidSliceSizeSnafu);
        self.delimiter_byte()?;
        Ok(())
    }

    pub fn delimiter_byte(&self) -> Result<u8> {
        ensure!(
            self.delimiter.len() == 1,
            InvalidDelimiterSnafu { delimiter: &self.delimiter }
        );
        Ok(self.delimiter.as_bytes()[0])
    }
}
