use serde::{Deserialize, Serialize};
use snafu::ensure;

use seam_common::{DEFAULT_MAX_ROTATIONS, DEFAULT_RECORDS_PER_CHUNK};

use crate::chunker::Timeseries;
use crate::err::{
    EmptyDirectorySnafu, InvalidMaxRotationsSnafu, InvalidRecordsPerChunkSnafu, Result,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Destination directory; with a timeseries interval configured it
    /// becomes the prefix of dated directories.
    pub directory: String,
    /// Destination file name inside the directory. When unset each
    /// chunker instance generates its own worker-scoped name.
    pub filename: Option<String>,
    pub records_per_chunk: usize,
    pub timeseries: Option<Timeseries>,
    /// Record field holding the ISO-8601 date used for bucketing.
    pub date_field: String,
    /// How many times one logical file may be rotated away from before
    /// appends to it are refused.
    pub max_rotations: u32,
    /// Embed the undelivered payload in append errors. Off by default
    /// since payloads may carry sensitive records.
    pub log_data_on_error: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            directory: "/".to_string(),
            filename: None,
            records_per_chunk: DEFAULT_RECORDS_PER_CHUNK,
            timeseries: None,
            date_field: "date".to_string(),
            max_rotations: DEFAULT_MAX_ROTATIONS,
            log_data_on_error: false,
        }
    }
}

impl WriterConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.directory.is_empty(), EmptyDirectorySnafu);
        ensure!(self.records_per_chunk > 0, InvalidRecordsPerChunkSnafu);
        ensure!(self.max_rotations > 0, InvalidMaxRotationsSnafu);
        Ok(())
    }
}
