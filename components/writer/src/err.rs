use snafu::{Location, Snafu};

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{filename} has exceeded the maximum number of write attempts"))]
    RotationExceeded {
        filename: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "append error on {filename}, rotating destination to {new_filename}"
    ))]
    AppendRotated {
        filename: String,
        new_filename: String,
        #[snafu(implicit)]
        location: Location,
        source: seam_client::Error,
    },

    #[snafu(display("failed to create file {filename}"))]
    CreateFailure {
        filename: String,
        #[snafu(implicit)]
        location: Location,
        source: seam_client::Error,
    },

    #[snafu(display("failed to append to {filename}"))]
    AppendFailure {
        filename: String,
        /// Offending payload, present only when `log_data_on_error` is set.
        data: Option<String>,
        #[snafu(implicit)]
        location: Location,
        source: seam_client::Error,
    },

    #[snafu(display("record is missing a usable date in field {field:?}"))]
    InvalidDateField {
        field: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to serialize record"))]
    SerializeRecord {
        #[snafu(implicit)]
        location: Location,
        source: serde_json::Error,
    },

    #[snafu(display("directory must not be empty"))]
    EmptyDirectory {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("records_per_chunk must be greater than zero"))]
    InvalidRecordsPerChunk {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("max_rotations must be greater than zero"))]
    InvalidMaxRotations {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("unsupported timeseries interval {interval:?}"))]
    UnsupportedInterval {
        interval: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl Error {
    /// Recoverable errors carry a rotated destination; the caller should
    /// redrive the same logical batch and `resolve` will route it there.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::AppendRotated { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
