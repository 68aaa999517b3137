use snafu::{Location, Snafu};

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("failed to read {path} at offset {offset}"))]
    ReadFailure {
        path: String,
        offset: u64,
        #[snafu(implicit)]
        location: Location,
        source: seam_client::Error,
    },

    #[snafu(display("failed to list {path}"))]
    ListFailure {
        path: String,
        #[snafu(implicit)]
        location: Location,
        source: seam_client::Error,
    },

    #[snafu(display("{path} does not exist"))]
    PathNotFound {
        path: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("path must specify a file or directory to read"))]
    EmptyPath {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("slice size must be greater than zero"))]
    InvalidSliceSize {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("delimiter must be a single byte, got {delimiter:?}"))]
    InvalidDelimiter {
        delimiter: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("unsupported record format {format:?}"))]
    UnsupportedFormat {
        format: String,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
