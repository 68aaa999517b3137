use snafu::{Location, Snafu};

/// Error-detail signature of the corrupt-block / replica-relocation append
/// failure. An append that fails with this marker is worth retrying against
/// a rotated filename; anything else is fatal for the attempt.
pub const REPLICA_RELOCATION_MARKER: &str = "AlreadyBeingCreatedException";

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("OpenDAL operator failed"))]
    OpenDal {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: opendal::Error,
    },

    #[snafu(display("{path} does not exist"))]
    NotFound {
        path: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("storage rejected request for {path}: {detail}"))]
    Rejected {
        path: String,
        detail: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::OpenDal { error, .. } => error.kind() == opendal::ErrorKind::NotFound,
            Error::NotFound { .. } => true,
            _ => false,
        }
    }

    /// True when the error detail carries the corrupt-block signature that
    /// makes an append failure rotation-eligible.
    pub fn is_replica_relocation(&self) -> bool {
        match self {
            Error::OpenDal { error, .. } => error.to_string().contains(REPLICA_RELOCATION_MARKER),
            Error::Rejected { detail, .. } => detail.contains(REPLICA_RELOCATION_MARKER),
            Error::NotFound { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
