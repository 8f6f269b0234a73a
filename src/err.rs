use crate::handle::LobId;
use std::io;
use thiserror::Error;

/// Represents possible errors returned from lobby.
#[derive(Debug, Error)]
pub enum Error {
    /**
        The requested operation is structurally impossible in this deployment
        mode. The payload names the operation. Callers must route the request
        to a component with server-side authority instead of retrying.
    */
    #[error("unsupported in this deployment mode: {0}")]
    Unsupported(&'static str),

    /**
        The remote store rejected the authenticator presented at stream-open
        time. A stale or forged authenticator will not become valid on retry.
    */
    #[error("authentication failed for LOB {lob}")]
    AuthenticationFailed { lob: LobId },

    /// The remote store has no content under the presented LOB id.
    #[error("unknown LOB {0}")]
    LobNotFound(LobId),

    /// A structurally invalid request, e.g. a remote read over a local handle.
    #[error("{0}")]
    InvalidArgument(String),

    /// A transient I/O failure during streaming or temp-storage copy.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(cause) => cause,
            other => {
                let kind = match &other {
                    Error::AuthenticationFailed { .. } => io::ErrorKind::PermissionDenied,
                    Error::LobNotFound(_) => io::ErrorKind::NotFound,
                    Error::Unsupported(_) => io::ErrorKind::Unsupported,
                    _ => io::ErrorKind::InvalidInput,
                };
                io::Error::new(kind, other)
            }
        }
    }
}

impl Error {
    pub(crate) fn arg(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
