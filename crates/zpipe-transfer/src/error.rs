//! Error types for zpipe-transfer

use thiserror::Error;

/// Errors raised while moving deliverables to the host file system.
#[derive(Error, Debug)]
pub enum TransferError {
    /// The FTP control or data connection failed.
    #[error(transparent)]
    Ftp(#[from] suppaftp::FtpError),

    /// A local file could not be read.
    #[error("could not read local file {path}")]
    Io {
        /// Local path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A batch stopped early; uploads after the failed one were never
    /// attempted.
    #[error("upload of {remote} failed after {completed} completed transfers")]
    BatchFailed {
        /// Remote path that failed.
        remote: String,
        /// Transfers completed before the failure.
        completed: usize,
        /// The failure itself.
        #[source]
        source: Box<TransferError>,
    },
}
