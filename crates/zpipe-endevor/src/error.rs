//! Error types for zpipe-endevor

use thiserror::Error;
use zpipe_core::InvokeError;

/// Errors raised by element sync and package promotion.
#[derive(Error, Debug)]
pub enum EndevorError {
    /// The external CLI could not be invoked.
    #[error(transparent)]
    Invoke(#[from] InvokeError),

    /// The local source directory could not be read.
    #[error("could not read source directory {dir}")]
    SourceDir {
        /// Directory being scanned.
        dir: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The source directory held no elements to push.
    #[error("no {ext} files found under {dir}")]
    NoElements {
        /// Directory scanned.
        dir: String,
        /// Extension looked for.
        ext: String,
    },

    /// The CLI ran but reported failure.
    #[error("CLI command failed during {operation} of {subject}: {stderr}")]
    CommandFailed {
        /// Operation being performed.
        operation: String,
        /// Element or package name.
        subject: String,
        /// Captured stderr (or stdout when stderr was empty).
        stderr: String,
    },

    /// Generation output did not report clean return codes at every
    /// processing step.
    #[error("generate of {element} did not complete cleanly:\n{stdout}")]
    GenerateFailed {
        /// Element name.
        element: String,
        /// Verbatim CLI output.
        stdout: String,
    },

    /// A package operation ended above the warning return code.
    #[error("package {package} {operation} failed with return code {rc}")]
    PackageFailed {
        /// Package name.
        package: String,
        /// Operation (create, cast, execute).
        operation: String,
        /// Reported return code.
        rc: i64,
    },
}
