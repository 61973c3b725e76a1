//! Error types for zpipe-core

use thiserror::Error;

/// Errors raised while invoking the external CLI.
#[derive(Error, Debug)]
pub enum InvokeError {
    /// The CLI binary could not be started at all.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        /// Program that was being launched.
        program: String,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The CLI is missing or its version check failed.
    #[error("'{program}' is not installed or not in PATH: {detail}")]
    CliUnavailable {
        /// Program that was probed.
        program: String,
        /// Captured stderr or explanation.
        detail: String,
    },

    /// The CLI produced output that was not the expected JSON envelope.
    #[error("CLI response was not valid JSON: {source}; raw output: {stdout}")]
    Json {
        /// Parse failure.
        source: serde_json::Error,
        /// The raw stdout that failed to parse.
        stdout: String,
    },

    /// Writing the supplied stdin text to the child failed.
    #[error("failed to feed stdin to '{program}': {source}")]
    Stdin {
        /// Program that was running.
        program: String,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// Waiting on the child process failed.
    #[error("failed to collect output from '{program}': {source}")]
    Wait {
        /// Program that was running.
        program: String,
        /// Underlying OS error.
        source: std::io::Error,
    },
}

/// Errors raised while loading or updating configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Filesystem error.
    #[error("IO error on {path}: {source}")]
    Io {
        /// File that was being accessed.
        path: String,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The YAML configuration file did not parse.
    #[error("invalid configuration in {path}: {source}")]
    Yaml {
        /// File that was being parsed.
        path: String,
        /// Parse failure.
        source: serde_yaml::Error,
    },

    /// The generated properties file did not parse.
    #[error("invalid generated properties in {path}: {source}")]
    Json {
        /// File that was being parsed.
        path: String,
        /// Parse failure.
        source: serde_json::Error,
    },
}

/// Errors raised while submitting JCL through the jobs interface.
#[derive(Error, Debug)]
pub enum JobError {
    /// The CLI invocation itself failed.
    #[error(transparent)]
    Invoke(#[from] InvokeError),

    /// The job ran but its output did not contain the expected condition code.
    #[error("job output missing '{expected}'; stdout:\n{stdout}")]
    BadCondCode {
        /// Pattern that was required in the output.
        expected: String,
        /// Full captured job output.
        stdout: String,
    },

    /// The CLI reported failure submitting the job.
    #[error("job submission failed: {stderr}")]
    SubmitFailed {
        /// Captured stderr.
        stderr: String,
    },
}
