//! External CLI invocation.
//!
//! Every mainframe operation in this workspace goes through a single
//! seam: the [`CommandRunner`] trait. The production implementation
//! ([`ZoweCli`]) spawns the configured Zowe-style CLI binary, optionally
//! feeds it stdin, and parses its JSON response envelope. Tests swap in
//! a scripted fake (see [`crate::fakes`]).

use crate::error::InvokeError;
use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error};

/// How the CLI should render its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Append `--response-format-json` and parse the envelope.
    Json,
    /// Return end-user screen output untouched.
    Text,
}

/// The outcome of one CLI invocation.
///
/// For [`OutputFormat::Json`] the fields come from the CLI's response
/// envelope; for [`OutputFormat::Text`] they are the raw process streams
/// and `success` mirrors the exit status.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the CLI reported success.
    pub success: bool,
    /// Process exit code (-1 when killed by signal).
    pub exit_code: i32,
    /// Captured stdout (envelope `stdout` field under Json).
    pub stdout: String,
    /// Captured stderr (envelope `stderr` field under Json).
    pub stderr: String,
    /// Structured payload, when the subcommand produces one.
    pub data: Option<serde_json::Value>,
}

impl CommandResult {
    /// A result is usable when the CLI succeeded and wrote nothing to stderr.
    ///
    /// The CLI sometimes exits zero while still reporting an error on
    /// stderr, so callers treat any stderr text as failure.
    pub fn is_clean(&self) -> bool {
        self.success && self.stderr.trim().is_empty()
    }
}

/// JSON response envelope printed by the CLI under `--response-format-json`.
#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    success: bool,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// The single seam between this workspace and the external CLI.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the CLI with the given argument vector.
    ///
    /// `stdin` text, when supplied, is piped into the child before
    /// waiting. There is no internal timeout: a hung CLI hangs the task
    /// and must be killed by the operator.
    async fn run(
        &self,
        args: &[String],
        format: OutputFormat,
        stdin: Option<&str>,
    ) -> Result<CommandResult, InvokeError>;
}

/// Production runner that shells out to the configured CLI binary.
#[derive(Debug, Clone)]
pub struct ZoweCli {
    program: String,
    verbose: bool,
}

impl ZoweCli {
    /// Create a runner for the given CLI program name (usually `zowe`).
    pub fn new(program: impl Into<String>, verbose: bool) -> Self {
        Self {
            program: program.into(),
            verbose,
        }
    }

    /// The program this runner spawns.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Issue `--version` and confirm the CLI is runnable.
    pub async fn verify_installed(&self) -> Result<(), InvokeError> {
        let args = vec!["--version".to_string()];
        let result = self.run(&args, OutputFormat::Text, None).await?;

        if result.success {
            Ok(())
        } else {
            Err(InvokeError::CliUnavailable {
                program: self.program.clone(),
                detail: if result.stderr.trim().is_empty() {
                    result.stdout
                } else {
                    result.stderr
                },
            })
        }
    }
}

#[async_trait]
impl CommandRunner for ZoweCli {
    async fn run(
        &self,
        args: &[String],
        format: OutputFormat,
        stdin: Option<&str>,
    ) -> Result<CommandResult, InvokeError> {
        let mut cmd_args = args.to_vec();
        if format == OutputFormat::Json {
            cmd_args.push("--response-format-json".to_string());
        }

        if self.verbose {
            debug!(program = %self.program, args = %cmd_args.join(" "), "issuing CLI command");
        }

        let mut command = Command::new(&self.program);
        command
            .args(&cmd_args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let mut child = command.spawn().map_err(|source| InvokeError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if let Some(text) = stdin {
            let mut handle = child.stdin.take().expect("stdin was requested piped");
            handle
                .write_all(text.as_bytes())
                .await
                .map_err(|source| InvokeError::Stdin {
                    program: self.program.clone(),
                    source,
                })?;
            // Dropping the handle closes the pipe so the child sees EOF.
            drop(handle);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| InvokeError::Wait {
                program: self.program.clone(),
                source,
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        let raw_stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let raw_stderr = String::from_utf8_lossy(&output.stderr).to_string();

        match format {
            OutputFormat::Text => Ok(CommandResult {
                success: output.status.success(),
                exit_code,
                stdout: raw_stdout,
                stderr: raw_stderr,
                data: None,
            }),
            OutputFormat::Json => {
                let envelope: ResponseEnvelope =
                    serde_json::from_str(&raw_stdout).map_err(|source| {
                        error!(program = %self.program, "unparsable CLI response");
                        InvokeError::Json {
                            source,
                            stdout: raw_stdout.clone(),
                        }
                    })?;

                Ok(CommandResult {
                    success: envelope.success,
                    exit_code,
                    stdout: envelope.stdout,
                    stderr: if envelope.stderr.trim().is_empty() {
                        raw_stderr
                    } else {
                        envelope.stderr
                    },
                    data: envelope.data,
                })
            }
        }
    }
}
