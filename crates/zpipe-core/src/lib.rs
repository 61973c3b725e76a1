//! zpipe-core: external CLI invocation, response classification and
//! configuration for the zpipe mainframe delivery toolkit.
//!
//! Everything this workspace does on the mainframe goes through an
//! external Zowe-style CLI. This crate owns that boundary:
//!
//! - [`invoker`]: the [`CommandRunner`] seam and its production
//!   implementation
//! - [`classify`]: ordered, case-insensitive pattern tables for the
//!   CLI's free-text responses
//! - [`config`] / [`genprops`]: the YAML pipeline configuration and the
//!   JSON generated-properties file written after provisioning
//! - [`jobs`] / [`template`]: JCL rendering and submission
//! - [`shell`]: local build tools (gradle, npm)
//! - [`fakes`]: scripted runner for downstream crate tests

pub mod classify;
pub mod config;
pub mod error;
pub mod fakes;
pub mod genprops;
pub mod invoker;
pub mod jobs;
pub mod shell;
pub mod telemetry;
pub mod template;

pub use classify::{parse_marked_integer, PatternSet};
pub use config::{Config, ProfileNames};
pub use error::{ConfigError, InvokeError, JobError};
pub use genprops::{GeneratedProperties, InstanceRecord};
pub use invoker::{CommandResult, CommandRunner, OutputFormat, ZoweCli};
pub use jobs::JobSubmitter;
pub use telemetry::init_tracing;
