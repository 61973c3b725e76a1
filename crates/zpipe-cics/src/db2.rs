//! DB2 SQL execution.
//!
//! The CLI reports SQL failures inside otherwise-successful output, as
//! `DSNT408I SQLCODE = -nnn, ...` message lines. Those have to be dug
//! out of the listing; the envelope alone says nothing.

use crate::error::CicsError;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use zpipe_core::{CommandRunner, OutputFormat};

/// Runs SQL files against the configured DB2 subsystem.
pub struct SqlRunner {
    runner: Arc<dyn CommandRunner>,
    db2_profile: String,
}

impl SqlRunner {
    /// Create a runner bound to a DB2 profile.
    pub fn new(runner: Arc<dyn CommandRunner>, db2_profile: String) -> Self {
        Self {
            runner,
            db2_profile,
        }
    }

    /// Execute every statement in a SQL file, failing on the first
    /// negative SQLCODE in the listing.
    pub async fn execute_file(&self, path: &Path) -> Result<(), CicsError> {
        debug!(file = %path.display(), "executing SQL file");

        let args = vec![
            "db2".to_string(),
            "execute".to_string(),
            "sql".to_string(),
            "--file".to_string(),
            path.display().to_string(),
            "--db2-p".to_string(),
            self.db2_profile.clone(),
        ];
        let result = self.runner.run(&args, OutputFormat::Json, None).await?;

        if !result.is_clean() {
            return Err(CicsError::CommandFailed {
                operation: "execute-sql".to_string(),
                resource: path.display().to_string(),
                stderr: result.stderr,
            });
        }

        check_for_sql_errors(&result.stdout)?;
        info!(file = %path.display(), "SQL file executed");
        Ok(())
    }
}

/// Scan a DB2 listing for DSNT408I failure messages.
pub fn check_for_sql_errors(stdout: &str) -> Result<(), CicsError> {
    // Two leading blanks are part of the message format.
    let pattern = Regex::new(r"(?m)^\s{2}DSNT408I\s+SQLCODE\s+=\s+(-\d+),\s*(.*)$")
        .expect("static regex");

    if let Some(captures) = pattern.captures(stdout) {
        let sqlcode: i64 = captures[1].parse().expect("regex matched digits");
        return Err(CicsError::SqlFailed {
            sqlcode,
            explanation: captures[2].trim().to_string(),
        });
    }
    Ok(())
}
