//! JCL submission through the jobs plugin.
//!
//! Rendered JCL is fed to `zos-jobs submit stdin --print-all` over the
//! child's standard input. The CLI exiting cleanly is not sufficient:
//! the printed job output must contain `COND CODE 0000`, otherwise a
//! step failed even though the submission succeeded.

use crate::error::JobError;
use crate::invoker::{CommandRunner, OutputFormat};
use regex::Regex;
use std::sync::Arc;
use tracing::info;

/// The pattern that every successful job step prints.
const GOOD_COND_CODE: &str = "COND CODE 0000";

/// Submits JCL and checks the printed job output.
pub struct JobSubmitter {
    runner: Arc<dyn CommandRunner>,
    zosmf_profile: String,
}

impl JobSubmitter {
    /// Create a submitter bound to a z/OSMF profile.
    pub fn new(runner: Arc<dyn CommandRunner>, zosmf_profile: impl Into<String>) -> Self {
        Self {
            runner,
            zosmf_profile: zosmf_profile.into(),
        }
    }

    /// Submit JCL over stdin and require `COND CODE 0000` in the output.
    ///
    /// Returns the full printed job output for the caller's log.
    pub async fn submit_and_check(&self, jcl: &str, description: &str) -> Result<String, JobError> {
        info!(%description, "submitting JCL");

        let args = vec![
            "zos-jobs".to_string(),
            "submit".to_string(),
            "stdin".to_string(),
            "--print-all".to_string(),
            "--zosmf-p".to_string(),
            self.zosmf_profile.clone(),
        ];

        let result = self.runner.run(&args, OutputFormat::Text, Some(jcl)).await?;

        if !result.success {
            return Err(JobError::SubmitFailed {
                stderr: result.stderr,
            });
        }

        let good = Regex::new(GOOD_COND_CODE).expect("static pattern");
        if !good.is_match(&result.stdout) {
            return Err(JobError::BadCondCode {
                expected: GOOD_COND_CODE.to_string(),
                stdout: result.stdout,
            });
        }

        Ok(result.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedRunner;

    #[tokio::test]
    async fn test_submit_requires_cond_code() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_text_ok("IEF142I STEP1 - COND CODE 0000\n");

        let submitter = JobSubmitter::new(runner.clone(), "mainframe");
        let output = submitter
            .submit_and_check("//ZP01 JOB\n", "copy to loadlib")
            .await
            .unwrap();

        assert!(output.contains("COND CODE 0000"));

        // The JCL must travel over stdin, not argv.
        let calls = runner.calls();
        assert_eq!(calls[0][..3], ["zos-jobs", "submit", "stdin"]);
        assert_eq!(runner.stdin_texts()[0].as_deref(), Some("//ZP01 JOB\n"));
    }

    #[tokio::test]
    async fn test_submit_fails_without_cond_code() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_text_ok("IEF142I STEP1 - COND CODE 0012\n");

        let submitter = JobSubmitter::new(runner, "mainframe");
        let err = submitter
            .submit_and_check("//ZP01 JOB\n", "bind plan")
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::BadCondCode { .. }));
    }

    #[tokio::test]
    async fn test_submit_surfaces_cli_failure() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_text_failure("", "z/OSMF connection refused");

        let submitter = JobSubmitter::new(runner, "mainframe");
        let err = submitter
            .submit_and_check("//ZP01 JOB\n", "bind plan")
            .await
            .unwrap_err();

        match err {
            JobError::SubmitFailed { stderr } => assert!(stderr.contains("refused")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
