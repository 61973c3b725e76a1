//! Package promotion.
//!
//! Promotion is a fixed sequence: delete any stale package of the same
//! name, create it from an SCL file, cast it, execute it. The package
//! subcommands answer with a structured return code in the response
//! data; anything above 4 is a failure.

use crate::error::EndevorError;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use zpipe_core::config::EndevorConfig;
use zpipe_core::{CommandResult, CommandRunner, OutputFormat};

const RC_WARNING_LIMIT: i64 = 4;

/// Drives package create/cast/execute against one Endevor instance.
pub struct PackagePromoter {
    runner: Arc<dyn CommandRunner>,
    config: EndevorConfig,
    endevor_profile: String,
}

impl PackagePromoter {
    /// Create a promoter for the configured instance.
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        config: EndevorConfig,
        endevor_profile: String,
    ) -> Self {
        Self {
            runner,
            config,
            endevor_profile,
        }
    }

    async fn package_command(
        &self,
        operation: &str,
        extra: Vec<String>,
    ) -> Result<CommandResult, EndevorError> {
        let mut args = vec![
            "endevor".to_string(),
            operation.to_string(),
            "package".to_string(),
            self.config.package.clone(),
        ];
        args.extend(extra);
        args.push("--instance".to_string());
        args.push(self.config.instance.clone());
        args.push("--endevor-p".to_string());
        args.push(self.endevor_profile.clone());

        Ok(self.runner.run(&args, OutputFormat::Json, None).await?)
    }

    fn check_return_code(&self, operation: &str, result: &CommandResult) -> Result<(), EndevorError> {
        let rc = result
            .data
            .as_ref()
            .and_then(|data| data.get("returnCode"))
            .and_then(Value::as_i64)
            .unwrap_or(0);

        if rc > RC_WARNING_LIMIT {
            return Err(EndevorError::PackageFailed {
                package: self.config.package.clone(),
                operation: operation.to_string(),
                rc,
            });
        }
        Ok(())
    }

    fn ensure_clean(
        &self,
        result: CommandResult,
        operation: &str,
    ) -> Result<CommandResult, EndevorError> {
        if result.is_clean() {
            Ok(result)
        } else {
            Err(EndevorError::CommandFailed {
                operation: operation.to_string(),
                subject: self.config.package.clone(),
                stderr: if result.stderr.trim().is_empty() {
                    result.stdout
                } else {
                    result.stderr
                },
            })
        }
    }

    /// Delete a stale package of the same name. A package that does not
    /// exist yet is not an error.
    pub async fn delete(&self) -> Result<(), EndevorError> {
        let result = self.package_command("delete", vec![]).await?;
        if !result.is_clean() {
            let combined = format!("{}{}", result.stdout, result.stderr).to_lowercase();
            if combined.contains("does not exist") || combined.contains("not found") {
                debug!(package = %self.config.package, "no stale package to delete");
                return Ok(());
            }
            self.ensure_clean(result, "delete")?;
        }
        Ok(())
    }

    /// Create the package from its SCL file.
    pub async fn create(&self) -> Result<(), EndevorError> {
        let result = self
            .package_command(
                "create",
                vec![
                    "--from-file".to_string(),
                    self.config.package_scl.clone(),
                ],
            )
            .await?;
        let result = self.ensure_clean(result, "create")?;
        self.check_return_code("create", &result)
    }

    /// Cast the package (validate and seal it for execution).
    pub async fn cast(&self) -> Result<(), EndevorError> {
        let result = self.package_command("cast", vec![]).await?;
        let result = self.ensure_clean(result, "cast")?;
        self.check_return_code("cast", &result)
    }

    /// Execute the package, moving its elements to the target stage.
    pub async fn execute(&self) -> Result<(), EndevorError> {
        let result = self.package_command("execute", vec![]).await?;
        let result = self.ensure_clean(result, "execute")?;
        self.check_return_code("execute", &result)
    }

    /// Full promotion: delete stale, create, cast, execute.
    pub async fn promote(&self) -> Result<(), EndevorError> {
        info!(package = %self.config.package, "promoting package");
        self.delete().await?;
        self.create().await?;
        self.cast().await?;
        self.execute().await?;
        info!(package = %self.config.package, "package executed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zpipe_core::fakes::ScriptedRunner;

    fn test_config() -> EndevorConfig {
        EndevorConfig {
            instance: "WEBSNDVR".to_string(),
            environment: "DEV".to_string(),
            system: "ZPIPE".to_string(),
            subsystem: "ZPIPE".to_string(),
            stage: 1,
            element: "ZPIPPGM".to_string(),
            element_type: "COBOL".to_string(),
            element_ext: ".cbl".to_string(),
            hlq: "NDVR".to_string(),
            project_dir: "mainframe/endevor".to_string(),
            ccid: "ZPIPE".to_string(),
            comment: "pipeline delivery".to_string(),
            package: "ZPIPEPKG".to_string(),
            package_scl: "mainframe/scl/package.scl".to_string(),
        }
    }

    fn promoter(runner: Arc<ScriptedRunner>) -> PackagePromoter {
        PackagePromoter::new(runner, test_config(), "mainframe-endevor".to_string())
    }

    #[tokio::test]
    async fn test_promote_runs_full_sequence() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_text_failure("Package ZPIPEPKG does not exist", "");
        runner.push_data_ok(json!({"returnCode": 0}));
        runner.push_data_ok(json!({"returnCode": 4}));
        runner.push_data_ok(json!({"returnCode": 0}));

        promoter(runner.clone()).promote().await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0][1], "delete");
        assert_eq!(calls[1][1], "create");
        assert!(calls[1].contains(&"mainframe/scl/package.scl".to_string()));
        assert_eq!(calls[2][1], "cast");
        assert_eq!(calls[3][1], "execute");
    }

    #[tokio::test]
    async fn test_execute_rc_above_warning_is_fatal() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_data_ok(json!({"returnCode": 8}));

        let err = promoter(runner).execute().await.unwrap_err();
        match err {
            EndevorError::PackageFailed { rc, operation, .. } => {
                assert_eq!(rc, 8);
                assert_eq!(operation, "execute");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_delete_failure_other_than_missing_is_fatal() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_text_failure("", "security violation");

        let err = promoter(runner).delete().await.unwrap_err();
        assert!(matches!(err, EndevorError::CommandFailed { .. }));
    }
}
