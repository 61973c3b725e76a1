//! Provisioned-instance queries.

use crate::error::ProvisionError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use zpipe_core::{CommandResult, CommandRunner, OutputFormat};

/// Lifecycle state of a software-services instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceState {
    /// Ready for use.
    Provisioned,
    /// Provisioning workflow still running.
    BeingProvisioned,
    /// Deprovisioning workflow still running.
    BeingDeprovisioned,
    /// A workflow step failed.
    Failed,
    /// Any other state the registry reports.
    Other(String),
}

impl InstanceState {
    /// Parse the state string from the registry. Every state carrying
    /// "fail" counts as failed.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "provisioned" => InstanceState::Provisioned,
            "being-provisioned" => InstanceState::BeingProvisioned,
            "being-deprovisioned" => InstanceState::BeingDeprovisioned,
            other if other.contains("fail") => InstanceState::Failed,
            other => InstanceState::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceState::Provisioned => f.write_str("provisioned"),
            InstanceState::BeingProvisioned => f.write_str("being-provisioned"),
            InstanceState::BeingDeprovisioned => f.write_str("being-deprovisioned"),
            InstanceState::Failed => f.write_str("failed"),
            InstanceState::Other(raw) => f.write_str(raw),
        }
    }
}

/// Registry facts about one instance.
#[derive(Debug, Clone)]
pub struct InstanceInfo {
    /// Current lifecycle state.
    pub state: InstanceState,
    /// Registry object id.
    pub object_id: String,
}

/// Read-side access to the provisioning registry.
pub struct InstanceQuery {
    runner: Arc<dyn CommandRunner>,
    zosmf_profile: String,
}

impl InstanceQuery {
    /// Create a query bound to a z/OSMF profile.
    pub fn new(runner: Arc<dyn CommandRunner>, zosmf_profile: String) -> Self {
        Self {
            runner,
            zosmf_profile,
        }
    }

    async fn run(&self, args: Vec<String>) -> Result<CommandResult, ProvisionError> {
        Ok(self.runner.run(&args, OutputFormat::Json, None).await?)
    }

    fn failed(operation: &str, result: CommandResult) -> ProvisionError {
        ProvisionError::CommandFailed {
            operation: operation.to_string(),
            stderr: if result.stderr.trim().is_empty() {
                result.stdout
            } else {
                result.stderr
            },
        }
    }

    /// Look up an instance. `Ok(None)` means the registry holds no
    /// instance with that name.
    pub async fn instance_info(&self, name: &str) -> Result<Option<InstanceInfo>, ProvisionError> {
        let result = self
            .run(vec![
                "provisioning".to_string(),
                "list".to_string(),
                "instance-info".to_string(),
                name.to_string(),
                "--zosmf-p".to_string(),
                self.zosmf_profile.clone(),
            ])
            .await?;

        if !result.is_clean() {
            let combined = format!("{}{}", result.stdout, result.stderr);
            if combined.contains("No instances found") {
                return Ok(None);
            }
            return Err(Self::failed("instance-info", result));
        }

        let data = result.data.as_ref().ok_or_else(|| ProvisionError::MissingData {
            operation: "instance-info".to_string(),
            detail: format!("no instance data for {name}"),
        })?;

        let state_raw = data
            .get("state")
            .and_then(Value::as_str)
            .ok_or_else(|| ProvisionError::MissingData {
                operation: "instance-info".to_string(),
                detail: format!("no state field for {name}"),
            })?;
        let object_id = data
            .get("object-id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let state = InstanceState::parse(state_raw);
        debug!(instance = name, %state, "instance state");
        Ok(Some(InstanceInfo { state, object_id }))
    }

    /// Variables published by the instance (e.g. the region APPLID).
    pub async fn instance_variables(
        &self,
        name: &str,
    ) -> Result<BTreeMap<String, String>, ProvisionError> {
        let result = self
            .run(vec![
                "provisioning".to_string(),
                "list".to_string(),
                "instance-variables".to_string(),
                name.to_string(),
                "--zosmf-p".to_string(),
                self.zosmf_profile.clone(),
            ])
            .await?;

        if !result.is_clean() {
            return Err(Self::failed("instance-variables", result));
        }

        let data = result.data.as_ref().ok_or_else(|| ProvisionError::MissingData {
            operation: "instance-variables".to_string(),
            detail: format!("no variable list for {name}"),
        })?;

        let mut variables = BTreeMap::new();
        if let Some(list) = data.as_array() {
            for entry in list {
                if let (Some(name), Some(value)) = (
                    entry.get("name").and_then(Value::as_str),
                    entry.get("value").and_then(Value::as_str),
                ) {
                    variables.insert(name.to_string(), value.to_string());
                }
            }
        }
        Ok(variables)
    }

    /// Find an already-provisioned instance of a template, if any.
    /// Returns the instance's external name.
    pub async fn provisioned_instance_of(
        &self,
        template: &str,
    ) -> Result<Option<String>, ProvisionError> {
        let result = self
            .run(vec![
                "provisioning".to_string(),
                "list".to_string(),
                "registry-instances".to_string(),
                "--zosmf-p".to_string(),
                self.zosmf_profile.clone(),
            ])
            .await?;

        if !result.is_clean() {
            return Err(Self::failed("registry-instances", result));
        }

        let Some(data) = result.data.as_ref() else {
            return Ok(None);
        };
        let Some(list) = data.get("scr-list").and_then(Value::as_array) else {
            return Ok(None);
        };

        for entry in list {
            let from_template = entry
                .get("catalog-object-name")
                .and_then(Value::as_str)
                .map(|t| t == template)
                .unwrap_or(false);
            let provisioned = entry
                .get("state")
                .and_then(Value::as_str)
                .map(|s| InstanceState::parse(s) == InstanceState::Provisioned)
                .unwrap_or(false);

            if from_template && provisioned {
                if let Some(name) = entry.get("external-name").and_then(Value::as_str) {
                    return Ok(Some(name.to_string()));
                }
            }
        }
        Ok(None)
    }

    /// Whether a started task with this name is currently active.
    pub async fn job_active(&self, job_name: &str) -> Result<bool, ProvisionError> {
        let result = self
            .run(vec![
                "zos-jobs".to_string(),
                "list".to_string(),
                "jobs".to_string(),
                "--prefix".to_string(),
                job_name.to_string(),
                "--owner".to_string(),
                "*".to_string(),
                "--zosmf-p".to_string(),
                self.zosmf_profile.clone(),
            ])
            .await?;

        if !result.is_clean() {
            return Err(Self::failed("list-jobs", result));
        }

        let active = result
            .data
            .as_ref()
            .and_then(Value::as_array)
            .map(|jobs| {
                jobs.iter().any(|job| {
                    job.get("status")
                        .and_then(Value::as_str)
                        .map(|s| s.eq_ignore_ascii_case("ACTIVE"))
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false);
        Ok(active)
    }

    /// Run a template-defined action (provision, deprovision, ...)
    /// against an instance. The CLI takes the instance first, then the
    /// action.
    pub async fn perform_action(&self, name: &str, action: &str) -> Result<(), ProvisionError> {
        let result = self
            .run(vec![
                "provisioning".to_string(),
                "perform".to_string(),
                "action".to_string(),
                name.to_string(),
                action.to_string(),
                "--zosmf-p".to_string(),
                self.zosmf_profile.clone(),
            ])
            .await?;

        if !result.is_clean() {
            return Err(Self::failed("perform-action", result));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zpipe_core::fakes::ScriptedRunner;

    fn query(runner: Arc<ScriptedRunner>) -> InstanceQuery {
        InstanceQuery::new(runner, "mainframe".to_string())
    }

    #[test]
    fn test_state_parse() {
        assert_eq!(InstanceState::parse("provisioned"), InstanceState::Provisioned);
        assert_eq!(
            InstanceState::parse("being-deprovisioned"),
            InstanceState::BeingDeprovisioned
        );
        assert_eq!(
            InstanceState::parse("deprovisioning-failed"),
            InstanceState::Failed
        );
        assert_eq!(
            InstanceState::parse("pending"),
            InstanceState::Other("pending".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_instance_is_none() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_text_failure("", "No instances found with name CICSAA01");

        let info = query(runner).instance_info("CICSAA01").await.unwrap();
        assert!(info.is_none());
    }

    #[tokio::test]
    async fn test_instance_info_parses_state() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_data_ok(json!({"state": "being-provisioned", "object-id": "obj-123"}));

        let info = query(runner).instance_info("CICSAA01").await.unwrap().unwrap();
        assert_eq!(info.state, InstanceState::BeingProvisioned);
        assert_eq!(info.object_id, "obj-123");
    }

    #[tokio::test]
    async fn test_variables_become_a_map() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_data_ok(json!([
            {"name": "DFH_REGION_APPLID", "value": "CICSAA01"},
            {"name": "DFH_REGION_RPL", "value": "IBMUSER.CICS.RPL"}
        ]));

        let vars = query(runner).instance_variables("CICSAA01").await.unwrap();
        assert_eq!(vars["DFH_REGION_APPLID"], "CICSAA01");
        assert_eq!(vars["DFH_REGION_RPL"], "IBMUSER.CICS.RPL");
    }

    #[tokio::test]
    async fn test_provisioned_instance_matches_template_and_state() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_data_ok(json!({"scr-list": [
            {"catalog-object-name": "cics_dev_template", "state": "being-provisioned", "external-name": "CICSAA00"},
            {"catalog-object-name": "cics_dev_template", "state": "provisioned", "external-name": "CICSAA01"},
            {"catalog-object-name": "other_template", "state": "provisioned", "external-name": "MQAA01"}
        ]}));

        let name = query(runner)
            .provisioned_instance_of("cics_dev_template")
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("CICSAA01"));
    }

    #[tokio::test]
    async fn test_perform_action_takes_instance_then_action() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_text_ok("Action performed");

        query(runner.clone())
            .perform_action("CICSAA01", "start")
            .await
            .unwrap();

        let call = &runner.calls()[0];
        assert_eq!(
            call[..5],
            ["provisioning", "perform", "action", "CICSAA01", "start"]
        );
    }

    #[tokio::test]
    async fn test_job_active() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_data_ok(json!([{"jobname": "CICSAA01", "status": "ACTIVE"}]));
        runner.push_data_ok(json!([]));

        let q = query(runner);
        assert!(q.job_active("CICSAA01").await.unwrap());
        assert!(!q.job_active("CICSAA01").await.unwrap());
    }
}
