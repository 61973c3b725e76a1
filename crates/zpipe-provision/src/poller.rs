//! Provisioning lifecycle driver.
//!
//! Provisioning is asynchronous on the host: a template is submitted,
//! then the instance is polled until its workflow lands. The poll
//! budget is explicit; a stuck instance surfaces as a timeout error
//! instead of hanging the pipeline. When a poll sees a failed state the
//! lifecycle action is retried once; a second failed state stops the
//! run. A state outside the provisioning path stops the run on the
//! spot.

use crate::error::ProvisionError;
use crate::instance::{InstanceInfo, InstanceQuery, InstanceState};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use zpipe_core::{CommandRunner, OutputFormat};

/// A provisioned instance ready for use.
#[derive(Debug, Clone)]
pub struct ProvisionedInstance {
    /// External (registry) name, also the region job name for CICS.
    pub name: String,
    /// Registry object id.
    pub object_id: String,
    /// Variables published by the instance.
    pub variables: BTreeMap<String, String>,
}

/// Drives instances through provision and deprovision workflows.
pub struct Provisioner {
    runner: Arc<dyn CommandRunner>,
    query: InstanceQuery,
    zosmf_profile: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl Provisioner {
    /// Create a provisioner with an explicit poll budget.
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        zosmf_profile: String,
        poll_interval: Duration,
        max_poll_attempts: u32,
    ) -> Self {
        Self {
            query: InstanceQuery::new(runner.clone(), zosmf_profile.clone()),
            runner,
            zosmf_profile,
            poll_interval,
            max_poll_attempts,
        }
    }

    /// Registry queries for the same profile.
    pub fn query(&self) -> &InstanceQuery {
        &self.query
    }

    /// Submit a template for provisioning and return the new instance
    /// name.
    async fn provision_template(&self, template: &str) -> Result<String, ProvisionError> {
        info!(template, "provisioning new instance");
        let result = self
            .runner
            .run(
                &[
                    "provisioning".to_string(),
                    "provision".to_string(),
                    "template".to_string(),
                    template.to_string(),
                    "--zosmf-p".to_string(),
                    self.zosmf_profile.clone(),
                ],
                OutputFormat::Json,
                None,
            )
            .await?;

        if !result.is_clean() {
            return Err(ProvisionError::CommandFailed {
                operation: "provision-template".to_string(),
                stderr: if result.stderr.trim().is_empty() {
                    result.stdout
                } else {
                    result.stderr
                },
            });
        }

        result
            .data
            .as_ref()
            .and_then(|data| data.get("registry-info").unwrap_or(data).get("external-name"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ProvisionError::MissingData {
                operation: "provision-template".to_string(),
                detail: format!("no external-name in response for {template}"),
            })
    }

    /// Poll until the instance is provisioned. A failed state retries
    /// the provision action once.
    pub async fn wait_until_provisioned(
        &self,
        name: &str,
    ) -> Result<InstanceInfo, ProvisionError> {
        let mut retried = false;

        for attempt in 1..=self.max_poll_attempts {
            let info = self
                .query
                .instance_info(name)
                .await?
                .ok_or_else(|| ProvisionError::InstanceVanished {
                    instance: name.to_string(),
                })?;

            match info.state {
                InstanceState::Provisioned => {
                    info!(instance = name, "provisioned");
                    return Ok(info);
                }
                InstanceState::Failed if !retried => {
                    warn!(instance = name, "provisioning failed, retrying the action once");
                    self.query.perform_action(name, "provision").await?;
                    retried = true;
                }
                InstanceState::Failed => {
                    return Err(ProvisionError::ActionFailed {
                        instance: name.to_string(),
                        action: "provision".to_string(),
                    });
                }
                InstanceState::BeingProvisioned => {
                    debug!(instance = name, attempt, "still being provisioned");
                }
                // Any state off the provisioning path (a deprovision in
                // flight, a suspended instance) will never land here on
                // its own; stop immediately instead of polling it out.
                state => {
                    return Err(ProvisionError::UnexpectedState {
                        instance: name.to_string(),
                        state: state.to_string(),
                    });
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        Err(ProvisionError::PollTimeout {
            instance: name.to_string(),
            target: "provisioned".to_string(),
            attempts: self.max_poll_attempts,
        })
    }

    /// Poll until the registry no longer knows the instance. A failed
    /// state retries the deprovision action once.
    pub async fn wait_until_gone(&self, name: &str) -> Result<(), ProvisionError> {
        let mut retried = false;

        for attempt in 1..=self.max_poll_attempts {
            match self.query.instance_info(name).await? {
                None => {
                    info!(instance = name, "deprovisioned");
                    return Ok(());
                }
                Some(info) => match info.state {
                    InstanceState::Failed if !retried => {
                        warn!(instance = name, "deprovisioning failed, retrying the action once");
                        self.query.perform_action(name, "deprovision").await?;
                        retried = true;
                    }
                    InstanceState::Failed => {
                        return Err(ProvisionError::ActionFailed {
                            instance: name.to_string(),
                            action: "deprovision".to_string(),
                        });
                    }
                    state => debug!(instance = name, attempt, %state, "still waiting"),
                },
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        Err(ProvisionError::PollTimeout {
            instance: name.to_string(),
            target: "deprovisioned".to_string(),
            attempts: self.max_poll_attempts,
        })
    }

    /// Poll until the instance's started task shows up active.
    pub async fn wait_until_job_active(&self, job_name: &str) -> Result<(), ProvisionError> {
        for attempt in 1..=self.max_poll_attempts {
            if self.query.job_active(job_name).await? {
                info!(job = job_name, "region job active");
                return Ok(());
            }
            debug!(job = job_name, attempt, "job not active yet");
            tokio::time::sleep(self.poll_interval).await;
        }

        Err(ProvisionError::PollTimeout {
            instance: job_name.to_string(),
            target: "active".to_string(),
            attempts: self.max_poll_attempts,
        })
    }

    /// Start the instance's started task when it is not already
    /// running, then wait for it to show up active.
    pub async fn ensure_job_started(
        &self,
        instance: &str,
        job_name: &str,
    ) -> Result<(), ProvisionError> {
        if self.query.job_active(job_name).await? {
            debug!(job = job_name, "region job already active");
            return Ok(());
        }

        info!(instance, job = job_name, "starting region job");
        self.query.perform_action(instance, "start").await?;
        self.wait_until_job_active(job_name).await
    }

    /// Ensure an instance of the template exists and is provisioned,
    /// reusing one that already is. Returns the instance with its
    /// published variables.
    pub async fn provision(&self, template: &str) -> Result<ProvisionedInstance, ProvisionError> {
        let name = match self.query.provisioned_instance_of(template).await? {
            Some(existing) => {
                info!(instance = %existing, template, "reusing provisioned instance");
                existing
            }
            None => {
                let name = self.provision_template(template).await?;
                self.wait_until_provisioned(&name).await?;
                name
            }
        };

        let info = self
            .query
            .instance_info(&name)
            .await?
            .ok_or_else(|| ProvisionError::InstanceVanished {
                instance: name.clone(),
            })?;
        let variables = self.query.instance_variables(&name).await?;

        Ok(ProvisionedInstance {
            name,
            object_id: info.object_id,
            variables,
        })
    }

    /// Run the deprovision action and wait for the instance to leave
    /// the registry. An instance the registry no longer knows counts
    /// as already deprovisioned.
    pub async fn deprovision(&self, name: &str) -> Result<(), ProvisionError> {
        if self.query.instance_info(name).await?.is_none() {
            info!(instance = name, "already deprovisioned");
            return Ok(());
        }

        info!(instance = name, "deprovisioning");
        self.query.perform_action(name, "deprovision").await?;
        self.wait_until_gone(name).await
    }
}
