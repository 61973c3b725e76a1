//! Poll-loop behavior against a scripted CLI.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use zpipe_core::fakes::ScriptedRunner;
use zpipe_provision::{ProvisionError, Provisioner};

fn provisioner(runner: Arc<ScriptedRunner>) -> Provisioner {
    Provisioner::new(runner, "mainframe".to_string(), Duration::from_millis(1), 10)
}

fn state(s: &str) -> serde_json::Value {
    json!({"state": s, "object-id": "obj-123"})
}

/// An instance that lands after two pending polls costs exactly three
/// info queries and nothing else.
#[tokio::test]
async fn test_poll_until_provisioned() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_data_ok(state("being-provisioned"));
    runner.push_data_ok(state("being-provisioned"));
    runner.push_data_ok(state("provisioned"));

    let info = provisioner(runner.clone())
        .wait_until_provisioned("CICSAA01")
        .await
        .unwrap();

    assert_eq!(info.object_id, "obj-123");
    assert_eq!(runner.call_count(), 3);
}

/// The first failed state retries the provision action once; the
/// second failed state is fatal, with no further action attempts.
#[tokio::test]
async fn test_failed_state_retries_action_once() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_data_ok(state("being-provisioned"));
    runner.push_data_ok(state("provisioning-failed"));
    runner.push_text_ok("Action performed");
    runner.push_data_ok(state("provisioning-failed"));

    let err = provisioner(runner.clone())
        .wait_until_provisioned("CICSAA01")
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisionError::ActionFailed { .. }));
    // Three info queries plus one action: never a second retry.
    assert_eq!(runner.call_count(), 4);

    let action_call = &runner.calls()[2];
    assert_eq!(
        action_call[..5],
        ["provisioning", "perform", "action", "CICSAA01", "provision"]
    );
}

/// A state outside the provisioning workflow is fatal on the first
/// poll instead of spending the poll budget.
#[tokio::test]
async fn test_unexpected_state_is_immediately_fatal() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_data_ok(state("being-deprovisioned"));

    let err = provisioner(runner.clone())
        .wait_until_provisioned("CICSAA01")
        .await
        .unwrap_err();

    match err {
        ProvisionError::UnexpectedState { state, .. } => {
            assert_eq!(state, "being-deprovisioned")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(runner.call_count(), 1);
}

/// An instance stuck in a pending state exhausts the poll budget and
/// reports a timeout instead of hanging.
#[tokio::test]
async fn test_stuck_instance_times_out() {
    let runner = Arc::new(ScriptedRunner::new());
    for _ in 0..10 {
        runner.push_data_ok(state("being-provisioned"));
    }

    let err = provisioner(runner.clone())
        .wait_until_provisioned("CICSAA01")
        .await
        .unwrap_err();

    match err {
        ProvisionError::PollTimeout { attempts, .. } => assert_eq!(attempts, 10),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(runner.call_count(), 10);
}

/// Deprovisioning polls until the registry forgets the instance.
#[tokio::test]
async fn test_deprovision_waits_for_removal() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_data_ok(state("provisioned"));
    runner.push_text_ok("Action performed");
    runner.push_data_ok(state("being-deprovisioned"));
    runner.push_text_failure("", "No instances found with name CICSAA01");

    provisioner(runner.clone())
        .deprovision("CICSAA01")
        .await
        .unwrap();

    assert_eq!(runner.call_count(), 4);
}

/// Deprovisioning an instance the registry no longer knows is a no-op
/// success.
#[tokio::test]
async fn test_deprovision_of_missing_instance_succeeds() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_text_failure("", "No instances found with name CICSAA01");

    provisioner(runner.clone())
        .deprovision("CICSAA01")
        .await
        .unwrap();

    assert_eq!(runner.call_count(), 1);
}

/// Provisioning reuses an instance the registry already holds for the
/// template instead of submitting it again.
#[tokio::test]
async fn test_provision_reuses_existing_instance() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_data_ok(json!({"scr-list": [
        {"catalog-object-name": "cics_dev_template", "state": "provisioned", "external-name": "CICSAA01"}
    ]}));
    runner.push_data_ok(state("provisioned"));
    runner.push_data_ok(json!([
        {"name": "DFH_REGION_APPLID", "value": "CICSAA01"}
    ]));

    let instance = provisioner(runner.clone())
        .provision("cics_dev_template")
        .await
        .unwrap();

    assert_eq!(instance.name, "CICSAA01");
    assert_eq!(instance.variables["DFH_REGION_APPLID"], "CICSAA01");
    // No "provisioning provision template" call was made.
    assert!(runner
        .calls()
        .iter()
        .all(|call| call.get(1).map(String::as_str) != Some("provision")));
}

/// A fresh provision submits the template, then polls to completion.
#[tokio::test]
async fn test_provision_submits_template_when_absent() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_data_ok(json!({"scr-list": []}));
    runner.push_data_ok(json!({"registry-info": {"external-name": "CICSAA02", "object-id": "obj-456"}}));
    runner.push_data_ok(state("being-provisioned"));
    runner.push_data_ok(state("provisioned"));
    runner.push_data_ok(json!({"state": "provisioned", "object-id": "obj-456"}));
    runner.push_data_ok(json!([]));

    let instance = provisioner(runner.clone())
        .provision("cics_dev_template")
        .await
        .unwrap();

    assert_eq!(instance.name, "CICSAA02");
    assert_eq!(instance.object_id, "obj-456");

    let submit = &runner.calls()[1];
    assert_eq!(submit[..3], ["provisioning", "provision", "template"]);
    assert!(submit.contains(&"cics_dev_template".to_string()));
}
