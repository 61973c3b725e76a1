//! End-to-end reconciler behavior against a scripted CLI.

use std::sync::Arc;
use zpipe_cics::{CicsClient, CicsError, ResourceDescriptor, ResourceType, Reconciler};
use zpipe_core::config::{CicsConfig, CobolConfig};
use zpipe_core::fakes::ScriptedRunner;

fn test_config() -> CicsConfig {
    CicsConfig {
        region: "CICSAA01".to_string(),
        group: "ZPIPE".to_string(),
        csd: "CSDLIST".to_string(),
        loadlib: "IBMUSER.LOADLIB".to_string(),
        db2conn_name: "ZPIPDB2".to_string(),
        mqconn_name: "ZPIPMQ".to_string(),
        mq_name: "MQ01".to_string(),
        initq_name: "ZPIPE.INITQ".to_string(),
        bridge_file_name: "ZPIPBRF".to_string(),
        bridge_file_group: "DFHMQ".to_string(),
        bridge_file_hlq: "IBMUSER.BRIDGE".to_string(),
        bridge_transaction: "CKBR".to_string(),
        cobol: CobolConfig {
            program: "ZPIPPGM".to_string(),
            plan: "ZPIPPLAN".to_string(),
        },
    }
}

fn client(runner: Arc<ScriptedRunner>) -> CicsClient {
    CicsClient::new(runner, &test_config(), "mainframe-cics".to_string())
}

fn jvmserver() -> ResourceDescriptor {
    ResourceDescriptor::new(ResourceType::JvmServer, "ZPIPJVM", "ZPIPE")
}

/// A resource absent at every tier remediates with exactly six CLI
/// invocations: query, enable, install, define, install, enable.
#[tokio::test]
async fn test_full_remediation_is_six_invocations() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_text_ok("1 record(s) NOT FOUND");
    runner.push_text_ok("JVMSERVER(ZPIPJVM) NOT FOUND");
    runner.push_text_ok("CSD does not contain entry ZPIPJVM");
    runner.push_text_ok("DEFINE JVMSERVER(ZPIPJVM)\nHIGHEST RETURN CODE WAS: 0");
    runner.push_text_ok("INSTALL SUCCESSFUL for JVMSERVER(ZPIPJVM)");
    runner.push_text_ok("RESPONSE: NORMAL");

    let client = client(runner.clone());
    Reconciler::new(&client)
        .prepare(&jvmserver(), &["JVMPROFILE(DFHOSGI)".to_string()])
        .await
        .unwrap();

    let calls = runner.calls();
    assert_eq!(calls.len(), 6);
    assert_eq!(calls[0][..3], ["cics", "get", "resource"]);
    assert_eq!(calls[1][..3], ["console", "issue", "cmd"]);
    assert_eq!(calls[2][..2], ["cics", "install"]);
    assert_eq!(calls[3][..3], ["cics", "submit", "dfhcsdup"]);
    assert_eq!(calls[4][..2], ["cics", "install"]);
    assert_eq!(calls[5][..3], ["console", "issue", "cmd"]);
    assert!(calls[3]
        .iter()
        .any(|arg| arg == "DEFINE JVMSERVER(ZPIPJVM) GROUP(ZPIPE) JVMPROFILE(DFHOSGI)"));
}

/// An already-usable resource costs exactly one query and nothing else.
#[tokio::test]
async fn test_enabled_resource_is_left_alone() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_text_ok("JVMSERVER(ZPIPJVM) STATUS(ENABLED)");

    let client = client(runner.clone());
    Reconciler::new(&client)
        .prepare(&jvmserver(), &[])
        .await
        .unwrap();

    assert_eq!(runner.call_count(), 1);
}

/// A tier that fails twice stops the run; there is never a third
/// attempt at the same tier.
#[tokio::test]
async fn test_second_install_failure_is_fatal() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_text_ok("1 record(s) NOT FOUND");
    runner.push_text_ok("JVMSERVER(ZPIPJVM) NOT FOUND");
    runner.push_text_ok("CSD does not contain entry ZPIPJVM");
    runner.push_text_ok("HIGHEST RETURN CODE WAS: 0");
    runner.push_text_ok("install unsuccessful: see CSD log");

    let client = client(runner.clone());
    let err = Reconciler::new(&client)
        .prepare(&jvmserver(), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, CicsError::ReconcileFailed { .. }));
    // Five invocations and no more: the second install failure ended
    // the run before the final enable.
    assert_eq!(runner.call_count(), 5);
}

/// A failed definition (return code above 4) is fatal before any
/// install retry happens.
#[tokio::test]
async fn test_define_failure_is_fatal() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_text_ok("1 record(s) NOT FOUND");
    runner.push_text_ok("JVMSERVER(ZPIPJVM) NOT FOUND");
    runner.push_text_ok("CSD does not contain entry ZPIPJVM");
    runner.push_text_ok("DEFINE JVMSERVER(ZPIPJVM)\nHIGHEST RETURN CODE WAS: 8");

    let client = client(runner.clone());
    let err = Reconciler::new(&client)
        .prepare(&jvmserver(), &[])
        .await
        .unwrap_err();

    match err {
        CicsError::CsdFailed { rc, .. } => assert_eq!(rc, 8),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(runner.call_count(), 4);
}

/// An enable that cannot land even after a successful install is fatal.
#[tokio::test]
async fn test_second_enable_failure_is_fatal() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_text_ok("1 record(s) NOT FOUND");
    runner.push_text_ok("JVMSERVER(ZPIPJVM) NOT FOUND");
    runner.push_text_ok("INSTALL SUCCESSFUL for JVMSERVER(ZPIPJVM)");
    runner.push_text_ok("JVMSERVER(ZPIPJVM) NOT ENABLED error");

    let client = client(runner.clone());
    let err = Reconciler::new(&client)
        .prepare(&jvmserver(), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, CicsError::ReconcileFailed { .. }));
    assert_eq!(runner.call_count(), 4);
}

/// Bundle-style resources install through CEDA INSTALL modify commands.
#[tokio::test]
async fn test_modify_install_uses_ceda() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_text_ok("1 record(s) NOT FOUND");
    runner.push_text_ok("BUNDLE(ZPIPBND) NOT FOUND");
    runner.push_text_ok("INSTALL SUCCESSFUL");
    runner.push_text_ok("RESPONSE: NORMAL");

    let bundle = ResourceDescriptor::new(ResourceType::Bundle, "ZPIPBND", "ZPIPE");
    let client = client(runner.clone());
    Reconciler::new(&client)
        .with_modify_install()
        .prepare(&bundle, &[])
        .await
        .unwrap();

    let calls = runner.calls();
    assert_eq!(calls[2][..3], ["cics", "issue", "modify"]);
    assert!(calls[2]
        .iter()
        .any(|arg| arg == "CEDA INSTALL BUNDLE(ZPIPBND) GROUP(ZPIPE)"));
}
