//! Local tool execution (gradle, npm).
//!
//! Unlike the mainframe CLI, local build tools stream their output
//! straight to the operator's terminal; we only care about the exit
//! status.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Run a local command with inherited stdio, returning its exit code.
pub async fn run_local(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
) -> std::io::Result<i32> {
    debug!(%program, args = %args.join(" "), "running local command");

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let status = command.spawn()?.wait().await?;
    Ok(status.code().unwrap_or(-1))
}

/// Run the gradle wrapper inside a project directory.
pub async fn run_gradle(project_dir: &Path, args: &[&str]) -> std::io::Result<i32> {
    let wrapper = if cfg!(windows) {
        "gradlew.bat"
    } else {
        "./gradlew"
    };
    run_local(wrapper, args, Some(project_dir)).await
}

/// Run npm inside a project directory.
pub async fn run_npm(project_dir: &Path, args: &[&str]) -> std::io::Result<i32> {
    run_local("npm", args, Some(project_dir)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_local_success() {
        let rc = run_local("true", &[], None).await.unwrap();
        assert_eq!(rc, 0);
    }

    #[tokio::test]
    async fn test_run_local_failure() {
        let rc = run_local("false", &[], None).await.unwrap();
        assert_ne!(rc, 0);
    }

    #[tokio::test]
    async fn test_run_local_missing_binary() {
        assert!(run_local("definitely-not-a-real-binary-xyz", &[], None)
            .await
            .is_err());
    }
}
