//! Scripted CLI fakes for tests.
//!
//! [`ScriptedRunner`] replays a queue of canned results and records the
//! argument vectors (and stdin text) it receives, letting downstream
//! crates assert on the exact sequence of CLI invocations without a
//! mainframe.

use crate::error::InvokeError;
use crate::invoker::{CommandResult, CommandRunner, OutputFormat};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A queue-of-canned-results fake [`CommandRunner`].
#[derive(Default)]
pub struct ScriptedRunner {
    responses: Mutex<VecDeque<Result<CommandResult, InvokeError>>>,
    calls: Mutex<Vec<Vec<String>>>,
    stdin_texts: Mutex<Vec<Option<String>>>,
}

impl ScriptedRunner {
    /// Create an empty scripted runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a clean text-mode success with the given stdout.
    pub fn push_text_ok(&self, stdout: &str) {
        self.push_result(CommandResult {
            success: true,
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
            data: None,
        });
    }

    /// Queue a failed invocation with the given stdout and stderr.
    pub fn push_text_failure(&self, stdout: &str, stderr: &str) {
        self.push_result(CommandResult {
            success: false,
            exit_code: 1,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            data: None,
        });
    }

    /// Queue a success carrying a structured payload.
    pub fn push_data_ok(&self, data: serde_json::Value) {
        self.push_result(CommandResult {
            success: true,
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            data: Some(data),
        });
    }

    /// Queue an arbitrary result.
    pub fn push_result(&self, result: CommandResult) {
        self.responses
            .lock()
            .expect("scripted runner poisoned")
            .push_back(Ok(result));
    }

    /// Queue an invocation error.
    pub fn push_error(&self, error: InvokeError) {
        self.responses
            .lock()
            .expect("scripted runner poisoned")
            .push_back(Err(error));
    }

    /// Argument vectors received so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().expect("scripted runner poisoned").clone()
    }

    /// Stdin text received per call, in order.
    pub fn stdin_texts(&self) -> Vec<Option<String>> {
        self.stdin_texts
            .lock()
            .expect("scripted runner poisoned")
            .clone()
    }

    /// Number of invocations received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("scripted runner poisoned").len()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        args: &[String],
        _format: OutputFormat,
        stdin: Option<&str>,
    ) -> Result<CommandResult, InvokeError> {
        self.calls
            .lock()
            .expect("scripted runner poisoned")
            .push(args.to_vec());
        self.stdin_texts
            .lock()
            .expect("scripted runner poisoned")
            .push(stdin.map(|s| s.to_string()));

        self.responses
            .lock()
            .expect("scripted runner poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                panic!(
                    "scripted runner exhausted; unexpected call: {}",
                    args.join(" ")
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_runner_replays_in_order() {
        let runner = ScriptedRunner::new();
        runner.push_text_ok("first");
        runner.push_text_ok("second");

        let a = runner
            .run(&["one".to_string()], OutputFormat::Text, None)
            .await
            .unwrap();
        let b = runner
            .run(&["two".to_string()], OutputFormat::Text, Some("in"))
            .await
            .unwrap();

        assert_eq!(a.stdout, "first");
        assert_eq!(b.stdout, "second");
        assert_eq!(runner.calls(), vec![vec!["one"], vec!["two"]]);
        assert_eq!(runner.stdin_texts()[1].as_deref(), Some("in"));
    }
}
