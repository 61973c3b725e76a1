//! Element sync and generation.
//!
//! Local source files are pushed into Endevor one element per file,
//! the element name taken from the upper-cased file stem. Generation
//! (compile and link under Endevor processors) answers in a free-text
//! listing; the only reliable success signal is a clean return code at
//! every processing step.

use crate::error::EndevorError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use zpipe_core::config::EndevorConfig;
use zpipe_core::{CommandResult, CommandRunner, OutputFormat};

/// Generation listings report one of these per processing step; a
/// clean run shows at least this many.
const GENERATE_CLEAN_STEPS: usize = 4;

/// Pushes and generates elements for one Endevor location.
pub struct ElementSync {
    runner: Arc<dyn CommandRunner>,
    config: EndevorConfig,
    endevor_profile: String,
}

impl ElementSync {
    /// Create a sync client for the configured location.
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

    fn location_args(&self) -> Vec<String> {
        vec![
            "--environment".to_string(),
            self.config.environment.clone(),
            "--system".to_string(),
            self.config.system.clone(),
            "--subsystem".to_string(),
            self.config.subsystem.clone(),
            "--stage-number".to_string(),
            self.config.stage.to_string(),
            "--instance".to_string(),
            self.config.instance.clone(),
            "--endevor-p".to_string(),
            self.endevor_profile.clone(),
        ]
    }

    async fn run(&self, args: Vec<String>) -> Result<CommandResult, EndevorError> {
        Ok(self.runner.run(&args, OutputFormat::Json, None).await?)
    }

    fn ensure_clean(
        result: CommandResult,
        operation: &str,
        subject: &str,
    ) -> Result<CommandResult, EndevorError> {
        if result.is_clean() {
            Ok(result)
        } else {
            Err(EndevorError::CommandFailed {
                operation: operation.to_string(),
                subject: subject.to_string(),
                stderr: if result.stderr.trim().is_empty() {
                    result.stdout
                } else {
                    result.stderr
                },
            })
        }
    }

    /// Push one source file into Endevor. `verb` is `update` for
    /// existing elements, `add` for first-time creation.
    async fn sync_element(&self, verb: &str, name: &str, file: &Path) -> Result<(), EndevorError> {
        debug!(element = name, file = %file.display(), verb, "pushing element");

        let mut args = vec![
            "endevor".to_string(),
            verb.to_string(),
            "element".to_string(),
            name.to_string(),
            "--type".to_string(),
            self.config.element_type.clone(),
            "--from-file".to_string(),
            file.display().to_string(),
            "--ccid".to_string(),
            self.config.ccid.clone(),
            "--comment".to_string(),
            self.config.comment.clone(),
        ];
        args.extend(self.location_args());

        let result = self.run(args).await?;
        Self::ensure_clean(result, verb, name)?;
        Ok(())
    }

    /// Update one existing element from a source file.
    pub async fn update_element(&self, name: &str, file: &Path) -> Result<(), EndevorError> {
        self.sync_element("update", name, file).await
    }

    /// Add one element for the first time.
    pub async fn add_element(&self, name: &str, file: &Path) -> Result<(), EndevorError> {
        self.sync_element("add", name, file).await
    }

    /// Push every matching source file in the project directory.
    /// Returns the element names pushed.
    pub async fn push_directory(&self) -> Result<Vec<String>, EndevorError> {
        self.sync_directory("update").await
    }

    /// Add every matching source file as a new element.
    pub async fn add_directory(&self) -> Result<Vec<String>, EndevorError> {
        self.sync_directory("add").await
    }

    async fn sync_directory(&self, verb: &str) -> Result<Vec<String>, EndevorError> {
        let dir = &self.config.project_dir;
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|source| EndevorError::SourceDir {
                dir: dir.clone(),
                source,
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.ends_with(&self.config.element_ext))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(EndevorError::NoElements {
                dir: dir.clone(),
                ext: self.config.element_ext.clone(),
            });
        }

        let mut pushed = Vec::with_capacity(files.len());
        for file in files {
            let name = element_name(&file, &self.config.element_ext);
            self.sync_element(verb, &name, &file).await?;
            pushed.push(name);
        }

        info!(count = pushed.len(), %dir, "elements pushed");
        Ok(pushed)
    }

    /// Generate an element and verify every processing step came back
    /// with a clean return code.
    pub async fn generate(&self, name: &str) -> Result<(), EndevorError> {
        info!(element = name, "generating element");

        let mut args = vec![
            "endevor".to_string(),
            "generate".to_string(),
            "element".to_string(),
            name.to_string(),
            "--type".to_string(),
            self.config.element_type.clone(),
            "--ccid".to_string(),
            self.config.ccid.clone(),
            "--comment".to_string(),
            self.config.comment.clone(),
        ];
        args.extend(self.location_args());

        let result = self.run(args).await?;
        let result = Self::ensure_clean(result, "generate", name)?;

        if !generation_clean(&result.stdout) {
            return Err(EndevorError::GenerateFailed {
                element: name.to_string(),
                stdout: result.stdout,
            });
        }
        Ok(())
    }
}

/// Element name derived from a source file: the upper-cased stem.
pub fn element_name(file: &Path, ext: &str) -> String {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    name.strip_suffix(ext).unwrap_or(name).to_uppercase()
}

/// Whether a generation listing shows a clean return code at every
/// processing step.
pub fn generation_clean(stdout: &str) -> bool {
    let pattern = Regex::new(r"(?i)highest endevor rc was 0000").expect("static regex");
    pattern.find_iter(stdout).count() >= GENERATE_CLEAN_STEPS
}

#[cfg(test)]
mod tests {
    use super::*;
    use zpipe_core::fakes::ScriptedRunner;

    fn test_config(project_dir: &str) -> EndevorConfig {
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
            project_dir: project_dir.to_string(),
            ccid: "ZPIPE".to_string(),
            comment: "pipeline delivery".to_string(),
            package: "ZPIPEPKG".to_string(),
            package_scl: "mainframe/scl/package.scl".to_string(),
        }
    }

    fn sync(runner: Arc<ScriptedRunner>, dir: &str) -> ElementSync {
        ElementSync::new(runner, test_config(dir), "mainframe-endevor".to_string())
    }

    #[test]
    fn test_element_name_from_file() {
        assert_eq!(element_name(Path::new("src/zpippgm.cbl"), ".cbl"), "ZPIPPGM");
        assert_eq!(element_name(Path::new("other.txt"), ".cbl"), "OTHER.TXT");
    }

    #[test]
    fn test_generation_clean_needs_every_step() {
        let clean = "STEP1\nHIGHEST ENDEVOR RC WAS 0000\nhighest endevor rc was 0000\n\
                     highest endevor rc was 0000\nhighest endevor rc was 0000";
        assert!(generation_clean(clean));

        let partial = "highest endevor rc was 0000\nhighest endevor rc was 0000\n\
                       highest endevor rc was 0012";
        assert!(!generation_clean(partial));
    }

    #[tokio::test]
    async fn test_push_directory_updates_each_element() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("zpippgm.cbl"), "IDENTIFICATION DIVISION.").unwrap();
        std::fs::write(dir.path().join("zpipsub.cbl"), "IDENTIFICATION DIVISION.").unwrap();
        std::fs::write(dir.path().join("readme.md"), "notes").unwrap();

        let runner = Arc::new(ScriptedRunner::new());
        runner.push_text_ok("element updated");
        runner.push_text_ok("element updated");

        let pushed = sync(runner.clone(), dir.path().to_str().unwrap())
            .push_directory()
            .await
            .unwrap();

        assert_eq!(pushed, vec!["ZPIPPGM".to_string(), "ZPIPSUB".to_string()]);
        assert_eq!(runner.call_count(), 2);
        let call = &runner.calls()[0];
        assert_eq!(call[..4], ["endevor", "update", "element", "ZPIPPGM"]);
        assert!(call.contains(&"--ccid".to_string()));
        assert!(call.contains(&"mainframe-endevor".to_string()));
    }

    #[tokio::test]
    async fn test_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());

        let err = sync(runner, dir.path().to_str().unwrap())
            .push_directory()
            .await
            .unwrap_err();
        assert!(matches!(err, EndevorError::NoElements { .. }));
    }

    #[tokio::test]
    async fn test_generate_rejects_dirty_listing() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_text_ok("highest endevor rc was 0012");

        let err = sync(runner, dir.path().to_str().unwrap())
            .generate("ZPIPPGM")
            .await
            .unwrap_err();
        assert!(matches!(err, EndevorError::GenerateFailed { .. }));
    }
}
