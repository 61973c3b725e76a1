//! JCL template substitution.
//!
//! Templates carry `@@name##` style variables that are replaced with
//! configured values before the JCL is submitted through stdin.

use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::path::Path;

/// Replace every occurrence of each variable in the template string.
pub fn render_string(template: &str, vars: &BTreeMap<String, String>) -> String {
    let mut rendered = template.to_string();
    for (name, value) in vars {
        rendered = rendered.replace(name, value);
    }
    rendered
}

/// Read a template file and substitute its variables.
pub fn render_file(path: &Path, vars: &BTreeMap<String, String>) -> Result<String, ConfigError> {
    let template = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    Ok(render_string(&template, vars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_replaces_all_occurrences() {
        let template = "//@@job##A JOB\n//STEP EXEC PGM=@@pgm##\n//* @@pgm## again";
        let rendered = render_string(template, &vars(&[("@@job##", "ZP01"), ("@@pgm##", "ZPIPPGM")]));

        assert_eq!(rendered, "//ZP01A JOB\n//STEP EXEC PGM=ZPIPPGM\n//* ZPIPPGM again");
    }

    #[test]
    fn test_render_leaves_unknown_text_alone() {
        let rendered = render_string("plain text", &vars(&[("@@x##", "y")]));
        assert_eq!(rendered, "plain text");
    }

    #[test]
    fn test_render_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("copy.jcl");
        std::fs::write(&path, "//JOB @@account##").unwrap();

        let rendered = render_file(&path, &vars(&[("@@account##", "ACCT1")])).unwrap();
        assert_eq!(rendered, "//JOB ACCT1");
    }
}
