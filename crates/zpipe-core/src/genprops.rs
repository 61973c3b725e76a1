//! Generated properties file.
//!
//! Provisioning writes the identity of each instance it creates into a
//! small JSON document keyed by logical id (`CICS`, `WAS`, ...). The
//! file is always read-modify-write merged, never overwritten wholesale,
//! so instances recorded by earlier runs survive.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Identity of one provisioned instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    /// External name of the provisioned instance.
    pub name: String,
    /// Template it was provisioned from.
    pub template: String,
    /// Registry object id (UUID) assigned by z/OSMF.
    #[serde(rename = "objectId")]
    pub object_id: String,
}

/// The generated properties document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedProperties {
    /// Instances keyed by logical id.
    #[serde(default)]
    pub instances: BTreeMap<String, InstanceRecord>,
}

impl GeneratedProperties {
    /// Load the document; `Ok(None)` when the file does not exist yet.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let props = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })?;

        Ok(Some(props))
    }

    /// Look up the instance recorded under a logical id.
    pub fn instance(&self, id: &str) -> Option<&InstanceRecord> {
        self.instances.get(id)
    }

    /// Merge one instance record under a logical id and persist.
    ///
    /// Existing entries for other ids are preserved; an existing entry
    /// for the same id is replaced.
    pub fn record_instance(
        path: &Path,
        id: &str,
        record: InstanceRecord,
    ) -> Result<Self, ConfigError> {
        let mut props = Self::load(path)?.unwrap_or_default();
        props.instances.insert(id.to_string(), record);

        let text = serde_json::to_string_pretty(&props).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })?;

        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Ok(props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(name: &str) -> InstanceRecord {
        InstanceRecord {
            name: name.to_string(),
            template: "cics_dev_template".to_string(),
            object_id: "a9a5165d-507d-4fb2-a734-cdd2877b312b".to_string(),
        }
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("generated.properties.json");
        assert!(GeneratedProperties::load(&path).unwrap().is_none());
    }

    #[test]
    fn test_record_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("generated.properties.json");

        let props = GeneratedProperties::record_instance(&path, "CICS", record("CICS_INST1")).unwrap();
        assert_eq!(props.instance("CICS").unwrap().name, "CICS_INST1");

        let reloaded = GeneratedProperties::load(&path).unwrap().unwrap();
        assert_eq!(reloaded, props);
    }

    #[test]
    fn test_record_merges_with_existing_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("generated.properties.json");

        GeneratedProperties::record_instance(&path, "CICS", record("CICS_INST1")).unwrap();
        let props = GeneratedProperties::record_instance(&path, "WAS", record("WAS_INST1")).unwrap();

        // Both instances survive the second write.
        assert_eq!(props.instance("CICS").unwrap().name, "CICS_INST1");
        assert_eq!(props.instance("WAS").unwrap().name, "WAS_INST1");
    }

    #[test]
    fn test_record_replaces_same_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("generated.properties.json");

        GeneratedProperties::record_instance(&path, "CICS", record("CICS_OLD")).unwrap();
        let props = GeneratedProperties::record_instance(&path, "CICS", record("CICS_NEW")).unwrap();

        assert_eq!(props.instances.len(), 1);
        assert_eq!(props.instance("CICS").unwrap().name, "CICS_NEW");
    }

    #[test]
    fn test_object_id_uses_camel_case_key() {
        let json = serde_json::to_string(&record("X")).unwrap();
        assert!(json.contains("\"objectId\""));
    }
}
