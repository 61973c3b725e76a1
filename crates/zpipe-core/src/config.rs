//! Pipeline configuration.
//!
//! A single YAML file (`zpipe.yaml` by default) describes the target
//! system, CLI profiles, CICS region, Endevor project and provisioning
//! templates. The configuration is loaded once in `main` and passed
//! explicitly into every component - there is no process-wide cache.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host credentials shared by FTP and JCL substitution.
    pub system: SystemConfig,

    /// External CLI settings.
    #[serde(default)]
    pub cli: CliConfig,

    /// CICS region and resource names.
    pub cics: CicsConfig,

    /// DB2 subsystem settings.
    pub db2: Db2Config,

    /// Endevor project coordinates.
    pub endevor: EndevorConfig,

    /// z/OSMF provisioning settings.
    pub provisioning: ProvisioningConfig,

    /// Job card values substituted into JCL templates.
    pub zos_jobs: JobCardConfig,

    /// Java/OSGi deliverable settings.
    pub java: JavaConfig,

    /// Web application server deliverable settings.
    pub server: ServerConfig,

    /// Local and generated file locations.
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load the configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    /// Derived CLI profile names for each plugin group.
    pub fn profiles(&self) -> ProfileNames {
        ProfileNames::new(&self.cli.profile)
    }
}

/// Target host and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Mainframe host name.
    pub host: String,
    /// TSO user id.
    pub user: String,
    /// Password; usually injected via the pipeline secret store.
    pub pass: String,
    /// Accounting information for job cards.
    #[serde(default)]
    pub account: String,
}

/// External CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Binary to spawn for every mainframe operation.
    #[serde(default = "default_program")]
    pub program: String,
    /// Base profile name; plugin profiles derive from it.
    #[serde(default = "default_profile")]
    pub profile: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            profile: default_profile(),
        }
    }
}

fn default_program() -> String {
    "zowe".to_string()
}

fn default_profile() -> String {
    "mainframe".to_string()
}

/// CICS region and resource names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CicsConfig {
    /// Static CICS region APPLID (used when no instance was provisioned).
    pub region: String,
    /// CSD group owning our definitions.
    pub group: String,
    /// CSD list name used by install commands.
    pub csd: String,
    /// Static load library (overridden by a provisioned region's RPL).
    pub loadlib: String,
    /// DB2CONN resource name.
    pub db2conn_name: String,
    /// MQCONN resource name.
    pub mqconn_name: String,
    /// MQ queue manager name.
    pub mq_name: String,
    /// MQ initiation queue name.
    pub initq_name: String,
    /// Bridge facility namespace file name.
    pub bridge_file_name: String,
    /// CSD group the bridge file is copied from.
    pub bridge_file_group: String,
    /// High-level qualifier of the bridge file data set.
    pub bridge_file_hlq: String,
    /// Bridge monitor transaction id.
    #[serde(default = "default_bridge_transaction")]
    pub bridge_transaction: String,
    /// COBOL deliverable names.
    pub cobol: CobolConfig,
}

fn default_bridge_transaction() -> String {
    "CKBR".to_string()
}

/// COBOL program deliverable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CobolConfig {
    /// CICS program name.
    pub program: String,
    /// DB2 plan bound for the program.
    pub plan: String,
}

/// DB2 subsystem settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Db2Config {
    /// DB2 subsystem id.
    pub region: String,
    /// Region data set prefix for bind JCL.
    pub hlq: String,
}

/// Endevor project coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndevorConfig {
    /// Endevor web-services instance.
    pub instance: String,
    /// Environment name.
    pub environment: String,
    /// System name.
    pub system: String,
    /// Subsystem name.
    pub subsystem: String,
    /// Stage number.
    pub stage: u8,
    /// Element being delivered.
    pub element: String,
    /// Element type (e.g. COBOL).
    pub element_type: String,
    /// Source file extension for the element.
    pub element_ext: String,
    /// High-level qualifier of Endevor data sets.
    pub hlq: String,
    /// Local directory holding Endevor-controlled source.
    pub project_dir: String,
    /// CCID recorded on element updates.
    #[serde(default = "default_ccid")]
    pub ccid: String,
    /// Comment recorded on element updates.
    #[serde(default = "default_comment")]
    pub comment: String,
    /// Package name for promotion.
    pub package: String,
    /// SCL file enumerating the package elements.
    pub package_scl: String,
}

fn default_ccid() -> String {
    "ZPIPE".to_string()
}

fn default_comment() -> String {
    "pipeline delivery".to_string()
}

/// z/OSMF provisioning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    /// Logical id recorded in the generated properties file (e.g. CICS).
    pub instance_id: String,
    /// Software services template to provision.
    pub template: String,
    /// Seconds between state polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Polls before a stuck instance is reported as a timeout.
    #[serde(default = "default_max_polls")]
    pub max_poll_attempts: u32,
}

fn default_poll_interval() -> u64 {
    10
}

fn default_max_polls() -> u32 {
    180
}

/// Job card values substituted into JCL templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCardConfig {
    /// Prefix for generated job names.
    pub job_name_prefix: String,
    /// Job class.
    pub job_class: String,
    /// Message class.
    pub msgclass: String,
}

/// Java/OSGi deliverable settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JavaConfig {
    /// JVMSERVER resource name.
    pub jvm_server: String,
    /// JVM profile for the server.
    pub jvm_profile: String,
    /// BUNDLE resource name.
    pub bundle_name: String,
    /// zFS directory receiving bundles.
    pub bundle_dir: String,
    /// OSGi bundle symbolic name.
    pub bundle_package: String,
    /// OSGi bundle version.
    pub bundle_version: String,
    /// CICS program backed by the bundle.
    pub program_name: String,
    /// Java class implementing the program.
    pub program_class: String,
    /// Transaction that drives the program.
    pub transaction_name: String,
    /// Local directory of the Java source tree.
    pub location: String,
}

impl JavaConfig {
    /// Remote directory for the deployed bundle, versioned like
    /// `<bundle_dir><package>_<version>/`.
    pub fn deployed_bundle_dir(&self) -> String {
        format!(
            "{}{}_{}/",
            self.bundle_dir, self.bundle_package, self.bundle_version
        )
    }
}

/// Web application server deliverable settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Provisioned instance name hosting the server.
    pub instance_name: String,
    /// Local WAR file produced by the gradle build.
    pub war_source: String,
    /// WAR destination relative to the server directory.
    pub war_destination: String,
    /// Server config destination relative to the server directory.
    pub config_destination: String,
    /// Default server configuration file stem.
    #[serde(default = "default_config_file")]
    pub config_file: String,
}

fn default_config_file() -> String {
    "conf-deploy".to_string()
}

/// Local and generated file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Generated properties file updated after provisioning.
    #[serde(default = "default_gen_properties")]
    pub generated_properties: String,
    /// Directory holding JCL templates.
    #[serde(default = "default_jcl_dir")]
    pub jcl_dir: String,
    /// Web server project directory (gradle build).
    #[serde(default = "default_webserver_dir")]
    pub webserver_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            generated_properties: default_gen_properties(),
            jcl_dir: default_jcl_dir(),
            webserver_dir: default_webserver_dir(),
        }
    }
}

fn default_gen_properties() -> String {
    "generated.properties.json".to_string()
}

fn default_jcl_dir() -> String {
    "mainframe/jcl".to_string()
}

fn default_webserver_dir() -> String {
    "webserver".to_string()
}

/// CLI profile names derived from the configured base profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileNames {
    base: String,
}

impl ProfileNames {
    /// Derive plugin profile names from a base name.
    pub fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
        }
    }

    /// The z/OSMF profile name.
    pub fn zosmf(&self) -> String {
        self.base.clone()
    }

    /// The TSO profile name.
    pub fn tso(&self) -> String {
        format!("{}-tso", self.base)
    }

    /// The CICS profile name.
    pub fn cics(&self) -> String {
        format!("{}-cics", self.base)
    }

    /// The DB2 profile name.
    pub fn db2(&self) -> String {
        format!("{}-db2", self.base)
    }

    /// The Endevor profile name.
    pub fn endevor(&self) -> String {
        format!("{}-endevor", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
system:
  host: mf.example.com
  user: ibmuser
  pass: secret
  account: ACCT1
cics:
  region: CICSAA01
  group: ZPIPE
  csd: CSDLIST
  loadlib: IBMUSER.CICS.LOADLIB
  db2conn_name: ZPIPDB2
  mqconn_name: ZPIPMQ
  mq_name: MQ01
  initq_name: ZPIPE.INITQ
  bridge_file_name: ZPIPBRF
  bridge_file_group: DFHMQ
  bridge_file_hlq: IBMUSER.BRIDGE
  cobol:
    program: ZPIPPGM
    plan: ZPIPPLAN
db2:
  region: DB2A
  hlq: DSNA10
endevor:
  instance: WEBSNDVR
  environment: DEV
  system: ZPIPE
  subsystem: ZPIPE
  stage: 1
  element: ZPIPPGM
  element_type: COBOL
  element_ext: .cbl
  hlq: NDVR
  project_dir: mainframe/endevor
  package: ZPIPEPKG
  package_scl: mainframe/scl/package.scl
provisioning:
  instance_id: CICS
  template: cics_dev_template
zos_jobs:
  job_name_prefix: ZP
  job_class: A
  msgclass: X
java:
  jvm_server: ZPIPJVM
  jvm_profile: DFHOSGI
  bundle_name: ZPIPBND
  bundle_dir: /u/ibmuser/bundles/
  bundle_package: com.example.zpipe
  bundle_version: 1.0.0
  program_name: ZPIPJAVA
  program_class: com.example.zpipe.Main
  transaction_name: ZPJT
  location: javasrc
server:
  instance_name: WAS_INST1
  war_source: webserver/build/libs/app.war
  war_destination: dropins/app.war
  config_destination: resources/config/app.yaml
"#;

    #[test]
    fn test_load_sample_config() {
        let config: Config = serde_yaml::from_str(SAMPLE).unwrap();

        assert_eq!(config.system.host, "mf.example.com");
        assert_eq!(config.cli.program, "zowe");
        assert_eq!(config.cics.bridge_transaction, "CKBR");
        assert_eq!(config.provisioning.poll_interval_secs, 10);
        assert_eq!(config.paths.generated_properties, "generated.properties.json");
        assert_eq!(config.endevor.stage, 1);
    }

    #[test]
    fn test_profile_names_derive_from_base() {
        let profiles = ProfileNames::new("mainframe");

        assert_eq!(profiles.zosmf(), "mainframe");
        assert_eq!(profiles.cics(), "mainframe-cics");
        assert_eq!(profiles.db2(), "mainframe-db2");
        assert_eq!(profiles.endevor(), "mainframe-endevor");
        assert_eq!(profiles.tso(), "mainframe-tso");
    }

    #[test]
    fn test_deployed_bundle_dir_is_versioned() {
        let config: Config = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(
            config.java.deployed_bundle_dir(),
            "/u/ibmuser/bundles/com.example.zpipe_1.0.0/"
        );
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = Config::from_file(Path::new("/nonexistent/zpipe.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/zpipe.yaml"));
    }
}
