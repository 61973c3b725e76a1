//! CICS resource identification.

use std::fmt;

/// The CICS-managed object kinds this pipeline touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// Application program.
    Program,
    /// Local transaction.
    Transaction,
    /// JVM server hosting OSGi bundles.
    JvmServer,
    /// OSGi bundle.
    Bundle,
    /// DB2 connection.
    Db2Conn,
    /// MQ connection.
    MqConn,
    /// VSAM/namespace file.
    File,
}

impl ResourceType {
    /// Lower-case name used as a CLI subcommand argument.
    pub fn cli_name(&self) -> &'static str {
        match self {
            ResourceType::Program => "program",
            ResourceType::Transaction => "transaction",
            ResourceType::JvmServer => "jvmserver",
            ResourceType::Bundle => "bundle",
            ResourceType::Db2Conn => "db2conn",
            ResourceType::MqConn => "mqconn",
            ResourceType::File => "file",
        }
    }

    /// Upper-case keyword used in CEMT and DFHCSDUP statements.
    pub fn csd_name(&self) -> &'static str {
        match self {
            ResourceType::Program => "PROGRAM",
            ResourceType::Transaction => "TRANSACTION",
            ResourceType::JvmServer => "JVMSERVER",
            ResourceType::Bundle => "BUNDLE",
            ResourceType::Db2Conn => "DB2CONN",
            ResourceType::MqConn => "MQCONN",
            ResourceType::File => "FILE",
        }
    }

    /// CMCI resource table and key attribute used by `cics get resource`.
    pub fn query_table(&self) -> (&'static str, &'static str) {
        match self {
            ResourceType::Program => ("CICSProgram", "PROGRAM"),
            ResourceType::Transaction => ("CICSLocalTransaction", "TRANID"),
            ResourceType::JvmServer => ("CICSJVMServer", "JVMSERVER"),
            ResourceType::Bundle => ("CICSBundle", "BUNDLE"),
            ResourceType::Db2Conn => ("CICSDB2Connection", "DB2CONN"),
            ResourceType::MqConn => ("CICSMQConnection", "MQCONN"),
            ResourceType::File => ("CICSFile", "FILE"),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.csd_name())
    }
}

/// Identifies one CICS-managed object. Constructed per call from
/// configuration, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Kind of resource.
    pub rtype: ResourceType,
    /// Resource name (upper-cased on the wire where CICS requires it).
    pub name: String,
    /// CSD group owning the definition.
    pub group: String,
}

impl ResourceDescriptor {
    /// Create a descriptor.
    pub fn new(rtype: ResourceType, name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            rtype,
            name: name.into(),
            group: group.into(),
        }
    }
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.rtype, self.name)
    }
}

/// Desired availability state for `CEMT SET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// Resource available for use.
    Enabled,
    /// Resource unavailable.
    Disabled,
}

impl ResourceState {
    /// Keyword placed in the CEMT SET command.
    pub fn cemt_keyword(&self) -> &'static str {
        match self {
            ResourceState::Enabled => "ENABLED",
            ResourceState::Disabled => "DISABLED",
        }
    }
}
