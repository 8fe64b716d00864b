use crate::domain::constants::{
    MON_BACKUP_PATH, MON_MAP_PATH, ZK_BACKUP_PATH, ZK_CONF_PATH, ZK_SERVICE_UNIT,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

/// The surviving node the session operates on. Built once from operator
/// input, immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    /// Fully-qualified hostname, used for ssh addressing.
    pub hostname: String,
    /// Portion before the first `.`, used as the member identifier in both
    /// subsystems' maps.
    pub shortname: String,
}

impl Node {
    pub fn new(hostname: &str) -> Self {
        let shortname = hostname.split('.').next().unwrap_or(hostname).to_string();
        Self {
            hostname: hostname.to_string(),
            shortname,
        }
    }
}

/// One consensus subsystem being forced down to a single member.
#[derive(Debug, Clone, Serialize)]
pub struct Subsystem {
    pub name: String,
    pub service_unit: String,
    pub map_path: String,
    pub backup_path: String,
}

impl Subsystem {
    /// The Ceph monitor quorum. The service unit is templated on the node's
    /// shortname, which is also the monitor's identity.
    pub fn monitor(node: &Node) -> Self {
        Self {
            name: "ceph-mon".to_string(),
            service_unit: format!("ceph-mon@{}", node.shortname),
            map_path: MON_MAP_PATH.to_string(),
            backup_path: MON_BACKUP_PATH.to_string(),
        }
    }

    /// The Zookeeper ensemble.
    pub fn ensemble() -> Self {
        Self {
            name: "zookeeper".to_string(),
            service_unit: ZK_SERVICE_UNIT.to_string(),
            map_path: ZK_CONF_PATH.to_string(),
            backup_path: ZK_BACKUP_PATH.to_string(),
        }
    }

    /// In-place sibling of the live map kept as a second line of defense
    /// alongside the explicit backup.
    pub fn orig_path(&self) -> String {
        format!("{}.orig", self.map_path)
    }
}

/// One quorum participant as recorded in a subsystem's map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEntry {
    pub id: String,
    pub address: Option<String>,
}

/// Recovery phases in their fixed order. A subsystem's outcome records the
/// prefix of this sequence it completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Stopped,
    BackedUp,
    Extracted,
    Filtered,
    Injected,
    Restarted,
    Verified,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Stopped => "stopped",
            Phase::BackedUp => "backed_up",
            Phase::Extracted => "extracted",
            Phase::Filtered => "filtered",
            Phase::Injected => "injected",
            Phase::Restarted => "restarted",
            Phase::Verified => "verified",
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RecoveryError {
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error("backup failed: {0}")]
    Backup(String),
    #[error("membership map unusable: {0}")]
    Codec(String),
    #[error("map injection failed: {0}")]
    Injection(String),
    #[error("service control failed: {0}")]
    ServiceControl(String),
}

impl RecoveryError {
    pub fn kind(&self) -> &'static str {
        match self {
            RecoveryError::Precondition(_) => "precondition",
            RecoveryError::Backup(_) => "backup",
            RecoveryError::Codec(_) => "codec",
            RecoveryError::Injection(_) => "injection",
            RecoveryError::ServiceControl(_) => "service_control",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub kind: String,
    pub message: String,
}

impl From<&RecoveryError> for Failure {
    fn from(err: &RecoveryError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Per-subsystem result: which phases completed, what stopped the sequence,
/// and the paths the restoration plan needs.
#[derive(Debug, Clone, Serialize)]
pub struct SubsystemOutcome {
    pub subsystem: String,
    pub service_unit: String,
    pub completed: Vec<Phase>,
    pub failure: Option<Failure>,
    pub map_path: String,
    pub backup_path: String,
    pub orig_path: String,
}

impl SubsystemOutcome {
    pub fn new(subsystem: &Subsystem) -> Self {
        Self {
            subsystem: subsystem.name.clone(),
            service_unit: subsystem.service_unit.clone(),
            completed: Vec::new(),
            failure: None,
            map_path: subsystem.map_path.clone(),
            backup_path: subsystem.backup_path.clone(),
            orig_path: subsystem.orig_path(),
        }
    }

    pub fn reached(&self, phase: Phase) -> bool {
        self.completed.contains(&phase)
    }
}

/// The whole run. Discarded at process exit; the durable residue is the
/// backup files on the remote host, the printed restoration plan and the
/// local audit log.
#[derive(Debug, Serialize)]
pub struct RecoverySession {
    pub cluster: String,
    pub node: Node,
    pub outcomes: Vec<SubsystemOutcome>,
    /// Whether `ceph osd set noout` was applied.
    pub redundancy_guard_suspended: bool,
    pub cluster_status: Option<String>,
    pub restoration_plan: Vec<String>,
}

impl RecoverySession {
    pub fn fully_recovered(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.failure.is_none() && o.reached(Phase::Verified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortname_is_first_label() {
        let node = Node::new("hv1.cluster.example.com");
        assert_eq!(node.shortname, "hv1");
        assert_eq!(node.hostname, "hv1.cluster.example.com");
    }

    #[test]
    fn shortname_of_bare_hostname_is_itself() {
        assert_eq!(Node::new("hv1").shortname, "hv1");
    }

    #[test]
    fn monitor_unit_is_templated_on_shortname() {
        let sub = Subsystem::monitor(&Node::new("hv1.example.com"));
        assert_eq!(sub.service_unit, "ceph-mon@hv1");
        assert_eq!(sub.orig_path(), "/var/tmp/monmap.orig");
    }
}
