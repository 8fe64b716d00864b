//! Single source of truth for remote paths, service units and timing.
//!
//! Every path referenced by the recovery steps and by the restoration plan
//! comes from here, so the plan can never drift from what was actually
//! written on the remote host.

/// Working copy of the monitor map during editing. Lives in /var/tmp so it
/// survives a reboot of the degraded node.
pub const MON_MAP_PATH: &str = "/var/tmp/monmap";

/// Pristine monitor map extracted before any mutation.
pub const MON_BACKUP_PATH: &str = "/var/tmp/monmap.backup";

/// Live Zookeeper ensemble configuration.
pub const ZK_CONF_PATH: &str = "/etc/zookeeper/conf/zoo.cfg";

/// Pristine ensemble configuration copied before any mutation.
pub const ZK_BACKUP_PATH: &str = "/var/tmp/zoo.cfg.backup";

/// Ensemble service unit. The monitor unit is templated per node and built
/// in `Subsystem::monitor`.
pub const ZK_SERVICE_UNIT: &str = "zookeeper";

/// Seconds to wait after a service start for single-node quorum formation.
/// A fixed delay, not a correctness guarantee.
pub const DEFAULT_SETTLE_SECS: u64 = 5;

/// Seconds ssh waits for a connection before giving up.
pub const SSH_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Binaries that must exist on the remote host before anything is mutated.
pub const REQUIRED_REMOTE_TOOLS: &[&str] = &["ceph-mon", "monmaptool", "systemctl"];
