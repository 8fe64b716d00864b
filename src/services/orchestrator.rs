use crate::domain::constants::REQUIRED_REMOTE_TOOLS;
use crate::domain::models::{Node, Phase, RecoveryError, RecoverySession, Subsystem};
use crate::services::ensemble::EnsembleCodec;
use crate::services::monmap::MonMapCodec;
use crate::services::recovery::run_subsystem;
use crate::services::remote::Remote;
use crate::services::restore::restoration_plan;
use std::time::Duration;

/// Everything the orchestrator needs beyond the node itself. Explicit
/// rather than ambient so a run is reproducible from its inputs.
pub struct RecoveryConfig {
    pub cluster: String,
    pub settle: Duration,
}

/// The only gate that must pass before any mutation: the remote host is
/// reachable and carries the subsystem tooling.
pub fn verify(remote: &dyn Remote, node: &Node) -> Result<(), RecoveryError> {
    let command = format!("command -v {}", REQUIRED_REMOTE_TOOLS.join(" "));
    let out = remote
        .run(node, &command)
        .map_err(|e| RecoveryError::Precondition(format!("{} unreachable: {}", node.hostname, e)))?;
    if !out.ok() {
        return Err(RecoveryError::Precondition(format!(
            "required tooling missing on {} ({})",
            node.hostname,
            out.diagnostic()
        )));
    }
    Ok(())
}

/// Force the node standalone across both subsystems.
///
/// Fixed order: the monitor quorum first, so storage is writable again
/// before the coordination layer that may depend on it is restarted. Each
/// subsystem's failure is scoped to itself; only the reachability
/// precondition aborts the whole session.
pub fn run(
    remote: &dyn Remote,
    node: &Node,
    config: &RecoveryConfig,
) -> Result<RecoverySession, RecoveryError> {
    verify(remote, node)?;

    let monitor = Subsystem::monitor(node);
    let monitor_outcome = run_subsystem(remote, &MonMapCodec, node, &monitor, config.settle);

    let ensemble = Subsystem::ensemble();
    let ensemble_outcome = run_subsystem(remote, &EnsembleCodec, node, &ensemble, config.settle);

    // Suspend redundancy enforcement whenever the degraded monitor quorum
    // is back up, even if the ensemble step failed: an active rebalance
    // against a forced single-monitor quorum risks further data loss.
    let mut guard_suspended = false;
    if monitor_outcome.reached(Phase::Restarted) {
        let out = remote.run_privileged(node, "ceph osd set noout");
        guard_suspended = matches!(&out, Ok(o) if o.ok());
    }

    let cluster_status = match remote.run_privileged(node, "ceph -s") {
        Ok(out) if out.ok() => Some(out.stdout),
        _ => None,
    };

    let outcomes = vec![monitor_outcome, ensemble_outcome];
    let restoration_plan = restoration_plan(node, &outcomes, guard_suspended);
    Ok(RecoverySession {
        cluster: config.cluster.clone(),
        node: node.clone(),
        outcomes,
        redundancy_guard_suspended: guard_suspended,
        cluster_status,
        restoration_plan,
    })
}

/// The forward command sequence a run would issue, for `--dry-run`. Pure
/// formatting; must stay in step with the codecs and the step runner.
pub fn command_plan(node: &Node) -> Vec<String> {
    let monitor = Subsystem::monitor(node);
    let ensemble = Subsystem::ensemble();
    vec![
        format!("ssh {} command -v {}", node.hostname, REQUIRED_REMOTE_TOOLS.join(" ")),
        format!("sudo systemctl stop {}", monitor.service_unit),
        format!(
            "sudo ceph-mon -i {} --extract-monmap {}",
            node.shortname, monitor.backup_path
        ),
        format!("sudo test -s {}", monitor.backup_path),
        format!(
            "sudo ceph-mon -i {} --extract-monmap {}",
            node.shortname, monitor.map_path
        ),
        format!("sudo strings {}", monitor.map_path),
        format!("sudo cp -a {} {}", monitor.map_path, monitor.orig_path()),
        format!(
            "sudo monmaptool {} --rm <each non-retained monitor>",
            monitor.map_path
        ),
        format!(
            "sudo ceph-mon -i {} --inject-monmap {}",
            node.shortname, monitor.map_path
        ),
        format!("sudo systemctl start {}", monitor.service_unit),
        format!("sudo systemctl stop {}", ensemble.service_unit),
        format!("sudo cp -a {} {}", ensemble.map_path, ensemble.backup_path),
        format!("sudo test -s {}", ensemble.backup_path),
        format!("sudo mv {} {}", ensemble.map_path, ensemble.orig_path()),
        format!(
            "sudo tee {} < <single-member ensemble config>",
            ensemble.map_path
        ),
        format!("sudo systemctl start {}", ensemble.service_unit),
        "sudo ceph osd set noout".to_string(),
        "sudo ceph -s".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::remote::testing::ScriptedRemote;

    fn node() -> Node {
        Node::new("hv1.example.com")
    }

    fn config() -> RecoveryConfig {
        RecoveryConfig {
            cluster: "prod".to_string(),
            settle: Duration::from_secs(0),
        }
    }

    fn healthy_remote() -> ScriptedRemote {
        ScriptedRemote::new()
            .respond("strings", 0, "monmap\nmon.hv1\nmon.hv2\n")
            .respond(
                "cat /etc/zookeeper/conf/zoo.cfg",
                0,
                "server.hv1=hv1:2888:3888\nserver.hv2=hv2:2888:3888\n",
            )
            .respond("ceph -s", 0, "cluster degraded but responding\n")
    }

    #[test]
    fn precondition_failure_prevents_all_mutation() {
        let remote = ScriptedRemote::new().respond("command -v", 127, "");

        let err = run(&remote, &node(), &config()).unwrap_err();

        assert_eq!(err.kind(), "precondition");
        // Exactly one command was attempted: the reachability probe.
        assert_eq!(remote.command_count(), 1);
        assert!(!remote.ran("systemctl"));
    }

    #[test]
    fn full_run_recovers_both_subsystems_and_suspends_guard() {
        let remote = healthy_remote();

        let session = run(&remote, &node(), &config()).unwrap();

        assert!(session.fully_recovered());
        assert!(session.redundancy_guard_suspended);
        assert!(remote.ran("ceph osd set noout"));
        assert_eq!(
            session.cluster_status.as_deref(),
            Some("cluster degraded but responding\n")
        );
        assert!(session
            .restoration_plan
            .iter()
            .any(|l| l.contains("unset noout")));
    }

    #[test]
    fn ensemble_backup_failure_still_suspends_guard_and_plans_monitor_restore() {
        let remote = healthy_remote().respond("cp -a /etc/zookeeper/conf/zoo.cfg", 1, "");

        let session = run(&remote, &node(), &config()).unwrap();

        let ensemble = &session.outcomes[1];
        assert_eq!(
            ensemble.failure.as_ref().expect("backup must fail").kind,
            "backup"
        );
        // Storage recovered, so the guard still goes down.
        assert!(session.redundancy_guard_suspended);
        // The plan restores only what was actually backed up.
        assert!(session
            .restoration_plan
            .iter()
            .any(|l| l.contains("/var/tmp/monmap.backup")));
        assert!(!session
            .restoration_plan
            .iter()
            .any(|l| l.contains("/var/tmp/zoo.cfg.backup")));
    }

    #[test]
    fn guard_stays_up_when_monitor_never_restarts() {
        let remote = healthy_remote().respond("--inject-monmap", 1, "");

        let session = run(&remote, &node(), &config()).unwrap();

        assert!(!session.redundancy_guard_suspended);
        assert!(!remote.ran("ceph osd set noout"));
        // The ensemble sequence still ran to completion on its own.
        assert!(session.outcomes[1].failure.is_none());
    }

    #[test]
    fn monitor_failure_does_not_block_ensemble_sequence() {
        let remote = healthy_remote().respond("systemctl stop ceph-mon@hv1", 1, "");

        let session = run(&remote, &node(), &config()).unwrap();

        assert_eq!(
            session.outcomes[0].failure.as_ref().expect("stop fails").kind,
            "service_control"
        );
        assert!(session.outcomes[1].failure.is_none());
        assert!(remote.ran("systemctl start zookeeper"));
    }

    #[test]
    fn command_plan_covers_both_subsystems() {
        let plan = command_plan(&node());
        assert!(plan.iter().any(|c| c.contains("ceph-mon@hv1")));
        assert!(plan.iter().any(|c| c.contains("zookeeper")));
        assert!(plan.iter().any(|c| c.contains("set noout")));
    }
}
