use crate::domain::models::{Node, Phase, SubsystemOutcome};

/// Render the literal command sequence that reverses the forced change.
///
/// Pure formatting over facts already recorded in the outcomes; no remote
/// calls. Only subsystems whose backup was confirmed get restore commands,
/// so the plan never references a file that was not written.
pub fn restoration_plan(
    node: &Node,
    outcomes: &[SubsystemOutcome],
    guard_suspended: bool,
) -> Vec<String> {
    let mut plan = Vec::new();
    for outcome in outcomes {
        if !outcome.reached(Phase::BackedUp) {
            continue;
        }
        plan.push(format!("sudo systemctl stop {}", outcome.service_unit));
        if outcome.subsystem == "ceph-mon" {
            plan.push(format!(
                "sudo ceph-mon -i {} --inject-monmap {}",
                node.shortname, outcome.backup_path
            ));
        } else {
            plan.push(format!(
                "sudo cp -a {} {}",
                outcome.backup_path, outcome.map_path
            ));
        }
        plan.push(format!(
            "# in-place fallback: {} holds the unedited map",
            outcome.orig_path
        ));
        plan.push(format!("sudo systemctl start {}", outcome.service_unit));
    }
    if guard_suspended {
        plan.push("sudo ceph osd unset noout".to_string());
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Subsystem, SubsystemOutcome};

    fn node() -> Node {
        Node::new("hv1.example.com")
    }

    fn outcome_reaching(subsystem: &Subsystem, phases: &[Phase]) -> SubsystemOutcome {
        let mut outcome = SubsystemOutcome::new(subsystem);
        outcome.completed = phases.to_vec();
        outcome
    }

    #[test]
    fn plan_restores_from_backup_not_the_filtered_map() {
        let node = node();
        let monitor = Subsystem::monitor(&node);
        let outcomes = vec![outcome_reaching(
            &monitor,
            &[Phase::Stopped, Phase::BackedUp, Phase::Extracted],
        )];

        let plan = restoration_plan(&node, &outcomes, true);

        assert!(plan
            .iter()
            .any(|l| l.contains("--inject-monmap /var/tmp/monmap.backup")));
        assert!(!plan
            .iter()
            .any(|l| l.contains("--inject-monmap /var/tmp/monmap ")));
        assert_eq!(plan.last().map(String::as_str), Some("sudo ceph osd unset noout"));
    }

    #[test]
    fn unbacked_subsystem_gets_no_plan_entry() {
        let node = node();
        let monitor = Subsystem::monitor(&node);
        let ensemble = Subsystem::ensemble();
        let outcomes = vec![
            outcome_reaching(&monitor, &[Phase::Stopped, Phase::BackedUp]),
            outcome_reaching(&ensemble, &[Phase::Stopped]),
        ];

        let plan = restoration_plan(&node, &outcomes, false);

        assert!(plan.iter().any(|l| l.contains("ceph-mon@hv1")));
        assert!(!plan.iter().any(|l| l.contains("zoo.cfg")));
        assert!(!plan.iter().any(|l| l.contains("unset noout")));
    }

    #[test]
    fn ensemble_restore_copies_config_back_in_place() {
        let node = node();
        let ensemble = Subsystem::ensemble();
        let outcomes = vec![outcome_reaching(
            &ensemble,
            &[Phase::Stopped, Phase::BackedUp, Phase::Extracted, Phase::Filtered],
        )];

        let plan = restoration_plan(&node, &outcomes, false);

        assert!(plan
            .iter()
            .any(|l| l == "sudo cp -a /var/tmp/zoo.cfg.backup /etc/zookeeper/conf/zoo.cfg"));
        assert!(plan
            .iter()
            .any(|l| l.contains("/etc/zookeeper/conf/zoo.cfg.orig")));
    }
}
