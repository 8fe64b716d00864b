use crate::domain::models::{Node, Phase, RecoveryError, Subsystem, SubsystemOutcome};
use crate::services::membership::MembershipCodec;
use crate::services::remote::{run_privileged_checked, Remote};
use std::time::Duration;

/// Drive one subsystem through the fixed recovery sequence:
/// stop -> backup -> extract -> filter -> inject -> start -> settle.
///
/// No skipping and no retries. The first failing phase is recorded in the
/// outcome and ends this subsystem's sequence; the caller decides what to
/// do about the other subsystem.
pub fn run_subsystem(
    remote: &dyn Remote,
    codec: &dyn MembershipCodec,
    node: &Node,
    subsystem: &Subsystem,
    settle: Duration,
) -> SubsystemOutcome {
    let mut outcome = SubsystemOutcome::new(subsystem);
    if let Err(err) = advance(remote, codec, node, subsystem, settle, &mut outcome) {
        outcome.failure = Some((&err).into());
    }
    outcome
}

fn advance(
    remote: &dyn Remote,
    codec: &dyn MembershipCodec,
    node: &Node,
    subsystem: &Subsystem,
    settle: Duration,
    outcome: &mut SubsystemOutcome,
) -> Result<(), RecoveryError> {
    stop_service(remote, node, subsystem)?;
    outcome.completed.push(Phase::Stopped);

    codec.backup(remote, node, subsystem)?;
    confirm_backup(remote, node, subsystem)?;
    outcome.completed.push(Phase::BackedUp);

    let raw = codec.extract(remote, node, subsystem)?;
    outcome.completed.push(Phase::Extracted);

    let members = codec.parse_members(&raw)?;
    let filtered = codec.filter_to_self(&raw, &members, &node.shortname)?;
    outcome.completed.push(Phase::Filtered);

    codec.inject(remote, node, subsystem, &filtered)?;
    outcome.completed.push(Phase::Injected);

    run_privileged_checked(
        remote,
        node,
        &format!("systemctl start {}", subsystem.service_unit),
        RecoveryError::ServiceControl,
    )?;
    outcome.completed.push(Phase::Restarted);

    // Fixed settle delay for single-node quorum formation; deliberately not
    // a polling loop.
    std::thread::sleep(settle);
    outcome.completed.push(Phase::Verified);

    Ok(())
}

/// Idempotent stop: a failed `systemctl stop` still counts as stopped if
/// the unit reports inactive afterwards.
fn stop_service(
    remote: &dyn Remote,
    node: &Node,
    subsystem: &Subsystem,
) -> Result<(), RecoveryError> {
    let command = format!("systemctl stop {}", subsystem.service_unit);
    let out = remote
        .run_privileged(node, &command)
        .map_err(|e| RecoveryError::ServiceControl(e.to_string()))?;
    if out.ok() {
        return Ok(());
    }
    let probe = remote
        .run_privileged(
            node,
            &format!("systemctl is-active {}", subsystem.service_unit),
        )
        .map_err(|e| RecoveryError::ServiceControl(e.to_string()))?;
    match probe.stdout.trim() {
        "inactive" | "failed" => Ok(()),
        state => Err(RecoveryError::ServiceControl(format!(
            "`{}`: {} (unit reports {})",
            command,
            out.diagnostic(),
            if state.is_empty() { "unknown" } else { state }
        ))),
    }
}

/// The live map is never touched unless this passes: the backup copy must
/// exist and be non-empty on the remote host.
fn confirm_backup(
    remote: &dyn Remote,
    node: &Node,
    subsystem: &Subsystem,
) -> Result<(), RecoveryError> {
    let command = format!("test -s {}", subsystem.backup_path);
    let out = remote
        .run_privileged(node, &command)
        .map_err(|e| RecoveryError::Backup(e.to_string()))?;
    if !out.ok() {
        return Err(RecoveryError::Backup(format!(
            "backup {} missing or empty after copy",
            subsystem.backup_path
        )));
    }
    Ok(())
}
