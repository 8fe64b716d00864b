use crate::domain::models::{MemberEntry, Node, RecoveryError, Subsystem};
use crate::services::remote::Remote;

/// The single-member map a codec computes before injection.
///
/// The two subsystems edit their maps in opposite directions: the monitor
/// map is mutated member-by-member with the subsystem's own tooling, the
/// ensemble config is rewritten wholesale. Both shapes are carried here so
/// the step runner stays format-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilteredMap {
    /// Member ids to remove from the working blob, one tool invocation each.
    Removals(Vec<String>),
    /// Full replacement content for the live config file.
    Rewrite(String),
}

/// Membership-map codec for one subsystem.
///
/// The monitor implementation scrapes member ids out of an opaque blob with
/// a generic string pass; keeping that fallback behind this trait means a
/// structured parser can replace it without touching the orchestration.
pub trait MembershipCodec {
    /// Copy the pristine live map to the subsystem's backup path. The step
    /// runner confirms the copy exists before anything later runs.
    fn backup(
        &self,
        remote: &dyn Remote,
        node: &Node,
        subsystem: &Subsystem,
    ) -> Result<(), RecoveryError>;

    /// Obtain the raw map in a parseable textual form.
    fn extract(
        &self,
        remote: &dyn Remote,
        node: &Node,
        subsystem: &Subsystem,
    ) -> Result<String, RecoveryError>;

    fn parse_members(&self, raw: &str) -> Result<Vec<MemberEntry>, RecoveryError>;

    /// Compute the single-member map retaining only the local node.
    ///
    /// Must be idempotent: applied to an already-filtered map it yields a
    /// no-op result. Must never retain an empty member set.
    fn filter_to_self(
        &self,
        raw: &str,
        members: &[MemberEntry],
        shortname: &str,
    ) -> Result<FilteredMap, RecoveryError>;

    /// Make the filtered map the subsystem's active one, preserving the
    /// unedited version as an `.orig` sibling first.
    fn inject(
        &self,
        remote: &dyn Remote,
        node: &Node,
        subsystem: &Subsystem,
        filtered: &FilteredMap,
    ) -> Result<(), RecoveryError>;
}

/// Whether a member entry is the local node's. Matches on the id, or on the
/// address host for ensembles keyed by something other than the hostname
/// (numeric ids are common in older deployments).
pub fn is_retained(member: &MemberEntry, shortname: &str) -> bool {
    if member.id == shortname {
        return true;
    }
    match &member.address {
        Some(addr) => {
            let host = addr.split(':').next().unwrap_or("");
            host == shortname || host.starts_with(&format!("{}.", shortname))
        }
        None => false,
    }
}

/// Invariant check shared by both codecs: the local node must appear in the
/// parsed member set, otherwise filtering would empty the quorum.
pub fn ensure_retained(members: &[MemberEntry], shortname: &str) -> Result<(), RecoveryError> {
    if !members.iter().any(|m| is_retained(m, shortname)) {
        return Err(RecoveryError::Codec(format!(
            "retained member {} not present in map ({} members found)",
            shortname,
            members.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, addr: Option<&str>) -> MemberEntry {
        MemberEntry {
            id: id.to_string(),
            address: addr.map(|a| a.to_string()),
        }
    }

    #[test]
    fn retained_matches_id_or_address_host() {
        assert!(is_retained(&entry("hv1", None), "hv1"));
        assert!(is_retained(&entry("1", Some("hv1:2888:3888")), "hv1"));
        assert!(is_retained(
            &entry("1", Some("hv1.example.com:2888:3888")),
            "hv1"
        ));
        assert!(!is_retained(&entry("hv2", Some("hv2:2888:3888")), "hv1"));
        assert!(!is_retained(&entry("1", Some("hv10:2888:3888")), "hv1"));
    }

    #[test]
    fn ensure_retained_rejects_missing_member() {
        let members = vec![entry("hv2", None), entry("hv3", None)];
        let err = ensure_retained(&members, "hv1").unwrap_err();
        assert_eq!(err.kind(), "codec");
    }
}
