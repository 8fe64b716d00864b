use crate::domain::models::{MemberEntry, Node, RecoveryError, Subsystem};
use crate::services::membership::{ensure_retained, is_retained, FilteredMap, MembershipCodec};
use crate::services::remote::{run_privileged_checked, Remote};

/// Codec for the Ceph monitor map.
///
/// The monmap is an opaque blob only the subsystem's own tooling
/// understands, so extraction, member removal and injection are all
/// delegated to `ceph-mon` / `monmaptool`. Member enumeration is a string
/// pass over the blob: monitor entity names appear as `mon.<id>` tokens,
/// the one token family in the blob with a stable prefix. A false positive
/// would surface as a failing `monmaptool --rm`, not a silent corruption.
pub struct MonMapCodec;

const ENTITY_PREFIX: &str = "mon.";

impl MembershipCodec for MonMapCodec {
    fn backup(
        &self,
        remote: &dyn Remote,
        node: &Node,
        subsystem: &Subsystem,
    ) -> Result<(), RecoveryError> {
        // Extract a pristine copy straight to the backup path; the working
        // copy is extracted separately so the two can never be confused.
        let command = format!(
            "ceph-mon -i {} --extract-monmap {}",
            node.shortname, subsystem.backup_path
        );
        run_privileged_checked(remote, node, &command, RecoveryError::Backup)?;
        Ok(())
    }

    fn extract(
        &self,
        remote: &dyn Remote,
        node: &Node,
        subsystem: &Subsystem,
    ) -> Result<String, RecoveryError> {
        let command = format!(
            "ceph-mon -i {} --extract-monmap {}",
            node.shortname, subsystem.map_path
        );
        run_privileged_checked(remote, node, &command, RecoveryError::Codec)?;
        run_privileged_checked(
            remote,
            node,
            &format!("strings {}", subsystem.map_path),
            RecoveryError::Codec,
        )
    }

    fn parse_members(&self, raw: &str) -> Result<Vec<MemberEntry>, RecoveryError> {
        let mut members = Vec::new();
        for line in raw.lines() {
            let token = line.trim();
            let Some(id) = token.strip_prefix(ENTITY_PREFIX) else {
                continue;
            };
            if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                continue;
            }
            if members.iter().any(|m: &MemberEntry| m.id == id) {
                continue;
            }
            members.push(MemberEntry {
                id: id.to_string(),
                address: None,
            });
        }
        if members.is_empty() {
            return Err(RecoveryError::Codec(
                "no monitor entities found in map".to_string(),
            ));
        }
        Ok(members)
    }

    fn filter_to_self(
        &self,
        _raw: &str,
        members: &[MemberEntry],
        shortname: &str,
    ) -> Result<FilteredMap, RecoveryError> {
        ensure_retained(members, shortname)?;
        let removals = members
            .iter()
            .filter(|m| !is_retained(m, shortname))
            .map(|m| m.id.clone())
            .collect();
        Ok(FilteredMap::Removals(removals))
    }

    fn inject(
        &self,
        remote: &dyn Remote,
        node: &Node,
        subsystem: &Subsystem,
        filtered: &FilteredMap,
    ) -> Result<(), RecoveryError> {
        let FilteredMap::Removals(removals) = filtered else {
            return Err(RecoveryError::Injection(
                "monitor map expects a removal list".to_string(),
            ));
        };
        run_privileged_checked(
            remote,
            node,
            &format!("cp -a {} {}", subsystem.map_path, subsystem.orig_path()),
            RecoveryError::Injection,
        )?;
        for id in removals {
            run_privileged_checked(
                remote,
                node,
                &format!("monmaptool {} --rm {}", subsystem.map_path, id),
                RecoveryError::Injection,
            )?;
        }
        run_privileged_checked(
            remote,
            node,
            &format!(
                "ceph-mon -i {} --inject-monmap {}",
                node.shortname, subsystem.map_path
            ),
            RecoveryError::Injection,
        )?;
        Ok(())
    }
}
