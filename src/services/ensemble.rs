use crate::domain::models::{MemberEntry, Node, RecoveryError, Subsystem};
use crate::services::membership::{ensure_retained, is_retained, FilteredMap, MembershipCodec};
use crate::services::remote::{run_privileged_checked, Remote};

/// Codec for the Zookeeper ensemble configuration.
///
/// The live map is a line-oriented key/value file. Member declarations are
/// `server.<id>=<address>` lines; filtering keeps the local node's line
/// verbatim and comments out the rest, so the original membership stays
/// readable in place.
pub struct EnsembleCodec;

const MEMBER_KEY_PREFIX: &str = "server.";

fn parse_member_line(line: &str) -> Option<MemberEntry> {
    let trimmed = line.trim_start();
    let rest = trimmed.strip_prefix(MEMBER_KEY_PREFIX)?;
    let (id, address) = rest.split_once('=')?;
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    Some(MemberEntry {
        id: id.to_string(),
        address: Some(address.trim().to_string()),
    })
}

impl MembershipCodec for EnsembleCodec {
    fn backup(
        &self,
        remote: &dyn Remote,
        node: &Node,
        subsystem: &Subsystem,
    ) -> Result<(), RecoveryError> {
        let command = format!("cp -a {} {}", subsystem.map_path, subsystem.backup_path);
        run_privileged_checked(remote, node, &command, RecoveryError::Backup)?;
        Ok(())
    }

    fn extract(
        &self,
        remote: &dyn Remote,
        node: &Node,
        subsystem: &Subsystem,
    ) -> Result<String, RecoveryError> {
        let command = format!("cat {}", subsystem.map_path);
        run_privileged_checked(remote, node, &command, RecoveryError::Codec)
    }

    fn parse_members(&self, raw: &str) -> Result<Vec<MemberEntry>, RecoveryError> {
        let members: Vec<MemberEntry> = raw.lines().filter_map(parse_member_line).collect();
        if members.is_empty() {
            return Err(RecoveryError::Codec(
                "no server declarations found in ensemble config".to_string(),
            ));
        }
        Ok(members)
    }

    fn filter_to_self(
        &self,
        raw: &str,
        members: &[MemberEntry],
        shortname: &str,
    ) -> Result<FilteredMap, RecoveryError> {
        ensure_retained(members, shortname)?;
        let mut lines = Vec::new();
        for line in raw.lines() {
            match parse_member_line(line) {
                Some(member) if is_retained(&member, shortname) => lines.push(line.to_string()),
                Some(_) => lines.push(format!("#{}", line)),
                None => lines.push(line.to_string()),
            }
        }
        let mut content = lines.join("\n");
        content.push('\n');
        Ok(FilteredMap::Rewrite(content))
    }

    fn inject(
        &self,
        remote: &dyn Remote,
        node: &Node,
        subsystem: &Subsystem,
        filtered: &FilteredMap,
    ) -> Result<(), RecoveryError> {
        let FilteredMap::Rewrite(content) = filtered else {
            return Err(RecoveryError::Injection(
                "ensemble config expects rewritten content".to_string(),
            ));
        };
        let command = format!("mv {} {}", subsystem.map_path, subsystem.orig_path());
        run_privileged_checked(remote, node, &command, RecoveryError::Injection)?;
        let out = remote
            .write_file(node, &subsystem.map_path, content)
            .map_err(|e| RecoveryError::Injection(e.to_string()))?;
        if !out.ok() {
            return Err(RecoveryError::Injection(format!(
                "writing {}: {}",
                subsystem.map_path,
                out.diagnostic()
            )));
        }
        Ok(())
    }
}
