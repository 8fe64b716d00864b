use std::path::PathBuf;

/// Append an event to the local audit trail. Best-effort: a run must never
/// fail because the operator's home directory is read-only.
pub fn audit(action: &str, data: serde_json::Value) {
    let home = match std::env::var("HOME") {
        Ok(h) => h,
        Err(_) => return,
    };
    let path = PathBuf::from(home).join(".config/solonode/audit.jsonl");
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let event = serde_json::json!({
        "ts": unix_now(),
        "action": action,
        "data": data
    });
    let line = format!("{}\n", event);
    let _ = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut f| std::io::Write::write_all(&mut f, line.as_bytes()));
}

/// Every remote command lands here with its exit status, so the trail shows
/// exactly what was run on the degraded node and what each step returned.
pub fn audit_command(hostname: &str, command: &str, status: i32) {
    audit(
        "remote_command",
        serde_json::json!({
            "host": hostname,
            "command": command,
            "status": status
        }),
    );
}

fn unix_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    ts.to_string()
}
