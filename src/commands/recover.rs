use crate::*;
use std::io::{BufRead, Write};
use std::time::Duration;

pub fn handle_recover(cli: &Cli) -> anyhow::Result<()> {
    let node = Node::new(&cli.lone_node);

    if cli.dry_run {
        let plan = command_plan(&node);
        print_out(cli.json, &plan, |c| c.to_string())?;
        return Ok(());
    }

    if !cli.yes && !confirm(&cli.target_cluster, &node)? {
        eprintln!("aborted, nothing was changed");
        std::process::exit(1);
    }

    let remote = SshExecutor::default();
    let config = RecoveryConfig {
        cluster: cli.target_cluster.clone(),
        settle: Duration::from_secs(cli.settle_secs),
    };

    if !cli.json {
        println!(
            "forcing {} into standalone quorum (cluster {})",
            node.hostname, cli.target_cluster
        );
    }

    audit(
        "session_start",
        serde_json::json!({"cluster": config.cluster, "node": node.hostname}),
    );
    let session = match run(&remote, &node, &config) {
        Ok(session) => session,
        Err(err) => {
            // Precondition failures happen before any mutation: there is no
            // backup and therefore no restoration plan to print.
            eprintln!("{}", err);
            audit("session_abort", serde_json::json!({"error": err.to_string()}));
            std::process::exit(1);
        }
    };

    audit(
        "session_end",
        serde_json::json!({
            "fully_recovered": session.fully_recovered(),
            "redundancy_guard_suspended": session.redundancy_guard_suspended,
        }),
    );
    let recovered = session.fully_recovered();
    print_one(cli.json, recovered, session, render_session)?;
    if !recovered {
        std::process::exit(1);
    }
    Ok(())
}

fn confirm(cluster: &str, node: &Node) -> anyhow::Result<bool> {
    eprintln!(
        "About to force {} (cluster {}) into standalone quorum.\n\
         This mutates the monitor map and the ensemble config in place and\n\
         cannot be undone automatically. Continue? [y/N]",
        node.hostname, cluster
    );
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn render_session(session: &RecoverySession) -> String {
    let mut lines = Vec::new();
    for outcome in &session.outcomes {
        let reached = outcome
            .completed
            .last()
            .map(|p| p.as_str())
            .unwrap_or("idle");
        match &outcome.failure {
            Some(failure) => lines.push(format!(
                "{}\treached {}\tfailed: {} ({})",
                outcome.subsystem, reached, failure.message, failure.kind
            )),
            None => lines.push(format!("{}\trecovered ({})", outcome.subsystem, reached)),
        }
    }
    lines.push(format!(
        "redundancy enforcement suspended: {}",
        if session.redundancy_guard_suspended {
            "yes (noout set)"
        } else {
            "no"
        }
    ));
    if let Some(status) = &session.cluster_status {
        lines.push("cluster status:".to_string());
        lines.push(status.trim_end().to_string());
    }
    if session.restoration_plan.is_empty() {
        lines.push("no restoration plan: nothing was backed up".to_string());
    } else {
        lines.push("to restore the original quorum later, run on the node:".to_string());
        for cmd in &session.restoration_plan {
            lines.push(format!("  {}", cmd));
        }
    }
    lines.join("\n")
}
