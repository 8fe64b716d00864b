use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "solonode",
    version,
    about = "Force the last surviving node of a degraded cluster into standalone quorum",
    after_help = "This permanently diverges the surviving node from the rest of the \
cluster (split-brain). A restoration plan for undoing the change is printed \
at the end of every run."
)]
pub struct Cli {
    /// Output machine-readable JSON
    #[arg(long)]
    pub json: bool,

    /// Skip the interactive confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Print the commands that would run, without executing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Seconds to wait after each service start for quorum formation
    #[arg(long, default_value_t = crate::domain::constants::DEFAULT_SETTLE_SECS)]
    pub settle_secs: u64,

    /// Cluster name (informational, recorded in the report)
    pub target_cluster: String,

    /// Fully-qualified hostname of the surviving node
    pub lone_node: String,
}
