use clap::Parser;

mod cli;
mod commands;
mod domain;
mod services;

pub use cli::*;
pub use domain::constants::*;
pub use domain::models::*;
pub use services::audit::*;
pub use services::ensemble::*;
pub use services::membership::*;
pub use services::monmap::*;
pub use services::orchestrator::*;
pub use services::output::*;
pub use services::recovery::*;
pub use services::remote::*;
pub use services::restore::*;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::handle_recover(&cli)
}
