mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, CrdAction, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    generalscaler::config::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => commands::version::run()?,
        Commands::Check => commands::check::run().await?,
        Commands::Crd { action } => match action {
            CrdAction::Generate => commands::crd::generate()?,
            CrdAction::Install => commands::crd::install().await?,
        },
        Commands::Reconcile => commands::reconcile::run().await?,
        Commands::DemoLoad { host, port, queue, count, rate } => {
            commands::demo_load::run(host, port, queue, count, rate).await?;
        }
    }

    Ok(())
}
