mod cli;
mod commands;

use clap::Parser;
use cli::{BundleAction, Cli, Commands, CrdAction, ProfileAction};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("cluster-assessment-engine {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Check => commands::check::run().await?,
        Commands::List => commands::list::run().await?,
        Commands::Run { name } => commands::run::run(name).await?,
        Commands::Crd { action } => match action {
            CrdAction::Generate => commands::crd::generate()?,
            CrdAction::Install => commands::crd::install().await?,
        },
        Commands::Reconcile => commands::reconcile::run().await?,
        Commands::Profile { action } => match action {
            ProfileAction::List => commands::profile::list().await?,
            ProfileAction::Show { name } => commands::profile::show(name).await?,
        },
        Commands::Bundle { action } => match action {
            BundleAction::List => commands::bundle::list(),
            BundleAction::Show { name } => commands::bundle::show(name)?,
            BundleAction::Apply { name, request_name } => {
                commands::bundle::apply(name, request_name).await?
            }
        },
    }

    Ok(())
}
