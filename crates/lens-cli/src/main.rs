use clap::Parser;
use lens_cli::{Cli, Command, ExitCode};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    std::process::exit(match run().await {
        Ok(()) => ExitCode::Success.as_i32(),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::UserError.as_i32()
        }
    });
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Keygen(args) => lens_cli::commands::keygen::execute(args),
        Command::Browse(args) => lens_cli::commands::browse::execute(args).await,
    }
}
