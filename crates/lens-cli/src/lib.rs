//! Operator tooling for the API Lens gateway: the pieces the source
//! system shipped as standalone scripts (`generate_keys.py`,
//! `redis_browser.py`) reimplemented as subcommands of one binary.

pub mod commands;
pub mod error;

pub use error::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "lens-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator tooling for the API Lens gateway", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a random master encryption key.
    Keygen(commands::keygen::KeygenArgs),
    /// Browse the shared K/V substrate.
    Browse(commands::browse::BrowseArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn keygen_defaults_to_one_32_byte_key() {
        let cli = Cli::parse_from(["lens-cli", "keygen"]);
        match cli.command {
            Command::Keygen(args) => {
                assert_eq!(args.length, 32);
                assert_eq!(args.count, 1);
            }
            _ => panic!("expected Keygen"),
        }
    }

    #[test]
    fn browse_list_defaults_to_wildcard_pattern() {
        let cli = Cli::parse_from(["lens-cli", "browse", "list"]);
        match cli.command {
            Command::Browse(args) => match args.command {
                commands::browse::BrowseCommand::List { pattern } => {
                    assert_eq!(pattern, "*");
                }
                _ => panic!("expected List"),
            },
            _ => panic!("expected Browse"),
        }
    }
}
