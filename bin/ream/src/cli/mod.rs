pub mod constants;
pub mod genesis;
pub mod transition;
pub mod verbosity;

use clap::{Parser, Subcommand};

use crate::cli::{genesis::GenesisConfig, transition::TransitionConfig};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply a signed block to a pre-state and write the post-state
    #[command(name = "transition")]
    Transition(Box<TransitionConfig>),

    /// Write an interop genesis state for local testing
    #[command(name = "genesis")]
    Genesis(GenesisConfig),
}

#[cfg(test)]
mod tests {
    use ream_consensus_misc::fork_name::ForkName;
    use ream_network_spec::networks::DEV;

    use super::*;
    use crate::cli::verbosity::Verbosity;

    #[test]
    fn test_cli_transition_command() {
        let cli = Cli::parse_from([
            "program",
            "transition",
            "--network",
            "dev",
            "--pre-state",
            "pre.ssz_snappy",
            "--block",
            "block.ssz",
            "--post-state",
            "post.ssz",
            "--fork",
            "altair",
            "--no-signature-verification",
            "--verbosity",
            "4",
        ]);

        match cli.command {
            Commands::Transition(config) => {
                assert_eq!(config.network, DEV.clone());
                assert_eq!(config.fork, Some(ForkName::Altair));
                assert_eq!(config.verbosity, Verbosity::Debug);
                assert!(config.no_signature_verification);
                assert!(config.execution_status.is_none());
                assert_eq!(config.pre_state.to_str(), Some("pre.ssz_snappy"));
            }
            Commands::Genesis(_) => panic!("expected the transition command"),
        }
    }

    #[test]
    fn test_cli_transition_defaults() {
        let cli = Cli::parse_from([
            "program",
            "transition",
            "--pre-state",
            "pre.ssz",
            "--block",
            "block.ssz",
            "--post-state",
            "post.ssz",
        ]);

        let Commands::Transition(config) = cli.command else {
            panic!("expected the transition command");
        };
        assert_eq!(config.network.config_name, "mainnet");
        assert_eq!(config.fork, None);
        assert_eq!(config.verbosity, Verbosity::Info);
        assert!(!config.no_signature_verification);
    }

    #[test]
    fn test_cli_rejects_unknown_fork() {
        let result = Cli::try_parse_from([
            "program",
            "genesis",
            "--fork",
            "deneb",
            "--output",
            "genesis.ssz",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_genesis_command() {
        let cli = Cli::parse_from([
            "program",
            "genesis",
            "--network",
            "dev",
            "--fork",
            "capella",
            "--validator-count",
            "16",
            "--output",
            "genesis.ssz",
        ]);

        let Commands::Genesis(config) = cli.command else {
            panic!("expected the genesis command");
        };
        assert_eq!(config.fork, ForkName::Capella);
        assert_eq!(config.validator_count, 16);
        assert_eq!(config.genesis_time, 1_606_824_023);
    }
}
