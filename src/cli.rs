#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "results")]
#[command(about = "Sync run executions into a results store and list their records")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (default: .results/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database URL (overrides DATABASE_URL and the config file)
    #[arg(long, global = true)]
    pub database_url: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Inspect stored records
    Records {
        #[command(subcommand)]
        command: RecordsCommand,
    },

    /// Reconcile source objects into results, one pass per key
    Sync {
        /// Directory holding source objects as <namespace>/<name>.json
        #[arg(long)]
        source_dir: Option<PathBuf>,

        /// Parent for newly created results
        #[arg(long)]
        parent: Option<String>,

        /// Object keys as <namespace>/<name> or <name>
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Initialize database schema
    InitDb,
}

#[derive(Debug, Subcommand)]
pub enum RecordsCommand {
    /// List records under <parent>/results/<result>; use `-` for every result
    List {
        parent: String,

        /// Only records whose name contains this text
        #[arg(long)]
        filter: Option<String>,

        /// Page size (default 50, max 1000)
        #[arg(long)]
        limit: Option<u32>,

        /// Token returned by the previous page
        #[arg(long)]
        page_token: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

const VALID_COMMANDS: &[&str] = &["records", "sync", "init-db", "help"];

/// Closest known command to a mistyped one.
#[must_use]
pub fn suggest_commands(typo: &str) -> Vec<String> {
    VALID_COMMANDS
        .iter()
        .map(|cmd| (cmd, strsim::levenshtein(typo, cmd)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by_key(|(_, dist)| *dist)
        .map(|(cmd, _)| vec![(*cmd).to_string()])
        .unwrap_or_default()
}

#[cfg(test)]
mod bdd_tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::{suggest_commands, Cli, Commands, OutputFormat, RecordsCommand};
    use clap::Parser;

    fn given_cli_args(args: &[&str]) -> Vec<String> {
        std::iter::once("results")
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn when_records_list_then_defaults_apply() {
        let cli = Cli::try_parse_from(given_cli_args(&["records", "list", "ns/results/-"])).unwrap();
        match cli.command {
            Commands::Records {
                command:
                    RecordsCommand::List {
                        parent,
                        filter,
                        limit,
                        page_token,
                        format,
                    },
            } => {
                assert_eq!(parent, "ns/results/-");
                assert!(filter.is_none() && limit.is_none() && page_token.is_none());
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn when_records_list_without_parent_then_error() {
        assert!(Cli::try_parse_from(given_cli_args(&["records", "list"])).is_err());
    }

    #[test]
    fn when_sync_with_keys_then_keys_kept_in_order() {
        let cli = Cli::try_parse_from(given_cli_args(&[
            "sync",
            "--source-dir",
            "/tmp/objs",
            "default/b",
            "a",
        ]))
        .unwrap();
        match cli.command {
            Commands::Sync {
                source_dir, keys, ..
            } => {
                assert_eq!(source_dir.unwrap().to_str(), Some("/tmp/objs"));
                assert_eq!(keys, vec!["default/b".to_string(), "a".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn when_sync_without_keys_then_error() {
        assert!(Cli::try_parse_from(given_cli_args(&["sync"])).is_err());
    }

    #[test]
    fn when_global_flags_follow_command_then_parsed() {
        let cli = Cli::try_parse_from(given_cli_args(&[
            "init-db",
            "--database-url",
            "postgres://x/db",
        ]))
        .unwrap();
        assert!(matches!(cli.command, Commands::InitDb));
        assert_eq!(cli.database_url.as_deref(), Some("postgres://x/db"));
    }

    #[test]
    fn when_command_mistyped_then_suggestion() {
        assert_eq!(suggest_commands("snyc"), vec!["sync".to_string()]);
        assert_eq!(suggest_commands("init-bd"), vec!["init-db".to_string()]);
        assert!(suggest_commands("completely-different").is_empty());
    }
}
