//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::ExportFormat;

/// Teams Chat Export - recover complete transcripts from virtualized chat views.
///
/// Fixtures are recorded conversations (JSON) replayed as a scrolling chat.
#[derive(Parser, Debug)]
#[command(name = "teams-chat-export")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file (default: ~/.teams-chat-export/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print action results as JSON responses.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the chat name and how many messages are rendered.
    Status {
        /// Recorded conversation to open.
        fixture: PathBuf,
    },

    /// Scroll through the whole history and report what was collected.
    Collect {
        /// Recorded conversation to open.
        fixture: PathBuf,
    },

    /// Show the transcript as a table.
    Show {
        /// Recorded conversation to open.
        fixture: PathBuf,

        /// Show only the last N messages.
        #[arg(short, long)]
        last: Option<usize>,

        /// Collect the full history first (default: visible messages only).
        #[arg(long)]
        collect: bool,
    },

    /// Export the transcript to a file.
    Export {
        /// Recorded conversation to open.
        fixture: PathBuf,

        /// Output format: html, txt, json, or csv.
        #[arg(short, long, default_value = "html")]
        format: String,

        /// Output directory (default: from config).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export only the visible messages, without scrolling.
        #[arg(long)]
        no_collect: bool,
    },

    /// Extract the messages of a captured page snapshot.
    Scan {
        /// Page snapshot (JSON element tree).
        snapshot: PathBuf,

        /// Show only the last N messages.
        #[arg(short, long)]
        last: Option<usize>,
    },

    /// Write the default configuration file.
    InitConfig,
}

impl Commands {
    /// Parse the export format argument, if this command has one.
    pub fn export_format(&self) -> Result<ExportFormat, String> {
        match self {
            Self::Export { format, .. } => format.parse(),
            _ => Ok(ExportFormat::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_export_command() {
        let cli = Cli::parse_from([
            "teams-chat-export",
            "-vv",
            "export",
            "chat.json",
            "-f",
            "CSV",
            "-o",
            "out",
            "--no-collect",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.command.export_format(), Ok(ExportFormat::Csv));
        match cli.command {
            Commands::Export {
                fixture,
                output,
                no_collect,
                ..
            } => {
                assert_eq!(fixture, PathBuf::from("chat.json"));
                assert_eq!(output, Some(PathBuf::from("out")));
                assert!(no_collect);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_format_is_reported() {
        let cli = Cli::parse_from(["teams-chat-export", "export", "chat.json", "-f", "pdf"]);
        assert!(cli.command.export_format().is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "teams-chat-export",
            "show",
            "chat.json",
            "--last",
            "5",
            "--config",
            "custom.toml",
            "--json",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(cli.json);
    }
}
