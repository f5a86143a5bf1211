//! Teams Chat Export - recover complete transcripts from virtualized chat views.
//!
//! Chat clients render only the messages near the viewport. This tool scrolls a
//! chat through its whole history, collects every message exactly once and
//! exports the transcript as HTML, plain text, JSON or CSV.
//!
//! QUICK START:
//!   teams-chat-export status chat.json                 # Chat name, visible messages
//!   teams-chat-export collect chat.json                # Full history collection report
//!   teams-chat-export show chat.json --collect -l 20   # Last 20 messages as a table
//!   teams-chat-export export chat.json -f csv          # Write exports/<chat>-export.csv
//!   teams-chat-export scan page.json                   # Messages of a page snapshot

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::fs;
use std::path::Path;

use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    format_report, format_transcript_table, sort_by_datetime, ChatSession, ExportFormat,
    MessageExtractor, ScrollCollector,
};
use cli::{Cli, Commands};
use domain::{ActionResponse, AppConfig, MessageRecord};
use infrastructure::{
    ensure_config_exists, load_config, resolve_chat_name, DirectorySink, Document,
    VirtualizedChat,
};

type Session = ChatSession<VirtualizedChat, DirectorySink>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(cli: Cli) -> domain::Result<()> {
    let format = cli
        .command
        .export_format()
        .map_err(|e| domain::AppError::Config { message: e })?;

    let config_path = cli.config.as_deref();
    if matches!(cli.command, Commands::InitConfig) {
        return cmd_init_config(config_path);
    }
    let config = load_config(config_path)?;

    match cli.command {
        Commands::Status { fixture } => {
            cmd_status(&open_session(&config, &fixture, None)?, cli.json)?;
        }
        Commands::Collect { fixture } => {
            cmd_collect(open_session(&config, &fixture, None)?, cli.json).await?;
        }
        Commands::Show {
            fixture,
            last,
            collect,
        } => {
            let mut session = open_session(&config, &fixture, None)?;
            if collect {
                session.collect_full_history().await?;
            }
            print_transcript(&session.chat_name(), session.transcript(), last, cli.json)?;
        }
        Commands::Export {
            fixture,
            output,
            no_collect,
            ..
        } => {
            let session = open_session(&config, &fixture, output.as_deref())?;
            cmd_export(session, format, !no_collect, cli.json).await?;
        }
        Commands::Scan { snapshot, last } => {
            cmd_scan(&config, &snapshot, last, cli.json)?;
        }
        Commands::InitConfig => {}
    }

    Ok(())
}

/// Opens a recorded conversation with the configured pipeline.
fn open_session(
    config: &AppConfig,
    fixture: &Path,
    output_dir: Option<&Path>,
) -> domain::Result<Session> {
    let chat = VirtualizedChat::load(fixture)?;
    let extractor = MessageExtractor::new(config.markers.clone(), config.extractor.clone());
    let collector = ScrollCollector::new(config.collector.clone(), extractor);
    let dir = output_dir.map_or_else(|| config.export.output_dir.clone(), Path::to_path_buf);

    Ok(ChatSession::new(chat, collector, DirectorySink::new(dir)))
}

fn print_json<T: Serialize>(value: &T) -> domain::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(domain::AppError::json_parse)?;
    println!("{json}");
    Ok(())
}

/// Show chat status command.
fn cmd_status(session: &Session, json: bool) -> domain::Result<()> {
    let status = session.status();
    if json {
        return print_json(&status);
    }

    println!("{} {}", "💬".bold(), status.chat_name.cyan().bold());
    println!("  Visible messages: {}", status.visible_message_count);
    Ok(())
}

/// Full history collection command.
async fn cmd_collect(mut session: Session, json: bool) -> domain::Result<()> {
    let result = session.collect_full_history().await;
    if json {
        return print_json(&ActionResponse::from(result));
    }

    let report = result?;
    println!("{}", format_report(&session.chat_name(), &report));
    Ok(())
}

/// Export command.
async fn cmd_export(
    mut session: Session,
    format: ExportFormat,
    collect: bool,
    json: bool,
) -> domain::Result<()> {
    let result = if collect {
        match session.collect_full_history().await {
            Ok(_) => session.export(format),
            Err(e) => Err(e),
        }
    } else {
        session.export(format)
    };

    if json {
        return print_json(&ActionResponse::from(result));
    }

    let receipt = result?;
    println!(
        "{} Exported {} messages to {}",
        "✓".green().bold(),
        receipt.message_count,
        receipt.path.display()
    );
    Ok(())
}

/// Scan a captured page snapshot.
fn cmd_scan(
    config: &AppConfig,
    snapshot: &Path,
    last: Option<usize>,
    json: bool,
) -> domain::Result<()> {
    let content = fs::read_to_string(snapshot).map_err(|e| {
        domain::AppError::io(format!("Failed to read {}", snapshot.display()), e)
    })?;
    let page = Document::from_json(&content)?;

    let extractor = MessageExtractor::new(config.markers.clone(), config.extractor.clone());
    let mut records = extractor.scan(&page);
    sort_by_datetime(&mut records);

    print_transcript(&resolve_chat_name(&page, &config.markers), records, last, json)
}

/// Prints a transcript, keeping only the last `last` messages if given.
fn print_transcript(
    chat_name: &str,
    mut records: Vec<MessageRecord>,
    last: Option<usize>,
    json: bool,
) -> domain::Result<()> {
    if let Some(n) = last {
        let skip = records.len().saturating_sub(n);
        records.drain(..skip);
    }

    if json {
        return print_json(&records);
    }
    if records.is_empty() {
        return Err(domain::AppError::NoMessages);
    }

    println!("{} {}", "💬".bold(), chat_name.cyan().bold());
    println!("{}", format_transcript_table(&records));
    println!("Total: {} message(s)", records.len());
    Ok(())
}

/// Write the default configuration file.
fn cmd_init_config(path: Option<&Path>) -> domain::Result<()> {
    let existed = path.map_or_else(AppConfig::default_config_path, Path::to_path_buf).exists();
    let config_path = ensure_config_exists(path)?;

    if existed {
        println!("Config already exists: {}", config_path.display());
    } else {
        println!("{} Created {}", "✓".green().bold(), config_path.display());
    }
    Ok(())
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
