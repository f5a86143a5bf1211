//! Output formatting for collected transcripts.
//!
//! Export encodings (HTML, plain text, JSON, CSV) plus the terminal views used
//! by the CLI (transcript table, collection report).

use chrono::{DateTime, Local, SecondsFormat, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::{AppError, ChatExport, CollectionReport, ExportFile, MessageRecord, Result};

/// Longest sanitized chat name used in export filenames.
const MAX_FILENAME_CHARS: usize = 50;

/// Export encodings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// Standalone HTML page.
    #[default]
    Html,
    /// Plain text transcript.
    Txt,
    /// JSON document with metadata.
    Json,
    /// Spreadsheet-friendly CSV.
    Csv,
}

impl ExportFormat {
    /// File extension, also the format's name.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Txt => "txt",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Html => "text/html",
            Self::Txt => "text/plain",
            Self::Json => "application/json",
            Self::Csv => "text/csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" | "htm" => Ok(Self::Html),
            "txt" | "text" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("Unknown format: {s}. Use: html, txt, json, csv")),
        }
    }
}

/// Renders `records` as an export file.
///
/// # Errors
/// Returns `NoMessages` for an empty transcript, or a JSON error if
/// serialization fails.
pub fn render_export(
    records: &[MessageRecord],
    chat_name: &str,
    format: ExportFormat,
    exported_at: DateTime<Utc>,
) -> Result<ExportFile> {
    if records.is_empty() {
        return Err(AppError::NoMessages);
    }

    let content = match format {
        ExportFormat::Html => format_html(records, chat_name, exported_at),
        ExportFormat::Txt => format_text(records, chat_name, exported_at),
        ExportFormat::Json => format_json(records, chat_name, exported_at)?,
        ExportFormat::Csv => format_csv(records),
    };

    Ok(ExportFile {
        content,
        filename: export_filename(chat_name, format),
        mime_type: format.mime_type(),
    })
}

/// `<sanitized chat name>-export.<ext>`.
#[must_use]
pub fn export_filename(chat_name: &str, format: ExportFormat) -> String {
    let kept: String = chat_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' '))
        .collect();
    let mut collapsed = String::with_capacity(kept.len());
    let mut in_space = false;
    for c in kept.chars() {
        if c != ' ' {
            collapsed.push(c);
        } else if !in_space {
            collapsed.push('-');
        }
        in_space = c == ' ';
    }
    let safe: String = collapsed.chars().take(MAX_FILENAME_CHARS).collect();
    format!("{safe}-export.{}", format.extension())
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%d/%m/%Y, %H:%M:%S")
        .to_string()
}

/// Escapes text for HTML element and attribute content.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

const HTML_STYLE: &str = "body{font-family:Segoe UI,sans-serif;max-width:900px;margin:0 auto;\
padding:20px;background:#f5f5f5}\
.msg{background:#fff;padding:15px;margin:10px 0;border-radius:8px;\
box-shadow:0 1px 3px rgba(0,0,0,0.1)}\
.header{display:flex;justify-content:space-between;margin-bottom:8px;flex-wrap:wrap}\
.sender{font-weight:bold;color:#6264a7}.time{color:#666;font-size:0.85em}\
.content{white-space:pre-wrap;line-height:1.5}";

fn format_html(records: &[MessageRecord], chat_name: &str, exported_at: DateTime<Utc>) -> String {
    let name = escape_html(chat_name);
    let mut out = String::new();

    out.push_str("<!DOCTYPE html><html><head><meta charset=\"UTF-8\">");
    out.push_str(&format!("<title>{name} - Export</title>"));
    out.push_str(&format!("<style>{HTML_STYLE}</style></head><body>"));
    out.push_str(&format!("<h1 style=\"color:#6264a7\">{name}</h1>"));
    out.push_str(&format!(
        "<p style=\"color:#666\">Exported: {} | {} messages</p>",
        local_time(exported_at),
        records.len()
    ));

    for m in records {
        out.push_str("<div class=\"msg\"><div class=\"header\">");
        out.push_str(&format!(
            "<span class=\"sender\">{}</span><span class=\"time\">{}</span>",
            escape_html(&m.sender),
            escape_html(&m.timestamp)
        ));
        out.push_str(&format!(
            "</div><div class=\"content\">{}</div></div>",
            escape_html(&m.content)
        ));
    }

    out.push_str("</body></html>");
    out
}

fn format_text(records: &[MessageRecord], chat_name: &str, exported_at: DateTime<Utc>) -> String {
    let mut out = format!(
        "{chat_name}\nExported: {}\n{}\n\n",
        local_time(exported_at),
        "=".repeat(50)
    );

    for m in records {
        out.push_str(&format!("[{}] {}\n{}\n\n---\n\n", m.timestamp, m.sender, m.content));
    }

    out
}

fn format_json(
    records: &[MessageRecord],
    chat_name: &str,
    exported_at: DateTime<Utc>,
) -> Result<String> {
    let document = ChatExport {
        chat_name: chat_name.to_string(),
        export_date: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        message_count: records.len(),
        messages: records.to_vec(),
    };
    serde_json::to_string_pretty(&document).map_err(AppError::json_parse)
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn format_csv(records: &[MessageRecord]) -> String {
    let mut out = String::from("\u{FEFF}Timestamp,Sender,Content\n");

    for m in records {
        let content = m.content.replace("\r\n", " ").replace('\n', " ");
        out.push_str(&format!(
            "{},{},{}\n",
            csv_field(&m.timestamp),
            csv_field(&m.sender),
            csv_field(&content)
        ));
    }

    out
}

/// Formats a transcript as a terminal table.
pub fn format_transcript_table(records: &[MessageRecord]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Time", "Sender", "Message"]);

    for (i, m) in records.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            m.timestamp.clone(),
            truncate(&m.sender, 24),
            truncate(&m.content, 60),
        ]);
    }

    table.to_string()
}

/// Formats a collection report for display.
pub fn format_report(chat_name: &str, report: &CollectionReport) -> String {
    let mark = |ok: bool| if ok { "yes".green() } else { "no (bound hit)".yellow() };
    format!(
        "{} {}\n  Messages: {}\n  Top sweep: {} iterations, reached: {}\n  Bottom sweep: {} iterations, reached: {}",
        "📥 Collected".bold(),
        chat_name.cyan(),
        report.message_count.to_string().cyan(),
        report.top_iterations,
        mark(report.reached_top),
        report.bottom_iterations,
        mark(report.reached_bottom)
    )
}

/// First line of `s`, cut to `max_len` characters with an ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.lines().next().unwrap_or(s);
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
