//! Application layer - use cases and orchestration.
//!
//! This layer turns rendered chat views into transcripts: field resolution,
//! extraction, scroll-driven collection, and export formatting.

pub mod accumulator;
pub mod collector;
pub mod extractor;
pub mod formatter;
pub mod resolver;
pub mod session;

pub use accumulator::sort_by_datetime;
pub use collector::ScrollCollector;
pub use extractor::MessageExtractor;
pub use formatter::{format_report, format_transcript_table, ExportFormat};
pub use session::ChatSession;
