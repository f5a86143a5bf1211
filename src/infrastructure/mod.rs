//! Infrastructure layer - page models and external adapters.
//!
//! Holds the concrete trees the application scans, chat identity lookup,
//! configuration files and export delivery.

pub mod config;
pub mod document;
pub mod file_sink;
pub mod page_metadata;
pub mod virtual_chat;

pub use config::{ensure_config_exists, load_config};
pub use document::{Document, NodeId};
pub use file_sink::{DirectorySink, FileSink};
pub use page_metadata::resolve_chat_name;
pub use virtual_chat::VirtualizedChat;
