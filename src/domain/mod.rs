//! Domain layer - core types, page abstraction and errors.
//!
//! This layer contains pure domain models and the traits the pipeline uses to
//! read a chat view, without any concrete page or file access.

pub mod config;
pub mod dom;
pub mod error;
pub mod models;
pub mod selector;

pub use config::{AppConfig, CollectorConfig, ExtractorConfig, MarkerConfig};
pub use dom::{DomTree, NodeMatcher, ScrollSurface};
pub use error::{AppError, Result};
pub use models::{
    parse_instant, ActionResponse, ChatExport, ChatStatus, CollectionReport, ExportFile,
    MessageCount, MessageKey, MessageRecord,
};
pub use selector::Selector;
