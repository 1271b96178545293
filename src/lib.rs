pub mod adf;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod menu;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod query;

pub use client::{Auth, JiraClient, JiraConfig};
pub use error::Error;
pub use models::*;

pub use adf::DescriptionMode;
pub use config::{ConfigFile, ExportConfig};
pub use query::QueryExecutor;

// Normalizer re-exports
pub use normalize::{COLUMN_TITLES, NormalizedRow, Normalizer};

// Exporter re-exports
pub use export::{ExportSummary, MetricValue, SpreadsheetExporter, column_widths, default_filename};

// Query selection re-exports
pub use menu::{FixedQuery, PromptSelector, QuerySelector, SelectedQuery, preset_queries};

pub use pipeline::{ExportOutcome, ExportPipeline};
