//! Terminal display helpers for the CLI: tables, progress bars, and styling.

pub mod progress;
pub mod tables;
pub mod theme;

pub use progress::{create_progress_bar, create_spinner, with_spinner};
pub use tables::{TableBuilder, create_documents_table, create_results_table, create_stats_table};
pub use theme::{THEME, Theme};
