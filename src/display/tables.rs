//! Table formatting utilities for structured output.

use comfy_table::{
    Attribute, Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

use crate::coordinator::{IndexStats, SearchResult};
use crate::store::{Document, Metadata};
use crate::vector::display_distance;

/// Characters of document text shown in a table cell.
const PREVIEW_CHARS: usize = 60;

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Create a new table builder.
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        Self { table }
    }

    /// Set the table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    /// Add a row to the table.
    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

/// Collapses whitespace and cuts `text` to `max_chars` characters.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn format_metadata(metadata: &Metadata) -> String {
    metadata
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Ranked query hits.
pub fn create_results_table(results: &[SearchResult]) -> String {
    let mut builder = TableBuilder::new().set_headers(vec!["#", "Id", "Score", "Distance", "Text"]);
    for (rank, result) in results.iter().enumerate() {
        builder = builder.add_row(vec![
            (rank + 1).to_string(),
            result.id.clone(),
            format!("{:.4}", result.score),
            format!("{:.4}", display_distance(result.distance)),
            preview(&result.text, PREVIEW_CHARS),
        ]);
    }
    builder.build()
}

/// Every stored document in corpus order.
pub fn create_documents_table(documents: &[Document]) -> String {
    let mut builder = TableBuilder::new().set_headers(vec!["Id", "Text", "Metadata"]);
    for document in documents {
        builder = builder.add_row(vec![
            document.id.clone(),
            preview(&document.text, PREVIEW_CHARS),
            format_metadata(&document.metadata),
        ]);
    }
    builder.build()
}

/// Index statistics as a two-column table.
pub fn create_stats_table(stats: &IndexStats) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);

    table.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    table.add_row(vec!["Collection", stats.name.as_str()]);
    table.add_row(vec!["Documents", &stats.document_count.to_string()]);
    table.add_row(vec!["Index rows", &stats.index_size.to_string()]);
    table.add_row(vec!["Max features", &stats.feature_dimension.to_string()]);
    table.add_row(vec!["Vocabulary", &stats.vocabulary_size.to_string()]);

    let directory = stats
        .persist_directory
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<in memory>".to_string());
    table.add_row(vec!["Persist directory", directory.as_str()]);

    let color = if stats.index_built {
        Color::Green
    } else {
        Color::Yellow
    };
    table.add_row(vec![
        Cell::new("State"),
        Cell::new(stats.state.to_string())
            .fg(color)
            .add_attribute(Attribute::Bold),
    ]);

    table.to_string()
}
