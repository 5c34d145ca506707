//! Flat export formats

use crate::record::AnnotationRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Text,
    Csv,
    Json,
}

/// Target lexemes, one per line.
pub fn export_text(records: &[AnnotationRecord]) -> String {
    records
        .iter()
        .map(|r| r.target_lexeme.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// `targetLexeme,sourceContext` with every value double-quoted.
pub fn export_csv(records: &[AnnotationRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push("targetLexeme,sourceContext".to_string());
    for record in records {
        lines.push(format!(
            "{},{}",
            quote(&record.target_lexeme),
            quote(&record.source_context)
        ));
    }
    lines.join("\n")
}

/// Pretty-printed array of full records.
pub fn export_json(records: &[AnnotationRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

pub fn render(format: ExportFormat, records: &[AnnotationRecord]) -> serde_json::Result<String> {
    match format {
        ExportFormat::Text => Ok(export_text(records)),
        ExportFormat::Csv => Ok(export_csv(records)),
        ExportFormat::Json => export_json(records),
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
