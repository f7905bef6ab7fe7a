use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::extract::{dates, grid};
use crate::normalize::{classify, ClassifiedTable};

/// Extract and classify every table in one PDF.
///
/// The full document text is scanned for the bulletin's date range first;
/// the filename is the fallback. Pages are split on form feeds (a document
/// without them is treated as a single page). Any failure here is a permanent
/// per-document failure; the caller records it and moves on.
pub fn extract_tables(pdf_path: &Path) -> Result<Vec<ClassifiedTable>> {
    let bytes = fs::read(pdf_path)
        .with_context(|| format!("reading {}", pdf_path.display()))?;
    let full_text = pdf_extract::extract_text_from_mem(&bytes)
        .map_err(|e| anyhow::anyhow!("extracting text from {}: {e}", pdf_path.display()))?;

    let filename = pdf_path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_default();
    let range = dates::resolve(&full_text, &filename);
    if range.is_none() {
        debug!(pdf = %filename, "no date range resolved");
    }

    let mut tables = Vec::new();
    for (page_idx, page_text) in full_text.split('\u{c}').enumerate() {
        for (table_idx, raw) in grid::extract_tables(page_text).into_iter().enumerate() {
            let table_type = classify(&raw);
            tables.push(ClassifiedTable {
                table: raw,
                table_type,
                dates: range,
                source: filename.clone(),
                page: page_idx + 1,
                table_num: table_idx + 1,
            });
        }
    }

    debug!(pdf = %filename, tables = tables.len(), "extracted tables");
    Ok(tables)
}
