//! PDF table extraction: per-document text and table-grid extraction, date
//! resolution, and price-cell cleaning.

pub mod dates;
pub mod grid;
pub mod pdf;
pub mod price;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{error, info};

use crate::normalize::{self, PriceRecord};

/// One document that could not be processed. The batch keeps going.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionError {
    pub pdf: PathBuf,
    pub error: String,
}

/// Everything the extraction phase produced, threaded explicitly to the
/// caller instead of accumulating in ambient state.
#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    pub records: Vec<PriceRecord>,
    pub errors: Vec<ExtractionError>,
    pub pdfs_processed: usize,
    pub tables_extracted: usize,
}

/// Extract and normalize every `*.pdf` under `pdf_dir`.
///
/// A malformed document is logged and recorded in the error list without
/// aborting the batch; an empty input directory is fatal.
pub fn process_dir(pdf_dir: &Path) -> Result<ExtractionOutcome> {
    let pattern = format!("{}/*.pdf", pdf_dir.display());
    let mut pdf_paths: Vec<PathBuf> = glob::glob(&pattern)
        .context("invalid glob pattern for PDF directory")?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    pdf_paths.sort();

    if pdf_paths.is_empty() {
        bail!("no PDF files found in {}", pdf_dir.display());
    }
    info!(count = pdf_paths.len(), dir = %pdf_dir.display(), "processing PDFs");

    let mut outcome = ExtractionOutcome::default();
    for (i, path) in pdf_paths.iter().enumerate() {
        info!("[{}/{}] {}", i + 1, pdf_paths.len(), path.display());
        match pdf::extract_tables(path) {
            Ok(tables) => {
                outcome.pdfs_processed += 1;
                outcome.tables_extracted += tables.len();
                for table in &tables {
                    outcome.records.extend(normalize::normalize(table));
                }
            }
            Err(e) => {
                error!("failed to process {}: {e:#}", path.display());
                outcome.errors.push(ExtractionError {
                    pdf: path.clone(),
                    error: format!("{e:#}"),
                });
            }
        }
    }

    info!(
        pdfs = outcome.pdfs_processed,
        tables = outcome.tables_extracted,
        records = outcome.records.len(),
        errors = outcome.errors.len(),
        "extraction complete"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = process_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no PDF files"));
    }

    #[test]
    fn malformed_pdf_is_recorded_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Del 01-03-24 al 07-03-24.pdf"), b"not a pdf").unwrap();
        let outcome = process_dir(dir.path()).unwrap();
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.records.is_empty());
    }
}
