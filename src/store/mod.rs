//! Record store: the normalized record set is written once, to CSV for
//! ordinary runs or to SQLite past a record-count threshold, plus a JSON
//! summary and (when present) a JSON error dump.

mod csv_store;
mod sqlite_store;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::extract::ExtractionError;
use crate::normalize::PriceRecord;

pub use csv_store::{read_csv, write_csv};
pub use sqlite_store::{read_sqlite, write_sqlite};

/// Past this many records CSV handling gets unwieldy and SQLite takes over.
pub const SQLITE_THRESHOLD: usize = 50_000;

const CSV_NAME: &str = "precios_ganado.csv";
const DB_NAME: &str = "precios_ganado.db";

/// Where the record set ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Csv(PathBuf),
    Sqlite(PathBuf),
}

impl StoreLocation {
    pub fn path(&self) -> &Path {
        match self {
            Self::Csv(p) | Self::Sqlite(p) => p,
        }
    }
}

/// Sort records by start date (dateless records last) and write them once.
/// Format is chosen by record count; the stored file is never updated in
/// place afterwards.
pub fn save_records(records: &[PriceRecord], data_dir: &Path) -> Result<StoreLocation> {
    if records.is_empty() {
        bail!("no records to save");
    }
    fs::create_dir_all(data_dir)
        .with_context(|| format!("creating {}", data_dir.display()))?;

    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| (r.fecha_desde.is_none(), r.fecha_desde));

    let location = if sorted.len() > SQLITE_THRESHOLD {
        let path = data_dir.join(DB_NAME);
        write_sqlite(&sorted, &path)?;
        StoreLocation::Sqlite(path)
    } else {
        let path = data_dir.join(CSV_NAME);
        write_csv(&sorted, &path)?;
        StoreLocation::Csv(path)
    };

    info!(records = sorted.len(), path = %location.path().display(), "records saved");
    Ok(location)
}

/// Load records back, auto-detecting the store format. SQLite wins when both
/// files exist, matching the save-side preference for large runs.
pub fn load_records(data_dir: &Path) -> Result<Vec<PriceRecord>> {
    let db_path = data_dir.join(DB_NAME);
    let csv_path = data_dir.join(CSV_NAME);
    if db_path.exists() {
        read_sqlite(&db_path)
    } else if csv_path.exists() {
        read_csv(&csv_path)
    } else {
        bail!("no record store found in {}", data_dir.display())
    }
}

/// Dataset summary written alongside the store as `resumen.json`.
#[derive(Debug, Serialize)]
pub struct Resumen {
    pub total_registros: usize,
    pub fecha_minima: Option<NaiveDate>,
    pub fecha_maxima: Option<NaiveDate>,
    pub lugares_unicos: usize,
    pub categorias_unicas: usize,
    pub precio_min: f64,
    pub precio_max: f64,
    pub precio_promedio: f64,
    pub lugares: Vec<String>,
    pub categorias: Vec<String>,
}

pub fn summarize(records: &[PriceRecord]) -> Resumen {
    let lugares: BTreeSet<&str> = records.iter().map(|r| r.lugar.as_str()).collect();
    let categorias: BTreeSet<&str> = records.iter().map(|r| r.categoria.as_str()).collect();
    let precios: Vec<f64> = records.iter().map(|r| r.precio).collect();
    let sum: f64 = precios.iter().sum();

    Resumen {
        total_registros: records.len(),
        fecha_minima: records.iter().filter_map(|r| r.fecha_desde).min(),
        fecha_maxima: records.iter().filter_map(|r| r.fecha_hasta).max(),
        lugares_unicos: lugares.len(),
        categorias_unicas: categorias.len(),
        precio_min: precios.iter().copied().fold(f64::INFINITY, f64::min),
        precio_max: precios.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        precio_promedio: if precios.is_empty() { 0.0 } else { sum / precios.len() as f64 },
        lugares: lugares.into_iter().map(String::from).collect(),
        categorias: categorias.into_iter().map(String::from).collect(),
    }
}

pub fn save_summary(records: &[PriceRecord], data_dir: &Path) -> Result<PathBuf> {
    let resumen = summarize(records);
    let path = data_dir.join("resumen.json");
    let json = serde_json::to_string_pretty(&resumen).context("serializing resumen")?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "summary saved");
    Ok(path)
}

/// Dump the per-document error list next to the store, if any.
pub fn save_errors(errors: &[ExtractionError], data_dir: &Path) -> Result<Option<PathBuf>> {
    if errors.is_empty() {
        return Ok(None);
    }
    let path = data_dir.join("errores.json");
    let json = serde_json::to_string_pretty(errors).context("serializing error list")?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(count = errors.len(), path = %path.display(), "errors saved");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::TableType;

    fn record(lugar: &str, categoria: &str, precio: f64, desde: Option<&str>) -> PriceRecord {
        PriceRecord {
            fecha_desde: desde.map(|d| d.parse().unwrap()),
            fecha_hasta: desde.map(|d| d.parse().unwrap()),
            lugar: lugar.into(),
            categoria: categoria.into(),
            precio,
            fuente_pdf: "test.pdf".into(),
            tipo_tabla: TableType::PorLugar,
        }
    }

    #[test]
    fn small_batches_go_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record("Divisa", "Novillo", 150.0, Some("2024-03-01")),
            record("Aguadulce", "Ternera", 180.0, Some("2024-02-01")),
        ];
        let location = save_records(&records, dir.path()).unwrap();
        assert!(matches!(location, StoreLocation::Csv(_)));

        let loaded = load_records(dir.path()).unwrap();
        assert_eq!(loaded.len(), 2);
        // Sorted by fecha_desde on write.
        assert_eq!(loaded[0].lugar, "Aguadulce");
    }

    #[test]
    fn dateless_records_sort_last_and_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record("Sin Fecha", "Novillo", 100.0, None),
            record("Divisa", "Novillo", 150.0, Some("2024-03-01")),
        ];
        save_records(&records, dir.path()).unwrap();
        let loaded = load_records(dir.path()).unwrap();
        assert_eq!(loaded[0].lugar, "Divisa");
        assert_eq!(loaded[1].fecha_desde, None);
    }

    #[test]
    fn empty_record_set_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(save_records(&[], dir.path()).is_err());
    }

    #[test]
    fn summary_counts_and_ranges() {
        let records = vec![
            record("Divisa", "Novillo", 100.0, Some("2024-01-01")),
            record("Divisa", "Ternera", 200.0, Some("2024-06-01")),
            record("Aguadulce", "Novillo", 300.0, None),
        ];
        let resumen = summarize(&records);
        assert_eq!(resumen.total_registros, 3);
        assert_eq!(resumen.lugares_unicos, 2);
        assert_eq!(resumen.categorias_unicas, 2);
        assert_eq!(resumen.precio_min, 100.0);
        assert_eq!(resumen.precio_max, 300.0);
        assert_eq!(resumen.precio_promedio, 200.0);
        assert_eq!(resumen.fecha_minima, Some("2024-01-01".parse().unwrap()));
        assert_eq!(resumen.fecha_maxima, Some("2024-06-01".parse().unwrap()));
        assert_eq!(resumen.lugares, vec!["Aguadulce", "Divisa"]);
    }
}
