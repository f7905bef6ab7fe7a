//! Table classification and flat-record normalization.
//!
//! Bulletin tables come in three shapes: rows keyed by auction location with
//! one price column per animal category, rows keyed by category with one
//! column per market, and generic grids. Classification is a pure function of
//! the header row plus the first data cell; each shape gets its own
//! normalization strategy.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::dates::DateRange;
use crate::extract::grid::RawTable;
use crate::extract::price::clean_price;

const KEYWORDS_LUGAR: &[&str] = &["lugar", "feria", "mercado", "ubicación", "sitio"];
const KEYWORDS_CATEGORIA: &[&str] = &["categoría", "categoria", "tipo", "clase"];
const KEYWORDS_PRECIO: &[&str] = &["precio", "valor", "monto", "b/", "$"];

/// Which column semantics a raw table was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    PorLugar,
    PorCategoria,
    General,
}

impl TableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PorLugar => "por_lugar",
            Self::PorCategoria => "por_categoria",
            Self::General => "general",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "por_lugar" => Self::PorLugar,
            "por_categoria" => Self::PorCategoria,
            _ => Self::General,
        }
    }
}

impl std::fmt::Display for TableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw table plus everything normalization needs: shape class, resolved
/// date range, and source coordinates. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct ClassifiedTable {
    pub table: RawTable,
    pub table_type: TableType,
    pub dates: Option<DateRange>,
    pub source: String,
    pub page: usize,
    pub table_num: usize,
}

/// The canonical normalized unit. `precio` is always finite and positive;
/// cells that fail price cleaning produce no record at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub fecha_desde: Option<NaiveDate>,
    pub fecha_hasta: Option<NaiveDate>,
    pub lugar: String,
    pub categoria: String,
    pub precio: f64,
    pub fuente_pdf: String,
    pub tipo_tabla: TableType,
}

/// Classify a table from its headers and first data cell.
pub fn classify(table: &RawTable) -> TableType {
    if table.headers.is_empty() || table.rows.is_empty() {
        return TableType::General;
    }

    let headers: Vec<String> = table.headers.iter().map(|h| h.to_lowercase()).collect();
    let first_cell = table
        .rows
        .first()
        .and_then(|r| r.first())
        .map(|c| c.to_lowercase())
        .unwrap_or_default();
    let haystack = format!("{} {}", headers.join(" "), first_cell);
    let header_haystack = headers.join(" ");

    let has_lugar = KEYWORDS_LUGAR.iter().any(|kw| haystack.contains(kw));
    let has_categoria = KEYWORDS_CATEGORIA.iter().any(|kw| haystack.contains(kw));
    // Price keywords only make sense in column headers, not in data cells.
    let has_precio = KEYWORDS_PRECIO.iter().any(|kw| header_haystack.contains(kw));

    if has_lugar && has_precio {
        TableType::PorLugar
    } else if has_categoria && has_precio {
        TableType::PorCategoria
    } else {
        TableType::General
    }
}

/// Normalize a classified table into zero or more flat records. Pure: the
/// same input always yields the same record sequence.
pub fn normalize(table: &ClassifiedTable) -> Vec<PriceRecord> {
    match table.table_type {
        TableType::PorLugar => normalize_por_lugar(table),
        TableType::PorCategoria => normalize_por_categoria(table),
        TableType::General => normalize_general(table),
    }
}

fn normalize_por_lugar(ct: &ClassifiedTable) -> Vec<PriceRecord> {
    let headers = &ct.table.headers;
    let mut records = Vec::new();

    // The location column is the first header matching a location keyword;
    // the first column is the fallback.
    let lugar_col = headers
        .iter()
        .position(|h| {
            let h = h.to_lowercase();
            ["lugar", "feria", "mercado"].iter().any(|kw| h.contains(kw))
        })
        .unwrap_or(0);

    for row in &ct.table.rows {
        let Some(lugar) = row.get(lugar_col).map(|c| c.trim()) else {
            continue;
        };
        if lugar.is_empty() {
            continue;
        }
        for (col, header) in headers.iter().enumerate() {
            let h = header.to_lowercase();
            if !["precio", "valor", "b/", "$"].iter().any(|kw| h.contains(kw)) {
                continue;
            }
            if let Some(precio) = row.get(col).and_then(|c| clean_price(c)).filter(|p| *p > 0.0) {
                records.push(make_record(ct, lugar, header, precio));
            }
        }
    }

    records
}

fn normalize_por_categoria(ct: &ClassifiedTable) -> Vec<PriceRecord> {
    let headers = &ct.table.headers;
    let mut records = Vec::new();

    let categoria_col = headers
        .iter()
        .position(|h| {
            let h = h.to_lowercase();
            ["categoría", "categoria", "tipo"].iter().any(|kw| h.contains(kw))
        })
        .unwrap_or(0);

    for row in &ct.table.rows {
        let Some(categoria) = row.get(categoria_col).map(|c| c.trim()) else {
            continue;
        };
        if categoria.is_empty() {
            continue;
        }
        for (col, header) in headers.iter().enumerate().skip(1) {
            if col == categoria_col {
                continue;
            }
            if let Some(precio) = row.get(col).and_then(|c| clean_price(c)).filter(|p| *p > 0.0) {
                // A bare "Precio" column carries no market name.
                let lugar = if header.to_lowercase().contains("precio") {
                    "General"
                } else {
                    header.as_str()
                };
                records.push(make_record(ct, lugar, categoria, precio));
            }
        }
    }

    records
}

fn normalize_general(ct: &ClassifiedTable) -> Vec<PriceRecord> {
    let headers = &ct.table.headers;
    let mut records = Vec::new();

    let first_header = headers.first().map(|h| h.to_lowercase()).unwrap_or_default();
    let id_is_lugar = first_header.contains("lugar");
    let id_is_categoria = first_header.contains("categ");
    if !id_is_lugar && !id_is_categoria {
        // Ambiguous identifier column: treat rows as categories and columns
        // as locations, the dominant bulletin layout.
        debug!(
            source = %ct.source,
            header = %first_header,
            "ambiguous first column in general table, assuming category rows"
        );
    }

    for row in &ct.table.rows {
        let Some(identifier) = row.first().map(|c| c.trim()) else {
            continue;
        };
        if identifier.is_empty() {
            continue;
        }
        for (col, header) in headers.iter().enumerate().skip(1) {
            let Some(precio) = row.get(col).and_then(|c| clean_price(c)).filter(|p| *p > 0.0)
            else {
                continue;
            };
            let (lugar, categoria) = if id_is_lugar {
                (identifier, header.as_str())
            } else {
                (header.as_str(), identifier)
            };
            records.push(make_record(ct, lugar, categoria, precio));
        }
    }

    records
}

fn make_record(ct: &ClassifiedTable, lugar: &str, categoria: &str, precio: f64) -> PriceRecord {
    PriceRecord {
        fecha_desde: ct.dates.map(|d| d.desde),
        fecha_hasta: ct.dates.map(|d| d.hasta),
        lugar: lugar.trim().to_string(),
        categoria: categoria.trim().to_string(),
        precio,
        fuente_pdf: ct.source.clone(),
        tipo_tabla: ct.table_type,
    }
}
