use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};

use crate::normalize::{PriceRecord, TableType};

const DATE_FMT: &str = "%Y-%m-%d";

/// Write the record set into a fresh `precios_ganado` table with the same
/// column layout as the CSV store, indexed for the common query axes.
pub fn write_sqlite(records: &[PriceRecord], path: &Path) -> Result<()> {
    let conn = Connection::open(path)
        .with_context(|| format!("opening {}", path.display()))?;

    conn.execute("DROP TABLE IF EXISTS precios_ganado", [])
        .context("dropping stale precios_ganado table")?;
    conn.execute(
        "CREATE TABLE precios_ganado (
            fecha_desde TEXT,
            fecha_hasta TEXT,
            lugar       TEXT NOT NULL,
            categoria   TEXT NOT NULL,
            precio      REAL NOT NULL,
            fuente_pdf  TEXT NOT NULL,
            tipo_tabla  TEXT NOT NULL
        )",
        [],
    )
    .context("creating precios_ganado table")?;

    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO precios_ganado
             (fecha_desde, fecha_hasta, lugar, categoria, precio, fuente_pdf, tipo_tabla)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for r in records {
            stmt.execute(params![
                r.fecha_desde.map(|d| d.format(DATE_FMT).to_string()),
                r.fecha_hasta.map(|d| d.format(DATE_FMT).to_string()),
                r.lugar,
                r.categoria,
                r.precio,
                r.fuente_pdf,
                r.tipo_tabla.as_str(),
            ])?;
        }
    }
    tx.commit().context("committing record inserts")?;

    for (name, column) in [
        ("idx_fecha_desde", "fecha_desde"),
        ("idx_fecha_hasta", "fecha_hasta"),
        ("idx_lugar", "lugar"),
        ("idx_categoria", "categoria"),
    ] {
        conn.execute(
            &format!("CREATE INDEX IF NOT EXISTS {name} ON precios_ganado({column})"),
            [],
        )
        .with_context(|| format!("creating index {name}"))?;
    }

    Ok(())
}

pub fn read_sqlite(path: &Path) -> Result<Vec<PriceRecord>> {
    let conn = Connection::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut stmt = conn.prepare(
        "SELECT fecha_desde, fecha_hasta, lugar, categoria, precio, fuente_pdf, tipo_tabla
         FROM precios_ganado",
    )?;
    let rows = stmt.query_map([], |row| {
        let fecha_desde: Option<String> = row.get(0)?;
        let fecha_hasta: Option<String> = row.get(1)?;
        let tipo: String = row.get(6)?;
        Ok(PriceRecord {
            fecha_desde: fecha_desde.and_then(|s| parse_date(&s)),
            fecha_hasta: fecha_hasta.and_then(|s| parse_date(&s)),
            lugar: row.get(2)?,
            categoria: row.get(3)?,
            precio: row.get(4)?,
            fuente_pdf: row.get(5)?,
            tipo_tabla: TableType::from_db_str(&tipo),
        })
    })?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row.context("reading record row")?);
    }
    Ok(records)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT).ok()
}
