use once_cell::sync::Lazy;
use regex::Regex;

/// A 2D cell grid detected on one page. The first detected line is treated as
/// the header-candidate row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Column boundaries in extracted PDF text: a tab, or a run of 2+ spaces.
static CELL_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\t|\s{2,}").expect("cell split regex must be valid"));

/// Detect table blocks in one page of extracted text.
///
/// A table block is a run of consecutive lines that each split into at least
/// two cells. Blocks shorter than two lines (header plus at least one data
/// row) carry no usable data and are skipped. Empty header cells are renamed
/// `col_{i}` so downstream keyword matching stays total.
pub fn extract_tables(page_text: &str) -> Vec<RawTable> {
    let mut tables = Vec::new();
    let mut block: Vec<Vec<String>> = Vec::new();

    for line in page_text.lines() {
        let cells = split_cells(line);
        if cells.len() >= 2 {
            block.push(cells);
        } else if !block.is_empty() {
            flush_block(std::mem::take(&mut block), &mut tables);
        }
    }
    flush_block(block, &mut tables);

    tables
}

fn flush_block(block: Vec<Vec<String>>, tables: &mut Vec<RawTable>) {
    if block.len() < 2 {
        return;
    }
    let mut iter = block.into_iter();
    let headers: Vec<String> = iter
        .next()
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, h)| {
            if h.trim().is_empty() {
                format!("col_{i}")
            } else {
                h.trim().to_string()
            }
        })
        .collect();
    let rows: Vec<Vec<String>> = iter
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .collect();
    if rows.is_empty() {
        return;
    }
    tables.push(RawTable { headers, rows });
}

fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    CELL_SPLIT_RE
        .split(trimmed)
        .map(|c| c.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_space_aligned_table() {
        let page = "\
BOLETIN DE PRECIOS
Lugar          Precio Novillo    Precio Ternera
Divisa         150.00            180.00
Aguadulce      145.50            175.25

Notas al pie";
        let tables = extract_tables(page);
        assert_eq!(tables.len(), 1);
        let t = &tables[0];
        assert_eq!(
            t.headers,
            vec!["Lugar", "Precio Novillo", "Precio Ternera"]
        );
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0], vec!["Divisa", "150.00", "180.00"]);
    }

    #[test]
    fn splits_on_tabs() {
        let page = "Categoría\tMercado A\tMercado B\nTernera\t100\t110\n";
        let tables = extract_tables(page);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].headers, vec!["Categoría", "Mercado A", "Mercado B"]);
        assert_eq!(tables[0].rows, vec![vec!["Ternera", "100", "110"]]);
    }

    #[test]
    fn header_only_block_is_skipped() {
        let page = "Lugar    Precio\n\nTexto corrido sin columnas";
        assert!(extract_tables(page).is_empty());
    }

    #[test]
    fn separate_blocks_become_separate_tables() {
        let page = "\
Lugar     Precio
Divisa    150

Categoría    Valor
Novillo      200";
        let tables = extract_tables(page);
        assert_eq!(tables.len(), 2);
    }

    #[test]
    fn plain_prose_yields_no_tables() {
        let page = "Informe semanal de la subasta de ganado.\nSin tablas aquí.";
        assert!(extract_tables(page).is_empty());
    }
}
