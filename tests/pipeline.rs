//! End-to-end normalization pipeline over bulletin page text, and the
//! store/analysis/report chain on the resulting records.

use chrono::NaiveDate;
use ganadoscraper::analysis;
use ganadoscraper::extract::{dates, grid};
use ganadoscraper::normalize::{self, ClassifiedTable, TableType};
use ganadoscraper::report;
use ganadoscraper::store;

fn classify_page(page_text: &str, source: &str) -> Vec<ClassifiedTable> {
    let range = dates::resolve(page_text, source);
    grid::extract_tables(page_text)
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let table_type = normalize::classify(&raw);
            ClassifiedTable {
                table: raw,
                table_type,
                dates: range,
                source: source.to_string(),
                page: 1,
                table_num: i + 1,
            }
        })
        .collect()
}

#[test]
fn category_market_grid_yields_one_record_per_market() {
    let page = "\
Subasta Ganadera - Semana del 05-03-24

Categoría    Mercado A    Mercado B
Ternera      100          110
";
    let tables = classify_page(page, "boletin.pdf");
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].table_type, TableType::General);

    let records: Vec<_> = tables.iter().flat_map(normalize::normalize).collect();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].categoria, "Ternera");
    assert_eq!(records[0].lugar, "Mercado A");
    assert_eq!(records[0].precio, 100.0);
    assert_eq!(records[1].lugar, "Mercado B");
    assert_eq!(records[1].precio, 110.0);

    // The "Semana" heading supplies a collapsed date range.
    let expected = NaiveDate::from_ymd_opt(2024, 3, 5);
    assert!(records
        .iter()
        .all(|r| r.fecha_desde == expected && r.fecha_hasta == expected));
}

#[test]
fn filename_dates_apply_when_text_has_none() {
    let page = "\
Lugar        Precio Novillo
Divisa       B/. 1,234.56
Aguadulce    N/D
";
    let tables = classify_page(page, "Del 01-03-24 al 07-03-24.pdf");
    assert_eq!(tables[0].table_type, TableType::PorLugar);

    let records: Vec<_> = tables.iter().flat_map(normalize::normalize).collect();
    // The N/D cell contributes nothing.
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].lugar, "Divisa");
    assert_eq!(records[0].precio, 1234.56);
    assert_eq!(records[0].fecha_desde, NaiveDate::from_ymd_opt(2024, 3, 1));
    assert_eq!(records[0].fecha_hasta, NaiveDate::from_ymd_opt(2024, 3, 7));
}

#[test]
fn records_survive_store_analysis_and_report() {
    let page_enero = "\
Lugar        Precio Novillo    Precio Ternera
Divisa       150.00            180.00
Aguadulce    145.50            175.25
";
    let page_junio = "\
Lugar        Precio Novillo    Precio Ternera
Divisa       210.00            240.00
Aguadulce    205.00            235.00
";
    let mut records = Vec::new();
    for (page, source) in [
        (page_enero, "Del 08-01-24 al 14-01-24.pdf"),
        (page_junio, "Del 03-06-24 al 09-06-24.pdf"),
    ] {
        for table in classify_page(page, source) {
            records.extend(normalize::normalize(&table));
        }
    }
    assert_eq!(records.len(), 8);

    let data_dir = tempfile::tempdir().unwrap();
    let location = store::save_records(&records, data_dir.path()).unwrap();
    assert!(matches!(location, store::StoreLocation::Csv(_)));
    let loaded = store::load_records(data_dir.path()).unwrap();
    assert_eq!(loaded.len(), records.len());

    let analysis = analysis::analyze(&loaded).unwrap();
    assert_eq!(analysis.monthly.len(), 2);
    assert_eq!(analysis.best_buy.first().map(|m| m.mes), Some(1));
    assert_eq!(analysis.best_sell.first().map(|m| m.mes), Some(6));

    let resumen = store::summarize(&loaded);
    let generated_at = NaiveDate::from_ymd_opt(2024, 7, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    let text = report::render(&analysis, &resumen, generated_at);
    assert!(text.contains("COMPRAR en: Enero"));
    assert!(text.contains("VENDER en: Junio"));
}
