//! Descriptive statistics over the normalized record set: seasonal (calendar
//! month across years) price trends, location and category comparisons, and
//! IQR outlier detection.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use chrono::Datelike;
use tracing::info;

use crate::normalize::PriceRecord;

pub const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

pub fn month_name(mes: u32) -> &'static str {
    MONTH_NAMES[(mes as usize - 1) % 12]
}

/// Price statistics for one calendar month, collapsed across years.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyStats {
    pub mes: u32,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; `None` with fewer than two records.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

/// Per-location aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct LugarStats {
    pub lugar: String,
    pub mean: f64,
    pub count: usize,
}

/// Category-by-month mean matrix for the heatmap, restricted to the most
/// traded categories.
#[derive(Debug, Clone)]
pub struct CategoryMonthMatrix {
    pub categorias: Vec<String>,
    /// `values[cat][mes - 1]`, `None` where a category has no records.
    pub values: Vec<Vec<Option<f64>>>,
}

/// IQR outlier summary (1.5 × IQR fences).
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierSummary {
    pub count: usize,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub precio_min: Option<f64>,
    pub precio_max: Option<f64>,
}

/// Everything the report and chart consume, computed in one pass.
#[derive(Debug, Clone)]
pub struct SeasonalAnalysis {
    pub total_records: usize,
    pub monthly: Vec<MonthlyStats>,
    pub best_buy: Vec<MonthlyStats>,
    pub best_sell: Vec<MonthlyStats>,
    pub lugares: Vec<LugarStats>,
    pub matrix: CategoryMonthMatrix,
    pub top_categorias: Vec<(String, usize)>,
    pub outliers: OutlierSummary,
}

/// Run the full seasonal analysis. Records without a resolved start date are
/// excluded from the monthly grouping but still count toward location,
/// category, and outlier statistics.
pub fn analyze(records: &[PriceRecord]) -> Result<SeasonalAnalysis> {
    if records.is_empty() {
        bail!("no records to analyze");
    }

    let monthly = monthly_stats(records);
    if monthly.is_empty() {
        bail!("no records carry a resolved date; seasonal analysis is impossible");
    }

    let analysis = SeasonalAnalysis {
        total_records: records.len(),
        best_buy: best_buy_months(&monthly, 3),
        best_sell: best_sell_months(&monthly, 3),
        lugares: lugar_stats(records),
        matrix: category_month_matrix(records, 10),
        top_categorias: top_categorias(records, 10),
        outliers: find_outliers(records),
        monthly,
    };
    info!(
        months = analysis.monthly.len(),
        lugares = analysis.lugares.len(),
        outliers = analysis.outliers.count,
        "analysis complete"
    );
    Ok(analysis)
}

/// Group prices by calendar month-of-year, independent of year, so recurring
/// seasonal patterns surface instead of year-specific ones.
pub fn monthly_stats(records: &[PriceRecord]) -> Vec<MonthlyStats> {
    let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for r in records {
        if let Some(fecha) = r.fecha_desde {
            by_month.entry(fecha.month()).or_default().push(r.precio);
        }
    }

    by_month
        .into_iter()
        .map(|(mes, mut precios)| {
            precios.sort_by(|a, b| a.partial_cmp(b).expect("prices are finite"));
            MonthlyStats {
                mes,
                count: precios.len(),
                mean: mean(&precios),
                median: median_sorted(&precios),
                std: sample_std(&precios),
                min: precios[0],
                max: precios[precios.len() - 1],
            }
        })
        .collect()
}

/// The `n` cheapest months by mean price. Sorting is stable, so ties keep
/// their original month ordering.
pub fn best_buy_months(monthly: &[MonthlyStats], n: usize) -> Vec<MonthlyStats> {
    let mut sorted = monthly.to_vec();
    sorted.sort_by(|a, b| a.mean.partial_cmp(&b.mean).expect("means are finite"));
    sorted.truncate(n);
    sorted
}

/// The `n` most expensive months by mean price, ties broken by month order.
pub fn best_sell_months(monthly: &[MonthlyStats], n: usize) -> Vec<MonthlyStats> {
    let mut sorted = monthly.to_vec();
    sorted.sort_by(|a, b| b.mean.partial_cmp(&a.mean).expect("means are finite"));
    sorted.truncate(n);
    sorted
}

/// Per-location mean and count, ascending by mean so the head of the list is
/// the cheapest place to buy.
pub fn lugar_stats(records: &[PriceRecord]) -> Vec<LugarStats> {
    let mut by_lugar: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in records {
        by_lugar.entry(r.lugar.as_str()).or_default().push(r.precio);
    }
    let mut stats: Vec<LugarStats> = by_lugar
        .into_iter()
        .map(|(lugar, precios)| LugarStats {
            lugar: lugar.to_string(),
            mean: mean(&precios),
            count: precios.len(),
        })
        .collect();
    stats.sort_by(|a, b| a.mean.partial_cmp(&b.mean).expect("means are finite"));
    stats
}

/// Categories ranked by record count (most traded first), capped at `n`.
pub fn top_categorias(records: &[PriceRecord], n: usize) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in records {
        *counts.entry(r.categoria.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(c, n)| (c.to_string(), n))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

/// Mean price per (top category, month) pair.
pub fn category_month_matrix(records: &[PriceRecord], top_n: usize) -> CategoryMonthMatrix {
    let categorias: Vec<String> = top_categorias(records, top_n)
        .into_iter()
        .map(|(c, _)| c)
        .collect();

    let mut sums: BTreeMap<(usize, u32), (f64, usize)> = BTreeMap::new();
    for r in records {
        let Some(fecha) = r.fecha_desde else { continue };
        let Some(cat_idx) = categorias.iter().position(|c| *c == r.categoria) else {
            continue;
        };
        let entry = sums.entry((cat_idx, fecha.month())).or_default();
        entry.0 += r.precio;
        entry.1 += 1;
    }

    let values = (0..categorias.len())
        .map(|cat_idx| {
            (1..=12)
                .map(|mes| {
                    sums.get(&(cat_idx, mes))
                        .map(|(sum, count)| sum / *count as f64)
                })
                .collect()
        })
        .collect();

    CategoryMonthMatrix { categorias, values }
}

/// Flag prices outside the 1.5 × IQR fences.
pub fn find_outliers(records: &[PriceRecord]) -> OutlierSummary {
    let mut precios: Vec<f64> = records.iter().map(|r| r.precio).collect();
    precios.sort_by(|a, b| a.partial_cmp(b).expect("prices are finite"));
    if precios.is_empty() {
        return OutlierSummary {
            count: 0,
            lower_bound: 0.0,
            upper_bound: 0.0,
            precio_min: None,
            precio_max: None,
        };
    }

    let q1 = quantile_sorted(&precios, 0.25);
    let q3 = quantile_sorted(&precios, 0.75);
    let iqr = q3 - q1;
    let lower_bound = q1 - 1.5 * iqr;
    let upper_bound = q3 + 1.5 * iqr;

    let outliers: Vec<f64> = precios
        .iter()
        .copied()
        .filter(|p| *p < lower_bound || *p > upper_bound)
        .collect();

    OutlierSummary {
        count: outliers.len(),
        lower_bound,
        upper_bound,
        precio_min: outliers.first().copied(),
        precio_max: outliers.last().copied(),
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Linear-interpolation quantile over an already sorted slice.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::TableType;
    use chrono::NaiveDate;

    fn record(precio: f64, mes: u32, lugar: &str, categoria: &str) -> PriceRecord {
        PriceRecord {
            fecha_desde: NaiveDate::from_ymd_opt(2024, mes, 1),
            fecha_hasta: NaiveDate::from_ymd_opt(2024, mes, 7),
            lugar: lugar.into(),
            categoria: categoria.into(),
            precio,
            fuente_pdf: "test.pdf".into(),
            tipo_tabla: TableType::General,
        }
    }

    #[test]
    fn monthly_grouping_collapses_years() {
        let mut records = vec![record(100.0, 3, "Divisa", "Novillo")];
        let mut other_year = record(200.0, 3, "Divisa", "Novillo");
        other_year.fecha_desde = NaiveDate::from_ymd_opt(2023, 3, 1);
        records.push(other_year);

        let monthly = monthly_stats(&records);
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].mes, 3);
        assert_eq!(monthly[0].count, 2);
        assert_eq!(monthly[0].mean, 150.0);
    }

    #[test]
    fn monthly_stats_are_order_independent() {
        let records = vec![
            record(100.0, 1, "A", "X"),
            record(120.0, 1, "B", "X"),
            record(300.0, 2, "A", "Y"),
            record(310.0, 2, "B", "Y"),
        ];
        let mut shuffled = records.clone();
        shuffled.reverse();
        shuffled.rotate_left(1);
        assert_eq!(monthly_stats(&records), monthly_stats(&shuffled));
    }

    #[test]
    fn dateless_records_are_excluded_from_monthly() {
        let mut r = record(100.0, 1, "A", "X");
        r.fecha_desde = None;
        assert!(monthly_stats(&[r]).is_empty());
    }

    #[test]
    fn median_and_std() {
        let records = vec![
            record(100.0, 1, "A", "X"),
            record(200.0, 1, "A", "X"),
            record(600.0, 1, "A", "X"),
        ];
        let monthly = monthly_stats(&records);
        assert_eq!(monthly[0].median, 200.0);
        assert_eq!(monthly[0].min, 100.0);
        assert_eq!(monthly[0].max, 600.0);
        // Sample std of [100, 200, 600].
        let std = monthly[0].std.unwrap();
        assert!((std - 264.575).abs() < 0.001);
    }

    #[test]
    fn single_record_month_has_no_std() {
        let monthly = monthly_stats(&[record(100.0, 1, "A", "X")]);
        assert_eq!(monthly[0].std, None);
    }

    #[test]
    fn buy_and_sell_windows() {
        let records = vec![
            record(100.0, 1, "A", "X"),
            record(400.0, 2, "A", "X"),
            record(200.0, 3, "A", "X"),
            record(300.0, 4, "A", "X"),
        ];
        let monthly = monthly_stats(&records);
        let buy = best_buy_months(&monthly, 3);
        assert_eq!(
            buy.iter().map(|m| m.mes).collect::<Vec<_>>(),
            vec![1, 3, 4]
        );
        let sell = best_sell_months(&monthly, 3);
        assert_eq!(
            sell.iter().map(|m| m.mes).collect::<Vec<_>>(),
            vec![2, 4, 3]
        );
    }

    #[test]
    fn tied_means_keep_month_order() {
        let records = vec![
            record(100.0, 5, "A", "X"),
            record(100.0, 2, "A", "X"),
            record(100.0, 9, "A", "X"),
        ];
        let monthly = monthly_stats(&records);
        let buy = best_buy_months(&monthly, 3);
        assert_eq!(
            buy.iter().map(|m| m.mes).collect::<Vec<_>>(),
            vec![2, 5, 9]
        );
    }

    #[test]
    fn lugar_ranking_is_ascending_by_mean() {
        let records = vec![
            record(300.0, 1, "Caro", "X"),
            record(100.0, 1, "Barato", "X"),
            record(200.0, 1, "Medio", "X"),
        ];
        let stats = lugar_stats(&records);
        assert_eq!(
            stats.iter().map(|s| s.lugar.as_str()).collect::<Vec<_>>(),
            vec!["Barato", "Medio", "Caro"]
        );
    }

    #[test]
    fn category_matrix_covers_twelve_months() {
        let records = vec![
            record(100.0, 1, "A", "Novillo"),
            record(200.0, 6, "A", "Novillo"),
        ];
        let matrix = category_month_matrix(&records, 10);
        assert_eq!(matrix.categorias, vec!["Novillo"]);
        assert_eq!(matrix.values[0].len(), 12);
        assert_eq!(matrix.values[0][0], Some(100.0));
        assert_eq!(matrix.values[0][5], Some(200.0));
        assert_eq!(matrix.values[0][11], None);
    }

    #[test]
    fn iqr_outliers() {
        let mut records: Vec<PriceRecord> =
            (1..=20).map(|i| record(100.0 + i as f64, 1, "A", "X")).collect();
        records.push(record(10_000.0, 1, "A", "X"));
        let summary = find_outliers(&records);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.precio_max, Some(10_000.0));
    }

    #[test]
    fn month_names_are_spanish() {
        assert_eq!(month_name(1), "Enero");
        assert_eq!(month_name(12), "Diciembre");
    }

    #[test]
    fn analyze_requires_dated_records() {
        let mut r = record(100.0, 1, "A", "X");
        r.fecha_desde = None;
        assert!(analyze(&[r]).is_err());
        assert!(analyze(&[]).is_err());
    }
}
