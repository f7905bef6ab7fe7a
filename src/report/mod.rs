//! Text report rendering. Formatting lives in one place so output changes
//! stay localized; everything is a deterministic function of the analysis
//! plus the caller-supplied generation timestamp.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::analysis::{month_name, MonthlyStats, SeasonalAnalysis};
use crate::store::Resumen;

const RULE: &str =
    "--------------------------------------------------------------------------------";
const DOUBLE_RULE: &str =
    "================================================================================";

pub const REPORT_FILENAME: &str = "REPORTE_ANALISIS_ESTACIONAL.txt";

/// Render the full recommendation report.
pub fn render(analysis: &SeasonalAnalysis, resumen: &Resumen, generated_at: NaiveDateTime) -> String {
    let mut out = String::new();

    let push_line = |out: &mut String, line: &str| {
        out.push_str(line);
        out.push('\n');
    };

    push_line(&mut out, DOUBLE_RULE);
    push_line(&mut out, "ANALISIS ESTACIONAL DE PRECIOS DE GANADO");
    push_line(&mut out, "Sistema de Recomendaciones para Compra y Venta");
    push_line(&mut out, DOUBLE_RULE);
    out.push('\n');

    // Dataset overview
    push_line(&mut out, "INFORMACION GENERAL");
    push_line(&mut out, RULE);
    let _ = writeln!(out, "Total de registros: {}", resumen.total_registros);
    let _ = writeln!(
        out,
        "Rango de fechas: {} a {}",
        fmt_date(resumen.fecha_minima),
        fmt_date(resumen.fecha_maxima)
    );
    let _ = writeln!(out, "Lugares unicos: {}", resumen.lugares_unicos);
    let _ = writeln!(out, "Categorias unicas: {}", resumen.categorias_unicas);
    let _ = writeln!(
        out,
        "Rango de precios: B/. {:.2} - B/. {:.2} (promedio B/. {:.2})",
        resumen.precio_min, resumen.precio_max, resumen.precio_promedio
    );
    out.push('\n');

    // Executive summary
    push_line(&mut out, "RESUMEN EJECUTIVO");
    push_line(&mut out, RULE);
    let min_mean = analysis
        .monthly
        .iter()
        .map(|m| m.mean)
        .fold(f64::INFINITY, f64::min);
    let max_mean = analysis
        .monthly
        .iter()
        .map(|m| m.mean)
        .fold(f64::NEG_INFINITY, f64::max);
    let diff = max_mean - min_mean;
    let _ = writeln!(out, "Precio promedio mas bajo del anio: B/. {min_mean:.2}");
    let _ = writeln!(out, "Precio promedio mas alto del anio: B/. {max_mean:.2}");
    let _ = writeln!(
        out,
        "Diferencia: B/. {diff:.2} ({:.1}% de margen potencial)",
        diff / min_mean * 100.0
    );
    out.push('\n');

    // Monthly table
    push_line(&mut out, "PRECIOS POR MES DEL ANIO");
    push_line(&mut out, RULE);
    let _ = writeln!(
        out,
        "{:<12} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Mes", "Promedio", "Mediana", "Desv.Est", "Minimo", "Maximo", "Registros"
    );
    for m in &analysis.monthly {
        let _ = writeln!(
            out,
            "{:<12} {:>10.2} {:>10.2} {:>10} {:>10.2} {:>10.2} {:>10}",
            month_name(m.mes),
            m.mean,
            m.median,
            m.std.map(|s| format!("{s:.2}")).unwrap_or_else(|| "-".into()),
            m.min,
            m.max,
            m.count
        );
    }
    out.push('\n');

    push_line(&mut out, "MEJORES MESES PARA COMPRAR (precios mas bajos)");
    push_line(&mut out, RULE);
    push_month_ranking(&mut out, &analysis.best_buy);

    push_line(&mut out, "MEJORES MESES PARA VENDER (precios mas altos)");
    push_line(&mut out, RULE);
    push_month_ranking(&mut out, &analysis.best_sell);

    // Strategy
    if let (Some(compra), Some(venta)) = (analysis.best_buy.first(), analysis.best_sell.first()) {
        push_line(&mut out, "ESTRATEGIA RECOMENDADA");
        push_line(&mut out, RULE);
        let ganancia = venta.mean - compra.mean;
        let roi = ganancia / compra.mean * 100.0;
        let _ = writeln!(
            out,
            "COMPRAR en: {} (precio promedio B/. {:.2})",
            month_name(compra.mes),
            compra.mean
        );
        let _ = writeln!(
            out,
            "VENDER en: {} (precio promedio B/. {:.2})",
            month_name(venta.mes),
            venta.mean
        );
        let _ = writeln!(
            out,
            "Ganancia potencial: B/. {ganancia:.2} por unidad ({roi:.1}% ROI)"
        );
        out.push('\n');
    }

    // Location rankings
    push_line(&mut out, "MEJORES LUGARES PARA COMPRAR (precios mas bajos)");
    push_line(&mut out, RULE);
    for (i, l) in analysis.lugares.iter().take(5).enumerate() {
        let _ = writeln!(
            out,
            "{}. {}: B/. {:.2} ({} registros)",
            i + 1,
            l.lugar,
            l.mean,
            l.count
        );
    }
    out.push('\n');

    push_line(&mut out, "LUGARES CON PRECIOS MAS ALTOS (para venta)");
    push_line(&mut out, RULE);
    for (i, l) in analysis.lugares.iter().rev().take(5).enumerate() {
        let _ = writeln!(
            out,
            "{}. {}: B/. {:.2} ({} registros)",
            i + 1,
            l.lugar,
            l.mean,
            l.count
        );
    }
    out.push('\n');

    push_line(&mut out, "CATEGORIAS MAS TRANSADAS");
    push_line(&mut out, RULE);
    for (i, (categoria, count)) in analysis.top_categorias.iter().take(5).enumerate() {
        let _ = writeln!(out, "{}. {categoria} ({count} registros)", i + 1);
    }
    out.push('\n');

    push_line(&mut out, "VALORES ATIPICOS DETECTADOS");
    push_line(&mut out, RULE);
    let _ = writeln!(out, "Total de outliers: {}", analysis.outliers.count);
    if let (Some(min), Some(max)) = (analysis.outliers.precio_min, analysis.outliers.precio_max) {
        let _ = writeln!(out, "Precio minimo atipico: B/. {min:.2}");
        let _ = writeln!(out, "Precio maximo atipico: B/. {max:.2}");
    }
    out.push('\n');

    push_line(&mut out, "NOTAS IMPORTANTES");
    push_line(&mut out, RULE);
    push_line(&mut out, "- Los precios varian segun categoria, raza y region");
    push_line(&mut out, "- Los datos historicos no garantizan precios futuros");
    push_line(&mut out, "- Verifique precios actuales antes de tomar decisiones");
    out.push('\n');

    push_line(&mut out, DOUBLE_RULE);
    let _ = writeln!(
        out,
        "Reporte generado: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    push_line(&mut out, DOUBLE_RULE);

    out
}

fn push_month_ranking(out: &mut String, months: &[MonthlyStats]) {
    for (i, m) in months.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, month_name(m.mes));
        let _ = writeln!(out, "   Precio promedio: B/. {:.2}", m.mean);
        let _ = writeln!(out, "   Rango: B/. {:.2} - B/. {:.2}", m.min, m.max);
        let _ = writeln!(out, "   Registros analizados: {}", m.count);
    }
    out.push('\n');
}

fn fmt_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
}

/// Render and write the report to `out_dir`.
pub fn save(
    analysis: &SeasonalAnalysis,
    resumen: &Resumen,
    generated_at: NaiveDateTime,
    out_dir: &Path,
) -> Result<PathBuf> {
    let text = render(analysis, resumen, generated_at);
    let path = out_dir.join(REPORT_FILENAME);
    fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::normalize::{PriceRecord, TableType};
    use crate::store::summarize;
    use chrono::NaiveDate;

    fn records() -> Vec<PriceRecord> {
        [
            (100.0, 1, "Barato", "Novillo"),
            (150.0, 2, "Barato", "Novillo"),
            (400.0, 6, "Caro", "Ternera"),
            (420.0, 7, "Caro", "Ternera"),
        ]
        .into_iter()
        .map(|(precio, mes, lugar, categoria)| PriceRecord {
            fecha_desde: NaiveDate::from_ymd_opt(2024, mes, 1),
            fecha_hasta: NaiveDate::from_ymd_opt(2024, mes, 7),
            lugar: lugar.into(),
            categoria: categoria.into(),
            precio,
            fuente_pdf: "test.pdf".into(),
            tipo_tabla: TableType::General,
        })
        .collect()
    }

    fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn report_contains_all_sections() {
        let records = records();
        let analysis = analyze(&records).unwrap();
        let resumen = summarize(&records);
        let text = render(&analysis, &resumen, fixed_time());

        for section in [
            "INFORMACION GENERAL",
            "RESUMEN EJECUTIVO",
            "MEJORES MESES PARA COMPRAR",
            "MEJORES MESES PARA VENDER",
            "ESTRATEGIA RECOMENDADA",
            "MEJORES LUGARES PARA COMPRAR",
            "CATEGORIAS MAS TRANSADAS",
            "VALORES ATIPICOS DETECTADOS",
        ] {
            assert!(text.contains(section), "missing section: {section}");
        }
        assert!(text.contains("Enero"));
        assert!(text.contains("Reporte generado: 2024-05-01 12:00:00"));
    }

    #[test]
    fn report_is_deterministic() {
        let records = records();
        let analysis = analyze(&records).unwrap();
        let resumen = summarize(&records);
        let a = render(&analysis, &resumen, fixed_time());
        let b = render(&analysis, &resumen, fixed_time());
        assert_eq!(a, b);
    }

    #[test]
    fn save_writes_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let records = records();
        let analysis = analyze(&records).unwrap();
        let resumen = summarize(&records);
        let path = save(&analysis, &resumen, fixed_time(), dir.path()).unwrap();
        assert!(path.exists());
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("COMPRAR en: Enero"));
    }
}
