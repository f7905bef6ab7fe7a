use std::path::Path;

use anyhow::{bail, Result};
use chrono::Local;
use clap::Parser;
use ganadoscraper::cli::{Cli, Command};
use ganadoscraper::{analysis, chart, extract, fetch, report, store};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── init logging ────────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Crawl {
            base_url,
            pdf_dir,
            max_pages,
        } => {
            run_crawl(&base_url, &pdf_dir, max_pages)?;
        }
        Command::Extract { pdf_dir, data_dir } => {
            run_extract(&pdf_dir, &data_dir)?;
        }
        Command::Analyze { data_dir, out_dir } => {
            run_analyze(&data_dir, &out_dir)?;
        }
        Command::Run {
            base_url,
            pdf_dir,
            data_dir,
            out_dir,
            max_pages,
            skip_crawl,
        } => {
            if skip_crawl {
                info!("skipping crawl phase");
            } else {
                run_crawl(&base_url, &pdf_dir, max_pages)?;
            }
            run_extract(&pdf_dir, &data_dir)?;
            run_analyze(&data_dir, &out_dir)?;
        }
    }

    info!("all done");
    Ok(())
}

/// Phase 1: crawl the blog and download every bulletin PDF.
fn run_crawl(base_url: &str, pdf_dir: &Path, max_pages: usize) -> Result<()> {
    let client = fetch::build_client()?;
    let outcome = fetch::pages::crawl(&client, base_url, max_pages)?;
    if outcome.pdf_links.is_empty() {
        bail!("crawl found no PDF links under {base_url}");
    }
    fetch::pdfs::download_all(&client, &outcome.pdf_links, pdf_dir)?;
    fetch::pdfs::save_metadata(&outcome, base_url, pdf_dir)?;
    Ok(())
}

/// Phase 2: extract tables from the PDFs, normalize, and persist the record
/// store plus summary and error dump.
fn run_extract(pdf_dir: &Path, data_dir: &Path) -> Result<()> {
    let outcome = extract::process_dir(pdf_dir)?;
    if outcome.tables_extracted == 0 {
        bail!("no tables extracted from {}", pdf_dir.display());
    }
    if outcome.records.is_empty() {
        bail!("no price records normalized from {}", pdf_dir.display());
    }
    store::save_records(&outcome.records, data_dir)?;
    store::save_summary(&outcome.records, data_dir)?;
    store::save_errors(&outcome.errors, data_dir)?;
    Ok(())
}

/// Phase 3: seasonal analysis, text report, and chart.
fn run_analyze(data_dir: &Path, out_dir: &Path) -> Result<()> {
    let records = store::load_records(data_dir)?;
    if records.is_empty() {
        bail!("record store in {} is empty", data_dir.display());
    }
    let analysis = analysis::analyze(&records)?;
    let resumen = store::summarize(&records);

    std::fs::create_dir_all(out_dir)?;
    let report_path = report::save(&analysis, &resumen, Local::now().naive_local(), out_dir)?;
    let chart_path = chart::save(&analysis, out_dir)?;

    info!(
        report = %report_path.display(),
        chart = %chart_path.display(),
        "analysis artifacts written"
    );
    Ok(())
}
