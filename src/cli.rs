use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub const DEFAULT_BASE_URL: &str = "https://subastaganadera.com/blog/";

#[derive(Parser)]
#[command(name = "ganadoscraper")]
#[command(about = "Scraper y analisis estacional de boletines de precios de ganado", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Crawl the bulletin blog and download every PDF found.
    Crawl {
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,
        /// Directory the PDFs are downloaded into.
        #[arg(long, default_value = "pdfs")]
        pdf_dir: PathBuf,
        /// Crawl page budget.
        #[arg(long, default_value_t = 200)]
        max_pages: usize,
    },

    /// Extract and normalize price tables from downloaded PDFs.
    Extract {
        #[arg(long, default_value = "pdfs")]
        pdf_dir: PathBuf,
        /// Directory for the record store, summary, and error dump.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },

    /// Run the seasonal analysis over the record store and write the
    /// report and chart.
    Analyze {
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        /// Directory for the text report and the chart.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Run the whole pipeline: crawl, download, extract, analyze.
    Run {
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,
        #[arg(long, default_value = "pdfs")]
        pdf_dir: PathBuf,
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        #[arg(long, default_value_t = 200)]
        max_pages: usize,
        /// Skip the crawl when PDFs are already on disk.
        #[arg(long)]
        skip_crawl: bool,
    },
}
