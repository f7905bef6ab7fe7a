//! Sequential PDF download with skip-on-existing and a politeness delay,
//! plus the crawl metadata dump.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{error, info};
use url::Url;

use super::get_with_retry;
use super::pages::CrawlOutcome;

const DOWNLOAD_DELAY: Duration = Duration::from_millis(500);

/// One successfully downloaded (or already present) bulletin.
#[derive(Debug, Clone, Serialize)]
pub struct Downloaded {
    pub url: String,
    pub path: PathBuf,
}

/// Download every discovered PDF into `pdf_dir`. Files already on disk are
/// not re-fetched; individual failures are logged and skipped.
pub fn download_all(client: &Client, pdf_links: &[String], pdf_dir: &Path) -> Result<Vec<Downloaded>> {
    fs::create_dir_all(pdf_dir).with_context(|| format!("creating {}", pdf_dir.display()))?;
    let mut downloaded = Vec::new();

    for (i, url) in pdf_links.iter().enumerate() {
        info!("[{}/{}] {}", i + 1, pdf_links.len(), url);
        let name = filename_for(url, i);
        let dest = pdf_dir.join(&name);

        if dest.exists() {
            info!("already exists: {name}");
            downloaded.push(Downloaded {
                url: url.clone(),
                path: dest,
            });
            continue;
        }

        match download_one(client, url, &dest) {
            Ok(()) => {
                info!("downloaded: {name}");
                downloaded.push(Downloaded {
                    url: url.clone(),
                    path: dest,
                });
            }
            Err(e) => error!("download {url} failed: {e:#}"),
        }
        sleep(DOWNLOAD_DELAY);
    }

    info!(
        downloaded = downloaded.len(),
        total = pdf_links.len(),
        "download phase complete"
    );
    Ok(downloaded)
}

fn download_one(client: &Client, url: &str, dest: &Path) -> Result<()> {
    let mut resp = get_with_retry(client, url)?;
    let mut file =
        File::create(dest).with_context(|| format!("creating {}", dest.display()))?;
    resp.copy_to(&mut file)
        .with_context(|| format!("writing {}", dest.display()))?;
    Ok(())
}

/// Derive a local filename from the URL path, percent-decoded so the date
/// resolver can read `Del DD-MM-YY al DD-MM-YY` names. URLs without a usable
/// path segment get a positional fallback name.
pub fn filename_for(url: &str, index: usize) -> String {
    let from_path = Url::parse(url).ok().and_then(|u| {
        u.path_segments()?
            .last()
            .filter(|s| s.to_lowercase().ends_with(".pdf"))
            .map(|s| urlencoding::decode(s).map_or_else(|_| s.to_string(), |d| d.into_owned()))
    });
    from_path.unwrap_or_else(|| format!("documento_{index}.pdf"))
}

#[derive(Debug, Serialize)]
struct CrawlMetadata<'a> {
    scrape_date: String,
    base_url: &'a str,
    total_pdfs: usize,
    pdf_links: &'a [String],
    posts_metadata: &'a [super::pages::PostMeta],
}

/// Persist what the crawl found as `metadata.json` next to the PDFs.
pub fn save_metadata(outcome: &CrawlOutcome, base_url: &str, pdf_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(pdf_dir).with_context(|| format!("creating {}", pdf_dir.display()))?;
    let metadata = CrawlMetadata {
        scrape_date: Utc::now().to_rfc3339(),
        base_url,
        total_pdfs: outcome.pdf_links.len(),
        pdf_links: &outcome.pdf_links,
        posts_metadata: &outcome.posts,
    };
    let path = pdf_dir.join("metadata.json");
    let json = serde_json::to_string_pretty(&metadata).context("serializing crawl metadata")?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "crawl metadata saved");
    Ok(path)
}
