//! Site crawl and PDF download. Everything here is synchronous and
//! deliberately polite: bounded retries with exponential backoff per request
//! and a fixed delay between sequential fetches.

pub mod pages;
pub mod pdfs;

use std::thread::sleep;
use std::time::Duration;

use anyhow::{bail, Result};
use reqwest::blocking::{Client, Response};
use tracing::warn;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: usize = 3;

/// Shared blocking client with the crawl user agent and request timeout.
pub fn build_client() -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .cookie_store(true)
        .build()?;
    Ok(client)
}

/// GET with bounded retry and exponential backoff (1s, 2s, 4s).
pub fn get_with_retry(client: &Client, url: &str) -> Result<Response> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match client.get(url).send().and_then(|r| r.error_for_status()) {
            Ok(resp) => return Ok(resp),
            Err(e) if attempt < MAX_RETRIES => {
                warn!("fetch {url} failed (attempt {attempt}/{MAX_RETRIES}): {e}");
                sleep(Duration::from_secs(1u64 << (attempt - 1)));
            }
            Err(e) => bail!("fetch {url} failed after {MAX_RETRIES} attempts: {e}"),
        }
    }
}
