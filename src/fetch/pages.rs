//! Bounded breadth-first crawl of the bulletin blog: collects PDF links,
//! per-post metadata, and pagination links.

use std::collections::HashSet;
use std::thread::sleep;
use std::time::Duration;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use super::get_with_retry;

const PAGE_DELAY: Duration = Duration::from_secs(1);

static PAGINATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/page/\d+|paged=\d+|\?pg=\d+").expect("pagination regex must be valid")
});

/// Per-post metadata scraped from article elements.
#[derive(Debug, Clone, Serialize)]
pub struct PostMeta {
    pub url: String,
    pub title: String,
    pub date_range: Option<String>,
    pub pdf_links: Vec<String>,
}

/// Everything one crawl produced, returned to the caller instead of
/// accumulating in ambient state.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub pages_visited: usize,
    pub pdf_links: Vec<String>,
    pub posts: Vec<PostMeta>,
}

/// Crawl up to `max_pages` pages starting from `base_url`, following
/// same-host pagination links only. Unreachable pages are skipped after the
/// retry budget; they never abort the crawl.
pub fn crawl(client: &Client, base_url: &str, max_pages: usize) -> Result<CrawlOutcome> {
    let base = Url::parse(base_url)?;
    let mut visited: HashSet<String> = HashSet::new();
    let mut to_visit: Vec<String> = vec![base_url.to_string()];
    let mut outcome = CrawlOutcome::default();
    let mut seen_pdfs: HashSet<String> = HashSet::new();

    info!(base = base_url, max_pages, "starting crawl");

    while let Some(url) = pop_front(&mut to_visit) {
        if outcome.pages_visited >= max_pages {
            break;
        }
        if !visited.insert(url.clone()) {
            continue;
        }
        outcome.pages_visited += 1;
        info!("[{}] {}", outcome.pages_visited, url);

        let html = match get_with_retry(client, &url) {
            Ok(resp) => match resp.text() {
                Ok(text) => text,
                Err(e) => {
                    warn!("reading body of {url} failed: {e}");
                    continue;
                }
            },
            Err(e) => {
                warn!("{e:#}");
                continue;
            }
        };

        let page = parse_page(&html, &url);
        for link in page.pdf_links {
            if seen_pdfs.insert(link.clone()) {
                outcome.pdf_links.push(link);
            }
        }
        outcome.posts.extend(page.posts);

        for next in page.pagination {
            let same_host = Url::parse(&next)
                .ok()
                .and_then(|u| u.host_str().map(|h| Some(h) == base.host_str()))
                .unwrap_or(false);
            if same_host && !visited.contains(&next) && !to_visit.contains(&next) {
                to_visit.push(next);
            }
        }

        sleep(PAGE_DELAY);
    }

    info!(
        pages = outcome.pages_visited,
        pdfs = outcome.pdf_links.len(),
        posts = outcome.posts.len(),
        "crawl complete"
    );
    Ok(outcome)
}

/// What one HTML page contributes to the crawl.
#[derive(Debug, Default)]
pub struct ParsedPage {
    pub pdf_links: Vec<String>,
    pub posts: Vec<PostMeta>,
    pub pagination: Vec<String>,
}

/// Pure HTML parsing, split out from the network loop so it is testable on
/// static fixtures.
pub fn parse_page(html: &str, page_url: &str) -> ParsedPage {
    let Ok(base) = Url::parse(page_url) else {
        return ParsedPage::default();
    };
    let doc = Html::parse_document(html);

    let anchor_sel = Selector::parse("a[href]").expect("anchor selector must be valid");
    let embed_sel = Selector::parse("iframe, embed").expect("embed selector must be valid");
    let article_sel = Selector::parse("article").expect("article selector must be valid");
    let title_sel = Selector::parse("h1, h2, h3").expect("title selector must be valid");

    let mut pdf_links = Vec::new();
    let mut pagination = Vec::new();

    for el in doc.select(&anchor_sel) {
        let Some(href) = el.value().attr("href") else { continue };
        let Ok(full) = base.join(href) else { continue };
        if href.to_lowercase().contains(".pdf") {
            pdf_links.push(full.to_string());
        }
        if PAGINATION_RE.is_match(href) {
            pagination.push(full.to_string());
        }
    }

    // Bulletins are sometimes embedded rather than linked.
    for el in doc.select(&embed_sel) {
        let Some(src) = el.value().attr("src") else { continue };
        if src.to_lowercase().contains(".pdf") {
            if let Ok(full) = base.join(src) {
                pdf_links.push(full.to_string());
            }
        }
    }

    let mut posts = Vec::new();
    for article in doc.select(&article_sel) {
        let title = article
            .select(&title_sel)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let post_pdfs: Vec<String> = article
            .select(&anchor_sel)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| href.to_lowercase().contains(".pdf"))
            .filter_map(|href| base.join(href).ok())
            .map(|u| u.to_string())
            .collect();

        if post_pdfs.is_empty() {
            continue;
        }
        let date_range = crate::extract::dates::from_text(&title)
            .map(|r| format!("{} / {}", r.desde, r.hasta));
        posts.push(PostMeta {
            url: page_url.to_string(),
            title,
            date_range,
            pdf_links: post_pdfs,
        });
    }

    ParsedPage {
        pdf_links,
        posts,
        pagination,
    }
}

fn pop_front(queue: &mut Vec<String>) -> Option<String> {
    if queue.is_empty() {
        None
    } else {
        Some(queue.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
<html><body>
<article>
  <h2>Precios Del 01-03-24 al 07-03-24</h2>
  <a href="/wp-content/uploads/Del 01-03-24 al 07-03-24.pdf">Boletín</a>
</article>
<article>
  <h2>Sin boletín esta semana</h2>
  <a href="/blog/otro-post/">Leer más</a>
</article>
<iframe src="/uploads/embedded.PDF"></iframe>
<a href="/blog/page/2/">Siguiente</a>
<a href="https://otrodominio.com/page/3/">Externo</a>
</body></html>
"##;

    #[test]
    fn finds_pdf_links_in_anchors_and_embeds() {
        let page = parse_page(PAGE, "https://subastaganadera.com/blog/");
        assert_eq!(page.pdf_links.len(), 2);
        assert!(page.pdf_links[0].ends_with(".pdf"));
        assert!(page.pdf_links[1].ends_with("embedded.PDF"));
    }

    #[test]
    fn extracts_post_metadata_with_date_range() {
        let page = parse_page(PAGE, "https://subastaganadera.com/blog/");
        assert_eq!(page.posts.len(), 1);
        let post = &page.posts[0];
        assert!(post.title.contains("Del 01-03-24"));
        assert_eq!(post.date_range.as_deref(), Some("2024-03-01 / 2024-03-07"));
        assert_eq!(post.pdf_links.len(), 1);
    }

    #[test]
    fn collects_pagination_links() {
        let page = parse_page(PAGE, "https://subastaganadera.com/blog/");
        assert!(page
            .pagination
            .iter()
            .any(|u| u == "https://subastaganadera.com/blog/page/2/"));
        // Cross-domain filtering happens in the crawl loop, not here.
        assert!(page
            .pagination
            .iter()
            .any(|u| u.starts_with("https://otrodominio.com")));
    }

    #[test]
    fn malformed_base_url_yields_empty_page() {
        let page = parse_page(PAGE, "not a url");
        assert!(page.pdf_links.is_empty());
        assert!(page.posts.is_empty());
    }
}
