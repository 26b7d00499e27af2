//! The crawl loop
//!
//! Drives the frontier under page and depth budgets: fetch, extract links
//! and content, enqueue discovered URLs, hand the page to the chunking and
//! indexing pipeline, mark it visited, checkpoint. Individual fetch or
//! embedding failures are logged and skipped; the crawl only guarantees
//! bounded-effort coverage up to the page budget, not delivery of any
//! specific URL.

use crate::config::Config;
use crate::crawl::fetcher::Fetcher;
use crate::crawl::frontier::Frontier;
use crate::error::{LexragError, Result};
use crate::ml::TextEmbedder;
use crate::storage::VectorStore;
use crate::text::{Chunker, Document, UNTITLED};
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tokio::sync::Semaphore;
use url::Url;

/// Summary of a finished crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlStats {
    /// Pages fetched and indexed
    pub pages_crawled: usize,

    /// Passages embedded and upserted into the vector store
    pub chunks_indexed: usize,

    /// URLs skipped because their fetch failed
    pub pages_skipped: usize,
}

/// One crawl run over the configured target sites
pub struct Crawler {
    fetcher: Fetcher,
    frontier: Frontier,
    chunker: Chunker,
    embedder: TextEmbedder,
    store: VectorStore,
    permits: Arc<Semaphore>,
    max_pages: usize,
}

impl Crawler {
    /// Prepare a crawl run: open the vector store, load (or resume) the
    /// frontier state, and wire the shared concurrency permits into the
    /// fetcher and the indexing stage.
    pub fn new(
        config: &Config,
        permits: Arc<Semaphore>,
        max_pages: usize,
        max_depth: usize,
        resume: bool,
    ) -> Result<Self> {
        std::fs::create_dir_all(&config.store_dir)?;

        let fetcher = Fetcher::new(&config.crawl, Arc::clone(&permits))?;
        let mut frontier = Frontier::new(
            config.crawl.targets.clone(),
            max_depth,
            config.store_dir.clone(),
        );
        frontier.load(resume)?;

        let chunker = Chunker::new(config.chunking.clone())?;
        let embedder = TextEmbedder::new(config.embedding.clone());
        let store = VectorStore::open(config.store_dir.join("vectors.db"))?;

        Ok(Self {
            fetcher,
            frontier,
            chunker,
            embedder,
            store,
            permits,
            max_pages,
        })
    }

    /// Run the crawl to completion.
    ///
    /// The loop checkpoints after every processed page, so cancelling the
    /// task (or crashing) leaves at most one page of duplicated work for a
    /// resumed crawl.
    pub async fn run(mut self) -> Result<CrawlStats> {
        // Make sure a checkpoint exists from the very start of the run.
        self.frontier.checkpoint()?;

        let mut stats = CrawlStats::default();

        while stats.pages_crawled < self.max_pages {
            let Some(entry) = self.frontier.next() else {
                break;
            };

            let page = match self.fetcher.fetch(&entry.url).await {
                Ok(page) => page,
                Err(e) => {
                    // Skip, not retry: a later resumed crawl is the retry
                    // mechanism. Marking the URL failed keeps later pages
                    // that link to it from re-enqueueing it this run.
                    log::warn!("Skipping {}: {}", entry.url, e);
                    self.frontier.mark_failed(&entry.url);
                    stats.pages_skipped += 1;
                    self.frontier.checkpoint()?;
                    continue;
                }
            };

            let extracted = extract_page(&entry.url, &page.body);

            for link in &extracted.links {
                if let Ok(parsed) = Url::parse(link) {
                    if let Some(site) = self.frontier.site_for(&parsed) {
                        self.frontier.enqueue(parsed.as_str(), entry.depth + 1, &site);
                    }
                }
            }

            let document = Document {
                url: entry.url.clone(),
                title: extracted.title,
                site: entry.site.clone(),
                text: extracted.text,
                fetched_at: Utc::now(),
            };

            stats.chunks_indexed += self.index_document(&document).await?;
            self.frontier.mark_visited(&entry.url, &entry.site);
            stats.pages_crawled += 1;
            self.frontier.checkpoint()?;

            log::info!(
                "Crawled {} (depth {}, {} pages so far)",
                entry.url,
                entry.depth,
                stats.pages_crawled
            );
        }

        log::info!(
            "Crawl completed: {} pages, {} chunks indexed, {} skipped, {} still pending",
            stats.pages_crawled,
            stats.chunks_indexed,
            stats.pages_skipped,
            self.frontier.pending_len()
        );
        Ok(stats)
    }

    /// Chunk a document, embed each passage under the shared concurrency
    /// limit, and upsert the results. Embedding failures skip the chunk.
    ///
    /// Takes `&mut self` so the crawl future only borrows the store
    /// exclusively; the sqlite connection is not a shared-reference type.
    async fn index_document(&mut self, document: &Document) -> Result<usize> {
        let chunks = self.chunker.chunk_document(document)?;
        let mut indexed = 0;

        for chunk in &chunks {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| LexragError::Embedding("indexing is shutting down".to_string()))?;

            match self.embedder.embed(&chunk.text) {
                Ok(embedding) => {
                    self.store.upsert_chunk(chunk, &embedding)?;
                    indexed += 1;
                }
                Err(e) => {
                    log::warn!(
                        "Skipping chunk {} of {}: {}",
                        chunk.position,
                        document.url,
                        e
                    );
                }
            }
        }

        Ok(indexed)
    }
}

/// Title, visible text, and outbound links pulled from one HTML page
struct ExtractedPage {
    title: String,
    text: String,
    links: Vec<String>,
}

/// Parse an HTML page, resolving relative links against the page URL and
/// discarding fragment-only and non-http(s) links
fn extract_page(page_url: &str, html: &str) -> ExtractedPage {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse("title").expect("static selector");
    let title = document
        .select(&title_selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let mut text = String::new();
    collect_visible_text(document.root_element(), &mut text);

    let base = Url::parse(page_url).ok();
    let anchor_selector = Selector::parse("a[href]").expect("static selector");
    let mut links = Vec::new();
    if let Some(base) = base {
        for anchor in document.select(&anchor_selector) {
            if let Some(href) = anchor.value().attr("href") {
                if let Some(resolved) = resolve_link(&base, href) {
                    links.push(resolved);
                }
            }
        }
    }

    ExtractedPage { title, text, links }
}

/// Rewrite one href against the page URL; `None` drops it
fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }
    // Fragments address positions inside a page we already fetch whole.
    resolved.set_fragment(None);
    Some(resolved.into())
}

/// Walk the element tree accumulating text, skipping non-content elements
fn collect_visible_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_element) = ElementRef::wrap(child) {
            match child_element.value().name() {
                "script" | "style" | "noscript" | "head" => {}
                _ => collect_visible_text(child_element, out),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"<html>
        <head><title>Land Registration Act</title><style>p { color: red; }</style></head>
        <body>
            <script>var tracking = true;</script>
            <h1>Land Registration</h1>
            <p>Registration of title to land in Kenya.</p>
            <a href="/acts/2012">Acts</a>
            <a href="#section-3">Jump</a>
            <a href="https://kenyalaw.org/judgments?page=2#top">Judgments</a>
            <a href="mailto:info@kenyalaw.org">Mail</a>
        </body>
    </html>"##;

    #[test]
    fn test_extracts_title_and_text() {
        let page = extract_page("https://kenyalaw.org/acts", SAMPLE);
        assert_eq!(page.title, "Land Registration Act");
        assert!(page.text.contains("Registration of title to land"));
        // Script and style bodies are not content.
        assert!(!page.text.contains("tracking"));
        assert!(!page.text.contains("color: red"));
    }

    #[test]
    fn test_link_extraction_rules() {
        let page = extract_page("https://kenyalaw.org/acts", SAMPLE);

        // Relative links are resolved against the page URL.
        assert!(page
            .links
            .contains(&"https://kenyalaw.org/acts/2012".to_string()));
        // Fragments are stripped; fragment-only and mailto links dropped.
        assert!(page
            .links
            .contains(&"https://kenyalaw.org/judgments?page=2".to_string()));
        assert_eq!(page.links.len(), 2);
    }

    #[test]
    fn test_missing_title_falls_back_to_untitled() {
        let page = extract_page("https://kenyalaw.org/", "<html><body>text</body></html>");
        assert_eq!(page.title, UNTITLED);
    }
}
