//! Frontier and persisted crawl state
//!
//! The frontier owns the visited-set, the pending URL queue, depth tracking,
//! and the per-site checkpoint files that make an interrupted crawl
//! resumable. Duplicate URLs are rejected at enqueue time (against both the
//! visited-set and the pending queue), never only at fetch time, so the same
//! page is never in flight twice.

use crate::config::CrawlTarget;
use crate::error::{LexragError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::PathBuf;
use url::Url;

/// A discovered-but-not-yet-fetched URL with its traversal metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierEntry {
    /// Absolute URL to fetch
    pub url: String,

    /// Link depth from the seed (seed itself is depth 0)
    pub depth: usize,

    /// Site the URL belongs to
    pub site: String,
}

/// Persisted snapshot of one site's crawl state
#[derive(Debug, Default, Serialize, Deserialize)]
struct CrawlCheckpoint {
    visited: Vec<String>,
    pending: Vec<FrontierEntry>,
    pages_crawled: usize,
}

/// Frontier with persisted resume state
pub struct Frontier {
    targets: Vec<CrawlTarget>,
    max_depth: usize,
    checkpoint_dir: PathBuf,
    visited: HashSet<String>,
    pending: VecDeque<FrontierEntry>,
    pending_urls: HashSet<String>,
    // URLs whose fetch failed this run. Not persisted, so a resumed crawl
    // retries them.
    failed: HashSet<String>,
    pages_crawled: HashMap<String, usize>,
}

impl Frontier {
    /// Create an empty frontier for the given targets. Call [`load`] before
    /// crawling.
    ///
    /// [`load`]: Frontier::load
    pub fn new<P: Into<PathBuf>>(targets: Vec<CrawlTarget>, max_depth: usize, checkpoint_dir: P) -> Self {
        Self {
            targets,
            max_depth,
            checkpoint_dir: checkpoint_dir.into(),
            visited: HashSet::new(),
            pending: VecDeque::new(),
            pending_urls: HashSet::new(),
            failed: HashSet::new(),
            pages_crawled: HashMap::new(),
        }
    }

    /// Load crawl state.
    ///
    /// With `resume = true`, previously checkpointed visited-sets and
    /// pending queues are restored so completed pages are never refetched;
    /// sites without a checkpoint fall back to their seed. With
    /// `resume = false`, every target starts from its single seed URL with
    /// an empty visited-set.
    pub fn load(&mut self, resume: bool) -> Result<()> {
        self.visited.clear();
        self.pending.clear();
        self.pending_urls.clear();
        self.failed.clear();
        self.pages_crawled.clear();

        let targets = self.targets.clone();
        for target in &targets {
            let path = self.checkpoint_path(&target.site);
            if resume && path.exists() {
                let data = fs::read_to_string(&path)?;
                let checkpoint: CrawlCheckpoint = serde_json::from_str(&data).map_err(|e| {
                    LexragError::Crawl(format!(
                        "corrupt checkpoint for {}: {}",
                        target.site, e
                    ))
                })?;

                self.visited.extend(checkpoint.visited);
                for entry in checkpoint.pending {
                    // The depth budget of this run applies to restored
                    // entries too; the checkpoint may come from a run with
                    // a larger one.
                    if entry.depth > self.max_depth {
                        log::debug!("Dropping over-depth checkpoint entry: {}", entry.url);
                        continue;
                    }
                    if self.pending_urls.insert(entry.url.clone()) {
                        self.pending.push_back(entry);
                    }
                }
                self.pages_crawled
                    .insert(target.site.clone(), checkpoint.pages_crawled);
                log::info!(
                    "Resumed crawl state for {}: {} visited, {} pending",
                    target.site,
                    self.visited.len(),
                    self.pending.len()
                );
            } else {
                self.enqueue(&target.seed_url, 0, &target.site);
            }
        }

        Ok(())
    }

    /// Resolve which configured site a URL belongs to, preferring the most
    /// specific match ("new.kenyalaw.org" beats "kenyalaw.org" for hosts
    /// under both).
    pub fn site_for(&self, url: &Url) -> Option<String> {
        let host = url.host_str()?;
        self.targets
            .iter()
            .filter(|target| host == target.site || host.ends_with(&format!(".{}", target.site)))
            .max_by_key(|target| target.site.len())
            .map(|target| target.site.clone())
    }

    /// Enqueue a discovered URL.
    ///
    /// A no-op (returning `false`) when the URL is already visited, pending,
    /// or failed this run, when the depth exceeds the configured maximum, or
    /// when the URL falls outside the allowed target scope. Scope violations
    /// are silently dropped, not errors.
    pub fn enqueue(&mut self, url: &str, depth: usize, site: &str) -> bool {
        if depth > self.max_depth {
            return false;
        }
        if self.visited.contains(url)
            || self.pending_urls.contains(url)
            || self.failed.contains(url)
        {
            return false;
        }

        let in_scope = Url::parse(url)
            .ok()
            .and_then(|parsed| self.site_for(&parsed))
            .is_some_and(|resolved| resolved == site);
        if !in_scope {
            log::debug!("Dropping out-of-scope URL: {}", url);
            return false;
        }

        self.pending_urls.insert(url.to_string());
        self.pending.push_back(FrontierEntry {
            url: url.to_string(),
            depth,
            site: site.to_string(),
        });
        true
    }

    /// Pop the next entry in breadth-first order
    pub fn next(&mut self) -> Option<FrontierEntry> {
        let entry = self.pending.pop_front()?;
        self.pending_urls.remove(&entry.url);
        Some(entry)
    }

    /// Record a URL whose fetch failed so it is not re-enqueued this run.
    /// Failed URLs are not checkpointed; a later resumed crawl retries them.
    pub fn mark_failed(&mut self, url: &str) {
        self.failed.insert(url.to_string());
    }

    /// Record a URL as processed and count it against its site
    pub fn mark_visited(&mut self, url: &str, site: &str) {
        if self.visited.insert(url.to_string()) {
            *self.pages_crawled.entry(site.to_string()).or_insert(0) += 1;
        }
    }

    /// Whether a URL has already been processed
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Number of URLs waiting in the queue
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pages processed for one site during this crawl lifetime
    pub fn pages_crawled(&self, site: &str) -> usize {
        self.pages_crawled.get(site).copied().unwrap_or(0)
    }

    /// Persist the current state, one checkpoint file per target site.
    ///
    /// Each file is written to a temporary path and renamed into place, so
    /// a crash mid-write never leaves a partially-written checkpoint.
    pub fn checkpoint(&self) -> Result<()> {
        fs::create_dir_all(&self.checkpoint_dir)?;

        for target in &self.targets {
            let visited: Vec<String> = self
                .visited
                .iter()
                .filter(|url| self.url_belongs_to(url, &target.site))
                .cloned()
                .collect();
            let pending: Vec<FrontierEntry> = self
                .pending
                .iter()
                .filter(|entry| entry.site == target.site)
                .cloned()
                .collect();

            let checkpoint = CrawlCheckpoint {
                visited,
                pending,
                pages_crawled: self.pages_crawled(&target.site),
            };

            let path = self.checkpoint_path(&target.site);
            let tmp_path = path.with_extension("json.tmp");
            fs::write(&tmp_path, serde_json::to_string(&checkpoint)?)?;
            fs::rename(&tmp_path, &path)?;
        }

        Ok(())
    }

    fn url_belongs_to(&self, url: &str, site: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|parsed| self.site_for(&parsed))
            .is_some_and(|resolved| resolved == site)
    }

    fn checkpoint_path(&self, site: &str) -> PathBuf {
        self.checkpoint_dir
            .join(format!("checkpoint_{}.json", sanitize_site(site)))
    }
}

/// Make a site string safe to use inside a file name
fn sanitize_site(site: &str) -> String {
    site.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '.' { ch } else { '_' })
        .collect()
}
