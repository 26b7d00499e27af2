//! Engine handle
//!
//! [`LexragEngine`] is the single entry point an embedding application talks
//! to: it owns the configuration, the shared concurrency permits, and the
//! handle of the at-most-one background crawl, and it exposes the question
//! answering pipeline (retrieve, assemble, generate) plus a coarse status
//! probe.

use crate::api::assembler::{assemble, SourceRef};
use crate::api::chat::GenerationClient;
use crate::api::retriever::Retriever;
use crate::config::Config;
use crate::crawl::{CrawlStats, Crawler};
use crate::error::{LexragError, Result};
use crate::ml::TextEmbedder;
use crate::storage::VectorStore;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Sample questions exposed to user interfaces
pub const SAMPLE_QUESTIONS: [&str; 10] = [
    "What are the key provisions of the Kenyan Constitution?",
    "What is the process for filing a case in the Kenyan High Court?",
    "Can you explain the Land Registration Act in Kenya?",
    "What are the different types of courts in Kenya?",
    "What rights are protected under the Bill of Rights in Kenya?",
    "How does Kenya's legal system handle intellectual property?",
    "What are the requirements for starting a business in Kenya?",
    "Can you explain how divorce proceedings work in Kenya?",
    "What laws govern environmental protection in Kenya?",
    "How is the judiciary structured in Kenya?",
];

/// Reply to a caller when no indexed passage matched their query
const EMPTY_INDEX_ANSWER: &str = "I could not find any relevant passages in the indexed legal \
publications for this question. The index may still be empty; start a crawl and try again.";

/// Coarse service state reported by [`LexragEngine::status`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// The engine has been constructed but `initialize` has not finished
    Initializing,

    /// A background crawl is in progress
    Crawling,

    /// Ready to answer queries
    Ready,
}

/// Acknowledgement returned when a background crawl is started
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlStarted {
    /// Human-readable confirmation with the effective budgets
    pub message: String,
}

/// A generated answer with its grounding sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The generated (or canned, when retrieval found nothing) response text
    pub response: String,

    /// Deduplicated source pages the answer was grounded on
    pub sources: Vec<SourceRef>,

    /// The question as asked
    pub query: String,
}

/// The engine: crawl orchestration plus the question answering pipeline
pub struct LexragEngine {
    config: Config,
    permits: Arc<Semaphore>,
    retriever: Retriever,
    generation: GenerationClient,
    initialized: AtomicBool,
    crawl_task: Mutex<Option<JoinHandle<Result<CrawlStats>>>>,
}

impl LexragEngine {
    /// Construct an engine. Cheap and synchronous; the engine reports
    /// [`ServiceStatus::Initializing`] and rejects queries until
    /// [`initialize`] completes.
    ///
    /// [`initialize`]: LexragEngine::initialize
    pub fn new(config: Config) -> Self {
        let permits = Arc::new(Semaphore::new(config.crawl.concurrent_requests));
        let embedder = TextEmbedder::new(config.embedding.clone());
        let retriever = Retriever::new(config.store_dir.join("vectors.db"), embedder);
        let generation = GenerationClient::new(config.generation.clone());

        Self {
            config,
            permits,
            retriever,
            generation,
            initialized: AtomicBool::new(false),
            crawl_task: Mutex::new(None),
        }
    }

    /// Prepare the engine for queries: create the store directory and open
    /// the vector store once so schema problems surface here instead of on
    /// the first query.
    pub async fn initialize(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config.store_dir)?;
        let store = VectorStore::open(self.config.store_dir.join("vectors.db"))?;
        let records = store.record_count()?;

        self.initialized.store(true, Ordering::SeqCst);
        log::info!("Engine initialized with {} indexed chunks", records);
        Ok(())
    }

    /// Report the current service state.
    ///
    /// A running crawl takes precedence over readiness, so callers polling
    /// this can tell "answers may still be incomplete" apart from "ready".
    pub fn status(&self) -> ServiceStatus {
        let crawl_task = self.crawl_task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = crawl_task.as_ref() {
            if !handle.is_finished() {
                return ServiceStatus::Crawling;
            }
        }

        if self.initialized.load(Ordering::SeqCst) {
            ServiceStatus::Ready
        } else {
            ServiceStatus::Initializing
        }
    }

    /// Start a background crawl over the configured target sites.
    ///
    /// At most one crawl runs at a time; a second call while one is in
    /// progress fails with [`LexragError::AlreadyRunning`]. Frontier loading
    /// and store opening happen before the task is spawned, so setup errors
    /// are returned to the caller instead of dying inside the task.
    pub fn start_crawl(
        &self,
        max_pages: usize,
        max_depth: usize,
        resume: bool,
    ) -> Result<CrawlStarted> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(LexragError::ServiceNotInitialized);
        }

        let mut crawl_task = self.crawl_task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = crawl_task.as_ref() {
            if !handle.is_finished() {
                return Err(LexragError::AlreadyRunning);
            }
        }

        let crawler = Crawler::new(
            &self.config,
            Arc::clone(&self.permits),
            max_pages,
            max_depth,
            resume,
        )?;

        *crawl_task = Some(tokio::spawn(async move {
            let stats = crawler.run().await?;
            Ok(stats)
        }));

        log::info!(
            "Started crawling with max_pages={}, max_depth={}",
            max_pages,
            max_depth
        );
        Ok(CrawlStarted {
            message: format!(
                "Started crawling with max_pages={}, max_depth={}",
                max_pages, max_depth
            ),
        })
    }

    /// Wait for the in-progress crawl (if any) to finish and return its
    /// stats. `None` when no crawl was started.
    pub async fn wait_for_crawl(&self) -> Result<Option<CrawlStats>> {
        let handle = {
            let mut crawl_task = self.crawl_task.lock().unwrap_or_else(|e| e.into_inner());
            crawl_task.take()
        };

        match handle {
            Some(handle) => {
                let stats = handle
                    .await
                    .map_err(|e| LexragError::Crawl(format!("crawl task failed: {}", e)))??;
                Ok(Some(stats))
            }
            None => Ok(None),
        }
    }

    /// Answer a question grounded in the indexed legal publications.
    ///
    /// Retrieval runs against the persisted store, so answers reflect
    /// everything indexed so far even while a crawl is in progress. When
    /// nothing relevant is indexed, a canned response with empty sources is
    /// returned instead of calling the generation backend. A failing backend
    /// surfaces as [`LexragError::GenerationUnavailable`]; retrieval results
    /// are never silently rewritten into an answer.
    pub async fn ask(
        &self,
        query: &str,
        site_filter: Option<&str>,
        model: Option<&str>,
    ) -> Result<Answer> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(LexragError::ServiceNotInitialized);
        }

        let results = self
            .retriever
            .search(query, self.config.search.top_k, site_filter)?;

        if results.is_empty() {
            return Ok(Answer {
                response: EMPTY_INDEX_ANSWER.to_string(),
                sources: Vec::new(),
                query: query.to_string(),
            });
        }

        let assembled = assemble(
            &results,
            self.config.search.max_context_size,
            self.config.search.max_context_chunks,
        );

        let model = model.unwrap_or_else(|| self.generation.default_model());
        let response = self
            .generation
            .complete(model, query, &assembled.context)
            .await?;

        Ok(Answer {
            response,
            sources: assembled.sources,
            query: query.to_string(),
        })
    }

    /// The configuration this engine was built with
    pub fn config(&self) -> &Config {
        &self.config
    }
}
