//! Application state for the HTTP server

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use crate::config::NexusConfig;
use crate::error::Result;
use crate::ingestion::IngestPipeline;
use crate::intent::IntentClassifier;
use crate::processing::{IngestWorker, JobQueue};
use crate::providers::{AuthProvider, CompletionProvider, GatewayClient, StaticTokenAuth};
use crate::retrieval::LexicalRetriever;
use crate::storage::{DocumentDb, LocalObjectStore, ObjectStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: NexusConfig,
    db: Arc<DocumentDb>,
    object_store: Arc<dyn ObjectStore>,
    auth: Arc<dyn AuthProvider>,
    completion: Arc<dyn CompletionProvider>,
    job_queue: Arc<JobQueue>,
    retriever: LexicalRetriever,
    classifier: IntentClassifier,
    ready: RwLock<bool>,
}

impl AppState {
    /// Create state with the default collaborators: local object store,
    /// config-backed auth, HTTP completion gateway.
    pub async fn new(config: NexusConfig) -> Result<Self> {
        let completion: Arc<dyn CompletionProvider> = Arc::new(GatewayClient::new(&config.gateway)?);
        let auth: Arc<dyn AuthProvider> = Arc::new(StaticTokenAuth::new(&config.auth));
        Self::with_providers(config, completion, auth).await
    }

    /// Create state with injected collaborator implementations
    pub async fn with_providers(
        config: NexusConfig,
        completion: Arc<dyn CompletionProvider>,
        auth: Arc<dyn AuthProvider>,
    ) -> Result<Self> {
        tracing::info!("initializing application state");

        let db = Arc::new(DocumentDb::new(config.storage.database_path())?);
        tracing::info!("database ready at {}", config.storage.database_path().display());

        let object_store: Arc<dyn ObjectStore> =
            Arc::new(LocalObjectStore::new(config.storage.objects_dir()));
        tracing::info!("object store '{}' ready", object_store.name());

        let worker_count = config
            .processing
            .worker_count
            .unwrap_or_else(|| num_cpus::get().min(4));
        let (job_queue, receiver) = JobQueue::new(worker_count, config.processing.queue_capacity);
        let job_queue = Arc::new(job_queue);

        let pipeline = Arc::new(IngestPipeline::new(db.clone(), object_store.clone(), &config));
        let retriever = LexicalRetriever::new(db.clone(), &config.retrieval);
        let classifier = IntentClassifier::new(completion.clone());

        let worker = IngestWorker::new(
            pipeline,
            db.clone(),
            job_queue.clone(),
            worker_count,
            Duration::from_secs(config.processing.ingest_timeout_secs),
        );
        tokio::spawn(worker.run(receiver));
        tracing::info!("ingestion worker started ({} workers)", worker_count);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                object_store,
                auth,
                completion,
                job_queue,
                retriever,
                classifier,
                ready: RwLock::new(true),
            }),
        })
    }

    pub fn config(&self) -> &NexusConfig {
        &self.inner.config
    }

    pub fn db(&self) -> &Arc<DocumentDb> {
        &self.inner.db
    }

    pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
        &self.inner.object_store
    }

    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.inner.auth
    }

    pub fn completion(&self) -> &Arc<dyn CompletionProvider> {
        &self.inner.completion
    }

    pub fn job_queue(&self) -> &Arc<JobQueue> {
        &self.inner.job_queue
    }

    pub fn retriever(&self) -> &LexicalRetriever {
        &self.inner.retriever
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.inner.classifier
    }

    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
