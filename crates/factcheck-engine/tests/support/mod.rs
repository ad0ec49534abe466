#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use factcheck_core::settings::{ChunkingSettings, RetrievalSettings, SessionSettings};
use factcheck_core::traits::{Embedder, ReasoningBackend, ReasoningRequest};
use factcheck_core::types::SourceDocuments;
use factcheck_engine::{Advocate, AdvocateConfig, Mediator, MediatorConfig, Session};
use factcheck_index::EvidenceIndex;
use factcheck_verdict::VerdictMapper;

pub const CLAIM: &str = "Has global temperature risen more than 1°C?";

type Handler = Box<dyn Fn(usize, &ReasoningRequest) -> anyhow::Result<String> + Send + Sync>;

/// Reasoning backend driven by a closure over (call number, request).
pub struct FakeBackend {
    handler: Handler,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ReasoningRequest>>,
}

impl FakeBackend {
    pub fn new(handler: impl Fn(usize, &ReasoningRequest) -> anyhow::Result<String> + Send + Sync + 'static) -> Self {
        Self { handler: Box::new(handler), delay: None, calls: AtomicUsize::new(0), requests: Mutex::new(Vec::new()) }
    }

    pub fn replying(text: &str) -> Arc<Self> {
        let text = text.to_string();
        Arc::new(Self::new(move |_, _| Ok(text.clone())))
    }

    /// Replies in order, repeating the last one.
    pub fn scripted(replies: &[&str]) -> Arc<Self> {
        let replies: Vec<String> = replies.iter().map(|s| s.to_string()).collect();
        Arc::new(Self::new(move |n, _| Ok(replies[n.min(replies.len() - 1)].clone())))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        let message = message.to_string();
        Arc::new(Self::new(move |_, _| Err(anyhow::anyhow!(message.clone()))))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|r| r.prompt.clone()).collect()
    }

    pub fn systems(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|r| r.system.clone()).collect()
    }
}

#[async_trait]
impl ReasoningBackend for FakeBackend {
    async fn complete(&self, request: &ReasoningRequest) -> anyhow::Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.handler)(n, request)
    }
}

/// One dimension per concept; a text scores 1.0 on every concept it mentions.
pub struct ConceptEmbedder;

const CONCEPTS: &[&[&str]] = &[
    &["temperature", "warming"],
    &["global", "worldwide"],
    &["risen", "rise", "increased"],
    &["glacier"],
    &["ocean"],
];

impl Embedder for ConceptEmbedder {
    fn embedder_id(&self) -> &str {
        "concept:test"
    }

    fn dim(&self) -> usize {
        CONCEPTS.len()
    }

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let lower = t.to_lowercase();
                CONCEPTS.iter().map(|words| if words.iter().any(|w| lower.contains(w)) { 1.0 } else { 0.0 }).collect()
            })
            .collect())
    }
}

/// Embeds normally for the index build, then fails every later call.
pub struct FlakyEmbedder {
    calls: AtomicUsize,
}

impl Embedder for FlakyEmbedder {
    fn embedder_id(&self) -> &str {
        "concept:flaky"
    }

    fn dim(&self) -> usize {
        CONCEPTS.len()
    }

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            anyhow::bail!("embedding service down");
        }
        ConceptEmbedder.embed_batch(texts)
    }
}

pub fn flaky_index(source_id: &str) -> EvidenceIndex {
    let docs = SourceDocuments::new(
        source_id,
        vec!["Global average temperature has risen about 1.1°C since pre-industrial times.".into()],
    );
    let embedder = Arc::new(FlakyEmbedder { calls: AtomicUsize::new(0) });
    EvidenceIndex::build(&docs, &ChunkingSettings::new(150, 20), embedder).expect("index")
}

pub fn climate_index(source_id: &str) -> EvidenceIndex {
    let docs = SourceDocuments::new(
        source_id,
        vec!["Global average temperature has risen about 1.1°C since pre-industrial times.".into()],
    );
    EvidenceIndex::build(&docs, &ChunkingSettings::new(150, 20), Arc::new(ConceptEmbedder)).expect("index")
}

/// A source with nothing relevant to [`CLAIM`].
pub fn glacier_index(source_id: &str) -> EvidenceIndex {
    let docs = SourceDocuments::new(source_id, vec!["Glacier mass has declined across most mountain ranges.".into()]);
    EvidenceIndex::build(&docs, &ChunkingSettings::new(150, 20), Arc::new(ConceptEmbedder)).expect("index")
}

pub fn mapper() -> Arc<VerdictMapper> {
    Arc::new(VerdictMapper::builtin().expect("builtin taxonomies"))
}

pub fn advocate_config() -> AdvocateConfig {
    AdvocateConfig { retrieval: RetrievalSettings::new(8, 0.75), ..AdvocateConfig::default() }
}

pub fn advocate(index: EvidenceIndex, backend: Arc<FakeBackend>) -> Advocate {
    Advocate::new(index, backend, mapper(), advocate_config()).expect("advocate")
}

pub fn mediator(backend: Arc<FakeBackend>) -> Mediator {
    Mediator::new(backend, MediatorConfig::default()).expect("mediator")
}

pub fn session(advocates: Vec<Advocate>, mediator_backend: Arc<FakeBackend>, verdict_taxonomy: &str) -> Session {
    let settings = SessionSettings { verdict_taxonomy: verdict_taxonomy.to_string(), ..SessionSettings::default() };
    Session::new(advocates, mediator(mediator_backend), mapper(), settings).expect("session")
}
