use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use factcheck_core::error::{Error, Result};
use factcheck_core::settings::{ReasoningSettings, RetrievalSettings, SessionSettings};
use factcheck_core::traits::{ReasoningBackend, ReasoningRequest};
use factcheck_core::types::{AdvocateArgument, Claim, Degradation, Stance};
use factcheck_index::EvidenceIndex;
use factcheck_verdict::VerdictMapper;

use crate::parse::{parse_advocate_response, ParsedArgument, ParsedResponse};
use crate::prompts::AdvocatePrompts;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvocateConfig {
    pub retrieval: RetrievalSettings,
    pub reasoning: ReasoningSettings,
    pub prompts: AdvocatePrompts,
    /// Taxonomy used to read the backend's verdict label as a stance.
    pub stance_taxonomy: String,
}

impl Default for AdvocateConfig {
    fn default() -> Self {
        Self::new(RetrievalSettings::default(), ReasoningSettings::default(), SessionSettings::default().stance_taxonomy)
    }
}

impl AdvocateConfig {
    pub fn new(retrieval: RetrievalSettings, reasoning: ReasoningSettings, stance_taxonomy: impl Into<String>) -> Self {
        Self { retrieval, reasoning, prompts: AdvocatePrompts::default(), stance_taxonomy: stance_taxonomy.into() }
    }
}

/// Argues a claim from the evidence of exactly one source.
pub struct Advocate {
    index: EvidenceIndex,
    backend: Arc<dyn ReasoningBackend>,
    mapper: Arc<VerdictMapper>,
    config: AdvocateConfig,
}

impl Advocate {
    pub fn new(
        index: EvidenceIndex,
        backend: Arc<dyn ReasoningBackend>,
        mapper: Arc<VerdictMapper>,
        config: AdvocateConfig,
    ) -> Result<Self> {
        config.retrieval.validate()?;
        config.reasoning.validate()?;
        if !mapper.has_taxonomy(&config.stance_taxonomy) {
            return Err(Error::config(format!(
                "advocate '{}' uses unknown stance taxonomy '{}'",
                index.source_id(),
                config.stance_taxonomy
            )));
        }
        Ok(Self { index, backend, mapper, config })
    }

    pub fn source_id(&self) -> &str {
        self.index.source_id()
    }

    pub fn config(&self) -> &AdvocateConfig {
        &self.config
    }

    /// Produce this advocate's argument without a time limit.
    pub async fn argue(&self, claim: &Claim) -> Result<AdvocateArgument> {
        self.argue_within(claim, None).await
    }

    /// Produce this advocate's argument, giving the reasoning backend at most
    /// `limit` to answer.
    ///
    /// Missing evidence, backend failures, timeouts and unreadable responses
    /// become insufficient-evidence arguments that keep whatever evidence was
    /// retrieved; only embedding failures are returned as errors.
    pub async fn argue_within(&self, claim: &Claim, limit: Option<Duration>) -> Result<AdvocateArgument> {
        let source_id = self.source_id();
        let retrieval = &self.config.retrieval;
        let query = retrieval.build_query(&claim.text);
        let evidence = self.index.query(&query, retrieval.top_k, retrieval.min_similarity)?;

        if evidence.is_empty() {
            tracing::info!(source_id, min_similarity = retrieval.min_similarity, "No evidence retrieved");
            return Ok(AdvocateArgument::degraded(
                source_id,
                Degradation::RetrievalEmpty,
                evidence,
                format!("No passage from '{source_id}' reached similarity {}", retrieval.min_similarity),
            ));
        }

        let request = ReasoningRequest {
            system: self.config.prompts.render_system(claim),
            prompt: self.config.prompts.render_user(claim, &evidence),
            temperature: self.config.reasoning.temperature,
            context_window: self.config.reasoning.context_window,
        };
        let reasoning = self.reason(&request, evidence.len());
        let outcome = match limit {
            None => reasoning.await,
            Some(limit) => match timeout(limit, reasoning).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    let after_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                    tracing::warn!(source_id, after_ms, "Reasoning backend timed out");
                    return Ok(AdvocateArgument::degraded(
                        source_id,
                        Degradation::TimedOut { after_ms },
                        evidence,
                        format!("No argument within {after_ms} ms"),
                    ));
                }
            },
        };

        let parsed = match outcome {
            Ok(Reasoned::Parsed(parsed)) => parsed,
            Ok(Reasoned::Unparseable(text)) => {
                tracing::warn!(
                    source_id,
                    attempts = self.config.reasoning.max_attempts,
                    "Giving up on unparseable advocate responses"
                );
                return Ok(AdvocateArgument::degraded(source_id, Degradation::Unparseable, evidence, text));
            }
            Err(Error::Backend(message)) => {
                tracing::warn!(source_id, error = %message, "Reasoning backend failed");
                return Ok(AdvocateArgument::degraded(
                    source_id,
                    Degradation::BackendFailure { message: message.clone() },
                    evidence,
                    message,
                ));
            }
            Err(err) => return Err(err),
        };

        let mut argument = AdvocateArgument {
            source_id: source_id.to_string(),
            stance: Stance::InsufficientEvidence,
            rationale: parsed.rationale,
            evidence,
            citations: parsed.citations,
            raw_label: Some(parsed.label.clone()),
            raw_confidence: parsed.confidence,
            degradation: None,
        };
        match self.mapper.normalize(&parsed.label, &self.config.stance_taxonomy) {
            Ok(verdict) => argument.stance = verdict.stance(),
            Err(_) => {
                tracing::warn!(source_id, label = %parsed.label, "Verdict label does not name a stance");
                argument.citations.clear();
                argument.degradation = Some(Degradation::AmbiguousStance { label: parsed.label });
            }
        }
        tracing::debug!(source_id, stance = %argument.stance, citations = argument.citations.len(), "Argument ready");
        Ok(argument)
    }

    /// Ask the backend until a response carries a verdict marker or the
    /// attempts run out.
    async fn reason(&self, request: &ReasoningRequest, evidence_len: usize) -> Result<Reasoned> {
        let source_id = self.source_id();
        let reasoning = &self.config.reasoning;
        let mut last_response = String::new();
        for attempt in 1..=reasoning.max_attempts {
            let raw = self
                .backend
                .complete(request)
                .await
                .map_err(|e| Error::Backend(format!("{source_id}: {e:#}")))?;
            match parse_advocate_response(&raw, evidence_len, reasoning.thinking_token.as_deref()) {
                ParsedResponse::Parsed(parsed) => return Ok(Reasoned::Parsed(parsed)),
                ParsedResponse::Unparseable(text) => {
                    tracing::warn!(source_id, attempt, "Advocate response has no verdict marker");
                    last_response = text;
                }
            }
        }
        Ok(Reasoned::Unparseable(last_response))
    }
}

enum Reasoned {
    Parsed(ParsedArgument),
    Unparseable(String),
}

impl fmt::Debug for Advocate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advocate")
            .field("source_id", &self.source_id())
            .field("chunks", &self.index.len())
            .field("config", &self.config)
            .finish()
    }
}
