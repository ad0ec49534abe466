use std::sync::Arc;

use serde::{Deserialize, Serialize};

use factcheck_core::error::{Error, Result};
use factcheck_core::settings::ReasoningSettings;
use factcheck_core::traits::{ReasoningBackend, ReasoningRequest};
use factcheck_core::types::{AdvocateArgument, Claim, MediatorVerdict};

use crate::parse::parse_mediator_response;
use crate::prompts::MediatorPrompts;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatorConfig {
    pub reasoning: ReasoningSettings,
    pub prompts: MediatorPrompts,
}

/// Adjudicates a claim over the complete set of advocate arguments.
pub struct Mediator {
    backend: Arc<dyn ReasoningBackend>,
    config: MediatorConfig,
}

impl Mediator {
    pub fn new(backend: Arc<dyn ReasoningBackend>, config: MediatorConfig) -> Result<Self> {
        config.reasoning.validate()?;
        Ok(Self { backend, config })
    }

    pub fn config(&self) -> &MediatorConfig {
        &self.config
    }

    pub async fn adjudicate(&self, claim: &Claim, arguments: &[AdvocateArgument]) -> Result<MediatorVerdict> {
        if arguments.is_empty() {
            return Err(Error::config("mediator needs at least one advocate argument"));
        }
        let reasoning = &self.config.reasoning;
        let request = ReasoningRequest {
            system: self.config.prompts.render_system(claim),
            prompt: self.config.prompts.render_user(claim, arguments),
            temperature: reasoning.temperature,
            context_window: reasoning.context_window,
        };
        let sources: Vec<&str> = arguments.iter().map(|a| a.source_id.as_str()).collect();

        for attempt in 1..=reasoning.max_attempts {
            let raw = self
                .backend
                .complete(&request)
                .await
                .map_err(|e| Error::MediatorFailure(format!("reasoning backend: {e:#}")))?;
            match parse_mediator_response(&raw, reasoning.thinking_token.as_deref(), &sources) {
                Some(parsed) => {
                    tracing::debug!(label = %parsed.label, decisive = ?parsed.decisive_sources, "Mediator verdict");
                    return Ok(MediatorVerdict {
                        raw_label: parsed.label,
                        rationale: parsed.rationale,
                        decisive_sources: parsed.decisive_sources,
                        considered: arguments.to_vec(),
                    });
                }
                None => tracing::warn!(attempt, "Mediator response has no verdict marker"),
            }
        }
        Err(Error::MediatorFailure(format!("no verdict marker after {} attempts", reasoning.max_attempts)))
    }
}
