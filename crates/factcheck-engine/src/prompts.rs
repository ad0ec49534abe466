//! Prompt templates for advocates and the mediator.

use serde::{Deserialize, Serialize};

use factcheck_core::settings::CLAIM_PLACEHOLDER;
use factcheck_core::types::{AdvocateArgument, Claim, RetrievedEvidence};

pub const DEFAULT_ADVOCATE_SYSTEM: &str = "You are a scientific fact-checker. Judge the claim \"{claim}\" using only \
the numbered evidence passages retrieved from your assigned source. When passages conflict, follow the majority of \
the evidence. Do not rely on outside knowledge.";

pub const DEFAULT_ADVOCATE_FORMAT: &str = "Cite the passages you rely on by their labels, for example [E1]. You may \
add a line `Confidence: <0-1>`. Finish with exactly one verdict: ((correct)), ((incorrect)) or \
((not_enough_information)).";

pub const DEFAULT_MEDIATOR_SYSTEM: &str = "You are the mediator of a fact-checking panel. Each advocate argued from \
a different source. Weigh their arguments, including advocates that found no usable evidence, and decide the claim.";

pub const DEFAULT_MEDIATOR_FORMAT: &str = "Name the advocates whose arguments decided the outcome on a line \
`Decisive: <source ids, comma separated>`. Finish with exactly one verdict: ((correct)), ((incorrect)) or \
((not_enough_information)).";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvocatePrompts {
    /// May contain `{claim}`.
    pub system: String,
    pub format: String,
}

impl Default for AdvocatePrompts {
    fn default() -> Self {
        Self { system: DEFAULT_ADVOCATE_SYSTEM.to_string(), format: DEFAULT_ADVOCATE_FORMAT.to_string() }
    }
}

impl AdvocatePrompts {
    pub fn render_system(&self, claim: &Claim) -> String {
        self.system.replace(CLAIM_PLACEHOLDER, &claim.text)
    }

    pub fn render_user(&self, claim: &Claim, evidence: &RetrievedEvidence) -> String {
        let mut out = format!("Claim: {}\n\nEvidence:\n", claim.text);
        for (i, entry) in evidence.iter().enumerate() {
            out.push_str(&format!(
                "[E{}] (chunk {}, similarity {:.3})\n{}\n\n",
                i + 1,
                entry.chunk.id,
                entry.score,
                entry.chunk.content.trim()
            ));
        }
        out.push_str(&self.format);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatorPrompts {
    pub system: String,
    pub format: String,
}

impl Default for MediatorPrompts {
    fn default() -> Self {
        Self { system: DEFAULT_MEDIATOR_SYSTEM.to_string(), format: DEFAULT_MEDIATOR_FORMAT.to_string() }
    }
}

impl MediatorPrompts {
    pub fn render_system(&self, claim: &Claim) -> String {
        self.system.replace(CLAIM_PLACEHOLDER, &claim.text)
    }

    /// Every argument is listed with its source id and stance. Degraded
    /// arguments are labelled with the reason evidence was missing.
    pub fn render_user(&self, claim: &Claim, arguments: &[AdvocateArgument]) -> String {
        let mut out = format!("Claim: {}\n\nAdvocate arguments:\n", claim.text);
        for (i, arg) in arguments.iter().enumerate() {
            out.push_str(&format!("\nAdvocate {} (source: {})\nStance: {}", i + 1, arg.source_id, arg.stance));
            if let Some(reason) = &arg.degradation {
                out.push_str(&format!(" (no usable evidence: {reason})"));
            }
            out.push_str(&format!("\nEvidence passages: {}\n", arg.evidence.len()));
            let rationale = arg.rationale.trim();
            if !rationale.is_empty() {
                out.push_str(&format!("Reasoning:\n{rationale}\n"));
            }
        }
        out.push('\n');
        out.push_str(&self.format);
        out
    }
}
