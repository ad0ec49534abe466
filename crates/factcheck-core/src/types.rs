//! Domain types used by the index, the advocates, the mediator and the session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub type ChunkId = String;
pub type SourceId = String;

/// A natural-language statement to verify.
///
/// Identity is the text; `external_id` joins the claim back to a
/// ground-truth dataset row when one exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Claim {
    pub text: String,
    pub external_id: Option<String>,
}

impl Claim {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), external_id: None }
    }

    #[must_use]
    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Raw text documents of one evidence source, as handed over by a source provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocuments {
    pub source_id: SourceId,
    pub documents: Vec<String>,
}

impl SourceDocuments {
    pub fn new(source_id: impl Into<String>, documents: Vec<String>) -> Self {
        Self { source_id: source_id.into(), documents }
    }
}

/// A contiguous slice of one source document.
///
/// - `id`: `<source_id>:<doc_index>:<chunk_index>`
/// - `start`/`end`: byte offsets of `content` inside the parent document
/// - `chunk_index`/`total_chunks`: position within the parent document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub source_id: SourceId,
    pub doc_index: usize,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub start: usize,
    pub end: usize,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Result of one index query: descending by score, ties in chunk order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedEvidence {
    pub entries: Vec<ScoredChunk>,
}

impl RetrievedEvidence {
    pub fn new(entries: Vec<ScoredChunk>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredChunk> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ScoredChunk> {
        self.entries.get(index)
    }
}

impl<'a> IntoIterator for &'a RetrievedEvidence {
    type Item = &'a ScoredChunk;
    type IntoIter = std::slice::Iter<'a, ScoredChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stance {
    Supports,
    Refutes,
    InsufficientEvidence,
}

impl Stance {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Supports => "supports",
            Self::Refutes => "refutes",
            Self::InsufficientEvidence => "insufficient-evidence",
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed ordinal scale every verdict is normalized onto.
///
/// Declaration order is the scale order, so `Ord` compares by strength of
/// support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CanonicalVerdict {
    StronglyRefutes,
    Refutes,
    InsufficientEvidence,
    Supports,
    StronglySupports,
}

impl CanonicalVerdict {
    pub const ALL: [Self; 5] = [
        Self::StronglyRefutes,
        Self::Refutes,
        Self::InsufficientEvidence,
        Self::Supports,
        Self::StronglySupports,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StronglyRefutes => "strongly-refutes",
            Self::Refutes => "refutes",
            Self::InsufficientEvidence => "insufficient-evidence",
            Self::Supports => "supports",
            Self::StronglySupports => "strongly-supports",
        }
    }

    /// Signed position on the scale, -2 ..= 2.
    pub fn rank(self) -> i8 {
        match self {
            Self::StronglyRefutes => -2,
            Self::Refutes => -1,
            Self::InsufficientEvidence => 0,
            Self::Supports => 1,
            Self::StronglySupports => 2,
        }
    }

    pub fn stance(self) -> Stance {
        match self {
            Self::StronglyRefutes | Self::Refutes => Stance::Refutes,
            Self::InsufficientEvidence => Stance::InsufficientEvidence,
            Self::Supports | Self::StronglySupports => Stance::Supports,
        }
    }
}

impl From<Stance> for CanonicalVerdict {
    fn from(stance: Stance) -> Self {
        match stance {
            Stance::Supports => Self::Supports,
            Stance::Refutes => Self::Refutes,
            Stance::InsufficientEvidence => Self::InsufficientEvidence,
        }
    }
}

impl fmt::Display for CanonicalVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalVerdict {
    type Err = Error;

    /// Accepts the kebab-case names as well as snake_case spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| Error::config(format!("unknown canonical verdict '{s}'")))
    }
}

/// Why an argument fell back to insufficient-evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Degradation {
    /// No chunk cleared the similarity threshold.
    RetrievalEmpty,
    /// The backend answered but no stance could be extracted.
    Unparseable,
    /// The verdict label is not in the stance taxonomy.
    AmbiguousStance { label: String },
    BackendFailure { message: String },
    TimedOut { after_ms: u64 },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetrievalEmpty => f.write_str("no evidence cleared the similarity threshold"),
            Self::Unparseable => f.write_str("response could not be parsed into a stance"),
            Self::AmbiguousStance { label } => write!(f, "verdict label '{label}' does not name a stance"),
            Self::BackendFailure { message } => write!(f, "reasoning backend failure: {message}"),
            Self::TimedOut { after_ms } => write!(f, "timed out after {after_ms} ms"),
        }
    }
}

/// One advocate's position on a claim. Built once per claim and never mutated.
///
/// `citations` index into `evidence.entries`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvocateArgument {
    pub source_id: SourceId,
    pub stance: Stance,
    pub rationale: String,
    pub evidence: RetrievedEvidence,
    pub citations: Vec<usize>,
    pub raw_label: Option<String>,
    pub raw_confidence: Option<f32>,
    pub degradation: Option<Degradation>,
}

impl AdvocateArgument {
    /// An insufficient-evidence argument carrying a diagnostic in its rationale.
    pub fn degraded(
        source_id: impl Into<String>,
        degradation: Degradation,
        evidence: RetrievedEvidence,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            stance: Stance::InsufficientEvidence,
            rationale: rationale.into(),
            evidence,
            citations: Vec::new(),
            raw_label: None,
            raw_confidence: None,
            degradation: Some(degradation),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degradation.is_some()
    }

    pub fn cited_evidence(&self) -> impl Iterator<Item = &ScoredChunk> {
        self.citations.iter().filter_map(|&i| self.evidence.get(i))
    }
}

/// The mediator's single adjudication for a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediatorVerdict {
    pub raw_label: String,
    pub rationale: String,
    pub decisive_sources: Vec<SourceId>,
    /// Every argument the mediator was shown, in advocate configuration order.
    pub considered: Vec<AdvocateArgument>,
}
