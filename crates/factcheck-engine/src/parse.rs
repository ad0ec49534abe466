//! Lenient parsing of reasoning-backend responses.
//!
//! Nothing in here fails: a response either yields a structured result or is
//! reported as unparseable with its text preserved.

use std::sync::LazyLock;

use regex::Regex;

static MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\(\s*([^()]+?)\s*\)\)").expect("valid regex"));
static VERDICT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<verdict>\s*(.*?)\s*</verdict>").expect("valid regex"));
static BRACKET_GROUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]").expect("valid regex"));
static EVIDENCE_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bE(\d+)\b").expect("valid regex"));
static CONFIDENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)confidence\s*[:=]\s*([0-9]*\.?[0-9]+)\s*(%)?").expect("valid regex"));
static DECISIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*decisive(?:\s+advocates?)?\s*[:=]\s*(.+?)\s*$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArgument {
    /// Verdict label as written by the backend, before normalization.
    pub label: String,
    pub rationale: String,
    /// Zero-based indices into the evidence shown in the prompt.
    pub citations: Vec<usize>,
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    Parsed(ParsedArgument),
    Unparseable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedVerdict {
    pub label: String,
    pub rationale: String,
    pub decisive_sources: Vec<String>,
}

/// Remove `<token>..</token>` spans. A closing tag without an opening one
/// drops everything before it.
pub fn strip_thinking(text: &str, token: Option<&str>) -> String {
    let Some(token) = token else {
        return text.trim().to_string();
    };
    let open = format!("<{token}>");
    let close = format!("</{token}>");
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    if !rest.contains(&open) {
        if let Some(pos) = rest.find(&close) {
            rest = &rest[pos + close.len()..];
        }
    }
    while let Some(start) = rest.find(&open) {
        out.push_str(&rest[..start]);
        match rest[start..].find(&close) {
            Some(end) => rest = &rest[start + end + close.len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

/// The verdict label of a response: the first `((label))` marker, else the
/// first `<verdict>label</verdict>` tag.
pub fn verdict_marker(text: &str) -> Option<String> {
    MARKER
        .captures(text)
        .or_else(|| VERDICT_TAG.captures(text))
        .map(|c| c[1].trim().to_string())
        .filter(|label| !label.is_empty())
}

/// Cited evidence labels (`[E1]`, `[E2, E4]`) as zero-based indices below
/// `evidence_len`, in first-citation order.
pub fn citations(text: &str, evidence_len: usize) -> Vec<usize> {
    let mut out = Vec::new();
    for group in BRACKET_GROUP.captures_iter(text) {
        for r in EVIDENCE_REF.captures_iter(&group[1]) {
            let Ok(label) = r[1].parse::<usize>() else { continue };
            if label == 0 || label > evidence_len {
                continue;
            }
            if !out.contains(&(label - 1)) {
                out.push(label - 1);
            }
        }
    }
    out
}

/// `Confidence: 0.8`, `Confidence: 80%` or `Confidence: 80`, clamped to [0, 1].
/// Bare whole numbers in (1, 100] read as percentages.
pub fn confidence(text: &str) -> Option<f32> {
    let caps = CONFIDENCE.captures_iter(text).last()?;
    let mut value: f32 = caps[1].parse().ok()?;
    if caps.get(2).is_some() || (value > 1.0 && value <= 100.0 && value.fract() == 0.0) {
        value /= 100.0;
    }
    Some(value.clamp(0.0, 1.0))
}

/// Whether `needle` occurs in `haystack` as a whole word, ignoring case.
fn mentions(haystack: &str, needle: &str) -> bool {
    Regex::new(&format!(r"(?i)(?:^|[^\w]){}(?:[^\w]|$)", regex::escape(needle)))
        .is_ok_and(|re| re.is_match(haystack))
}

pub fn parse_advocate_response(raw: &str, evidence_len: usize, thinking_token: Option<&str>) -> ParsedResponse {
    let cleaned = strip_thinking(raw, thinking_token);
    match verdict_marker(&cleaned) {
        Some(label) => ParsedResponse::Parsed(ParsedArgument {
            label,
            citations: citations(&cleaned, evidence_len),
            confidence: confidence(&cleaned),
            rationale: cleaned,
        }),
        None => ParsedResponse::Unparseable(if cleaned.is_empty() { raw.trim().to_string() } else { cleaned }),
    }
}

/// Parse a mediator response. `sources` are the advocate source ids in
/// configuration order; decisive sources come from a `Decisive:` line, or
/// failing that from any mention of a source id.
pub fn parse_mediator_response(raw: &str, thinking_token: Option<&str>, sources: &[&str]) -> Option<ParsedVerdict> {
    let cleaned = strip_thinking(raw, thinking_token);
    let label = verdict_marker(&cleaned)?;

    let named: Vec<String> = DECISIVE
        .captures_iter(&cleaned)
        .last()
        .map(|c| c[1].split([',', ';']).map(|s| s.trim().to_lowercase()).collect())
        .unwrap_or_default();
    let decisive_sources = sources
        .iter()
        .filter(|s| {
            if named.is_empty() {
                mentions(&cleaned, s)
            } else {
                let s = s.to_lowercase();
                named.iter().any(|n| n == &s)
            }
        })
        .map(|s| (*s).to_string())
        .collect();

    Some(ParsedVerdict { label, rationale: cleaned, decisive_sources })
}
