//! Classification metrics over normalized verdicts.
//!
//! Predictions and ground truth are compared after projecting both onto a
//! chosen granularity: the full five-point scale, supports/refutes/
//! insufficient, or supported/unsupported.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use factcheck_core::error::{Error, Result};
use factcheck_core::types::{CanonicalVerdict, Stance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Granularity {
    Full,
    Ternary,
    Binary,
}

impl Granularity {
    /// Class name of `verdict` at this granularity.
    pub fn project(self, verdict: CanonicalVerdict) -> &'static str {
        match self {
            Self::Full => verdict.as_str(),
            Self::Ternary => verdict.stance().as_str(),
            Self::Binary => match verdict.stance() {
                Stance::Supports => "supported",
                Stance::Refutes | Stance::InsufficientEvidence => "unsupported",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub granularity: Granularity,
    pub total: usize,
    pub accuracy: f64,
    pub macro_f1: f64,
    pub per_class: BTreeMap<String, ClassMetrics>,
    /// `confusion[truth][predicted]` counts.
    pub confusion: BTreeMap<String, BTreeMap<String, usize>>,
}

impl ClassificationReport {
    pub fn compute(
        truth: &[CanonicalVerdict],
        predicted: &[CanonicalVerdict],
        granularity: Granularity,
    ) -> Result<Self> {
        if truth.is_empty() || predicted.is_empty() {
            return Err(Error::config("classification inputs cannot be empty"));
        }
        if truth.len() != predicted.len() {
            return Err(Error::config(format!(
                "classification inputs differ in length: {} truths vs {} predictions",
                truth.len(),
                predicted.len()
            )));
        }

        let mut confusion: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        let mut classes = BTreeSet::new();
        let mut correct = 0usize;
        for (&t, &p) in truth.iter().zip(predicted) {
            let (t, p) = (granularity.project(t), granularity.project(p));
            classes.insert(t);
            classes.insert(p);
            if t == p {
                correct += 1;
            }
            *confusion.entry(t.to_string()).or_default().entry(p.to_string()).or_default() += 1;
        }

        let count = |t: &str, p: &str| confusion.get(t).and_then(|row| row.get(p)).copied().unwrap_or(0);
        let mut per_class = BTreeMap::new();
        for &class in &classes {
            let tp = count(class, class);
            let support: usize = confusion.get(class).map_or(0, |row| row.values().sum());
            let predicted_as: usize = classes.iter().map(|&t| count(t, class)).sum();
            let precision = ratio(tp, predicted_as);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 { 2.0 * precision * recall / (precision + recall) } else { 0.0 };
            per_class.insert(class.to_string(), ClassMetrics { precision, recall, f1, support });
        }

        #[allow(clippy::cast_precision_loss)]
        let macro_f1 = per_class.values().map(|m| m.f1).sum::<f64>() / per_class.len() as f64;

        Ok(Self {
            granularity,
            total: truth.len(),
            accuracy: ratio(correct, truth.len()),
            macro_f1,
            per_class,
            confusion,
        })
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>24} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        for (class, m) in &self.per_class {
            writeln!(f, "{:>24} {:>9.2} {:>9.2} {:>9.2} {:>9}", class, m.precision, m.recall, m.f1, m.support)?;
        }
        writeln!(f)?;
        writeln!(f, "{:>24} {:>9} {:>9} {:>9.2} {:>9}", "accuracy", "", "", self.accuracy, self.total)?;
        write!(f, "{:>24} {:>9} {:>9} {:>9.2} {:>9}", "macro f1", "", "", self.macro_f1, self.total)
    }
}
