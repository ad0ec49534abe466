//! factcheck-verdict
//!
//! Normalizes verdict labels from any registered taxonomy onto the canonical
//! ordinal scale, and scores normalized predictions against ground truth.

pub mod mapper;
pub mod metrics;
pub mod taxonomy;

pub use mapper::VerdictMapper;
pub use metrics::{ClassMetrics, ClassificationReport, Granularity};
pub use taxonomy::{normalize_label, TaxonomyTable};
