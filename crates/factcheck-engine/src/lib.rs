//! factcheck-engine
//!
//! Advocate-mediator verification: each advocate argues from its own evidence
//! index, the mediator adjudicates over the finished arguments, and the
//! session normalizes the adjudicated label onto the canonical scale.

pub mod advocate;
pub mod mediator;
pub mod parse;
pub mod prompts;
pub mod session;

pub use advocate::{Advocate, AdvocateConfig};
pub use mediator::{Mediator, MediatorConfig};
pub use session::{Session, SessionState, VerificationResult};
