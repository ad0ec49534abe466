//! factcheck-core
//!
//! Shared vocabulary of the verification engine: domain types, the error
//! taxonomy, collaborator traits, typed settings, chunking and the figment
//! configuration loader used at the application edge.

#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunking;
pub mod config;
pub mod error;
pub mod settings;
pub mod sources;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
