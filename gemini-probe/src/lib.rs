//! Core client crate for the Gemini model probe.

pub mod client;
pub mod error;
pub mod models;
pub mod probe;

#[cfg(test)]
mod test_support;

pub use gemini_probe_types as types;

pub use client::{Client, ClientBuilder, HttpOptions};
pub use error::{Error, FailureKind, Result};
pub use probe::{GenerativeService, ProbePlan, ProbeRunner, ProbeSummary};
