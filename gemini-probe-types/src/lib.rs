//! Shared wire types for the Gemini model probe.

pub mod content;
pub mod models;
pub mod response;
