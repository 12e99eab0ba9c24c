//! Shared helpers: input limits, the error taxonomy, and report formatting.

pub mod format;
pub mod validation;
