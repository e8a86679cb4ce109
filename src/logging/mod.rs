//! Structured logging via `tracing`, JSON lines by default.

mod format;

pub use format::{FailureRecord, StructuredLogger};
