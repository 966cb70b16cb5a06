//! Counter sources for the Linux `/proc` filesystem.
//!
//! `parser` turns pseudo-file content into typed records; `source` labels
//! those records as named counters for the delta engines.

pub mod parser;
pub mod source;

pub use source::ProcfsSource;
