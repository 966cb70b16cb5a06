//! ustat - Kernel counter sampler and offline reporter.
//!
//! This library provides the pieces behind the `ustat` binary:
//! - `collector` - `/proc` counter sources and per-domain delta engines
//! - `sampler` - the recording loop writing the delimited text stream
//! - `report` - the offline summary of a recording

pub mod collector;
pub mod error;
pub mod report;
pub mod sampler;
