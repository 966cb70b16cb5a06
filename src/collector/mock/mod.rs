//! Mock implementations for testing.
//!
//! This module provides `MockFs` with pre-built `/proc` scenarios, and
//! `ScriptedSource` for driving delta engines with synthetic counters.

mod filesystem;
mod scenarios;
mod scripted;

pub use filesystem::MockFs;
pub use scripted::ScriptedSource;
