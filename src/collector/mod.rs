//! Counter collection and delta computation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Recorder (sampler.rs)                   │
//! │          Vec<Box<dyn Collector>>, one per domain         │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │ collect()
//!                     ┌────────▼────────┐
//!                     │   DeltaEngine   │  previous snapshot,
//!                     │                 │  raw delta / cpu %
//!                     └────────┬────────┘
//!                              │ read()
//!                     ┌────────▼────────┐
//!                     │  CounterSource  │ (trait)
//!                     └────────┬────────┘
//!              ┌───────────────┴───────────────┐
//!       ┌──────▼───────┐                ┌──────▼─────────┐
//!       │ ProcfsSource │                │ ScriptedSource │
//!       │  FileSystem  │                │   (Testing)    │
//!       └──────┬───────┘                └────────────────┘
//!        ┌─────┴──────┐
//!   ┌────▼───┐   ┌────▼───┐
//!   │ RealFs │   │ MockFs │
//!   └────────┘   └────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use ustat::collector::{DeltaEngine, Domain, MockFs, ProcfsSource};
//!
//! let fs = MockFs::typical_system();
//! let mut engine = DeltaEngine::new(ProcfsSource::new(fs, "/proc", Domain::Disk)).unwrap();
//! assert_eq!(engine.metrics().names()[0], "disk.sda.read.sectors");
//! assert!(engine.collect().unwrap().iter().all(|&v| v == 0));
//! ```

pub mod delta;
pub mod domain;
pub mod error;
pub mod mock;
pub mod procfs;
pub mod traits;

pub use delta::{DeltaEngine, Snapshot};
pub use domain::{Domain, MetricSet};
pub use error::CollectError;
pub use mock::{MockFs, ScriptedSource};
pub use procfs::ProcfsSource;
pub use traits::{Collector, Counter, CounterSource, FileSystem, RealFs};

/// Builds a `/proc` backed delta engine for `domain`, taking its baseline.
pub fn procfs_engine<F>(
    fs: F,
    proc_path: &str,
    domain: Domain,
) -> Result<Box<dyn Collector>, CollectError>
where
    F: FileSystem + 'static,
{
    let engine = DeltaEngine::new(ProcfsSource::new(fs, proc_path, domain))?;
    Ok(Box::new(engine))
}
