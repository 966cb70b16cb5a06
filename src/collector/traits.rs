//! Seams between the delta engines and the outside world.
//!
//! `FileSystem` lets the `/proc` readers work against the real filesystem on
//! Linux and against an in-memory mock in tests. `CounterSource` is what a
//! delta engine pulls snapshots from, and `Collector` is the uniform view the
//! sampler has of every enabled domain.

use std::io;
use std::path::Path;

use crate::collector::domain::{Domain, MetricSet};
use crate::collector::error::CollectError;

/// Abstraction for filesystem operations.
///
/// This trait allows collectors to read from the real filesystem or from
/// a mock implementation for testing purposes.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Real filesystem implementation that delegates to `std::fs`.
///
/// Use this in production to read from the actual `/proc` filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// One labelled cumulative counter as reported by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    pub name: String,
    pub description: String,
    pub value: u64,
}

impl Counter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, value: u64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            value,
        }
    }
}

/// Point-in-time reader of the cumulative counters of one domain.
///
/// Every call returns the full counter set of the domain, in a stable order.
/// The delta engine decides what to do if that order ever changes.
pub trait CounterSource {
    /// Domain this source reads.
    fn domain(&self) -> Domain;

    /// Reads all counters of the domain right now.
    fn read(&mut self) -> Result<Vec<Counter>, CollectError>;
}

impl<S: CounterSource + ?Sized> CounterSource for Box<S> {
    fn domain(&self) -> Domain {
        (**self).domain()
    }

    fn read(&mut self) -> Result<Vec<Counter>, CollectError> {
        (**self).read()
    }
}

/// Uniform view of an enabled domain, as driven by the sampler.
pub trait Collector {
    /// Column layout fixed at construction.
    fn metrics(&self) -> &MetricSet;

    /// Produces the next row, one value per column of [`Collector::metrics`].
    fn collect(&mut self) -> Result<Vec<u64>, CollectError>;
}
