//! Synthetic counter source replaying pre-recorded snapshots.

use std::collections::VecDeque;

use crate::collector::domain::Domain;
use crate::collector::error::CollectError;
use crate::collector::traits::{Counter, CounterSource};

/// Counter source that hands out one scripted frame per read.
///
/// Once the script is exhausted the last frame keeps being returned, which
/// models counters that stopped moving.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    domain: Domain,
    names: Vec<String>,
    frames: VecDeque<Vec<u64>>,
    last: Vec<u64>,
}

impl ScriptedSource {
    pub fn new<I, S>(domain: Domain, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let last = vec![0; names.len()];
        Self {
            domain,
            names,
            frames: VecDeque::new(),
            last,
        }
    }

    /// Appends a frame. Its length may differ from the names to simulate a
    /// resource appearing or vanishing mid-run.
    pub fn frame(mut self, values: &[u64]) -> Self {
        self.frames.push_back(values.to_vec());
        self
    }
}

impl CounterSource for ScriptedSource {
    fn domain(&self) -> Domain {
        self.domain
    }

    fn read(&mut self) -> Result<Vec<Counter>, CollectError> {
        if let Some(next) = self.frames.pop_front() {
            self.last = next;
        }

        let counters = self
            .last
            .iter()
            .enumerate()
            .map(|(idx, &value)| {
                let name = self
                    .names
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| format!("{}.extra{}", self.domain, idx));
                let description = format!("{} = scripted", name);
                Counter::new(name, description, value)
            })
            .collect();

        Ok(counters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_frames_then_repeats_last() {
        let mut source = ScriptedSource::new(Domain::Disk, ["disk.sda.read.sectors"])
            .frame(&[1])
            .frame(&[5]);

        assert_eq!(source.read().unwrap()[0].value, 1);
        assert_eq!(source.read().unwrap()[0].value, 5);
        assert_eq!(source.read().unwrap()[0].value, 5);
        assert_eq!(source.read().unwrap()[0].name, "disk.sda.read.sectors");
    }

    #[test]
    fn test_longer_frame_invents_names() {
        let mut source = ScriptedSource::new(Domain::Net, ["net.lo.rx.bytes"]).frame(&[1, 2]);
        let counters = source.read().unwrap();
        assert_eq!(counters[1].name, "net.extra1");
    }
}
