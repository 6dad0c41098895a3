//! Range-partitioned accumulator for merging per-worker buffers.
//!
//! The accumulated buffer is split into contiguous, non-overlapping
//! subsections, each behind its own lock. Workers merging their private
//! buffers walk all subsections starting from a different one, so disjoint
//! subsections are summed concurrently and no global lock is ever taken.

use std::ops::Range;

use mattes_core::partition::split_range;
use parking_lot::Mutex;

use crate::error::{MetricError, Result};

/// Flat `f64` buffer merged concurrently under per-subsection locks.
#[derive(Debug)]
pub struct PartitionedAccumulator {
    len: usize,
    bounds: Vec<Range<usize>>,
    subsections: Vec<Mutex<Vec<f64>>>,
}

impl PartitionedAccumulator {
    /// Create a zeroed accumulator of `len` entries split into at most
    /// `subsections` locked ranges.
    pub fn new(len: usize, subsections: usize) -> Self {
        let pieces = subsections.max(1).min(len.max(1));
        let bounds = split_range(len, pieces);
        let subsections = bounds.iter().map(|range| Mutex::new(vec![0.0; range.len()])).collect();
        Self {
            len,
            bounds,
            subsections,
        }
    }

    /// Number of accumulated entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the accumulator has no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of locked subsections.
    pub fn number_of_subsections(&self) -> usize {
        self.subsections.len()
    }

    /// Zero every entry.
    pub fn reset(&mut self) {
        for section in &mut self.subsections {
            section.get_mut().fill(0.0);
        }
    }

    /// Add `partial` into the accumulator.
    ///
    /// The walk over subsections starts at `worker % subsections`; only one
    /// subsection lock is held at a time.
    ///
    /// # Errors
    /// Returns [`MetricError::ShapeMismatch`] if `partial` has the wrong length.
    pub fn merge(&self, worker: usize, partial: &[f64]) -> Result<()> {
        if partial.len() != self.len {
            return Err(MetricError::ShapeMismatch {
                expected: vec![self.len],
                actual: vec![partial.len()],
            });
        }

        let n = self.subsections.len();
        for step in 0..n {
            let k = (worker + step) % n;
            let source = &partial[self.bounds[k].clone()];
            let mut section = self.subsections[k].lock();
            for (acc, value) in section.iter_mut().zip(source) {
                *acc += value;
            }
        }
        Ok(())
    }

    /// Multiply every entry by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for section in &mut self.subsections {
            for value in section.get_mut().iter_mut() {
                *value *= factor;
            }
        }
    }

    /// Copy the accumulated entries into one contiguous vector.
    pub fn to_vec(&mut self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.len);
        for section in &mut self.subsections {
            out.extend_from_slice(section.get_mut());
        }
        out
    }
}
