//! Equal-width partition of the output frame grid.
//!
//! Every beat owns one contiguous slice of `total_frames / n_beats` frames,
//! regardless of its transition duration. Slice boundaries are real-valued
//! and rounded; the final slice always ends exactly at `total_frames`.
//!
//! Camera interpolation and the frame -> beat lookup both go through this
//! type, so captions and camera motion can never disagree about which beat
//! is active on a frame.

use std::ops::Range;

/// Partition of `[0, total_frames)` into `slices` contiguous, non-overlapping ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlicePartition {
    total_frames: usize,
    slices: usize,
}

impl SlicePartition {
    /// Create a partition. Returns `None` when `slices` is zero.
    pub fn new(total_frames: usize, slices: usize) -> Option<Self> {
        (slices > 0).then_some(Self {
            total_frames,
            slices,
        })
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    pub fn slices(&self) -> usize {
        self.slices
    }

    /// Nominal (unrounded) slice width in frames.
    pub fn slice_width(&self) -> f64 {
        self.total_frames as f64 / self.slices as f64
    }

    /// Frame range owned by slice `index`. Empty when `index` is out of range
    /// or when there are more slices than frames.
    pub fn bounds(&self, index: usize) -> Range<usize> {
        if index >= self.slices {
            return self.total_frames..self.total_frames;
        }
        self.boundary(index)..self.boundary(index + 1)
    }

    /// All slices in order, paired with their index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Range<usize>)> + '_ {
        (0..self.slices).map(move |index| (index, self.bounds(index)))
    }

    /// The slice containing `frame`, or `None` past the end of the grid.
    pub fn slice_of(&self, frame: usize) -> Option<usize> {
        if frame >= self.total_frames {
            return None;
        }

        // Last slice whose start is <= frame. Its end is > frame because
        // boundaries are non-decreasing and the final boundary is total_frames.
        let (mut lo, mut hi) = (0usize, self.slices);
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.boundary(mid) <= frame {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Some(lo)
    }

    /// Slice index for every frame of the grid.
    pub fn assignments(&self) -> Vec<usize> {
        let mut owners = vec![0usize; self.total_frames];
        for (index, range) in self.iter() {
            owners[range].fill(index);
        }
        owners
    }

    fn boundary(&self, index: usize) -> usize {
        if index >= self.slices {
            return self.total_frames;
        }
        let edge = (index as f64 * self.slice_width()).round() as usize;
        edge.min(self.total_frames)
    }
}
