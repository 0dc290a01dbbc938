//! Hyperslab selections as stored in dataset region references.
//!
//! A region reference's heap object holds a serialized dataspace selection.
//! Only the version 1 hyperslab form is written: an explicit list of blocks,
//! each given by its first and last (inclusive) coordinate per dimension.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use core::ops::Range;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ensure_len, FormatError};

const SEL_HYPERSLAB: u32 = 2;
const HYPERSLAB_VERSION: u32 = 1;

/// One rectangular block, `start[d]..=end[d]` in every dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperslabBlock {
    pub start: Vec<u64>,
    pub end: Vec<u64>,
}

impl HyperslabBlock {
    pub fn num_elements(&self) -> u64 {
        self.start
            .iter()
            .zip(&self.end)
            .map(|(&s, &e)| e - s + 1)
            .product()
    }
}

/// A union of hyperslab blocks over a dataspace of fixed rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperslabSelection {
    rank: usize,
    blocks: Vec<HyperslabBlock>,
}

impl HyperslabSelection {
    /// A single block covering `ranges` (half-open, one per dimension).
    ///
    /// Returns `SelectionOutOfBounds` for an empty range.
    pub fn from_ranges(ranges: &[Range<u64>]) -> Result<Self, FormatError> {
        if ranges.is_empty() || ranges.iter().any(|r| r.start >= r.end) {
            return Err(FormatError::SelectionOutOfBounds);
        }
        let block = HyperslabBlock {
            start: ranges.iter().map(|r| r.start).collect(),
            end: ranges.iter().map(|r| r.end - 1).collect(),
        };
        Ok(Self {
            rank: ranges.len(),
            blocks: vec![block],
        })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn blocks(&self) -> &[HyperslabBlock] {
        &self.blocks
    }

    pub fn num_elements(&self) -> u64 {
        self.blocks.iter().map(HyperslabBlock::num_elements).sum()
    }

    /// Check that every block lies within a dataspace of shape `dims`.
    pub fn check_bounds(&self, dims: &[u64]) -> Result<(), FormatError> {
        if dims.len() != self.rank {
            return Err(FormatError::SelectionOutOfBounds);
        }
        let fits = self.blocks.iter().all(|b| {
            b.end.iter().zip(dims).all(|(&e, &d)| e < d)
                && b.start.iter().zip(&b.end).all(|(s, e)| s <= e)
        });
        if fits {
            Ok(())
        } else {
            Err(FormatError::SelectionOutOfBounds)
        }
    }

    /// Encode as a version 1 hyperslab selection with 4-byte coordinates.
    pub fn serialize(&self) -> Result<Vec<u8>, FormatError> {
        let coords = self.blocks.len() * self.rank * 2;
        let length = 8 + coords * 4;
        let mut buf = Vec::with_capacity(16 + length);
        buf.extend_from_slice(&SEL_HYPERSLAB.to_le_bytes());
        buf.extend_from_slice(&HYPERSLAB_VERSION.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&(length as u32).to_le_bytes());
        buf.extend_from_slice(&(self.rank as u32).to_le_bytes());
        buf.extend_from_slice(&(self.blocks.len() as u32).to_le_bytes());
        for block in &self.blocks {
            for &c in block.start.iter().chain(&block.end) {
                let c = u32::try_from(c).map_err(|_| FormatError::SelectionOutOfBounds)?;
                buf.extend_from_slice(&c.to_le_bytes());
            }
        }
        Ok(buf)
    }

    /// Decode a version 1 hyperslab selection.
    pub fn parse(data: &[u8]) -> Result<HyperslabSelection, FormatError> {
        ensure_len(data, 0, 24)?;
        let sel_type = LittleEndian::read_u32(&data[0..4]);
        if sel_type != SEL_HYPERSLAB {
            return Err(FormatError::InvalidSelectionType(sel_type));
        }
        let version = LittleEndian::read_u32(&data[4..8]);
        if version != HYPERSLAB_VERSION {
            return Err(FormatError::InvalidSelectionVersion(version));
        }
        let rank = LittleEndian::read_u32(&data[16..20]) as usize;
        let nblocks = LittleEndian::read_u32(&data[20..24]) as usize;
        let mut pos = 24;
        ensure_len(data, pos, nblocks.saturating_mul(rank).saturating_mul(8))?;

        let mut read = |n: usize| -> Vec<u64> {
            let v = (0..n)
                .map(|i| u64::from(LittleEndian::read_u32(&data[pos + i * 4..pos + i * 4 + 4])))
                .collect();
            pos += n * 4;
            v
        };
        let blocks = (0..nblocks)
            .map(|_| {
                let start = read(rank);
                let end = read(rank);
                HyperslabBlock { start, end }
            })
            .collect();
        Ok(HyperslabSelection { rank, blocks })
    }
}
