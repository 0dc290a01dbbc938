//! HDF5 Dataspace message (type 0x0001), version 2.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ensure_len, FormatError};

/// Shape of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dataspace {
    /// No elements at all; the dataset only carries type metadata.
    Null,
    /// Exactly one element, rank 0.
    Scalar,
    /// Fixed-size N-dimensional array.
    Simple(Vec<u64>),
}

impl Dataspace {
    /// Number of dimensions (0 for null and scalar).
    pub fn rank(&self) -> usize {
        match self {
            Dataspace::Simple(dims) => dims.len(),
            _ => 0,
        }
    }

    /// Dimension sizes (empty for null and scalar).
    pub fn dims(&self) -> &[u64] {
        match self {
            Dataspace::Simple(dims) => dims,
            _ => &[],
        }
    }

    /// Total number of elements.
    pub fn num_elements(&self) -> u64 {
        match self {
            Dataspace::Null => 0,
            Dataspace::Scalar => 1,
            Dataspace::Simple(dims) => dims.iter().product(),
        }
    }

    /// Encode as a version 2 message with 8-byte dimension sizes and no
    /// maximum dimensions.
    pub fn serialize(&self) -> Vec<u8> {
        let type_code = match self {
            Dataspace::Scalar => 0u8,
            Dataspace::Simple(_) => 1,
            Dataspace::Null => 2,
        };
        let mut buf = vec![2, self.rank() as u8, 0, type_code];
        for d in self.dims() {
            buf.extend_from_slice(&d.to_le_bytes());
        }
        buf
    }

    /// Decode a version 1 or 2 message with 8-byte lengths.
    pub fn parse(data: &[u8]) -> Result<Dataspace, FormatError> {
        ensure_len(data, 0, 4)?;
        let version = data[0];
        let rank = data[1] as usize;
        let flags = data[2];
        let (kind, mut pos) = match version {
            1 => (if rank == 0 { 0 } else { 1 }, 8),
            2 => (data[3], 4),
            v => return Err(FormatError::InvalidDataspaceVersion(v)),
        };
        let mut dims = Vec::with_capacity(rank);
        for _ in 0..rank {
            ensure_len(data, pos, 8)?;
            dims.push(LittleEndian::read_u64(&data[pos..pos + 8]));
            pos += 8;
        }
        if flags & 0x01 != 0 {
            ensure_len(data, pos, rank * 8)?;
        }
        match kind {
            0 => Ok(Dataspace::Scalar),
            1 => Ok(Dataspace::Simple(dims)),
            2 => Ok(Dataspace::Null),
            other => Err(FormatError::InvalidDataspaceType(other)),
        }
    }
}
