//! HDF5 Data Layout message (type 0x0008), contiguous storage only.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ensure_len, FormatError};
use crate::UNDEF_ADDR;

const CLASS_CONTIGUOUS: u8 = 1;

/// Location of a dataset's raw data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContiguousLayout {
    /// File address of the first byte, `None` when nothing is allocated.
    pub address: Option<u64>,
    /// Size of the raw data in bytes.
    pub size: u64,
}

impl ContiguousLayout {
    /// Layout for a dataset with no storage (null dataspace).
    pub fn unallocated() -> Self {
        Self {
            address: None,
            size: 0,
        }
    }

    /// Encode as a version 3 layout message.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![3, CLASS_CONTIGUOUS];
        buf.extend_from_slice(&self.address.unwrap_or(UNDEF_ADDR).to_le_bytes());
        buf.extend_from_slice(&self.size.to_le_bytes());
        buf
    }

    /// Decode a version 3 or 4 contiguous layout message.
    pub fn parse(data: &[u8]) -> Result<ContiguousLayout, FormatError> {
        ensure_len(data, 0, 2)?;
        if !(3..=4).contains(&data[0]) {
            return Err(FormatError::InvalidLayoutVersion(data[0]));
        }
        if data[1] != CLASS_CONTIGUOUS {
            return Err(FormatError::UnsupportedLayoutClass(data[1]));
        }
        ensure_len(data, 2, 16)?;
        let addr = LittleEndian::read_u64(&data[2..10]);
        Ok(ContiguousLayout {
            address: (addr != UNDEF_ADDR).then_some(addr),
            size: LittleEndian::read_u64(&data[10..18]),
        })
    }
}

/// Fill value message (type 0x0005) version 3: late allocation, fill
/// written only if set, no fill value defined.
pub fn fill_value_message() -> Vec<u8> {
    vec![3, 0x0a]
}
