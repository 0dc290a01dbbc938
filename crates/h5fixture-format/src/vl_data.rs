//! Variable-length element encoding.
//!
//! A VL element in a dataset's raw data is 16 bytes: a `u32` length (bytes
//! for strings, base elements for sequences), the global heap collection
//! address and a `u32` object index.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ensure_len, FormatError};
use crate::raw_data::{AddressTarget, RawData};

/// A decoded VL element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlElement {
    pub length: u32,
    pub collection_address: u64,
    pub object_index: u32,
}

/// Append a VL element whose heap address is filled in at layout time.
pub fn push_vl_element(raw: &mut RawData, length: u32, object_index: u16) {
    raw.extend_from_slice(&length.to_le_bytes());
    raw.push_address(AddressTarget::GlobalHeap);
    raw.extend_from_slice(&u32::from(object_index).to_le_bytes());
}

impl VlElement {
    /// Decode one element at `offset`.
    pub fn parse(data: &[u8], offset: usize) -> Result<VlElement, FormatError> {
        ensure_len(data, offset, 16)?;
        Ok(VlElement {
            length: LittleEndian::read_u32(&data[offset..offset + 4]),
            collection_address: LittleEndian::read_u64(&data[offset + 4..offset + 12]),
            object_index: LittleEndian::read_u32(&data[offset + 12..offset + 16]),
        })
    }
}
