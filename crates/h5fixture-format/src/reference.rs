//! Object and dataset-region reference encoding.
//!
//! An object reference is the 8-byte address of the target's object header.
//! A region reference is a 12-byte global heap id; the heap object it names
//! holds the target's object header address followed by a serialized
//! selection.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ensure_len, FormatError};
use crate::raw_data::{AddressTarget, DatasetId, RawData};
use crate::selection::HyperslabSelection;

/// Encoded size of an object reference.
pub const OBJECT_REF_SIZE: u32 = 8;
/// Encoded size of a dataset region reference.
pub const REGION_REF_SIZE: u32 = 12;

/// Append an object reference to `target`.
pub fn push_object_reference(raw: &mut RawData, target: DatasetId) {
    raw.push_address(AddressTarget::Dataset(target));
}

/// Append a region reference naming global heap object `object_index`.
pub fn push_region_reference(raw: &mut RawData, object_index: u16) {
    raw.push_address(AddressTarget::GlobalHeap);
    raw.extend_from_slice(&u32::from(object_index).to_le_bytes());
}

/// Build the heap object a region reference points at.
pub fn region_heap_object(
    target: DatasetId,
    selection: &HyperslabSelection,
) -> Result<RawData, FormatError> {
    let mut raw = RawData::new();
    raw.push_address(AddressTarget::Dataset(target));
    raw.extend_from_slice(&selection.serialize()?);
    Ok(raw)
}

/// Decode an object reference at `offset`.
pub fn parse_object_reference(data: &[u8], offset: usize) -> Result<u64, FormatError> {
    ensure_len(data, offset, 8)?;
    Ok(LittleEndian::read_u64(&data[offset..offset + 8]))
}

/// A decoded region reference element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionReference {
    pub collection_address: u64,
    pub object_index: u32,
}

impl RegionReference {
    pub fn parse(data: &[u8], offset: usize) -> Result<RegionReference, FormatError> {
        ensure_len(data, offset, REGION_REF_SIZE as usize)?;
        Ok(RegionReference {
            collection_address: LittleEndian::read_u64(&data[offset..offset + 8]),
            object_index: LittleEndian::read_u32(&data[offset + 8..offset + 12]),
        })
    }
}

/// Decode a region heap object into the target address and its selection.
pub fn parse_region_heap_object(data: &[u8]) -> Result<(u64, HyperslabSelection), FormatError> {
    ensure_len(data, 0, 8)?;
    let address = LittleEndian::read_u64(&data[..8]);
    let selection = HyperslabSelection::parse(&data[8..])?;
    Ok((address, selection))
}
