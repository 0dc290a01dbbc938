//! HDF5 global heap collections (`GCOL`).
//!
//! Variable-length strings, variable-length sequences and region reference
//! selections live in a global heap collection; dataset elements hold
//! `(collection address, object index)` ids pointing into it.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ensure_len, FormatError};
use crate::raw_data::{AddressTarget, RawData};

const GCOL_SIGNATURE: &[u8; 4] = b"GCOL";

/// Smallest collection the HDF5 library allocates.
pub const MIN_COLLECTION_SIZE: usize = 4096;

const COLLECTION_HEADER_SIZE: usize = 16;
const OBJECT_HEADER_SIZE: usize = 16;

fn pad8(x: usize) -> usize {
    (x + 7) & !7
}

/// Accumulates heap objects for a single collection.
#[derive(Debug, Default)]
pub struct GlobalHeapWriter {
    objects: Vec<RawData>,
}

impl GlobalHeapWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Store an object and return its 1-based index.
    pub fn insert(&mut self, object: RawData) -> Result<u16, FormatError> {
        let index = u16::try_from(self.objects.len() + 1).map_err(|_| FormatError::GlobalHeapFull)?;
        self.objects.push(object);
        Ok(index)
    }

    fn used_len(&self) -> usize {
        COLLECTION_HEADER_SIZE
            + self
                .objects
                .iter()
                .map(|o| OBJECT_HEADER_SIZE + pad8(o.len()))
                .sum::<usize>()
    }

    /// Encoded collection size, padded to [`MIN_COLLECTION_SIZE`].
    pub fn encoded_len(&self) -> usize {
        self.used_len().max(MIN_COLLECTION_SIZE)
    }

    /// Encode the collection, resolving addresses embedded in objects.
    pub fn serialize<F>(&self, mut resolve: F) -> Result<Vec<u8>, FormatError>
    where
        F: FnMut(AddressTarget) -> Result<u64, FormatError>,
    {
        let total = self.encoded_len();
        let mut buf = Vec::with_capacity(total);
        buf.extend_from_slice(GCOL_SIGNATURE);
        buf.extend_from_slice(&[1, 0, 0, 0]);
        buf.extend_from_slice(&(total as u64).to_le_bytes());

        for (i, object) in self.objects.iter().enumerate() {
            let data = object.resolve(&mut resolve)?;
            buf.extend_from_slice(&((i + 1) as u16).to_le_bytes());
            buf.extend_from_slice(&0u16.to_le_bytes()); // reference count
            buf.extend_from_slice(&[0u8; 4]);
            buf.extend_from_slice(&(data.len() as u64).to_le_bytes());
            buf.extend_from_slice(&data);
            buf.resize(pad8(buf.len()), 0);
        }

        let free = total - buf.len();
        if free >= OBJECT_HEADER_SIZE {
            buf.extend_from_slice(&[0u8; 8]);
            buf.extend_from_slice(&(free as u64).to_le_bytes());
        }
        buf.resize(total, 0);
        Ok(buf)
    }
}

/// A parsed global heap collection.
#[derive(Debug, Clone)]
pub struct GlobalHeapCollection {
    pub collection_size: u64,
    pub objects: Vec<GlobalHeapObject>,
}

/// A single object within a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalHeapObject {
    /// 1-based; index 0 marks free space.
    pub index: u16,
    pub reference_count: u16,
    pub data: Vec<u8>,
}

impl GlobalHeapCollection {
    /// Parse the collection at `offset`.
    pub fn parse(file_data: &[u8], offset: usize) -> Result<GlobalHeapCollection, FormatError> {
        ensure_len(file_data, offset, COLLECTION_HEADER_SIZE)?;
        if &file_data[offset..offset + 4] != GCOL_SIGNATURE {
            return Err(FormatError::InvalidGlobalHeapSignature);
        }
        let version = file_data[offset + 4];
        if version != 1 {
            return Err(FormatError::InvalidGlobalHeapVersion(version));
        }
        let collection_size = LittleEndian::read_u64(&file_data[offset + 8..offset + 16]);
        let end = offset + collection_size as usize;
        ensure_len(file_data, offset, collection_size as usize)?;

        let mut pos = offset + COLLECTION_HEADER_SIZE;
        let mut objects = Vec::new();
        while pos + OBJECT_HEADER_SIZE <= end {
            let index = LittleEndian::read_u16(&file_data[pos..pos + 2]);
            if index == 0 {
                break;
            }
            let reference_count = LittleEndian::read_u16(&file_data[pos + 2..pos + 4]);
            let size = LittleEndian::read_u64(&file_data[pos + 8..pos + 16]) as usize;
            pos += OBJECT_HEADER_SIZE;
            ensure_len(file_data, pos, size)?;
            objects.push(GlobalHeapObject {
                index,
                reference_count,
                data: file_data[pos..pos + size].to_vec(),
            });
            pos += pad8(size);
        }

        Ok(GlobalHeapCollection {
            collection_size,
            objects,
        })
    }

    /// Look up an object, reporting `collection_address` on failure.
    pub fn get(&self, collection_address: u64, index: u16) -> Result<&GlobalHeapObject, FormatError> {
        self.objects
            .iter()
            .find(|o| o.index == index)
            .ok_or(FormatError::GlobalHeapObjectNotFound {
                collection_address,
                index,
            })
    }
}
