//! HDF5 superblock, version 3.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};

use crate::checksum::jenkins_lookup3;
use crate::error::{ensure_len, FormatError};
use crate::{LENGTH_SIZE, OFFSET_SIZE, UNDEF_ADDR};

/// The 8-byte HDF5 file signature.
pub const HDF5_SIGNATURE: [u8; 8] = [0x89, b'H', b'D', b'F', b'\r', b'\n', 0x1a, b'\n'];

/// Encoded size of a version 2/3 superblock with 8-byte offsets.
pub const SUPERBLOCK_SIZE: usize = 48;

/// A version 2 or 3 superblock with 8-byte offsets and lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superblock {
    pub version: u8,
    pub consistency_flags: u8,
    pub base_address: u64,
    pub extension_address: Option<u64>,
    pub eof_address: u64,
    pub root_group_address: u64,
}

impl Superblock {
    /// Version 3 superblock for a closed file of `eof_address` bytes.
    pub fn v3(root_group_address: u64, eof_address: u64) -> Self {
        Self {
            version: 3,
            consistency_flags: 0,
            base_address: 0,
            extension_address: None,
            eof_address,
            root_group_address,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SUPERBLOCK_SIZE);
        buf.extend_from_slice(&HDF5_SIGNATURE);
        buf.extend_from_slice(&[self.version, OFFSET_SIZE, LENGTH_SIZE, self.consistency_flags]);
        buf.extend_from_slice(&self.base_address.to_le_bytes());
        buf.extend_from_slice(&self.extension_address.unwrap_or(UNDEF_ADDR).to_le_bytes());
        buf.extend_from_slice(&self.eof_address.to_le_bytes());
        buf.extend_from_slice(&self.root_group_address.to_le_bytes());
        let checksum = jenkins_lookup3(&buf);
        buf.extend_from_slice(&checksum.to_le_bytes());
        buf
    }

    /// Parse a superblock at the start of `data`, verifying its checksum.
    pub fn parse(data: &[u8]) -> Result<Superblock, FormatError> {
        ensure_len(data, 0, 12)?;
        if data[..8] != HDF5_SIGNATURE {
            return Err(FormatError::SignatureNotFound);
        }
        let version = data[8];
        if !(2..=3).contains(&version) {
            return Err(FormatError::UnsupportedVersion(version));
        }
        if data[9] != OFFSET_SIZE {
            return Err(FormatError::InvalidOffsetSize(data[9]));
        }
        if data[10] != LENGTH_SIZE {
            return Err(FormatError::InvalidLengthSize(data[10]));
        }
        ensure_len(data, 0, SUPERBLOCK_SIZE)?;
        let stored = LittleEndian::read_u32(&data[44..48]);
        let computed = jenkins_lookup3(&data[..44]);
        if stored != computed {
            return Err(FormatError::ChecksumMismatch {
                expected: stored,
                computed,
            });
        }
        let ext = LittleEndian::read_u64(&data[20..28]);
        Ok(Superblock {
            version,
            consistency_flags: data[11],
            base_address: LittleEndian::read_u64(&data[12..20]),
            extension_address: (ext != UNDEF_ADDR).then_some(ext),
            eof_address: LittleEndian::read_u64(&data[28..36]),
            root_group_address: LittleEndian::read_u64(&data[36..44]),
        })
    }
}
