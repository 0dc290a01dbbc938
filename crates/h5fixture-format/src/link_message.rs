//! HDF5 Link message (type 0x0006) for hard links.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec, vec::Vec};

use byteorder::{ByteOrder, LittleEndian};

use crate::datatype::CharacterSet;
use crate::error::{ensure_len, FormatError};

const FLAG_CREATION_ORDER: u8 = 0x04;
const FLAG_LINK_TYPE: u8 = 0x08;
const FLAG_CHARSET: u8 = 0x10;

/// A hard link from a group to an object header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMessage {
    pub name: String,
    pub object_header_address: u64,
    /// Position in the group's creation order, when tracked.
    pub creation_order: Option<u64>,
    pub charset: CharacterSet,
}

impl LinkMessage {
    /// Hard link to `address` with an optional creation order.
    pub fn hard(name: &str, address: u64, creation_order: Option<u64>) -> Self {
        let charset = if name.is_ascii() {
            CharacterSet::Ascii
        } else {
            CharacterSet::Utf8
        };
        Self {
            name: name.into(),
            object_header_address: address,
            creation_order,
            charset,
        }
    }

    /// Encode as a version 1 link message with 8-byte addresses.
    pub fn serialize(&self) -> Vec<u8> {
        let name = self.name.as_bytes();
        let (size_code, width) = match name.len() {
            0..=0xFF => (0u8, 1usize),
            0x100..=0xFFFF => (1, 2),
            _ => (2, 4),
        };
        let mut flags = size_code;
        if self.creation_order.is_some() {
            flags |= FLAG_CREATION_ORDER;
        }
        if self.charset == CharacterSet::Utf8 {
            flags |= FLAG_CHARSET;
        }

        let mut buf = vec![1, flags];
        if let Some(order) = self.creation_order {
            buf.extend_from_slice(&order.to_le_bytes());
        }
        if self.charset == CharacterSet::Utf8 {
            buf.push(1);
        }
        buf.extend_from_slice(&(name.len() as u32).to_le_bytes()[..width]);
        buf.extend_from_slice(name);
        buf.extend_from_slice(&self.object_header_address.to_le_bytes());
        buf
    }

    /// Decode a version 1 hard link message with 8-byte addresses.
    pub fn parse(data: &[u8]) -> Result<LinkMessage, FormatError> {
        ensure_len(data, 0, 2)?;
        if data[0] != 1 {
            return Err(FormatError::InvalidLinkVersion(data[0]));
        }
        let flags = data[1];
        let mut pos = 2;

        if flags & FLAG_LINK_TYPE != 0 {
            ensure_len(data, pos, 1)?;
            if data[pos] != 0 {
                return Err(FormatError::UnsupportedLinkType(data[pos]));
            }
            pos += 1;
        }

        let creation_order = if flags & FLAG_CREATION_ORDER != 0 {
            ensure_len(data, pos, 8)?;
            let v = LittleEndian::read_u64(&data[pos..pos + 8]);
            pos += 8;
            Some(v)
        } else {
            None
        };

        let charset = if flags & FLAG_CHARSET != 0 {
            ensure_len(data, pos, 1)?;
            let c = if data[pos] == 1 {
                CharacterSet::Utf8
            } else {
                CharacterSet::Ascii
            };
            pos += 1;
            c
        } else {
            CharacterSet::Ascii
        };

        let width = 1usize << (flags & 0x03);
        ensure_len(data, pos, width)?;
        let mut len_bytes = [0u8; 8];
        len_bytes[..width].copy_from_slice(&data[pos..pos + width]);
        let name_len = u64::from_le_bytes(len_bytes) as usize;
        pos += width;

        ensure_len(data, pos, name_len + 8)?;
        let name = String::from_utf8_lossy(&data[pos..pos + name_len]).into_owned();
        pos += name_len;
        let object_header_address = LittleEndian::read_u64(&data[pos..pos + 8]);

        Ok(LinkMessage {
            name,
            object_header_address,
            creation_order,
            charset,
        })
    }
}
