//! Version 2 object header parsing.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};

use crate::checksum::jenkins_lookup3;
use crate::error::{ensure_len, FormatError};
use crate::message_type::MessageType;

const OHDR_SIGNATURE: &[u8; 4] = b"OHDR";

/// A single header message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMessage {
    pub msg_type: MessageType,
    pub flags: u8,
    /// Present when the header tracks attribute creation order.
    pub creation_order: Option<u16>,
    pub data: Vec<u8>,
}

/// A parsed version 2 object header (first chunk only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHeader {
    pub flags: u8,
    pub messages: Vec<HeaderMessage>,
    /// Total encoded size including signature and checksum.
    pub encoded_len: usize,
}

impl ObjectHeader {
    /// Parse the header at `offset` and verify its checksum.
    pub fn parse(data: &[u8], offset: usize) -> Result<ObjectHeader, FormatError> {
        ensure_len(data, offset, 6)?;
        if &data[offset..offset + 4] != OHDR_SIGNATURE {
            return Err(FormatError::InvalidObjectHeaderSignature);
        }
        let version = data[offset + 4];
        if version != 2 {
            return Err(FormatError::InvalidObjectHeaderVersion(version));
        }
        let flags = data[offset + 5];
        let mut pos = offset + 6;
        if flags & 0x20 != 0 {
            pos += 16; // access/modification/change/birth times
        }
        if flags & 0x10 != 0 {
            pos += 4; // attribute phase change values
        }

        let width = 1usize << (flags & 0x03);
        ensure_len(data, pos, width)?;
        let mut size_bytes = [0u8; 8];
        size_bytes[..width].copy_from_slice(&data[pos..pos + width]);
        let chunk_size = u64::from_le_bytes(size_bytes) as usize;
        pos += width;

        let end = pos + chunk_size;
        ensure_len(data, end, 4)?;
        let stored = LittleEndian::read_u32(&data[end..end + 4]);
        let computed = jenkins_lookup3(&data[offset..end]);
        if stored != computed {
            return Err(FormatError::ChecksumMismatch {
                expected: stored,
                computed,
            });
        }

        let tracks_order = flags & 0x04 != 0;
        let prefix = if tracks_order { 6 } else { 4 };
        let mut messages = Vec::new();
        while pos + prefix <= end {
            let msg_type = MessageType::from(data[pos]);
            let size = LittleEndian::read_u16(&data[pos + 1..pos + 3]) as usize;
            let msg_flags = data[pos + 3];
            let creation_order =
                tracks_order.then(|| LittleEndian::read_u16(&data[pos + 4..pos + 6]));
            pos += prefix;
            if pos + size > end {
                break;
            }
            if msg_type != MessageType::Nil {
                messages.push(HeaderMessage {
                    msg_type,
                    flags: msg_flags,
                    creation_order,
                    data: data[pos..pos + size].to_vec(),
                });
            }
            pos += size;
        }

        Ok(ObjectHeader {
            flags,
            messages,
            encoded_len: end + 4 - offset,
        })
    }

    /// First message of the given type.
    pub fn find(&self, msg_type: MessageType) -> Option<&HeaderMessage> {
        self.messages.iter().find(|m| m.msg_type == msg_type)
    }

    /// All messages of the given type, in header order.
    pub fn find_all(&self, msg_type: MessageType) -> impl Iterator<Item = &HeaderMessage> {
        self.messages.iter().filter(move |m| m.msg_type == msg_type)
    }
}
