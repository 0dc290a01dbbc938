//! Version 2 object header writer.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::checksum::jenkins_lookup3;
use crate::error::FormatError;
use crate::message_type::MessageType;

/// Message flag: the message is constant and may not change.
pub const MSG_FLAG_CONSTANT: u8 = 0x01;

/// Collects header messages and emits one `OHDR` chunk with its checksum.
#[derive(Debug, Default)]
pub struct ObjectHeaderWriter {
    messages: Vec<(MessageType, Vec<u8>, u8)>,
}

impl ObjectHeaderWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message with no flags.
    pub fn add_message(&mut self, msg_type: MessageType, data: Vec<u8>) {
        self.messages.push((msg_type, data, 0));
    }

    /// Append a message with explicit message flags.
    pub fn add_message_with_flags(&mut self, msg_type: MessageType, data: Vec<u8>, flags: u8) {
        self.messages.push((msg_type, data, flags));
    }

    /// Encoded size without building the header.
    pub fn encoded_len(&self) -> usize {
        let body = self.body_len();
        6 + Self::chunk_size_width(body) + body + 4
    }

    /// Encode the header: signature, version, flags, chunk size, messages
    /// and the lookup3 checksum.
    pub fn serialize(&self) -> Result<Vec<u8>, FormatError> {
        let body = self.body_len();
        let width = Self::chunk_size_width(body);
        let mut buf = Vec::with_capacity(6 + width + body + 4);
        buf.extend_from_slice(b"OHDR");
        buf.push(2);
        buf.push(match width {
            1 => 0x00,
            2 => 0x01,
            _ => 0x02,
        });
        buf.extend_from_slice(&(body as u32).to_le_bytes()[..width]);

        for (msg_type, data, flags) in &self.messages {
            let len = u16::try_from(data.len()).map_err(|_| FormatError::MessageTooLarge(data.len()))?;
            buf.push(msg_type.code());
            buf.extend_from_slice(&len.to_le_bytes());
            buf.push(*flags);
            buf.extend_from_slice(data);
        }

        let checksum = jenkins_lookup3(&buf);
        buf.extend_from_slice(&checksum.to_le_bytes());
        Ok(buf)
    }

    fn body_len(&self) -> usize {
        self.messages.iter().map(|(_, data, _)| 4 + data.len()).sum()
    }

    fn chunk_size_width(body: usize) -> usize {
        if body <= 0xFF {
            1
        } else if body <= 0xFFFF {
            2
        } else {
            4
        }
    }
}
