//! HDF5 Link Info message (type 0x0002).

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ensure_len, FormatError};
use crate::UNDEF_ADDR;

/// Link storage and ordering properties of a new-style group.
///
/// Fixture groups always keep their links compact, so the fractal heap and
/// B-tree addresses are written undefined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfoMessage {
    /// Highest creation order handed out so far, present when tracked.
    pub max_creation_order: Option<u64>,
    /// Whether a creation-order index is maintained.
    pub creation_order_indexed: bool,
    pub fractal_heap_address: Option<u64>,
    pub name_index_address: Option<u64>,
    pub creation_order_index_address: Option<u64>,
}

impl LinkInfoMessage {
    /// Compact storage that tracks and indexes creation order.
    pub fn tracked(max_creation_order: u64) -> Self {
        Self {
            max_creation_order: Some(max_creation_order),
            creation_order_indexed: true,
            fractal_heap_address: None,
            name_index_address: None,
            creation_order_index_address: None,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut flags = 0u8;
        if self.max_creation_order.is_some() {
            flags |= 0x01;
        }
        if self.creation_order_indexed {
            flags |= 0x02;
        }
        let mut buf = vec![0, flags];
        if let Some(max) = self.max_creation_order {
            buf.extend_from_slice(&max.to_le_bytes());
        }
        buf.extend_from_slice(&self.fractal_heap_address.unwrap_or(UNDEF_ADDR).to_le_bytes());
        buf.extend_from_slice(&self.name_index_address.unwrap_or(UNDEF_ADDR).to_le_bytes());
        if self.creation_order_indexed {
            buf.extend_from_slice(
                &self
                    .creation_order_index_address
                    .unwrap_or(UNDEF_ADDR)
                    .to_le_bytes(),
            );
        }
        buf
    }

    pub fn parse(data: &[u8]) -> Result<LinkInfoMessage, FormatError> {
        ensure_len(data, 0, 2)?;
        if data[0] != 0 {
            return Err(FormatError::InvalidLinkInfoVersion(data[0]));
        }
        let flags = data[1];
        let mut pos = 2;
        let next_u64 = |pos: &mut usize| -> Result<u64, FormatError> {
            ensure_len(data, *pos, 8)?;
            let v = LittleEndian::read_u64(&data[*pos..*pos + 8]);
            *pos += 8;
            Ok(v)
        };
        let defined = |addr: u64| (addr != UNDEF_ADDR).then_some(addr);

        let max_creation_order = if flags & 0x01 != 0 {
            Some(next_u64(&mut pos)?)
        } else {
            None
        };
        let fractal_heap_address = defined(next_u64(&mut pos)?);
        let name_index_address = defined(next_u64(&mut pos)?);
        let creation_order_indexed = flags & 0x02 != 0;
        let creation_order_index_address = if creation_order_indexed {
            defined(next_u64(&mut pos)?)
        } else {
            None
        };

        Ok(LinkInfoMessage {
            max_creation_order,
            creation_order_indexed,
            fractal_heap_address,
            name_index_address,
            creation_order_index_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_untracked_groups() {
        let mut bytes = vec![0u8, 0];
        bytes.extend_from_slice(&[0xFF; 16]);
        let info = LinkInfoMessage::parse(&bytes).unwrap();
        assert_eq!(info.max_creation_order, None);
        assert!(!info.creation_order_indexed);
        assert_eq!(info.fractal_heap_address, None);
    }

    #[test]
    fn tracked_layout() {
        let info = LinkInfoMessage::tracked(41);
        let bytes = info.serialize();
        assert_eq!(bytes.len(), 2 + 8 + 8 + 8 + 8);
        assert_eq!(bytes[1], 0x03);
        assert_eq!(&bytes[2..10], &41u64.to_le_bytes());
        assert_eq!(LinkInfoMessage::parse(&bytes).unwrap(), info);
    }

    #[test]
    fn bad_version() {
        assert_eq!(
            LinkInfoMessage::parse(&[1, 0]),
            Err(FormatError::InvalidLinkInfoVersion(1))
        );
    }
}
