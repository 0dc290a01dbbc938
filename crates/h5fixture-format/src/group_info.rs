//! HDF5 Group Info message (type 0x000A).

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ensure_len, FormatError};

/// Default threshold above which HDF5 moves links to dense storage.
pub const DEFAULT_MAX_COMPACT: u16 = 8;
/// Default threshold below which HDF5 moves links back to compact storage.
pub const DEFAULT_MIN_DENSE: u16 = 6;

/// Storage thresholds and size hints for a new-style group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfoMessage {
    /// `(max_compact, min_dense)` when the defaults are overridden.
    pub link_phase_change: Option<(u16, u16)>,
    /// `(estimated_entries, estimated_name_length)` hints.
    pub estimates: Option<(u16, u16)>,
}

impl GroupInfoMessage {
    /// Keep up to `links` links in compact storage.
    pub fn compact_for(links: usize) -> Self {
        let max_compact = (links.min(u16::MAX as usize) as u16).max(DEFAULT_MAX_COMPACT);
        let min_dense = DEFAULT_MIN_DENSE.min(max_compact);
        Self {
            link_phase_change: Some((max_compact, min_dense)),
            estimates: None,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut flags = 0u8;
        if self.link_phase_change.is_some() {
            flags |= 0x01;
        }
        if self.estimates.is_some() {
            flags |= 0x02;
        }
        let mut buf = vec![0, flags];
        for (x, y) in self.link_phase_change.iter().chain(self.estimates.iter()) {
            buf.extend_from_slice(&x.to_le_bytes());
            buf.extend_from_slice(&y.to_le_bytes());
        }
        buf
    }

    pub fn parse(data: &[u8]) -> Result<GroupInfoMessage, FormatError> {
        ensure_len(data, 0, 2)?;
        if data[0] != 0 {
            return Err(FormatError::InvalidGroupInfoVersion(data[0]));
        }
        let flags = data[1];
        let mut pos = 2;
        let mut pair = |present: bool| -> Result<Option<(u16, u16)>, FormatError> {
            if !present {
                return Ok(None);
            }
            ensure_len(data, pos, 4)?;
            let x = LittleEndian::read_u16(&data[pos..pos + 2]);
            let y = LittleEndian::read_u16(&data[pos + 2..pos + 4]);
            pos += 4;
            Ok(Some((x, y)))
        };
        let link_phase_change = pair(flags & 0x01 != 0)?;
        let estimates = pair(flags & 0x02 != 0)?;
        Ok(GroupInfoMessage {
            link_phase_change,
            estimates,
        })
    }
}
