//! Raw byte buffers with deferred file addresses.
//!
//! Element data for references and variable-length values embeds file
//! addresses that are only known once the whole file is laid out. Writers
//! emit a zero placeholder and record an [`AddressFixup`]; the file writer
//! patches every placeholder when it assigns addresses.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::error::FormatError;

/// Identifies a dataset inside a [`crate::file_writer::FileWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetId(pub usize);

/// What a deferred address points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressTarget {
    /// The file's global heap collection.
    GlobalHeap,
    /// The object header of a dataset.
    Dataset(DatasetId),
}

/// An 8-byte placeholder at `offset` to be replaced by `target`'s address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressFixup {
    pub offset: usize,
    pub target: AddressTarget,
}

/// Bytes plus the placeholders embedded in them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawData {
    bytes: Vec<u8>,
    fixups: Vec<AddressFixup>,
}

impl RawData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain bytes without placeholders.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            fixups: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn fixups(&self) -> &[AddressFixup] {
        &self.fixups
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Append an 8-byte address placeholder for `target`.
    pub fn push_address(&mut self, target: AddressTarget) {
        self.fixups.push(AddressFixup {
            offset: self.bytes.len(),
            target,
        });
        self.bytes.extend_from_slice(&[0u8; 8]);
    }

    /// Replace every placeholder using `resolve` and return the final bytes.
    pub fn resolve<F>(&self, mut resolve: F) -> Result<Vec<u8>, FormatError>
    where
        F: FnMut(AddressTarget) -> Result<u64, FormatError>,
    {
        let mut out = self.bytes.clone();
        for fixup in &self.fixups {
            let addr = resolve(fixup.target)?;
            out[fixup.offset..fixup.offset + 8].copy_from_slice(&addr.to_le_bytes());
        }
        Ok(out)
    }
}
