//! Error types for HDF5 format encoding and parsing.

#[cfg(not(feature = "std"))]
use alloc::string::String;

use core::fmt;

/// Errors raised while encoding or parsing HDF5 structures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Unexpected end of data.
    UnexpectedEof {
        /// Number of bytes expected.
        expected: usize,
        /// Number of bytes actually available.
        available: usize,
    },
    /// The HDF5 magic signature was not found at offset 0.
    SignatureNotFound,
    /// The superblock version is not supported.
    UnsupportedVersion(u8),
    /// Invalid offset size (must be 2, 4, or 8).
    InvalidOffsetSize(u8),
    /// Invalid length size (must be 2, 4, or 8).
    InvalidLengthSize(u8),
    /// Invalid object header signature.
    InvalidObjectHeaderSignature,
    /// Invalid object header version.
    InvalidObjectHeaderVersion(u8),
    /// Lookup3 checksum mismatch.
    ChecksumMismatch {
        /// The checksum stored in the file.
        expected: u32,
        /// The checksum we computed.
        computed: u32,
    },
    /// Unknown datatype class.
    InvalidDatatypeClass(u8),
    /// Datatype version not valid for its class.
    InvalidDatatypeVersion {
        /// Datatype class id.
        class: u8,
        /// Version found.
        version: u8,
    },
    /// Unknown string padding type.
    InvalidStringPadding(u8),
    /// Unknown character set.
    InvalidCharacterSet(u8),
    /// Unknown reference type.
    InvalidReferenceType(u8),
    /// Unknown dataspace type.
    InvalidDataspaceType(u8),
    /// Unsupported dataspace version.
    InvalidDataspaceVersion(u8),
    /// Unsupported data layout version.
    InvalidLayoutVersion(u8),
    /// Data layout class other than contiguous.
    UnsupportedLayoutClass(u8),
    /// Unsupported link message version.
    InvalidLinkVersion(u8),
    /// Link type other than hard.
    UnsupportedLinkType(u8),
    /// Unsupported link info version.
    InvalidLinkInfoVersion(u8),
    /// Unsupported group info version.
    InvalidGroupInfoVersion(u8),
    /// Invalid global heap collection signature.
    InvalidGlobalHeapSignature,
    /// Unsupported global heap collection version.
    InvalidGlobalHeapVersion(u8),
    /// Object index not present in a global heap collection.
    GlobalHeapObjectNotFound {
        /// Address of the collection.
        collection_address: u64,
        /// Requested object index.
        index: u16,
    },
    /// More objects than a single collection can index.
    GlobalHeapFull,
    /// Unknown dataspace selection type.
    InvalidSelectionType(u32),
    /// Unsupported selection encoding version.
    InvalidSelectionVersion(u32),
    /// A selection does not fit inside its dataspace.
    SelectionOutOfBounds,
    /// Two links in one group share a name.
    DuplicateLinkName(String),
    /// An address fixup names a dataset that was never added.
    UnknownDataset(usize),
    /// A header message exceeds the 16-bit size field.
    MessageTooLarge(usize),
    /// An address fixup names the global heap but no heap objects exist.
    MissingGlobalHeap,
    /// Raw data length disagrees with the datatype and dataspace.
    DataSizeMismatch { expected: u64, actual: u64 },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::UnexpectedEof {
                expected,
                available,
            } => {
                write!(f, "unexpected EOF: need {expected} bytes, have {available}")
            }
            FormatError::SignatureNotFound => write!(f, "HDF5 signature not found"),
            FormatError::UnsupportedVersion(v) => {
                write!(f, "unsupported superblock version: {v}")
            }
            FormatError::InvalidOffsetSize(s) => {
                write!(f, "invalid offset size: {s} (must be 2, 4, or 8)")
            }
            FormatError::InvalidLengthSize(s) => {
                write!(f, "invalid length size: {s} (must be 2, 4, or 8)")
            }
            FormatError::InvalidObjectHeaderSignature => {
                write!(f, "invalid object header signature")
            }
            FormatError::InvalidObjectHeaderVersion(v) => {
                write!(f, "invalid object header version: {v}")
            }
            FormatError::ChecksumMismatch { expected, computed } => {
                write!(
                    f,
                    "checksum mismatch: expected {expected:#010x}, computed {computed:#010x}"
                )
            }
            FormatError::InvalidDatatypeClass(c) => write!(f, "invalid datatype class: {c}"),
            FormatError::InvalidDatatypeVersion { class, version } => {
                write!(f, "invalid version {version} for datatype class {class}")
            }
            FormatError::InvalidStringPadding(p) => write!(f, "invalid string padding: {p}"),
            FormatError::InvalidCharacterSet(c) => write!(f, "invalid character set: {c}"),
            FormatError::InvalidReferenceType(r) => write!(f, "invalid reference type: {r}"),
            FormatError::InvalidDataspaceType(t) => write!(f, "invalid dataspace type: {t}"),
            FormatError::InvalidDataspaceVersion(v) => {
                write!(f, "invalid dataspace version: {v}")
            }
            FormatError::InvalidLayoutVersion(v) => write!(f, "invalid data layout version: {v}"),
            FormatError::UnsupportedLayoutClass(c) => {
                write!(f, "unsupported data layout class: {c}")
            }
            FormatError::InvalidLinkVersion(v) => write!(f, "invalid link message version: {v}"),
            FormatError::UnsupportedLinkType(t) => write!(f, "unsupported link type: {t}"),
            FormatError::InvalidLinkInfoVersion(v) => {
                write!(f, "invalid link info version: {v}")
            }
            FormatError::InvalidGroupInfoVersion(v) => {
                write!(f, "invalid group info version: {v}")
            }
            FormatError::InvalidGlobalHeapSignature => {
                write!(f, "invalid global heap collection signature")
            }
            FormatError::InvalidGlobalHeapVersion(v) => {
                write!(f, "invalid global heap collection version: {v}")
            }
            FormatError::GlobalHeapObjectNotFound {
                collection_address,
                index,
            } => write!(
                f,
                "global heap object {index} not found in collection at {collection_address:#x}"
            ),
            FormatError::GlobalHeapFull => write!(f, "global heap collection is full"),
            FormatError::InvalidSelectionType(t) => write!(f, "invalid selection type: {t}"),
            FormatError::InvalidSelectionVersion(v) => {
                write!(f, "invalid selection version: {v}")
            }
            FormatError::SelectionOutOfBounds => {
                write!(f, "selection exceeds dataspace bounds")
            }
            FormatError::DuplicateLinkName(name) => write!(f, "duplicate link name: {name}"),
            FormatError::UnknownDataset(i) => write!(f, "address fixup targets unknown dataset {i}"),
            FormatError::MessageTooLarge(n) => {
                write!(f, "header message of {n} bytes exceeds 65535")
            }
            FormatError::MissingGlobalHeap => {
                write!(f, "address fixup targets an empty global heap")
            }
            FormatError::DataSizeMismatch { expected, actual } => {
                write!(f, "raw data is {actual} bytes, expected {expected}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FormatError {}

/// Check that `data[offset..offset + needed]` is in bounds.
pub(crate) fn ensure_len(data: &[u8], offset: usize, needed: usize) -> Result<(), FormatError> {
    match offset.checked_add(needed) {
        Some(end) if end <= data.len() => Ok(()),
        _ => Err(FormatError::UnexpectedEof {
            expected: offset.saturating_add(needed),
            available: data.len(),
        }),
    }
}
