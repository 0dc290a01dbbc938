//! Error types for fixture construction.

use std::path::PathBuf;

use h5fixture_format::error::FormatError;

/// Why a value cannot be stored under its declared type or shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// The value's kind does not fit the element type at all.
    #[error("expected a value for {expected}, got {found}")]
    TypeMismatch { expected: String, found: &'static str },
    /// An integer outside the range of its integer or bitfield type.
    #[error("{value} is out of range for {kind}")]
    OutOfRange { value: i128, kind: &'static str },
    /// A finite real that becomes infinite at the target float width.
    #[error("{value} overflows {kind}")]
    FloatOverflow { value: f64, kind: &'static str },
    /// An integer stored as a float that would not read back unchanged.
    #[error("{value} is not exactly representable as {kind}")]
    InexactInteger { value: i128, kind: &'static str },
    /// An enum code missing from the enum's member list.
    #[error("{0} is not a member of the enum")]
    UnknownEnumCode(i128),
    /// Text longer than its fixed-size string type.
    #[error("{len} bytes do not fit a {size}-byte string")]
    StringTooLong { len: usize, size: u32 },
    /// Non-ASCII text for an ASCII string type.
    #[error("text is not ASCII")]
    NotAscii,
    /// An opaque payload of the wrong length.
    #[error("expected {expected} bytes, got {found}")]
    ByteLength { expected: u32, found: usize },
    /// A record whose field count differs from its compound schema.
    #[error("expected {expected} fields, got {found}")]
    FieldCount { expected: usize, found: usize },
    /// Element count disagrees with an explicit shape or array dimension.
    #[error("expected {expected} array elements, got {found}")]
    ElementCount { expected: u64, found: u64 },
    /// Sibling rows of a nested array have different lengths.
    #[error("nested array is not rectangular")]
    Ragged,
    /// An array entry with no dimensions.
    #[error("array entries need rank >= 1")]
    ZeroRank,
    /// A reference element passed as a plain value.
    #[error("{0} values are written through create_reference")]
    ReferenceValue(&'static str),
    /// A region selection outside the target's shape; carries that shape.
    #[error("region selection does not fit shape {0:?}")]
    BadRegion(Vec<u64>),
    /// A calendar timestamp that failed to parse.
    #[error("invalid timestamp: {0}")]
    Timestamp(String),
}

/// Errors raised while building a fixture file.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    /// A width or type this build cannot encode.
    #[error("{type_name} is not available on this build")]
    UnsupportedPlatformType { type_name: String },
    /// A stored name that is already taken.
    #[error("entry {0:?} already exists")]
    DuplicateName(String),
    /// A reference whose target has not been created.
    #[error("reference {name:?} targets unknown entry {target:?}")]
    DanglingReference { name: String, target: String },
    /// The output path already exists.
    #[error("{} already exists", .path.display())]
    ContainerCreateConflict { path: PathBuf },
    /// A value rejected for the named entry.
    #[error("invalid value for {name:?}: {source}")]
    InvalidValue {
        name: String,
        #[source]
        source: ValueError,
    },
    /// Laying out the file image failed.
    #[error("HDF5 format error: {0}")]
    Format(#[from] FormatError),
    /// Creating, writing or removing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FixtureError {
    pub(crate) fn invalid(name: &str, source: ValueError) -> Self {
        FixtureError::InvalidValue {
            name: name.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, FixtureError>;
