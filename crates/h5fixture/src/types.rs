//! Explicit element types for fixture entries.
//!
//! Every matrix entry names its [`ElementType`]; inference from native Rust
//! values lives in [`crate::value::NativeValue`] and maps onto the same
//! types.

use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use h5fixture_format::datatype::{
    CharacterSet, Datatype, DatatypeByteOrder, EnumMember, ReferenceType, StringPadding,
};

use crate::error::{FixtureError, Result};

/// Byte order of a numeric entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Host byte order.
    #[default]
    Native,
    BigEndian,
}

impl Encoding {
    pub fn byte_order(self) -> DatatypeByteOrder {
        match self {
            Encoding::BigEndian => DatatypeByteOrder::BigEndian,
            Encoding::Native if cfg!(target_endian = "big") => DatatypeByteOrder::BigEndian,
            Encoding::Native => DatatypeByteOrder::LittleEndian,
        }
    }

    pub fn is_big_endian(self) -> bool {
        self.byte_order() == DatatypeByteOrder::BigEndian
    }
}

/// Integer width and signedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntKind {
    pub const ALL: [IntKind; 8] = [
        IntKind::I8,
        IntKind::I16,
        IntKind::I32,
        IntKind::I64,
        IntKind::U8,
        IntKind::U16,
        IntKind::U32,
        IntKind::U64,
    ];

    pub fn bytes(self) -> u32 {
        match self {
            IntKind::I8 | IntKind::U8 => 1,
            IntKind::I16 | IntKind::U16 => 2,
            IntKind::I32 | IntKind::U32 => 4,
            IntKind::I64 | IntKind::U64 => 8,
        }
    }

    pub fn signed(self) -> bool {
        matches!(self, IntKind::I8 | IntKind::I16 | IntKind::I32 | IntKind::I64)
    }

    pub fn min(self) -> i128 {
        if self.signed() {
            -(1i128 << (self.bytes() * 8 - 1))
        } else {
            0
        }
    }

    pub fn max(self) -> i128 {
        if self.signed() {
            (1i128 << (self.bytes() * 8 - 1)) - 1
        } else {
            (1i128 << (self.bytes() * 8)) - 1
        }
    }

    /// `int8` .. `uint64`.
    pub fn name(self) -> &'static str {
        match self {
            IntKind::I8 => "int8",
            IntKind::I16 => "int16",
            IntKind::I32 => "int32",
            IntKind::I64 => "int64",
            IntKind::U8 => "uint8",
            IntKind::U16 => "uint16",
            IntKind::U32 => "uint32",
            IntKind::U64 => "uint64",
        }
    }
}

/// Floating-point width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatKind {
    F16,
    F32,
    F64,
    /// x87 80-bit extended precision padded to 16 bytes.
    F128,
}

impl FloatKind {
    pub fn bytes(self) -> u32 {
        match self {
            FloatKind::F16 => 2,
            FloatKind::F32 => 4,
            FloatKind::F64 => 8,
            FloatKind::F128 => 16,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FloatKind::F16 => "float16",
            FloatKind::F32 => "float32",
            FloatKind::F64 => "float64",
            FloatKind::F128 => "float128",
        }
    }

    /// Name of the complex type built from two of these.
    pub fn complex_name(self) -> &'static str {
        match self {
            FloatKind::F16 => "complex32",
            FloatKind::F32 => "complex64",
            FloatKind::F64 => "complex128",
            FloatKind::F128 => "complex256",
        }
    }

    /// Whether this build can encode the width.
    pub fn available(self) -> bool {
        match self {
            FloatKind::F128 => cfg!(feature = "extended-float"),
            _ => true,
        }
    }

    fn datatype(self, encoding: Encoding) -> Datatype {
        let order = encoding.byte_order();
        Datatype::ieee_float(self.bytes(), order).unwrap_or_else(|| Datatype::extended_float(order))
    }
}

/// Coarse HDF5 class of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    Integer,
    Float,
    String,
    Opaque,
    Compound,
    Enum,
    VariableLength,
    Array,
    Reference,
    Bitfield,
}

/// Named fields packed back to back.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundSchema {
    pub fields: Vec<(String, ElementType)>,
}

impl CompoundSchema {
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = (S, ElementType)>) -> Self {
        Self {
            fields: fields.into_iter().map(|(n, t)| (n.into(), t)).collect(),
        }
    }

    pub fn size(&self) -> u32 {
        self.fields.iter().map(|(_, t)| t.size()).sum()
    }
}

/// Ordered label to code mapping over an integer type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    pub base: IntKind,
    pub encoding: Encoding,
    pub members: Vec<(String, i128)>,
}

impl EnumSchema {
    pub fn new<S: Into<String>>(base: IntKind, members: impl IntoIterator<Item = (S, i128)>) -> Self {
        Self {
            base,
            encoding: Encoding::Native,
            members: members.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }

    /// `{FALSE: 0, TRUE: 1}` over a signed byte.
    pub fn boolean() -> Self {
        Self::new(IntKind::I8, [("FALSE", 0), ("TRUE", 1)])
    }

    pub fn contains_code(&self, code: i128) -> bool {
        self.members.iter().any(|(_, v)| *v == code)
    }
}

/// The type of every element in an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    Int(IntKind, Encoding),
    Float(FloatKind, Encoding),
    /// Compound `{r, i}` of two floats.
    Complex(FloatKind, Encoding),
    /// Fixed-size, null-padded string of `size` bytes.
    FixedString { charset: CharacterSet, size: u32 },
    VarString(CharacterSet),
    /// Untagged opaque blob of `size` bytes.
    Opaque(u32),
    Compound(CompoundSchema),
    Enum(EnumSchema),
    /// Variable-length sequence of the base type.
    VarLen(Box<ElementType>),
    /// Fixed-size array of the base type, row-major.
    Array { base: Box<ElementType>, dims: Vec<u32> },
    ObjectRef,
    RegionRef,
    /// Bitfield of `bytes` bytes, every bit significant.
    Bitfield(u32, Encoding),
}

impl ElementType {
    pub fn int(kind: IntKind) -> Self {
        ElementType::Int(kind, Encoding::Native)
    }

    pub fn float(kind: FloatKind) -> Self {
        ElementType::Float(kind, Encoding::Native)
    }

    pub fn complex(kind: FloatKind) -> Self {
        ElementType::Complex(kind, Encoding::Native)
    }

    pub fn boolean() -> Self {
        ElementType::Enum(EnumSchema::boolean())
    }

    pub fn vlen(base: ElementType) -> Self {
        ElementType::VarLen(Box::new(base))
    }

    pub fn array(base: ElementType, dims: impl Into<Vec<u32>>) -> Self {
        ElementType::Array {
            base: Box::new(base),
            dims: dims.into(),
        }
    }

    pub fn class(&self) -> TypeClass {
        match self {
            ElementType::Int(..) => TypeClass::Integer,
            ElementType::Float(..) => TypeClass::Float,
            ElementType::Complex(..) | ElementType::Compound(_) => TypeClass::Compound,
            ElementType::FixedString { .. } | ElementType::VarString(_) => TypeClass::String,
            ElementType::Opaque(_) => TypeClass::Opaque,
            ElementType::Enum(_) => TypeClass::Enum,
            ElementType::VarLen(_) => TypeClass::VariableLength,
            ElementType::Array { .. } => TypeClass::Array,
            ElementType::ObjectRef | ElementType::RegionRef => TypeClass::Reference,
            ElementType::Bitfield(..) => TypeClass::Bitfield,
        }
    }

    /// Encoded size of one element.
    pub fn size(&self) -> u32 {
        match self {
            ElementType::Int(k, _) => k.bytes(),
            ElementType::Float(k, _) => k.bytes(),
            ElementType::Complex(k, _) => 2 * k.bytes(),
            ElementType::FixedString { size, .. } => *size,
            ElementType::VarString(_) | ElementType::VarLen(_) => {
                h5fixture_format::datatype::VL_ELEMENT_SIZE
            }
            ElementType::Opaque(size) => *size,
            ElementType::Compound(schema) => schema.size(),
            ElementType::Enum(schema) => schema.base.bytes(),
            ElementType::Array { base, dims } => base.size() * dims.iter().product::<u32>(),
            ElementType::ObjectRef => h5fixture_format::reference::OBJECT_REF_SIZE,
            ElementType::RegionRef => h5fixture_format::reference::REGION_REF_SIZE,
            ElementType::Bitfield(bytes, _) => *bytes,
        }
    }

    /// First width anywhere in this type that the build cannot encode.
    pub fn unavailable_part(&self) -> Option<String> {
        match self {
            ElementType::Float(k, _) if !k.available() => Some(k.name().into()),
            ElementType::Complex(k, _) if !k.available() => Some(k.complex_name().into()),
            ElementType::Compound(schema) => {
                schema.fields.iter().find_map(|(_, t)| t.unavailable_part())
            }
            ElementType::VarLen(base) | ElementType::Array { base, .. } => base.unavailable_part(),
            ElementType::Bitfield(bytes, _) if !matches!(bytes, 1 | 2 | 4 | 8) => Some(self.to_string()),
            _ => None,
        }
    }

    /// The HDF5 datatype message for this type.
    pub fn to_datatype(&self) -> Result<Datatype> {
        if let Some(type_name) = self.unavailable_part() {
            return Err(FixtureError::UnsupportedPlatformType { type_name });
        }
        Ok(self.datatype_unchecked())
    }

    fn datatype_unchecked(&self) -> Datatype {
        match self {
            ElementType::Int(k, e) => Datatype::integer(k.bytes(), k.signed(), e.byte_order()),
            ElementType::Float(k, e) => k.datatype(*e),
            ElementType::Complex(k, e) => Datatype::packed_compound(vec![
                ("r".into(), k.datatype(*e)),
                ("i".into(), k.datatype(*e)),
            ]),
            ElementType::FixedString { charset, size } => Datatype::String {
                size: *size,
                padding: StringPadding::NullPad,
                charset: *charset,
            },
            ElementType::VarString(charset) => Datatype::vlen_string(*charset),
            ElementType::Opaque(size) => Datatype::Opaque {
                size: *size,
                tag: String::new(),
            },
            ElementType::Compound(schema) => Datatype::packed_compound(
                schema
                    .fields
                    .iter()
                    .map(|(n, t)| (n.clone(), t.datatype_unchecked()))
                    .collect(),
            ),
            ElementType::Enum(schema) => {
                let order = schema.encoding.byte_order();
                Datatype::Enumeration {
                    base_type: Box::new(Datatype::integer(
                        schema.base.bytes(),
                        schema.base.signed(),
                        order,
                    )),
                    members: schema
                        .members
                        .iter()
                        .map(|(name, code)| EnumMember {
                            name: name.clone(),
                            value: int_bytes(*code, schema.base.bytes(), schema.encoding),
                        })
                        .collect(),
                }
            }
            ElementType::VarLen(base) => Datatype::vlen_sequence(base.datatype_unchecked()),
            ElementType::Array { base, dims } => Datatype::Array {
                base_type: Box::new(base.datatype_unchecked()),
                dimensions: dims.clone(),
            },
            ElementType::ObjectRef => Datatype::Reference {
                ref_type: ReferenceType::Object,
            },
            ElementType::RegionRef => Datatype::Reference {
                ref_type: ReferenceType::DatasetRegion,
            },
            ElementType::Bitfield(bytes, e) => Datatype::BitField {
                size: *bytes,
                byte_order: e.byte_order(),
                bit_offset: 0,
                bit_precision: (*bytes * 8) as u16,
            },
        }
    }
}

/// Two's complement bytes of `value` truncated to `bytes` (1 to 8), in
/// `encoding` order.
pub(crate) fn int_bytes(value: i128, bytes: u32, encoding: Encoding) -> Vec<u8> {
    let n = bytes as usize;
    let bits = (value as u64) & (u64::MAX >> (64 - 8 * n));
    let mut out = vec![0u8; n];
    if encoding.is_big_endian() {
        BigEndian::write_uint(&mut out, bits, n);
    } else {
        LittleEndian::write_uint(&mut out, bits, n);
    }
    out
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Int(k, _) => f.write_str(k.name()),
            ElementType::Float(k, _) => f.write_str(k.name()),
            ElementType::Complex(k, _) => f.write_str(k.complex_name()),
            ElementType::FixedString { size, .. } => write!(f, "string[{size}]"),
            ElementType::VarString(_) => f.write_str("vlen string"),
            ElementType::Opaque(size) => write!(f, "opaque[{size}]"),
            ElementType::Compound(schema) => {
                f.write_str("compound{")?;
                for (i, (name, t)) in schema.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {t}")?;
                }
                f.write_str("}")
            }
            ElementType::Enum(schema) => write!(f, "enum<{}>", schema.base.name()),
            ElementType::VarLen(base) => write!(f, "vlen<{base}>"),
            ElementType::Array { base, dims } => write!(f, "array<{base}, {dims:?}>"),
            ElementType::ObjectRef => f.write_str("object reference"),
            ElementType::RegionRef => f.write_str("region reference"),
            ElementType::Bitfield(bytes, _) => write!(f, "bitfield{}", bytes * 8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_ranges() {
        assert_eq!(IntKind::I8.min(), -128);
        assert_eq!(IntKind::I8.max(), 127);
        assert_eq!(IntKind::U64.max(), u64::MAX as i128);
        assert_eq!(IntKind::I64.min(), i64::MIN as i128);
        assert_eq!(IntKind::U16.min(), 0);
    }

    #[test]
    fn compound_sizes_are_packed() {
        let nested = ElementType::Compound(CompoundSchema::new([
            ("bool", ElementType::boolean()),
            ("cplx", ElementType::complex(FloatKind::F32)),
            ("bigint", ElementType::int(IntKind::I64)),
        ]));
        assert_eq!(nested.size(), 17);
        let dt = nested.to_datatype().unwrap();
        match dt {
            Datatype::Compound { size, members } => {
                assert_eq!(size, 17);
                let offsets: Vec<_> = members.iter().map(|m| m.byte_offset).collect();
                assert_eq!(offsets, [0, 1, 9]);
            }
            other => panic!("expected compound, got {other:?}"),
        }
    }

    #[test]
    fn array_and_vlen_sizes() {
        let arr = ElementType::array(ElementType::float(FloatKind::F32), [2]);
        assert_eq!(arr.size(), 8);
        assert_eq!(ElementType::vlen(ElementType::int(IntKind::U64)).size(), 16);
        assert_eq!(ElementType::RegionRef.size(), 12);
        assert_eq!(arr.class(), TypeClass::Array);
    }

    #[test]
    fn enum_members_follow_base_order() {
        let mut schema = EnumSchema::new(IntKind::I32, [("A", 256), ("B", 257)]);
        schema.encoding = Encoding::BigEndian;
        match ElementType::Enum(schema).to_datatype().unwrap() {
            Datatype::Enumeration { members, .. } => {
                assert_eq!(members[0].value, vec![0, 0, 1, 0]);
                assert_eq!(members[1].value, vec![0, 0, 1, 1]);
            }
            other => panic!("expected enum, got {other:?}"),
        }
    }

    #[test]
    fn big_endian_integer_bytes() {
        assert_eq!(int_bytes(1, 4, Encoding::BigEndian), vec![0, 0, 0, 1]);
        assert_eq!(int_bytes(-128, 1, Encoding::Native), vec![0x80]);
        assert_eq!(int_bytes(-2, 4, Encoding::BigEndian), vec![0xFF, 0xFF, 0xFF, 0xFE]);
        assert_eq!(int_bytes(u64::MAX as i128, 8, Encoding::BigEndian), vec![0xFF; 8]);
    }

    #[test]
    fn wide_bitfields_unsupported() {
        for bytes in [0, 3, 16] {
            let err = ElementType::Bitfield(bytes, Encoding::Native).to_datatype().unwrap_err();
            assert!(matches!(err, FixtureError::UnsupportedPlatformType { .. }), "{bytes}");
        }
        assert!(ElementType::Bitfield(8, Encoding::BigEndian).to_datatype().is_ok());
        let nested = ElementType::Compound(CompoundSchema::new([("bits", ElementType::Bitfield(16, Encoding::Native))]));
        assert!(nested.to_datatype().is_err());
    }

    #[cfg(not(feature = "extended-float"))]
    #[test]
    fn extended_float_unavailable() {
        let err = ElementType::complex(FloatKind::F128).to_datatype().unwrap_err();
        assert!(matches!(
            err,
            FixtureError::UnsupportedPlatformType { ref type_name } if type_name == "complex256"
        ));
    }

    #[cfg(feature = "extended-float")]
    #[test]
    fn extended_complex_layout() {
        match ElementType::complex(FloatKind::F128).to_datatype().unwrap() {
            Datatype::Compound { size, members } => {
                assert_eq!(size, 32);
                assert_eq!(members[1].byte_offset, 16);
            }
            other => panic!("expected compound, got {other:?}"),
        }
    }
}
