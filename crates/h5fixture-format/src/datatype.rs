//! HDF5 Datatype message (type 0x0003): encoding and decoding.
//!
//! Covers every class a conformance fixture needs: fixed-point, float,
//! time, fixed strings, bitfield, opaque, compound, reference, enum,
//! variable-length and array. Compound, enum and array types are written as
//! version 3 (unpadded names, minimal compound offsets); everything else as
//! version 1.

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, string::String, vec, vec::Vec};

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ensure_len, FormatError};

/// Byte order of numeric data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatatypeByteOrder {
    LittleEndian,
    BigEndian,
}

/// String padding type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringPadding {
    NullTerminate,
    NullPad,
    SpacePad,
}

/// Character set encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterSet {
    Ascii,
    Utf8,
}

/// Reference type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceType {
    /// 8-byte object header address.
    Object,
    /// 12-byte global heap id of an (address, selection) pair.
    DatasetRegion,
}

/// How the leading mantissa bit of a float is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MantissaNormalization {
    /// Leading bit stored explicitly (x87 extended precision).
    None,
    /// Leading bit always set and stored.
    MsbSet,
    /// Leading bit implied, as in IEEE 754.
    Implied,
}

/// Kind of a variable-length type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VlKind {
    /// Sequence of base-type elements.
    Sequence,
    /// String; the base type is a single byte.
    String {
        padding: StringPadding,
        charset: CharacterSet,
    },
}

/// A member of a compound datatype.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundMember {
    pub name: String,
    /// Byte offset within the compound.
    pub byte_offset: u32,
    pub datatype: Datatype,
}

/// A member of an enumeration datatype.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    /// Raw value bytes, encoded with the base type's size and byte order.
    pub value: Vec<u8>,
}

/// An HDF5 datatype.
#[derive(Debug, Clone, PartialEq)]
pub enum Datatype {
    /// Class 0.
    FixedPoint {
        size: u32,
        byte_order: DatatypeByteOrder,
        signed: bool,
        bit_offset: u16,
        bit_precision: u16,
    },
    /// Class 1.
    FloatingPoint {
        size: u32,
        byte_order: DatatypeByteOrder,
        normalization: MantissaNormalization,
        sign_location: u8,
        bit_offset: u16,
        bit_precision: u16,
        exponent_location: u8,
        exponent_size: u8,
        mantissa_location: u8,
        mantissa_size: u8,
        exponent_bias: u32,
    },
    /// Class 3: fixed-length string.
    String {
        size: u32,
        padding: StringPadding,
        charset: CharacterSet,
    },
    /// Class 4.
    BitField {
        size: u32,
        byte_order: DatatypeByteOrder,
        bit_offset: u16,
        bit_precision: u16,
    },
    /// Class 5.
    Opaque { size: u32, tag: String },
    /// Class 6.
    Compound {
        size: u32,
        members: Vec<CompoundMember>,
    },
    /// Class 7.
    Reference { ref_type: ReferenceType },
    /// Class 8.
    Enumeration {
        base_type: Box<Datatype>,
        members: Vec<EnumMember>,
    },
    /// Class 9.
    VariableLength {
        kind: VlKind,
        base_type: Box<Datatype>,
    },
    /// Class 10.
    Array {
        base_type: Box<Datatype>,
        dimensions: Vec<u32>,
    },
}

/// Size of a variable-length element: length(4) + collection address(8) + index(4).
pub const VL_ELEMENT_SIZE: u32 = 16;

fn padding_code(p: StringPadding) -> u8 {
    match p {
        StringPadding::NullTerminate => 0,
        StringPadding::NullPad => 1,
        StringPadding::SpacePad => 2,
    }
}

fn parse_string_padding(val: u8) -> Result<StringPadding, FormatError> {
    match val {
        0 => Ok(StringPadding::NullTerminate),
        1 => Ok(StringPadding::NullPad),
        2 => Ok(StringPadding::SpacePad),
        _ => Err(FormatError::InvalidStringPadding(val)),
    }
}

fn charset_code(c: CharacterSet) -> u8 {
    match c {
        CharacterSet::Ascii => 0,
        CharacterSet::Utf8 => 1,
    }
}

fn parse_charset(val: u8) -> Result<CharacterSet, FormatError> {
    match val {
        0 => Ok(CharacterSet::Ascii),
        1 => Ok(CharacterSet::Utf8),
        _ => Err(FormatError::InvalidCharacterSet(val)),
    }
}

fn byte_order_bit(order: DatatypeByteOrder) -> u8 {
    match order {
        DatatypeByteOrder::LittleEndian => 0,
        DatatypeByteOrder::BigEndian => 1,
    }
}

fn parse_byte_order(bf0: u8) -> DatatypeByteOrder {
    if bf0 & 0x01 == 0 {
        DatatypeByteOrder::LittleEndian
    } else {
        DatatypeByteOrder::BigEndian
    }
}

/// Bytes needed to store a member offset inside a v3 compound of `size` bytes.
fn offset_width(size: u32) -> usize {
    if size <= 0xFF {
        1
    } else if size <= 0xFFFF {
        2
    } else if size <= 0xFF_FFFF {
        3
    } else {
        4
    }
}

fn read_cstr(data: &[u8], offset: usize) -> Result<(String, usize), FormatError> {
    let rest = data.get(offset..).unwrap_or(&[]);
    let nul = rest.iter().position(|&b| b == 0).ok_or(FormatError::UnexpectedEof {
        expected: offset + rest.len() + 1,
        available: data.len(),
    })?;
    let name = String::from_utf8_lossy(&rest[..nul]).into_owned();
    Ok((name, nul + 1))
}

fn header(class: u8, version: u8, bf: [u8; 3], size: u32) -> Vec<u8> {
    let mut buf = vec![(class & 0x0F) | (version << 4), bf[0], bf[1], bf[2]];
    buf.extend_from_slice(&size.to_le_bytes());
    buf
}

impl Datatype {
    /// Integer type with full-width precision.
    pub fn integer(size: u32, signed: bool, byte_order: DatatypeByteOrder) -> Self {
        Datatype::FixedPoint {
            size,
            byte_order,
            signed,
            bit_offset: 0,
            bit_precision: (size * 8) as u16,
        }
    }

    /// IEEE 754 binary16, binary32 or binary64; `None` for other sizes.
    pub fn ieee_float(size: u32, byte_order: DatatypeByteOrder) -> Option<Self> {
        let (exponent_size, mantissa_size, exponent_bias) = match size {
            2 => (5u8, 10u8, 15u32),
            4 => (8, 23, 127),
            8 => (11, 52, 1023),
            _ => return None,
        };
        Some(Datatype::FloatingPoint {
            size,
            byte_order,
            normalization: MantissaNormalization::Implied,
            sign_location: (size * 8 - 1) as u8,
            bit_offset: 0,
            bit_precision: (size * 8) as u16,
            exponent_location: mantissa_size,
            exponent_size,
            mantissa_location: 0,
            mantissa_size,
            exponent_bias,
        })
    }

    /// x87 80-bit extended precision stored in a 16-byte slot.
    pub fn extended_float(byte_order: DatatypeByteOrder) -> Self {
        Datatype::FloatingPoint {
            size: 16,
            byte_order,
            normalization: MantissaNormalization::None,
            sign_location: 79,
            bit_offset: 0,
            bit_precision: 80,
            exponent_location: 64,
            exponent_size: 15,
            mantissa_location: 0,
            mantissa_size: 64,
            exponent_bias: 16383,
        }
    }

    /// Variable-length string of single-byte characters.
    pub fn vlen_string(charset: CharacterSet) -> Self {
        Datatype::VariableLength {
            kind: VlKind::String {
                padding: StringPadding::NullTerminate,
                charset,
            },
            base_type: Box::new(Datatype::integer(1, false, DatatypeByteOrder::LittleEndian)),
        }
    }

    /// Variable-length sequence of `base`.
    pub fn vlen_sequence(base: Datatype) -> Self {
        Datatype::VariableLength {
            kind: VlKind::Sequence,
            base_type: Box::new(base),
        }
    }

    /// Compound with members packed back to back in declaration order.
    pub fn packed_compound(fields: Vec<(String, Datatype)>) -> Self {
        let mut offset = 0u32;
        let mut members = Vec::with_capacity(fields.len());
        for (name, datatype) in fields {
            let sz = datatype.type_size();
            members.push(CompoundMember {
                name,
                byte_offset: offset,
                datatype,
            });
            offset += sz;
        }
        Datatype::Compound {
            size: offset,
            members,
        }
    }

    /// HDF5 class id (0-10).
    pub fn class_id(&self) -> u8 {
        match self {
            Datatype::FixedPoint { .. } => 0,
            Datatype::FloatingPoint { .. } => 1,
            Datatype::String { .. } => 3,
            Datatype::BitField { .. } => 4,
            Datatype::Opaque { .. } => 5,
            Datatype::Compound { .. } => 6,
            Datatype::Reference { .. } => 7,
            Datatype::Enumeration { .. } => 8,
            Datatype::VariableLength { .. } => 9,
            Datatype::Array { .. } => 10,
        }
    }

    /// Size in bytes of one element of this type.
    pub fn type_size(&self) -> u32 {
        match self {
            Datatype::FixedPoint { size, .. }
            | Datatype::FloatingPoint { size, .. }
            | Datatype::String { size, .. }
            | Datatype::BitField { size, .. }
            | Datatype::Opaque { size, .. }
            | Datatype::Compound { size, .. } => *size,
            Datatype::Reference { ref_type } => match ref_type {
                ReferenceType::Object => 8,
                ReferenceType::DatasetRegion => 12,
            },
            Datatype::Enumeration { base_type, .. } => base_type.type_size(),
            Datatype::VariableLength { .. } => VL_ELEMENT_SIZE,
            Datatype::Array {
                base_type,
                dimensions,
            } => base_type.type_size() * dimensions.iter().product::<u32>(),
        }
    }

    /// Encode as Datatype message bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let size = self.type_size();
        match self {
            Datatype::FixedPoint {
                byte_order,
                signed,
                bit_offset,
                bit_precision,
                ..
            } => {
                let bf0 = byte_order_bit(*byte_order) | if *signed { 0x08 } else { 0 };
                let mut buf = header(0, 1, [bf0, 0, 0], size);
                buf.extend_from_slice(&bit_offset.to_le_bytes());
                buf.extend_from_slice(&bit_precision.to_le_bytes());
                buf
            }
            Datatype::FloatingPoint {
                byte_order,
                normalization,
                sign_location,
                bit_offset,
                bit_precision,
                exponent_location,
                exponent_size,
                mantissa_location,
                mantissa_size,
                exponent_bias,
                ..
            } => {
                let norm = match normalization {
                    MantissaNormalization::None => 0u8,
                    MantissaNormalization::MsbSet => 1,
                    MantissaNormalization::Implied => 2,
                };
                let bf0 = byte_order_bit(*byte_order) | (norm << 4);
                let mut buf = header(1, 1, [bf0, *sign_location, 0], size);
                buf.extend_from_slice(&bit_offset.to_le_bytes());
                buf.extend_from_slice(&bit_precision.to_le_bytes());
                buf.extend_from_slice(&[
                    *exponent_location,
                    *exponent_size,
                    *mantissa_location,
                    *mantissa_size,
                ]);
                buf.extend_from_slice(&exponent_bias.to_le_bytes());
                buf
            }
            Datatype::String {
                padding, charset, ..
            } => {
                let bf0 = padding_code(*padding) | (charset_code(*charset) << 4);
                header(3, 1, [bf0, 0, 0], size)
            }
            Datatype::BitField {
                byte_order,
                bit_offset,
                bit_precision,
                ..
            } => {
                let mut buf = header(4, 1, [byte_order_bit(*byte_order), 0, 0], size);
                buf.extend_from_slice(&bit_offset.to_le_bytes());
                buf.extend_from_slice(&bit_precision.to_le_bytes());
                buf
            }
            Datatype::Opaque { tag, .. } => {
                let padded = (tag.len() + 7) & !7;
                let mut buf = header(5, 1, [padded as u8, 0, 0], size);
                buf.extend_from_slice(tag.as_bytes());
                buf.resize(8 + padded, 0);
                buf
            }
            Datatype::Compound { members, .. } => {
                let n = members.len() as u16;
                let [lo, hi] = n.to_le_bytes();
                let mut buf = header(6, 3, [lo, hi, 0], size);
                let width = offset_width(size);
                for m in members {
                    buf.extend_from_slice(m.name.as_bytes());
                    buf.push(0);
                    buf.extend_from_slice(&m.byte_offset.to_le_bytes()[..width]);
                    buf.extend_from_slice(&m.datatype.serialize());
                }
                buf
            }
            Datatype::Reference { ref_type } => {
                let bf0 = match ref_type {
                    ReferenceType::Object => 0,
                    ReferenceType::DatasetRegion => 1,
                };
                header(7, 1, [bf0, 0, 0], size)
            }
            Datatype::Enumeration { base_type, members } => {
                let n = members.len() as u16;
                let [lo, hi] = n.to_le_bytes();
                let mut buf = header(8, 3, [lo, hi, 0], size);
                buf.extend_from_slice(&base_type.serialize());
                for m in members {
                    buf.extend_from_slice(m.name.as_bytes());
                    buf.push(0);
                }
                for m in members {
                    buf.extend_from_slice(&m.value);
                }
                buf
            }
            Datatype::VariableLength { kind, base_type } => {
                let (bf0, bf1) = match kind {
                    VlKind::Sequence => (0u8, 0u8),
                    VlKind::String { padding, charset } => {
                        (0x01 | (padding_code(*padding) << 4), charset_code(*charset))
                    }
                };
                let mut buf = header(9, 1, [bf0, bf1, 0], size);
                buf.extend_from_slice(&base_type.serialize());
                buf
            }
            Datatype::Array {
                base_type,
                dimensions,
            } => {
                let mut buf = header(10, 3, [0, 0, 0], size);
                buf.push(dimensions.len() as u8);
                for d in dimensions {
                    buf.extend_from_slice(&d.to_le_bytes());
                }
                buf.extend_from_slice(&base_type.serialize());
                buf
            }
        }
    }

    /// Decode a Datatype message.
    ///
    /// Returns `(Datatype, bytes_consumed)` for recursive parsing.
    pub fn parse(data: &[u8]) -> Result<(Datatype, usize), FormatError> {
        ensure_len(data, 0, 8)?;
        let class_id = data[0] & 0x0F;
        let version = data[0] >> 4;
        let (bf0, bf1) = (data[1], data[2]);
        let size = LittleEndian::read_u32(&data[4..8]);
        let mut pos = 8;

        let bad_version = || FormatError::InvalidDatatypeVersion {
            class: class_id,
            version,
        };

        let dt = match class_id {
            0 | 4 => {
                ensure_len(data, pos, 4)?;
                let bit_offset = LittleEndian::read_u16(&data[pos..pos + 2]);
                let bit_precision = LittleEndian::read_u16(&data[pos + 2..pos + 4]);
                pos += 4;
                if class_id == 0 {
                    Datatype::FixedPoint {
                        size,
                        byte_order: parse_byte_order(bf0),
                        signed: bf0 & 0x08 != 0,
                        bit_offset,
                        bit_precision,
                    }
                } else {
                    Datatype::BitField {
                        size,
                        byte_order: parse_byte_order(bf0),
                        bit_offset,
                        bit_precision,
                    }
                }
            }
            1 => {
                ensure_len(data, pos, 12)?;
                let normalization = match (bf0 >> 4) & 0x03 {
                    0 => MantissaNormalization::None,
                    1 => MantissaNormalization::MsbSet,
                    _ => MantissaNormalization::Implied,
                };
                let p = &data[pos..pos + 12];
                pos += 12;
                Datatype::FloatingPoint {
                    size,
                    byte_order: parse_byte_order(bf0),
                    normalization,
                    sign_location: bf1,
                    bit_offset: LittleEndian::read_u16(&p[0..2]),
                    bit_precision: LittleEndian::read_u16(&p[2..4]),
                    exponent_location: p[4],
                    exponent_size: p[5],
                    mantissa_location: p[6],
                    mantissa_size: p[7],
                    exponent_bias: LittleEndian::read_u32(&p[8..12]),
                }
            }
            3 => Datatype::String {
                size,
                padding: parse_string_padding(bf0 & 0x0F)?,
                charset: parse_charset(bf0 >> 4)?,
            },
            5 => {
                let tag_len = bf0 as usize;
                ensure_len(data, pos, tag_len)?;
                let raw = &data[pos..pos + tag_len];
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                let tag = String::from_utf8_lossy(&raw[..end]).into_owned();
                pos += tag_len;
                Datatype::Opaque { size, tag }
            }
            6 => {
                if version != 3 {
                    return Err(bad_version());
                }
                let count = u16::from_le_bytes([bf0, bf1]) as usize;
                let width = offset_width(size);
                let mut members = Vec::with_capacity(count);
                for _ in 0..count {
                    let (name, used) = read_cstr(data, pos)?;
                    pos += used;
                    ensure_len(data, pos, width)?;
                    let mut off = [0u8; 4];
                    off[..width].copy_from_slice(&data[pos..pos + width]);
                    pos += width;
                    let (datatype, used) = Datatype::parse(&data[pos..])?;
                    pos += used;
                    members.push(CompoundMember {
                        name,
                        byte_offset: u32::from_le_bytes(off),
                        datatype,
                    });
                }
                Datatype::Compound { size, members }
            }
            7 => {
                let ref_type = match bf0 & 0x0F {
                    0 => ReferenceType::Object,
                    1 => ReferenceType::DatasetRegion,
                    other => return Err(FormatError::InvalidReferenceType(other)),
                };
                Datatype::Reference { ref_type }
            }
            8 => {
                if version != 3 {
                    return Err(bad_version());
                }
                let count = u16::from_le_bytes([bf0, bf1]) as usize;
                let (base, used) = Datatype::parse(&data[pos..])?;
                pos += used;
                let mut names = Vec::with_capacity(count);
                for _ in 0..count {
                    let (name, used) = read_cstr(data, pos)?;
                    pos += used;
                    names.push(name);
                }
                let width = base.type_size() as usize;
                ensure_len(data, pos, width * count)?;
                let members = names
                    .into_iter()
                    .enumerate()
                    .map(|(i, name)| EnumMember {
                        name,
                        value: data[pos + i * width..pos + (i + 1) * width].to_vec(),
                    })
                    .collect();
                pos += width * count;
                Datatype::Enumeration {
                    base_type: Box::new(base),
                    members,
                }
            }
            9 => {
                let kind = match bf0 & 0x0F {
                    0 => VlKind::Sequence,
                    _ => VlKind::String {
                        padding: parse_string_padding(bf0 >> 4)?,
                        charset: parse_charset(bf1 & 0x0F)?,
                    },
                };
                let (base, used) = Datatype::parse(&data[pos..])?;
                pos += used;
                Datatype::VariableLength {
                    kind,
                    base_type: Box::new(base),
                }
            }
            10 => {
                if version != 3 {
                    return Err(bad_version());
                }
                ensure_len(data, pos, 1)?;
                let ndims = data[pos] as usize;
                pos += 1;
                ensure_len(data, pos, ndims * 4)?;
                let dimensions = (0..ndims)
                    .map(|i| LittleEndian::read_u32(&data[pos + i * 4..pos + i * 4 + 4]))
                    .collect();
                pos += ndims * 4;
                let (base, used) = Datatype::parse(&data[pos..])?;
                pos += used;
                Datatype::Array {
                    base_type: Box::new(base),
                    dimensions,
                }
            }
            other => return Err(FormatError::InvalidDatatypeClass(other)),
        };
        Ok((dt, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reparse(dt: &Datatype) -> Datatype {
        let bytes = dt.serialize();
        let (parsed, used) = Datatype::parse(&bytes).unwrap();
        assert_eq!(used, bytes.len(), "trailing bytes for {dt:?}");
        parsed
    }

    #[test]
    fn signed_big_endian_int_flags() {
        let dt = Datatype::integer(4, true, DatatypeByteOrder::BigEndian);
        let bytes = dt.serialize();
        assert_eq!(bytes[0], 0x10);
        assert_eq!(bytes[1], 0x09);
        assert_eq!(&bytes[4..8], &4u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &[0, 0, 32, 0]);
        assert_eq!(reparse(&dt), dt);
    }

    #[test]
    fn float_sign_location_tracks_width() {
        for (size, sign) in [(2u32, 15u8), (4, 31), (8, 63)] {
            let dt = Datatype::ieee_float(size, DatatypeByteOrder::LittleEndian).unwrap();
            let bytes = dt.serialize();
            assert_eq!(bytes[1], 0x20);
            assert_eq!(bytes[2], sign);
            assert_eq!(reparse(&dt), dt);
        }
        assert!(Datatype::ieee_float(16, DatatypeByteOrder::LittleEndian).is_none());
    }

    #[test]
    fn extended_float_layout() {
        let dt = Datatype::extended_float(DatatypeByteOrder::LittleEndian);
        let bytes = dt.serialize();
        assert_eq!(bytes[1], 0x00, "no implied mantissa bit");
        assert_eq!(bytes[2], 79);
        assert_eq!(&bytes[8..12], &[0, 0, 80, 0]);
        assert_eq!(&bytes[12..16], &[64, 15, 0, 64]);
        assert_eq!(&bytes[16..20], &16383u32.to_le_bytes());
        assert_eq!(reparse(&dt), dt);
    }

    #[test]
    fn opaque_tag_padding() {
        let untagged = Datatype::Opaque {
            size: 8,
            tag: String::new(),
        };
        assert_eq!(untagged.serialize().len(), 8);
        assert_eq!(reparse(&untagged), untagged);

        let tagged = Datatype::Opaque {
            size: 3,
            tag: "bytes".into(),
        };
        let bytes = tagged.serialize();
        assert_eq!(bytes[1], 8);
        assert_eq!(bytes.len(), 16);
        assert_eq!(reparse(&tagged), tagged);
    }

    #[test]
    fn packed_compound_offsets() {
        let dt = Datatype::packed_compound(vec![
            ("bigint".into(), Datatype::integer(8, true, DatatypeByteOrder::LittleEndian)),
            (
                "double".into(),
                Datatype::ieee_float(8, DatatypeByteOrder::LittleEndian).unwrap(),
            ),
            ("utf-8".into(), Datatype::vlen_string(CharacterSet::Utf8)),
        ]);
        assert_eq!(dt.type_size(), 32);
        match reparse(&dt) {
            Datatype::Compound { size, members } => {
                assert_eq!(size, 32);
                let offsets: Vec<u32> = members.iter().map(|m| m.byte_offset).collect();
                assert_eq!(offsets, vec![0, 8, 16]);
                assert_eq!(members[2].name, "utf-8");
                assert!(matches!(
                    members[2].datatype,
                    Datatype::VariableLength {
                        kind: VlKind::String {
                            charset: CharacterSet::Utf8,
                            ..
                        },
                        ..
                    }
                ));
            }
            other => panic!("expected compound, got {other:?}"),
        }
    }

    #[test]
    fn enum_names_then_values() {
        let dt = Datatype::Enumeration {
            base_type: Box::new(Datatype::integer(4, true, DatatypeByteOrder::LittleEndian)),
            members: vec![
                EnumMember {
                    name: "A".into(),
                    value: 256i32.to_le_bytes().to_vec(),
                },
                EnumMember {
                    name: "B".into(),
                    value: 257i32.to_le_bytes().to_vec(),
                },
            ],
        };
        let bytes = dt.serialize();
        // header(8) + base(12) + "A\0B\0" + 2 * 4
        assert_eq!(bytes.len(), 8 + 12 + 4 + 8);
        assert_eq!(&bytes[20..24], b"A\0B\0");
        assert_eq!(dt.type_size(), 4);
        assert_eq!(reparse(&dt), dt);
    }

    #[test]
    fn array_and_vlen_nesting() {
        let arr = Datatype::Array {
            base_type: Box::new(Datatype::ieee_float(4, DatatypeByteOrder::LittleEndian).unwrap()),
            dimensions: vec![2],
        };
        assert_eq!(arr.type_size(), 8);
        assert_eq!(reparse(&arr), arr);

        let seq = Datatype::vlen_sequence(Datatype::integer(8, false, DatatypeByteOrder::LittleEndian));
        assert_eq!(seq.type_size(), VL_ELEMENT_SIZE);
        assert_eq!(seq.serialize()[1], 0x00);
        assert_eq!(reparse(&seq), seq);

        let s = Datatype::vlen_string(CharacterSet::Ascii);
        let bytes = s.serialize();
        assert_eq!((bytes[1], bytes[2]), (0x01, 0x00));
        assert_eq!(reparse(&s), s);
    }

    #[test]
    fn references_have_fixed_sizes() {
        let obj = Datatype::Reference {
            ref_type: ReferenceType::Object,
        };
        let region = Datatype::Reference {
            ref_type: ReferenceType::DatasetRegion,
        };
        assert_eq!(&obj.serialize()[4..8], &8u32.to_le_bytes());
        assert_eq!(&region.serialize()[4..8], &12u32.to_le_bytes());
        assert_eq!(reparse(&region), region);
    }

    #[test]
    fn bitfield_roundtrip() {
        let bf = Datatype::BitField {
            size: 2,
            byte_order: DatatypeByteOrder::BigEndian,
            bit_offset: 0,
            bit_precision: 16,
        };
        assert_eq!(reparse(&bf), bf);
    }

    #[test]
    fn rejects_unknown_class_and_truncation() {
        let mut bytes = Datatype::integer(1, false, DatatypeByteOrder::LittleEndian).serialize();
        bytes[0] = 0x1F;
        assert_eq!(Datatype::parse(&bytes), Err(FormatError::InvalidDatatypeClass(15)));
        bytes[0] = 0x12;
        assert_eq!(Datatype::parse(&bytes), Err(FormatError::InvalidDatatypeClass(2)));
        assert!(matches!(
            Datatype::parse(&[0x10, 0, 0]),
            Err(FormatError::UnexpectedEof { .. })
        ));
    }
}
