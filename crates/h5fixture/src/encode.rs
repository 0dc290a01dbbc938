//! Element encoding: values to raw dataset bytes.
//!
//! Variable-length payloads are staged alongside the element bytes and only
//! handed to the file writer once the whole entry has encoded, so a failed
//! entry leaves the heap untouched.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use half::f16;
use h5fixture_format::datatype::CharacterSet;
use h5fixture_format::error::FormatError;
use h5fixture_format::raw_data::RawData;
use h5fixture_format::vl_data::push_vl_element;

use crate::error::{FixtureError, Result, ValueError};
use crate::types::{int_bytes, ElementType, Encoding, FloatKind};
use crate::value::{flatten, Real, Value};

/// Encodes the elements of one entry.
pub(crate) struct Encoder<'a> {
    name: &'a str,
    heap_base: usize,
    staged: Vec<RawData>,
}

impl<'a> Encoder<'a> {
    /// `heap_len` is the number of objects already in the file's heap.
    pub(crate) fn new(name: &'a str, heap_len: usize) -> Self {
        Self {
            name,
            heap_base: heap_len,
            staged: Vec::new(),
        }
    }

    /// Heap objects produced so far, in index order.
    pub(crate) fn into_staged(self) -> Vec<RawData> {
        self.staged
    }

    pub(crate) fn invalid(&self, err: ValueError) -> FixtureError {
        FixtureError::invalid(self.name, err)
    }

    fn mismatch(&self, ty: &ElementType, value: &Value) -> FixtureError {
        self.invalid(ValueError::TypeMismatch {
            expected: ty.to_string(),
            found: value.kind(),
        })
    }

    /// Reserve the next heap index for `object`.
    pub(crate) fn stage(&mut self, object: RawData) -> Result<u16> {
        let index = self.heap_base + self.staged.len() + 1;
        let index = u16::try_from(index).map_err(|_| FormatError::GlobalHeapFull)?;
        self.staged.push(object);
        Ok(index)
    }

    /// Encode every element of `values` back to back.
    pub(crate) fn encode_all(&mut self, ty: &ElementType, values: &[&Value]) -> Result<RawData> {
        let mut out = RawData::new();
        for v in values {
            self.encode(ty, v, &mut out)?;
        }
        Ok(out)
    }

    /// Append one element of type `ty`.
    pub(crate) fn encode(&mut self, ty: &ElementType, value: &Value, out: &mut RawData) -> Result<()> {
        match ty {
            ElementType::Int(kind, encoding) => {
                let Value::Int(v) = value else {
                    return Err(self.mismatch(ty, value));
                };
                if *v < kind.min() || *v > kind.max() {
                    return Err(self.invalid(ValueError::OutOfRange {
                        value: *v,
                        kind: kind.name(),
                    }));
                }
                out.extend_from_slice(&int_bytes(*v, kind.bytes(), *encoding));
            }
            ElementType::Float(kind, encoding) => {
                let r = self.real_of(ty, value, *kind)?;
                let bytes = float_bytes(*kind, r, *encoding).map_err(|e| self.invalid(e))?;
                out.extend_from_slice(&bytes);
            }
            ElementType::Complex(kind, encoding) => {
                let (re, im) = match value {
                    Value::Complex(re, im) => (*re, *im),
                    other => (self.real_of(ty, other, *kind)?, Real::Num(0.0)),
                };
                for part in [re, im] {
                    let bytes = float_bytes(*kind, part, *encoding).map_err(|e| self.invalid(e))?;
                    out.extend_from_slice(&bytes);
                }
            }
            ElementType::FixedString { charset, size } => {
                let bytes = self.text_bytes(ty, value, *charset)?;
                if bytes.len() > *size as usize {
                    return Err(self.invalid(ValueError::StringTooLong {
                        len: bytes.len(),
                        size: *size,
                    }));
                }
                let mut padded = bytes.to_vec();
                padded.resize(*size as usize, 0);
                out.extend_from_slice(&padded);
            }
            ElementType::VarString(charset) => {
                let bytes = self.text_bytes(ty, value, *charset)?.to_vec();
                self.push_vl(out, bytes.len(), RawData::from_bytes(bytes))?;
            }
            ElementType::Opaque(size) => {
                let Value::Bytes(bytes) = value else {
                    return Err(self.mismatch(ty, value));
                };
                if bytes.len() != *size as usize {
                    return Err(self.invalid(ValueError::ByteLength {
                        expected: *size,
                        found: bytes.len(),
                    }));
                }
                out.extend_from_slice(bytes);
            }
            ElementType::Compound(schema) => {
                let Value::Record(fields) = value else {
                    return Err(self.mismatch(ty, value));
                };
                if fields.len() != schema.fields.len() {
                    return Err(self.invalid(ValueError::FieldCount {
                        expected: schema.fields.len(),
                        found: fields.len(),
                    }));
                }
                for ((_, field_ty), field) in schema.fields.iter().zip(fields) {
                    self.encode(field_ty, field, out)?;
                }
            }
            ElementType::Enum(schema) => {
                let code = match value {
                    Value::Int(v) => *v,
                    Value::Bool(b) => i128::from(*b),
                    other => return Err(self.mismatch(ty, other)),
                };
                if !schema.contains_code(code) {
                    return Err(self.invalid(ValueError::UnknownEnumCode(code)));
                }
                out.extend_from_slice(&int_bytes(code, schema.base.bytes(), schema.encoding));
            }
            ElementType::VarLen(base) => {
                let (Value::Seq(items) | Value::Array(items)) = value else {
                    return Err(self.mismatch(ty, value));
                };
                let refs: Vec<&Value> = items.iter().collect();
                let payload = self.encode_all(base, &refs)?;
                self.push_vl(out, items.len(), payload)?;
            }
            ElementType::Array { base, dims } => {
                let expected: u64 = dims.iter().map(|&d| u64::from(d)).product();
                let items = flatten(value, dims.len())
                    .or_else(|_| flatten(value, 1))
                    .map_err(|e| self.invalid(e))?;
                if items.len() as u64 != expected {
                    return Err(self.invalid(ValueError::ElementCount {
                        expected,
                        found: items.len() as u64,
                    }));
                }
                for item in items {
                    self.encode(base, item, out)?;
                }
            }
            ElementType::ObjectRef => {
                return Err(self.invalid(ValueError::ReferenceValue("object reference")))
            }
            ElementType::RegionRef => {
                return Err(self.invalid(ValueError::ReferenceValue("region reference")))
            }
            ElementType::Bitfield(bytes, encoding) => {
                let Value::Int(v) = value else {
                    return Err(self.mismatch(ty, value));
                };
                let limit = 1i128 << (bytes * 8);
                if *v < 0 || *v >= limit {
                    return Err(self.invalid(ValueError::OutOfRange {
                        value: *v,
                        kind: "bitfield",
                    }));
                }
                out.extend_from_slice(&int_bytes(*v, *bytes, *encoding));
            }
        }
        Ok(())
    }

    /// The real stored for `value`; integers must convert exactly.
    fn real_of(&self, ty: &ElementType, value: &Value, kind: FloatKind) -> Result<Real> {
        match value {
            Value::Real(r) => Ok(*r),
            Value::Int(i) => {
                let x = *i as f64;
                let exact = x.abs() < i128::MAX as f64
                    && x as i128 == *i
                    && match kind {
                        FloatKind::F16 => f16::from_f64(x).to_f64() == x,
                        FloatKind::F32 => f64::from(x as f32) == x,
                        FloatKind::F64 | FloatKind::F128 => true,
                    };
                if exact {
                    Ok(Real::Num(x))
                } else {
                    Err(self.invalid(ValueError::InexactInteger {
                        value: *i,
                        kind: kind.name(),
                    }))
                }
            }
            other => Err(self.mismatch(ty, other)),
        }
    }

    fn text_bytes<'v>(&self, ty: &ElementType, value: &'v Value, charset: CharacterSet) -> Result<&'v [u8]> {
        let bytes = match value {
            Value::Text(s) => s.as_bytes(),
            Value::Bytes(b) => b.as_slice(),
            other => return Err(self.mismatch(ty, other)),
        };
        if charset == CharacterSet::Ascii && !bytes.is_ascii() {
            return Err(self.invalid(ValueError::NotAscii));
        }
        Ok(bytes)
    }

    /// Append a VL element for `payload`; empty payloads get a null heap id.
    fn push_vl(&mut self, out: &mut RawData, len: usize, payload: RawData) -> Result<()> {
        let len = u32::try_from(len).map_err(|_| {
            self.invalid(ValueError::ElementCount {
                expected: u64::from(u32::MAX),
                found: len as u64,
            })
        })?;
        if len == 0 {
            out.extend_from_slice(&[0u8; 16]);
            return Ok(());
        }
        let index = self.stage(payload)?;
        push_vl_element(out, len, index);
        Ok(())
    }
}

/// Bytes of `r` as a float of `kind`, in `encoding` order.
///
/// Finite values that overflow the width are rejected rather than stored
/// as infinities.
pub(crate) fn float_bytes(kind: FloatKind, r: Real, encoding: Encoding) -> std::result::Result<Vec<u8>, ValueError> {
    if encoding.is_big_endian() {
        float_bytes_in::<BigEndian>(kind, r)
    } else {
        float_bytes_in::<LittleEndian>(kind, r)
    }
}

fn float_bytes_in<B: ByteOrder>(kind: FloatKind, r: Real) -> std::result::Result<Vec<u8>, ValueError> {
    let overflow = |v: f64, narrowed_infinite: bool| {
        if v.is_finite() && narrowed_infinite {
            Err(ValueError::FloatOverflow {
                value: v,
                kind: kind.name(),
            })
        } else {
            Ok(())
        }
    };
    let mut buf = vec![0u8; kind.bytes() as usize];
    match kind {
        FloatKind::F16 => {
            let v = match r {
                Real::Num(v) => {
                    let h = f16::from_f64(v);
                    overflow(v, h.is_infinite())?;
                    h
                }
                Real::SmallestNormal => f16::MIN_POSITIVE,
                Real::Max => f16::MAX,
            };
            B::write_u16(&mut buf, v.to_bits());
        }
        FloatKind::F32 => {
            let v = match r {
                Real::Num(v) => {
                    let n = v as f32;
                    overflow(v, n.is_infinite())?;
                    n
                }
                Real::SmallestNormal => f32::MIN_POSITIVE,
                Real::Max => f32::MAX,
            };
            B::write_f32(&mut buf, v);
        }
        FloatKind::F64 => {
            let v = match r {
                Real::Num(v) => v,
                Real::SmallestNormal => f64::MIN_POSITIVE,
                Real::Max => f64::MAX,
            };
            B::write_f64(&mut buf, v);
        }
        FloatKind::F128 => B::write_u128(&mut buf, x87_bits(r)),
    }
    Ok(buf)
}

const X87_BIAS: i32 = 16383;
const X87_EXP_MAX: u16 = 0x7FFF;
const X87_INTEGER_BIT: u64 = 1 << 63;

/// x87 80-bit extended precision in the low bits of a 16-byte slot:
/// sign and exponent above a 64-bit mantissa.
fn x87_bits(r: Real) -> u128 {
    let (sign, exponent, mantissa) = match r {
        Real::SmallestNormal => (0u16, 1u16, X87_INTEGER_BIT),
        Real::Max => (0, X87_EXP_MAX - 1, u64::MAX),
        Real::Num(v) => x87_from_f64(v),
    };
    (u128::from((sign << 15) | exponent) << 64) | u128::from(mantissa)
}

/// Exact widening of an `f64` to `(sign, biased exponent, mantissa)`.
fn x87_from_f64(v: f64) -> (u16, u16, u64) {
    let bits = v.to_bits();
    let sign = (bits >> 63) as u16;
    let exp = ((bits >> 52) & 0x7FF) as i32;
    let frac = bits & ((1u64 << 52) - 1);
    match (exp, frac) {
        (0, 0) => (sign, 0, 0),
        (0, _) => {
            // f64 subnormals are normal in the wider exponent range
            let lead = 63 - frac.leading_zeros() as i32;
            let mantissa = frac << (63 - lead);
            let exponent = lead - 1074 + X87_BIAS;
            (sign, exponent as u16, mantissa)
        }
        (0x7FF, 0) => (sign, X87_EXP_MAX, X87_INTEGER_BIT),
        (0x7FF, _) => (sign, X87_EXP_MAX, X87_INTEGER_BIT | (1 << 62) | (frac << 11)),
        _ => {
            let exponent = exp - 1023 + X87_BIAS;
            (sign, exponent as u16, X87_INTEGER_BIT | (frac << 11))
        }
    }
}
