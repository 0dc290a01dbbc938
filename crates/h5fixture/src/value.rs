//! Entry values and the native-type inference layer.

use crate::error::ValueError;
use crate::types::{ElementType, FloatKind, IntKind};

/// A real number, with the width-dependent extremes kept symbolic so each
/// float width encodes its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Real {
    Num(f64),
    /// Smallest positive normal number of the target width.
    SmallestNormal,
    /// Largest finite number of the target width.
    Max,
}

impl From<f64> for Real {
    fn from(v: f64) -> Self {
        Real::Num(v)
    }
}

/// The value of one element, or a nested array of them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i128),
    Real(Real),
    Complex(Real, Real),
    Bool(bool),
    Text(String),
    Bytes(Vec<u8>),
    /// Compound fields in schema order.
    Record(Vec<Value>),
    /// Variable-length sequence.
    Seq(Vec<Value>),
    /// One array level: entry dimensions, or a fixed-array element
    /// flattened row-major.
    Array(Vec<Value>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Real(_) => "real",
            Value::Complex(..) => "complex",
            Value::Bool(_) => "bool",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Record(_) => "record",
            Value::Seq(_) => "sequence",
            Value::Array(_) => "array",
        }
    }

    pub fn real(v: f64) -> Self {
        Value::Real(Real::Num(v))
    }

    pub fn complex(re: f64, im: f64) -> Self {
        Value::Complex(Real::Num(re), Real::Num(im))
    }

    pub fn text(s: &str) -> Self {
        Value::Text(s.into())
    }

    /// Row-major nested array with the given outer rows.
    pub fn rows<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Value>,
    {
        Value::Array(rows.into_iter().map(Into::into).collect())
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(v as i128)
            }
        }
    )*};
}
value_from_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::real(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::real(f64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::text(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

/// Native Rust scalars with a fixed element type.
///
/// Inference never changes width or signedness: `i8` is always `int8`.
pub trait NativeValue {
    fn element_type() -> ElementType;
    fn into_value(self) -> Value;
}

macro_rules! native_int {
    ($($t:ty => $kind:ident),*) => {$(
        impl NativeValue for $t {
            fn element_type() -> ElementType {
                ElementType::int(IntKind::$kind)
            }
            fn into_value(self) -> Value {
                Value::Int(self as i128)
            }
        }
    )*};
}
native_int!(i8 => I8, i16 => I16, i32 => I32, i64 => I64, u8 => U8, u16 => U16, u32 => U32, u64 => U64);

impl NativeValue for half::f16 {
    fn element_type() -> ElementType {
        ElementType::float(FloatKind::F16)
    }
    fn into_value(self) -> Value {
        Value::real(self.to_f64())
    }
}

impl NativeValue for f32 {
    fn element_type() -> ElementType {
        ElementType::float(FloatKind::F32)
    }
    fn into_value(self) -> Value {
        Value::real(f64::from(self))
    }
}

impl NativeValue for f64 {
    fn element_type() -> ElementType {
        ElementType::float(FloatKind::F64)
    }
    fn into_value(self) -> Value {
        Value::real(self)
    }
}

impl NativeValue for bool {
    fn element_type() -> ElementType {
        ElementType::boolean()
    }
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl NativeValue for String {
    fn element_type() -> ElementType {
        ElementType::VarString(h5fixture_format::datatype::CharacterSet::Utf8)
    }
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl NativeValue for &str {
    fn element_type() -> ElementType {
        String::element_type()
    }
    fn into_value(self) -> Value {
        Value::text(self)
    }
}

/// Nested `Vec`s of a native scalar, one level per dimension.
pub trait NativeArray {
    /// Number of dimensions, fixed by the nesting of the Rust type.
    const RANK: usize;
    fn element_type() -> ElementType;
    fn into_value(self) -> Value;
}

macro_rules! native_array {
    ($($t:ty),*) => {$(
        impl NativeArray for Vec<$t> {
            const RANK: usize = 1;
            fn element_type() -> ElementType {
                <$t as NativeValue>::element_type()
            }
            fn into_value(self) -> Value {
                Value::Array(self.into_iter().map(NativeValue::into_value).collect())
            }
        }
        impl NativeArray for Vec<Vec<$t>> {
            const RANK: usize = 2;
            fn element_type() -> ElementType {
                <$t as NativeValue>::element_type()
            }
            fn into_value(self) -> Value {
                Value::Array(self.into_iter().map(NativeArray::into_value).collect())
            }
        }
        impl NativeArray for Vec<Vec<Vec<$t>>> {
            const RANK: usize = 3;
            fn element_type() -> ElementType {
                <$t as NativeValue>::element_type()
            }
            fn into_value(self) -> Value {
                Value::Array(self.into_iter().map(NativeArray::into_value).collect())
            }
        }
    )*};
}
native_array!(i8, i16, i32, i64, u8, u16, u32, u64, half::f16, f32, f64, bool, String, &str);

/// Nesting depth of `Value::Array` along first elements. An empty level
/// ends the walk, so callers that know the rank pass an explicit shape.
fn depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.first().map_or(0, depth),
        _ => 0,
    }
}

/// Shape of an array entry, either inferred from nesting or checked
/// against `shape`.
///
/// Elements of a fixed-array type are themselves `Value::Array`, so one
/// nesting level is reserved for them.
pub(crate) fn resolve_shape(
    value: &Value,
    element: &ElementType,
    shape: Option<&[u64]>,
) -> Result<Vec<u64>, ValueError> {
    let reserved = usize::from(matches!(element, ElementType::Array { .. }));
    let rank = depth(value).saturating_sub(reserved);
    if let Some(shape) = shape {
        if shape.is_empty() {
            return Err(ValueError::ZeroRank);
        }
        let expected: u64 = shape.iter().product();
        if rank == shape.len() {
            let found = nested_shape(value, rank)?;
            if found != shape {
                return Err(ValueError::ElementCount {
                    expected,
                    found: found.iter().product(),
                });
            }
        } else {
            let found = count_elements(value, rank)?;
            if rank != 1 || found != expected {
                return Err(ValueError::ElementCount { expected, found });
            }
        }
        return Ok(shape.to_vec());
    }
    if rank == 0 {
        return Err(ValueError::ZeroRank);
    }
    nested_shape(value, rank)
}

/// Shape of a `rank`-deep nested array; dimensions below an empty level
/// are 0.
pub(crate) fn nested_shape(value: &Value, rank: usize) -> Result<Vec<u64>, ValueError> {
    let mut shape = Vec::with_capacity(rank);
    let mut cur = value;
    for _ in 0..rank {
        match cur {
            Value::Array(items) => {
                shape.push(items.len() as u64);
                match items.first() {
                    Some(first) => cur = first,
                    None => break,
                }
            }
            _ => return Err(ValueError::Ragged),
        }
    }
    while shape.len() < rank {
        shape.push(0);
    }
    check_rectangular(value, &shape)?;
    Ok(shape)
}

fn check_rectangular(value: &Value, shape: &[u64]) -> Result<(), ValueError> {
    let Some((&len, rest)) = shape.split_first() else {
        return Ok(());
    };
    match value {
        Value::Array(items) if items.len() as u64 == len => {
            items.iter().try_for_each(|item| check_rectangular(item, rest))
        }
        _ => Err(ValueError::Ragged),
    }
}

fn count_elements(value: &Value, rank: usize) -> Result<u64, ValueError> {
    let mut elements = Vec::new();
    flatten_into(value, rank, &mut elements)?;
    Ok(elements.len() as u64)
}

/// Leaf elements of a `rank`-deep nested array, row-major.
pub(crate) fn flatten(value: &Value, rank: usize) -> Result<Vec<&Value>, ValueError> {
    let mut out = Vec::new();
    flatten_into(value, rank, &mut out)?;
    Ok(out)
}

fn flatten_into<'a>(value: &'a Value, rank: usize, out: &mut Vec<&'a Value>) -> Result<(), ValueError> {
    if rank == 0 {
        out.push(value);
        return Ok(());
    }
    match value {
        Value::Array(items) => items.iter().try_for_each(|item| flatten_into(item, rank - 1, out)),
        _ => Err(ValueError::Ragged),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FloatKind;

    #[test]
    fn infers_rank_from_nesting() {
        let v = NativeArray::into_value(vec![vec![0i8, 1, 2], vec![3, 4, 5]]);
        let elem = <Vec<Vec<i8>> as NativeArray>::element_type();
        assert_eq!(elem, ElementType::int(IntKind::I8));
        assert_eq!(resolve_shape(&v, &elem, None).unwrap(), vec![2, 3]);
        assert_eq!(flatten(&v, 2).unwrap().len(), 6);
    }

    #[test]
    fn ragged_arrays_rejected() {
        let v = Value::rows([vec![1i32, 2], vec![3]]);
        let elem = ElementType::int(IntKind::I32);
        assert_eq!(resolve_shape(&v, &elem, None), Err(ValueError::Ragged));
    }

    #[test]
    fn explicit_shape_must_agree() {
        let v = Value::rows([vec![1i32, 2, 3], vec![4, 5, 6]]);
        let elem = ElementType::int(IntKind::I32);
        assert_eq!(resolve_shape(&v, &elem, Some(&[2, 3])).unwrap(), vec![2, 3]);
        assert!(matches!(
            resolve_shape(&v, &elem, Some(&[3, 2])),
            Err(ValueError::ElementCount { .. })
        ));
        let flat = Value::from(vec![1i32, 2, 3, 4, 5, 6]);
        assert_eq!(resolve_shape(&flat, &elem, Some(&[3, 2])).unwrap(), vec![3, 2]);
    }

    #[test]
    fn fixed_array_elements_reserve_a_level() {
        let elem = ElementType::array(ElementType::float(FloatKind::F32), [2]);
        let v = Value::rows([vec![0f32, 1.0], vec![2.0, 3.0], vec![4.0, 5.0]]);
        assert_eq!(resolve_shape(&v, &elem, None).unwrap(), vec![3]);
    }

    #[test]
    fn scalars_have_no_rank() {
        let elem = ElementType::int(IntKind::I8);
        assert_eq!(resolve_shape(&Value::Int(1), &elem, None), Err(ValueError::ZeroRank));
    }

    #[test]
    fn empty_levels_pad_the_shape() {
        let v = NativeArray::into_value(Vec::<Vec<i8>>::new());
        assert_eq!(<Vec<Vec<i8>> as NativeArray>::RANK, 2);
        assert_eq!(nested_shape(&v, 2).unwrap(), vec![0, 0]);
        let v = NativeArray::into_value(vec![Vec::<u16>::new(), Vec::new()]);
        assert_eq!(nested_shape(&v, 2).unwrap(), vec![2, 0]);
    }

    #[test]
    fn native_inference_keeps_width() {
        assert_eq!(<u16 as NativeValue>::element_type(), ElementType::int(IntKind::U16));
        assert_eq!(i8::MIN.into_value(), Value::Int(-128));
        assert_eq!(
            <half::f16 as NativeValue>::element_type(),
            ElementType::float(FloatKind::F16)
        );
    }
}
