//! The sample matrix: every entry of `sample.h5`, in file order.

use chrono::DateTime;
use h5fixture_format::datatype::CharacterSet;
use tracing::warn;

use crate::builder::{EntryHandle, FixtureBuilder, FixtureSummary, Region};
use crate::config::FixtureConfig;
use crate::error::{FixtureError, Result, ValueError};
use crate::naming::{segmented, Segment};
use crate::types::{CompoundSchema, ElementType, Encoding, EnumSchema, FloatKind, IntKind};
use crate::value::{Real, Value};

const DATETIME64: &str = "2019-09-22T17:38:30Z";

/// Seconds since the epoch of the datetime64 entry.
pub fn datetime64_seconds() -> Result<i64> {
    DateTime::parse_from_rfc3339(DATETIME64)
        .map(|t| t.timestamp())
        .map_err(|e| FixtureError::invalid("datetime64", ValueError::Timestamp(e.to_string())))
}

/// Create, populate and finish a fixture as configured.
pub fn build(config: FixtureConfig) -> Result<FixtureSummary> {
    let mut builder = FixtureBuilder::create(config)?;
    populate(&mut builder)?;
    builder.finish()
}

/// Create every matrix entry in order.
pub fn populate(b: &mut FixtureBuilder) -> Result<()> {
    let allow_gaps = b.config().allow_platform_gaps;
    let gap = |r: Result<EntryHandle>| tolerate(r, allow_gaps);

    integers(b)?;
    floats(b, &gap)?;
    strings(b)?;
    opaques(b)?;
    compounds(b, &gap)?;
    references(b)?;
    enums(b)?;
    variable_length(b)?;
    if b.config().include_bitfield {
        bitfields(b)?;
    }
    Ok(())
}

/// Downgrade an unsupported width to a warning when gaps are allowed.
fn tolerate(result: Result<EntryHandle>, allow_gaps: bool) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(FixtureError::UnsupportedPlatformType { type_name }) if allow_gaps => {
            warn!(type_name = %type_name, "skipping entry unsupported by this build");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn grid(rows: &[&[i64]]) -> Value {
    Value::rows(rows.iter().map(|r| r.to_vec()))
}

fn real_grid(rows: &[&[f64]]) -> Value {
    Value::rows(rows.iter().map(|r| r.to_vec()))
}

fn complex_grid() -> Value {
    Value::rows([
        vec![Value::complex(1.0, 2.0), Value::complex(3.0, 4.0)],
        vec![Value::complex(5.0, 6.0), Value::complex(7.0, 8.0)],
    ])
}

fn integers(b: &mut FixtureBuilder) -> Result<()> {
    let small = grid(&[&[0, 1, 2], &[3, 4, 5]]);
    for kind in IntKind::ALL {
        let ty = ElementType::int(kind);
        let extreme = if kind.signed() { kind.min() } else { kind.max() };
        b.create_scalar(kind.name(), Value::Int(extreme), ty.clone())?;
        if kind == IntKind::I32 {
            let be = ElementType::Int(kind, Encoding::BigEndian);
            b.create_scalar(&segmented(kind.name(), &[Segment::BigEndian]), Value::Int(0), be)?;
        }
        if kind == IntKind::U64 {
            let cube = Value::rows([
                Value::rows([vec![0u64, 1], vec![2, 3]]),
                Value::rows([vec![4u64, 5], vec![6, u64::MAX]]),
            ]);
            b.create_array(kind.name(), cube, ty, None)?;
        } else {
            b.create_array(kind.name(), small.clone(), ty, None)?;
        }
    }
    Ok(())
}

fn floats(b: &mut FixtureBuilder, gap: &dyn Fn(Result<EntryHandle>) -> Result<()>) -> Result<()> {
    let small = grid(&[&[0, 1, 2], &[3, 4, 5]]);
    let smallest = Value::Real(Real::SmallestNormal);

    let f16 = ElementType::float(FloatKind::F16);
    b.create_scalar("float16", smallest.clone(), f16.clone())?;
    b.create_array("float16", small.clone(), f16, None)?;

    let f32 = ElementType::float(FloatKind::F32);
    b.create_empty("float32", f32.clone())?;
    b.create_scalar("float32", smallest.clone(), f32.clone())?;
    b.create_scalar(
        &segmented("float32", &[Segment::BigEndian]),
        Value::real(0.0),
        ElementType::Float(FloatKind::F32, Encoding::BigEndian),
    )?;
    b.create_array("float32", small.clone(), f32, None)?;

    let f64 = ElementType::float(FloatKind::F64);
    b.create_scalar("float64", smallest.clone(), f64.clone())?;
    let specials = [
        (Segment::Nan, f64::NAN),
        (Segment::Inf, f64::INFINITY),
        (Segment::NegInf, f64::NEG_INFINITY),
        (Segment::Zero, 0.0),
        (Segment::NegZero, -0.0),
        (Segment::Pi, std::f64::consts::PI),
    ];
    for (segment, v) in specials {
        b.create_scalar(&segmented("float64", &[segment]), Value::real(v), f64.clone())?;
    }
    let wide = real_grid(&[
        &[0.0, 1.0, f64::INFINITY, 3.0, 4.0],
        &[3.0, 4.0, f64::NAN, 6.0, 7.0],
        &[6.0, 7.0, f64::NEG_INFINITY, 9.0, 10.0],
    ]);
    b.create_array("float64", wide, f64, None)?;

    let f128 = ElementType::float(FloatKind::F128);
    gap(b.create_scalar("float128", smallest, f128.clone()))?;
    let with_max = Value::rows([
        vec![Value::real(0.0), Value::real(1.0), Value::real(2.0)],
        vec![Value::real(3.0), Value::real(4.0), Value::Real(Real::Max)],
    ]);
    gap(b.create_array("float128", with_max, f128, None))?;
    Ok(())
}

fn strings(b: &mut FixtureBuilder) -> Result<()> {
    let ascii_vlen = ElementType::VarString(CharacterSet::Ascii);
    b.create_empty("ascii_vlen", ascii_vlen.clone())?;
    b.create_scalar("ascii_vlen", Value::Bytes(b"Some text".to_vec()), ascii_vlen)?;
    b.create_scalar(
        "ascii_fixed",
        Value::text("Some text"),
        ElementType::FixedString {
            charset: CharacterSet::Ascii,
            size: 9,
        },
    )?;

    let utf8_vlen = ElementType::VarString(CharacterSet::Utf8);
    b.create_scalar("utf8_vlen", Value::text("Some text"), utf8_vlen.clone())?;
    b.create_array("utf8_vlen", Value::from(vec!["foo", "bar", "baz"]), utf8_vlen, None)?;
    b.create_scalar(
        "utf8_fixed",
        Value::text("Some text"),
        ElementType::FixedString {
            charset: CharacterSet::Utf8,
            size: 9,
        },
    )?;
    Ok(())
}

fn opaques(b: &mut FixtureBuilder) -> Result<()> {
    b.create_scalar("byte_string", Value::Bytes(vec![0x00, 0x11, 0x22]), ElementType::Opaque(3))?;
    let singles = Value::Array(vec![
        Value::Bytes(vec![0x00]),
        Value::Bytes(vec![0x11]),
        Value::Bytes(vec![0x22]),
    ]);
    b.create_array("byte_string", singles, ElementType::Opaque(1), None)?;

    let seconds = datetime64_seconds()?;
    b.create_scalar("datetime64", Value::Bytes(seconds.to_le_bytes().to_vec()), ElementType::Opaque(8))?;
    b.create_scalar(
        &segmented("datetime64", &[Segment::NotATime]),
        Value::Bytes(i64::MIN.to_le_bytes().to_vec()),
        ElementType::Opaque(8),
    )?;
    Ok(())
}

/// Schema of `compound_scalar` and `compound_1D`.
pub fn record_schema() -> CompoundSchema {
    CompoundSchema::new([
        ("bigint", ElementType::int(IntKind::I64)),
        ("double", ElementType::float(FloatKind::F64)),
        ("utf-8", ElementType::VarString(CharacterSet::Utf8)),
    ])
}

fn record(n: i64, x: f64, s: &str) -> Value {
    Value::Record(vec![Value::from(n), Value::real(x), Value::text(s)])
}

fn compounds(b: &mut FixtureBuilder, gap: &dyn Fn(Result<EntryHandle>) -> Result<()>) -> Result<()> {
    let extremes = Value::Complex(Real::SmallestNormal, Real::Max);
    for kind in [FloatKind::F32, FloatKind::F64, FloatKind::F128] {
        let name = kind.complex_name();
        let ty = ElementType::complex(kind);
        gap(b.create_scalar(name, extremes.clone(), ty.clone()))?;
        if kind == FloatKind::F64 {
            b.create_scalar(
                &segmented(name, &[Segment::BigEndian]),
                Value::complex(1.0, 2.0),
                ElementType::Complex(kind, Encoding::BigEndian),
            )?;
        }
        gap(b.create_array(name, complex_grid(), ty, None))?;
    }

    let rec = ElementType::Compound(record_schema());
    b.create_scalar("compound", record(1, 2.0, "foo"), rec.clone())?;
    let rows = Value::Array(vec![
        record(1, f64::NAN, "foo"),
        record(2, f64::INFINITY, "bar"),
        record(3, -0.0, "baz"),
    ]);
    b.create_array("compound", rows, rec, None)?;

    let inner = ElementType::Compound(CompoundSchema::new([
        ("bool", ElementType::boolean()),
        ("cplx", ElementType::complex(FloatKind::F32)),
        ("bigint", ElementType::int(IntKind::I64)),
    ]));
    let nested = ElementType::Compound(CompoundSchema::new([("nested", inner)]));
    let value = Value::Record(vec![Value::Record(vec![
        Value::Bool(true),
        Value::complex(1.0, 2.0),
        Value::Int(3),
    ])]);
    b.create_scalar("compound_nested", value, nested)?;

    let array_vlen = ElementType::Compound(CompoundSchema::new([
        ("arr", ElementType::array(ElementType::float(FloatKind::F32), [2])),
        ("vlen", ElementType::vlen(ElementType::int(IntKind::U64))),
    ]));
    let rows = Value::Array(
        (0..3u64)
            .map(|i| {
                let arr = Value::from(vec![(2 * i) as f32, (2 * i + 1) as f32]);
                let seq = Value::Seq((0..=i).map(Value::from).collect());
                Value::Record(vec![arr, seq])
            })
            .collect(),
    );
    b.create_array("compound_array_vlen", rows, array_vlen, None)?;
    Ok(())
}

fn references(b: &mut FixtureBuilder) -> Result<()> {
    b.create_reference("reference", "compound_1D", None)?;
    b.create_reference(
        &segmented("reference", &[Segment::Region]),
        "compound_1D",
        Some(Region::slice(vec![0..1])),
    )?;
    Ok(())
}

fn enums(b: &mut FixtureBuilder) -> Result<()> {
    let boolean = ElementType::boolean();
    b.create_empty("bool", boolean.clone())?;
    b.create_scalar(&segmented("bool", &[Segment::False]), Value::Bool(false), boolean.clone())?;
    b.create_scalar(&segmented("bool", &[Segment::True]), Value::Bool(true), boolean.clone())?;
    let pattern = Value::rows([
        vec![true, false, true, true],
        vec![false, false, true, false],
    ]);
    b.create_array("bool", pattern, boolean, None)?;

    let u8_enum = EnumSchema::new(IntKind::U8, [("A", 0), ("B", 1)]);
    b.create_scalar("enum_uint8", Value::Int(1), ElementType::Enum(u8_enum))?;
    let i32_enum = EnumSchema::new(IntKind::I32, [("A", 256), ("B", 257)]);
    b.create_scalar("enum_int32", Value::Int(256), ElementType::Enum(i32_enum))?;
    Ok(())
}

fn variable_length(b: &mut FixtureBuilder) -> Result<()> {
    let seq = |n: i64| Value::Seq((0..n).map(Value::from).collect());
    b.create_scalar("vlen_int8", seq(2), ElementType::vlen(ElementType::int(IntKind::I8)))?;
    b.create_array(
        "vlen_int64",
        Value::Array(vec![seq(1), seq(2), seq(3)]),
        ElementType::vlen(ElementType::int(IntKind::I64)),
        None,
    )?;
    Ok(())
}

fn bitfields(b: &mut FixtureBuilder) -> Result<()> {
    b.create_scalar("bitfield8", Value::Int(0xA5), ElementType::Bitfield(1, Encoding::Native))?;
    b.create_scalar(
        &segmented("bitfield16", &[Segment::BigEndian]),
        Value::Int(0x1234),
        ElementType::Bitfield(2, Encoding::BigEndian),
    )?;
    Ok(())
}

/// Stored names of the standard matrix, in order.
pub fn expected_names(include_extended: bool, include_bitfield: bool) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut push = |s: &str| names.push(s.to_string());
    for kind in IntKind::ALL {
        push(&format!("{}_scalar", kind.name()));
        if kind == IntKind::I32 {
            push("int32_BE_scalar");
        }
        push(&format!("{}_{}D", kind.name(), if kind == IntKind::U64 { 3 } else { 2 }));
    }
    for n in [
        "float16_scalar",
        "float16_2D",
        "float32_empty",
        "float32_scalar",
        "float32_BE_scalar",
        "float32_2D",
        "float64_scalar",
        "float64_nan_scalar",
        "float64_inf_scalar",
        "float64_ninf_scalar",
        "float64_zero_scalar",
        "float64_nzero_scalar",
        "float64_pi_scalar",
        "float64_2D",
    ] {
        push(n);
    }
    if include_extended {
        push("float128_scalar");
        push("float128_2D");
    }
    for n in [
        "ascii_vlen_empty",
        "ascii_vlen_scalar",
        "ascii_fixed_scalar",
        "utf8_vlen_scalar",
        "utf8_vlen_1D",
        "utf8_fixed_scalar",
        "byte_string_scalar",
        "byte_string_1D",
        "datetime64_scalar",
        "datetime64_not-a-time_scalar",
        "complex64_scalar",
        "complex64_2D",
        "complex128_scalar",
        "complex128_BE_scalar",
        "complex128_2D",
    ] {
        push(n);
    }
    if include_extended {
        push("complex256_scalar");
        push("complex256_2D");
    }
    for n in [
        "compound_scalar",
        "compound_1D",
        "compound_nested_scalar",
        "compound_array_vlen_1D",
        "reference_scalar",
        "reference_region_scalar",
        "bool_empty",
        "bool_false_scalar",
        "bool_true_scalar",
        "bool_2D",
        "enum_uint8_scalar",
        "enum_int32_scalar",
        "vlen_int8_scalar",
        "vlen_int64_1D",
    ] {
        push(n);
    }
    if include_bitfield {
        push("bitfield8_scalar");
        push("bitfield16_BE_scalar");
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_epoch_seconds() {
        assert_eq!(datetime64_seconds().unwrap(), 1_569_173_910);
    }

    #[test]
    fn populate_matches_expected_order() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = FixtureConfig::new(dir.path().join("sample.h5"))
            .allow_platform_gaps(true)
            .include_bitfield(true);
        let mut b = FixtureBuilder::create(cfg).unwrap();
        populate(&mut b).unwrap();
        let names: Vec<&str> = b.entries().iter().map(|e| e.name.as_str()).collect();
        let expected = expected_names(cfg!(feature = "extended-float"), true);
        assert_eq!(names, expected);
        b.finish().unwrap();
    }

    #[test]
    fn every_numeric_class_has_scalar_and_array() {
        let names = expected_names(true, false);
        for base in ["int8", "uint16", "float32", "float64", "complex128", "bool"] {
            let with_base = |suffix: &str| {
                names
                    .iter()
                    .any(|n| n.starts_with(&format!("{base}_")) && n.ends_with(suffix))
            };
            assert!(with_base("_scalar"), "{base} scalar");
            assert!(with_base("D"), "{base} array");
        }
    }
}
