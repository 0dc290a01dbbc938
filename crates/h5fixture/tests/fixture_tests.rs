//! End-to-end checks of the generated fixture file.

mod common;

use std::path::Path;

use common::Fixture;
use h5fixture::naming::Variant;
use h5fixture::{matrix, FixtureBuilder, FixtureConfig, FixtureError};
use h5fixture_format::dataspace::Dataspace;
use h5fixture_format::datatype::{
    CharacterSet, Datatype, DatatypeByteOrder, ReferenceType, StringPadding, VlKind,
};
use h5fixture_format::reference::{parse_object_reference, parse_region_heap_object, RegionReference};

fn build_at(path: &Path, bitfield: bool) -> Fixture {
    let cfg = FixtureConfig::new(path)
        .allow_platform_gaps(true)
        .include_bitfield(bitfield);
    matrix::build(cfg).unwrap();
    Fixture::open(path)
}

fn build_sample() -> (tempfile::TempDir, Fixture) {
    let dir = tempfile::tempdir().unwrap();
    let fixture = build_at(&dir.path().join("sample.h5"), false);
    (dir, fixture)
}

fn f64_at(raw: &[u8], i: usize) -> f64 {
    f64::from_le_bytes(raw[i * 8..i * 8 + 8].try_into().unwrap())
}

// ---------------------------------------------------------------------------
// Naming and order
// ---------------------------------------------------------------------------

#[test]
fn every_name_has_its_variant_suffix() {
    let (_dir, fx) = build_sample();
    for name in fx.names() {
        let ds = fx.dataset(name);
        match Variant::of_name(name) {
            Some(Variant::Empty) => assert_eq!(ds.dataspace, Dataspace::Null, "{name}"),
            Some(Variant::Scalar) => assert_eq!(ds.dataspace, Dataspace::Scalar, "{name}"),
            Some(Variant::Array(rank)) => assert_eq!(ds.dataspace.rank(), rank, "{name}"),
            None => panic!("{name} has no variant suffix"),
        }
    }
}

#[test]
fn link_order_follows_creation_order() {
    let (_dir, fx) = build_sample();
    let expected = matrix::expected_names(cfg!(feature = "extended-float"), false);
    assert_eq!(fx.names(), expected);
    for (i, link) in fx.links.iter().enumerate() {
        assert_eq!(link.creation_order, Some(i as u64), "{}", link.name);
    }
    assert_eq!(fx.link_info.max_creation_order, Some(fx.links.len() as u64));
    assert!(fx.link_info.creation_order_indexed);
}

#[test]
fn dataset_headers_follow_root_in_order() {
    let (_dir, fx) = build_sample();
    let addrs: Vec<u64> = fx.links.iter().map(|l| l.object_header_address).collect();
    assert!(addrs.windows(2).all(|w| w[0] < w[1]));
    assert!(addrs[0] > fx.superblock.root_group_address);
}

// ---------------------------------------------------------------------------
// Integers
// ---------------------------------------------------------------------------

#[test]
fn int8_minimum_reads_back_signed() {
    let (_dir, fx) = build_sample();
    assert_eq!(fx.raw("int8_scalar"), &[0x80]);
    assert_eq!(fx.raw("int8_scalar")[0] as i8, -128);
    assert!(matches!(
        fx.dataset("int8_scalar").datatype,
        Datatype::FixedPoint {
            size: 1,
            signed: true,
            ..
        }
    ));
}

#[test]
fn int8_2d_shape() {
    let (_dir, fx) = build_sample();
    assert_eq!(fx.dataset("int8_2D").dataspace, Dataspace::Simple(vec![2, 3]));
    assert_eq!(fx.raw("int8_2D"), &[0, 1, 2, 3, 4, 5]);
}

#[test]
fn unsigned_maxima_and_cube() {
    let (_dir, fx) = build_sample();
    assert_eq!(fx.raw("uint16_scalar"), &[0xFF, 0xFF]);
    assert_eq!(fx.raw("uint64_scalar"), &[0xFF; 8]);
    let cube = fx.raw("uint64_3D");
    assert_eq!(fx.dataset("uint64_3D").dataspace, Dataspace::Simple(vec![2, 2, 2]));
    assert_eq!(&cube[56..64], &[0xFF; 8]);
    assert_eq!(&cube[48..56], &6u64.to_le_bytes());
}

#[test]
fn big_endian_int32() {
    let (_dir, fx) = build_sample();
    match fx.dataset("int32_BE_scalar").datatype {
        Datatype::FixedPoint { byte_order, .. } => {
            assert_eq!(byte_order, DatatypeByteOrder::BigEndian)
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(fx.raw("int32_BE_scalar"), &[0, 0, 0, 0]);
}

// ---------------------------------------------------------------------------
// Floats
// ---------------------------------------------------------------------------

#[test]
fn float64_specials_are_bit_exact() {
    let (_dir, fx) = build_sample();
    let bits = |name: &str| u64::from_le_bytes(fx.raw(name).try_into().unwrap());
    assert!(f64::from_bits(bits("float64_nan_scalar")).is_nan());
    assert_eq!(bits("float64_inf_scalar"), f64::INFINITY.to_bits());
    assert_eq!(bits("float64_ninf_scalar"), f64::NEG_INFINITY.to_bits());
    assert_eq!(bits("float64_zero_scalar"), 0);
    assert_eq!(bits("float64_nzero_scalar"), (-0.0f64).to_bits());
    assert_eq!(bits("float64_pi_scalar"), std::f64::consts::PI.to_bits());
    assert_eq!(bits("float64_scalar"), f64::MIN_POSITIVE.to_bits());

    let mut distinct: Vec<u64> = ["nan", "inf", "ninf", "zero", "nzero"]
        .iter()
        .map(|s| bits(&format!("float64_{s}_scalar")))
        .collect();
    distinct.sort_unstable();
    distinct.dedup();
    assert_eq!(distinct.len(), 5);
}

#[test]
fn float64_grid_keeps_specials() {
    let (_dir, fx) = build_sample();
    assert_eq!(fx.dataset("float64_2D").dataspace, Dataspace::Simple(vec![3, 5]));
    let raw = fx.raw("float64_2D");
    assert_eq!(f64_at(raw, 2), f64::INFINITY);
    assert!(f64_at(raw, 7).is_nan());
    assert_eq!(f64_at(raw, 12), f64::NEG_INFINITY);
    assert_eq!(f64_at(raw, 14), 10.0);
}

#[test]
fn small_float_widths() {
    let (_dir, fx) = build_sample();
    assert_eq!(fx.raw("float16_scalar"), &[0x00, 0x04]);
    assert_eq!(fx.raw("float32_scalar"), &f32::MIN_POSITIVE.to_le_bytes());
    assert_eq!(fx.raw("float32_BE_scalar"), &[0, 0, 0, 0]);
    let empty = fx.dataset("float32_empty");
    assert_eq!(empty.dataspace, Dataspace::Null);
    assert_eq!(empty.layout.address, None);
    // 5.0 as binary16
    assert_eq!(&fx.raw("float16_2D")[10..12], &[0x00, 0x45]);
}

#[cfg(feature = "extended-float")]
#[test]
fn float128_uses_x87_layout() {
    let (_dir, fx) = build_sample();
    let raw = fx.raw("float128_scalar");
    assert_eq!(raw.len(), 16);
    assert_eq!(&raw[..8], &(1u64 << 63).to_le_bytes());
    assert_eq!(&raw[8..10], &1u16.to_le_bytes());
    let grid = fx.raw("float128_2D");
    assert_eq!(&grid[5 * 16 + 8..5 * 16 + 10], &0x7FFEu16.to_le_bytes());
    match fx.dataset("complex256_scalar").datatype {
        Datatype::Compound { size, .. } => assert_eq!(size, 32),
        other => panic!("unexpected {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Strings and opaque
// ---------------------------------------------------------------------------

#[test]
fn strings_fixed_and_variable() {
    let (_dir, fx) = build_sample();
    assert_eq!(fx.raw("ascii_fixed_scalar"), b"Some text");
    match fx.dataset("utf8_fixed_scalar").datatype {
        Datatype::String { size, padding, .. } => {
            assert_eq!(size, 9);
            assert_eq!(padding, StringPadding::NullPad);
        }
        other => panic!("unexpected {other:?}"),
    }
    let (len, text) = fx.vl_payload(fx.raw("ascii_vlen_scalar"), 0);
    assert_eq!(len, 9);
    assert_eq!(text, b"Some text");

    match fx.dataset("utf8_vlen_scalar").datatype {
        Datatype::VariableLength {
            kind: VlKind::String { charset, .. },
            ..
        } => assert_eq!(charset, CharacterSet::Utf8),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(fx.vl_payload(fx.raw("utf8_vlen_scalar"), 0), (9, b"Some text".to_vec()));

    let raw = fx.raw("utf8_vlen_1D");
    let words: Vec<Vec<u8>> = (0..3).map(|i| fx.vl_payload(raw, i * 16).1).collect();
    assert_eq!(words, [b"foo".to_vec(), b"bar".to_vec(), b"baz".to_vec()]);
    assert_eq!(fx.dataset("ascii_vlen_empty").dataspace, Dataspace::Null);
}

#[test]
fn opaque_payloads() {
    let (_dir, fx) = build_sample();
    assert_eq!(fx.raw("byte_string_scalar"), &[0x00, 0x11, 0x22]);
    assert_eq!(fx.raw("byte_string_1D"), &[0x00, 0x11, 0x22]);
    assert_eq!(fx.raw("datetime64_scalar"), &1_569_173_910i64.to_le_bytes());
    assert_eq!(fx.raw("datetime64_not-a-time_scalar"), &i64::MIN.to_le_bytes());
}

// ---------------------------------------------------------------------------
// Compounds, references, enums, VL
// ---------------------------------------------------------------------------

#[test]
fn compound_rows_round_trip() {
    let (_dir, fx) = build_sample();
    let raw = fx.raw("compound_1D");
    assert_eq!(raw.len(), 3 * 32);
    assert_eq!(&raw[0..8], &1i64.to_le_bytes());
    assert!(f64::from_le_bytes(raw[8..16].try_into().unwrap()).is_nan());
    assert_eq!(&raw[64 + 8..64 + 16], &(-0.0f64).to_le_bytes());
    assert_eq!(fx.vl_payload(raw, 64 + 16).1, b"baz");

    let nested = fx.raw("compound_nested_scalar");
    assert_eq!(nested.len(), 17);
    assert_eq!(nested[0], 1);
    assert_eq!(&nested[1..5], &1.0f32.to_le_bytes());
    assert_eq!(&nested[9..17], &3i64.to_le_bytes());
}

#[test]
fn compound_array_vlen_rows() {
    let (_dir, fx) = build_sample();
    let raw = fx.raw("compound_array_vlen_1D");
    assert_eq!(raw.len(), 3 * 24);
    for i in 0..3usize {
        let row = i * 24;
        let pair: Vec<f32> = raw[row..row + 8]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(pair, [(2 * i) as f32, (2 * i + 1) as f32]);
        let (len, payload) = fx.vl_payload(raw, row + 8);
        assert_eq!(len as usize, i + 1);
        let values: Vec<u64> = payload
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(values, (0..=i as u64).collect::<Vec<_>>());
    }
}

#[test]
fn complex_scalars_hold_extremes() {
    let (_dir, fx) = build_sample();
    let c64 = fx.raw("complex64_scalar");
    assert_eq!(&c64[..4], &f32::MIN_POSITIVE.to_le_bytes());
    assert_eq!(&c64[4..], &f32::MAX.to_le_bytes());
    let c128 = fx.raw("complex128_scalar");
    assert_eq!(&c128[..8], &f64::MIN_POSITIVE.to_le_bytes());
    assert_eq!(&c128[8..], &f64::MAX.to_le_bytes());
}

#[test]
fn complex_big_endian() {
    let (_dir, fx) = build_sample();
    let raw = fx.raw("complex128_BE_scalar");
    assert_eq!(&raw[..8], &1.0f64.to_be_bytes());
    assert_eq!(&raw[8..], &2.0f64.to_be_bytes());
}

#[test]
fn references_resolve_to_compound_1d() {
    let (_dir, fx) = build_sample();
    let target = fx.address_of("compound_1D");

    let obj = fx.dataset("reference_scalar");
    assert_eq!(obj.datatype, Datatype::Reference { ref_type: ReferenceType::Object });
    assert_eq!(parse_object_reference(fx.raw("reference_scalar"), 0).unwrap(), target);

    let region = RegionReference::parse(fx.raw("reference_region_scalar"), 0).unwrap();
    let heap = fx.heap_object(region.collection_address, region.object_index as u16);
    let (addr, selection) = parse_region_heap_object(&heap).unwrap();
    assert_eq!(addr, target);
    assert_eq!(selection.blocks().len(), 1);
    assert_eq!(selection.blocks()[0].start, vec![0]);
    assert_eq!(selection.blocks()[0].end, vec![0]);
    assert_eq!(selection.num_elements(), 1);
}

#[test]
fn bool_empty_enum_domain() {
    let (_dir, fx) = build_sample();
    let ds = fx.dataset("bool_empty");
    assert_eq!(ds.dataspace, Dataspace::Null);
    match ds.datatype {
        Datatype::Enumeration { members, .. } => {
            let domain: Vec<(&str, &[u8])> =
                members.iter().map(|m| (m.name.as_str(), m.value.as_slice())).collect();
            assert_eq!(domain, [("FALSE", &[0u8][..]), ("TRUE", &[1u8][..])]);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(fx.raw("bool_2D"), &[1, 0, 1, 1, 0, 0, 1, 0]);
    assert_eq!(fx.raw("enum_int32_scalar"), &256i32.to_le_bytes());
}

#[test]
fn enum_uint8_domain() {
    let (_dir, fx) = build_sample();
    assert_eq!(fx.raw("enum_uint8_scalar"), &[1]);
    match fx.dataset("enum_uint8_scalar").datatype {
        Datatype::Enumeration { base_type, members } => {
            assert!(matches!(
                *base_type,
                Datatype::FixedPoint { size: 1, signed: false, .. }
            ));
            let domain: Vec<(&str, &[u8])> =
                members.iter().map(|m| (m.name.as_str(), m.value.as_slice())).collect();
            assert_eq!(domain, [("A", &[0u8][..]), ("B", &[1u8][..])]);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn vlen_lengths_are_independent() {
    let (_dir, fx) = build_sample();
    let raw = fx.raw("vlen_int64_1D");
    for (i, expected_len) in [1u32, 2, 3].into_iter().enumerate() {
        let (len, payload) = fx.vl_payload(raw, i * 16);
        assert_eq!(len, expected_len);
        let values: Vec<i64> = payload
            .chunks_exact(8)
            .map(|c| i64::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(values, (0..i64::from(expected_len)).collect::<Vec<_>>());
    }
    let (len, payload) = fx.vl_payload(fx.raw("vlen_int8_scalar"), 0);
    assert_eq!((len, payload), (2, vec![0, 1]));
}

// ---------------------------------------------------------------------------
// Container lifecycle
// ---------------------------------------------------------------------------

#[test]
fn second_build_conflicts_and_keeps_first() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.h5");
    build_at(&path, false);
    let before = std::fs::read(&path).unwrap();

    let err = matrix::build(FixtureConfig::new(&path).allow_platform_gaps(true)).unwrap_err();
    assert!(matches!(err, FixtureError::ContainerCreateConflict { .. }));
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn failed_build_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.h5");
    let attempt = || -> h5fixture::Result<()> {
        let mut b = FixtureBuilder::create(FixtureConfig::new(&path))?;
        b.scalar("int8", 1i8)?;
        b.create_reference("reference", "missing_1D", None)?;
        b.finish().map(|_| ())
    };
    assert!(matches!(attempt(), Err(FixtureError::DanglingReference { .. })));
    assert!(!path.exists());
}

#[test]
fn builds_are_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let a = build_at(&dir.path().join("a.h5"), true);
    let b = build_at(&dir.path().join("b.h5"), true);
    assert_eq!(a.bytes, b.bytes);
}

#[test]
fn bitfield_entries_are_opt_in() {
    let dir = tempfile::tempdir().unwrap();
    let fx = build_at(&dir.path().join("bits.h5"), true);
    let names = fx.names();
    assert_eq!(&names[names.len() - 2..], ["bitfield8_scalar", "bitfield16_BE_scalar"]);
    assert_eq!(fx.raw("bitfield8_scalar"), &[0xA5]);
    assert_eq!(fx.raw("bitfield16_BE_scalar"), &[0x12, 0x34]);
    assert!(matches!(
        fx.dataset("bitfield16_BE_scalar").datatype,
        Datatype::BitField { size: 2, byte_order: DatatypeByteOrder::BigEndian, .. }
    ));
}

#[test]
fn parent_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dist/nested/sample.h5");
    build_at(&path, false);
    assert!(path.is_file());
}
