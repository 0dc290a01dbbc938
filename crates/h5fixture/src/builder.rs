//! The fixture builder.
//!
//! Entries are recorded in a name table as they are created; references
//! look their targets up there. Raw bytes are staged in a
//! [`FileWriter`] and every file address is resolved when the image is laid
//! out in [`FixtureBuilder::finish`].

use std::collections::HashMap;
use std::fs;
use std::ops::Range;
use std::path::PathBuf;

use h5fixture_format::dataspace::Dataspace;
use h5fixture_format::file_writer::FileWriter;
use h5fixture_format::raw_data::{DatasetId, RawData};
use h5fixture_format::reference::{push_object_reference, push_region_reference, region_heap_object};
use h5fixture_format::selection::HyperslabSelection;
use tracing::{debug, info};

use crate::config::FixtureConfig;
use crate::container::ContainerFile;
use crate::encode::Encoder;
use crate::error::{FixtureError, Result, ValueError};
use crate::naming::{entry_name, Variant};
use crate::types::{ElementType, Encoding, TypeClass};
use crate::value::{flatten, nested_shape, resolve_shape, NativeArray, NativeValue, Value};

/// Handle to an entry created by a [`FixtureBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryHandle(DatasetId);

impl EntryHandle {
    /// Position of the entry in creation order.
    pub fn index(self) -> usize {
        self.0 .0
    }
}

/// A recorded entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    pub element: ElementType,
    pub variant: Variant,
    pub shape: Vec<u64>,
}

impl Entry {
    pub fn class(&self) -> TypeClass {
        self.element.class()
    }

    /// Byte order, for numeric classes.
    pub fn encoding(&self) -> Option<Encoding> {
        match &self.element {
            ElementType::Int(_, e)
            | ElementType::Float(_, e)
            | ElementType::Complex(_, e)
            | ElementType::Bitfield(_, e) => Some(*e),
            ElementType::Enum(schema) => Some(schema.encoding),
            _ => None,
        }
    }
}

/// A hyperslab of a target entry, one half-open range per dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    ranges: Vec<Range<u64>>,
}

impl Region {
    pub fn slice(ranges: impl Into<Vec<Range<u64>>>) -> Self {
        Self {
            ranges: ranges.into(),
        }
    }

    pub fn ranges(&self) -> &[Range<u64>] {
        &self.ranges
    }
}

/// What a finished build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureSummary {
    pub path: PathBuf,
    pub entries: usize,
    pub bytes: u64,
}

/// Builds one fixture file.
pub struct FixtureBuilder {
    config: FixtureConfig,
    container: ContainerFile,
    writer: FileWriter,
    entries: Vec<Entry>,
    names: HashMap<String, EntryHandle>,
}

impl FixtureBuilder {
    /// Exclusively create the configured output, with its parent directory.
    pub fn create(config: FixtureConfig) -> Result<Self> {
        if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let container = ContainerFile::create(&config.output)?;
        info!(path = %config.output.display(), "building fixture");
        Ok(Self {
            config,
            container,
            writer: FileWriter::new(),
            entries: Vec::new(),
            names: HashMap::new(),
        })
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    /// Entries in creation order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, handle: EntryHandle) -> &Entry {
        &self.entries[handle.index()]
    }

    pub fn lookup(&self, name: &str) -> Option<EntryHandle> {
        self.names.get(name).copied()
    }

    /// A typed entry with a null dataspace.
    pub fn create_empty(&mut self, name: &str, element: ElementType) -> Result<EntryHandle> {
        let name = entry_name(name, Variant::Empty);
        self.insert(name, element, Variant::Empty, Vec::new(), |_, _| Ok(RawData::new()))
    }

    /// A rank-0 entry holding `value`.
    pub fn create_scalar(&mut self, name: &str, value: Value, element: ElementType) -> Result<EntryHandle> {
        let name = entry_name(name, Variant::Scalar);
        self.insert(name, element, Variant::Scalar, Vec::new(), |enc, ty| {
            enc.encode_all(ty, &[&value])
        })
    }

    /// An N-dimensional entry; rank comes from `shape` or from nesting.
    pub fn create_array(
        &mut self,
        name: &str,
        value: Value,
        element: ElementType,
        shape: Option<&[u64]>,
    ) -> Result<EntryHandle> {
        let shape = resolve_shape(&value, &element, shape).map_err(|e| FixtureError::invalid(name, e))?;
        let name = entry_name(name, Variant::Array(shape.len()));
        let rank = if depth_matches(&value, &element, shape.len()) {
            shape.len()
        } else {
            1
        };
        self.insert(name, element, Variant::Array(shape.len()), shape, |enc, ty| {
            let items = flatten(&value, rank).map_err(|e| enc.invalid(e))?;
            enc.encode_all(ty, &items)
        })
    }

    /// A scalar object reference to `target`, or a region reference when
    /// `region` is given.
    pub fn create_reference(&mut self, name: &str, target: &str, region: Option<Region>) -> Result<EntryHandle> {
        let stored = entry_name(name, Variant::Scalar);
        let handle = self.lookup(target).ok_or_else(|| FixtureError::DanglingReference {
            name: stored.clone(),
            target: target.into(),
        })?;
        let target_shape = self.entry(handle).shape.clone();
        let target_id = handle.0;

        match region {
            None => self.insert(stored, ElementType::ObjectRef, Variant::Scalar, Vec::new(), |_, _| {
                let mut raw = RawData::new();
                push_object_reference(&mut raw, target_id);
                Ok(raw)
            }),
            Some(region) => {
                let bad_region = || ValueError::BadRegion(target_shape.clone());
                let selection = HyperslabSelection::from_ranges(region.ranges())
                    .and_then(|s| s.check_bounds(&target_shape).map(|()| s))
                    .map_err(|_| FixtureError::invalid(&stored, bad_region()))?;
                self.insert(stored, ElementType::RegionRef, Variant::Scalar, Vec::new(), |enc, _| {
                    let index = enc.stage(region_heap_object(target_id, &selection)?)?;
                    let mut raw = RawData::new();
                    push_region_reference(&mut raw, index);
                    Ok(raw)
                })
            }
        }
    }

    /// Empty entry typed by a native Rust type.
    pub fn empty<T: NativeValue>(&mut self, name: &str) -> Result<EntryHandle> {
        self.create_empty(name, T::element_type())
    }

    /// Scalar entry typed by its native Rust value.
    pub fn scalar<T: NativeValue>(&mut self, name: &str, value: T) -> Result<EntryHandle> {
        self.create_scalar(name, value.into_value(), T::element_type())
    }

    /// Array entry from nested `Vec`s of a native Rust type. The rank is
    /// the type's nesting depth, even when a level is empty.
    pub fn array<A: NativeArray>(&mut self, name: &str, value: A) -> Result<EntryHandle> {
        let value = value.into_value();
        let shape = nested_shape(&value, A::RANK).map_err(|e| FixtureError::invalid(name, e))?;
        self.create_array(name, value, A::element_type(), Some(&shape))
    }

    /// Validate, encode and record one entry. Nothing changes on error.
    fn insert<F>(
        &mut self,
        name: String,
        element: ElementType,
        variant: Variant,
        shape: Vec<u64>,
        encode: F,
    ) -> Result<EntryHandle>
    where
        F: FnOnce(&mut Encoder<'_>, &ElementType) -> Result<RawData>,
    {
        if self.names.contains_key(&name) {
            return Err(FixtureError::DuplicateName(name));
        }
        let datatype = element.to_datatype()?;
        let dataspace = match variant {
            Variant::Empty => Dataspace::Null,
            Variant::Scalar => Dataspace::Scalar,
            Variant::Array(_) => Dataspace::Simple(shape.clone()),
        };

        let mut encoder = Encoder::new(&name, self.writer.heap().len());
        let data = encode(&mut encoder, &element)?;
        let staged = encoder.into_staged();

        let id = self.writer.add_dataset(&name, datatype, dataspace, data)?;
        for object in staged {
            self.writer.insert_heap_object(object)?;
        }

        debug!(name = %name, class = ?element.class(), variant = %variant, "created entry");
        let handle = EntryHandle(id);
        self.names.insert(name.clone(), handle);
        self.entries.push(Entry {
            name,
            element,
            variant,
            shape,
        });
        Ok(handle)
    }

    /// Lay out the file, write it and release the container.
    pub fn finish(self) -> Result<FixtureSummary> {
        let FixtureBuilder {
            config,
            container,
            writer,
            entries,
            ..
        } = self;
        let image = writer.finish()?;
        container.commit(&image)?;
        let summary = FixtureSummary {
            path: config.output,
            entries: entries.len(),
            bytes: image.len() as u64,
        };
        info!(
            path = %summary.path.display(),
            entries = summary.entries,
            bytes = summary.bytes,
            "fixture written"
        );
        Ok(summary)
    }
}

/// Whether `value` nests `rank` levels deep before reaching elements.
fn depth_matches(value: &Value, element: &ElementType, rank: usize) -> bool {
    resolve_shape(value, element, None).map_or(false, |s| s.len() == rank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FloatKind, IntKind};

    fn builder() -> (tempfile::TempDir, FixtureBuilder) {
        let dir = tempfile::tempdir().unwrap();
        let cfg = FixtureConfig::new(dir.path().join("out/sample.h5"));
        let b = FixtureBuilder::create(cfg).unwrap();
        (dir, b)
    }

    #[test]
    fn names_carry_variant_suffix() {
        let (_dir, mut b) = builder();
        let h = b.scalar("int8", i8::MIN).unwrap();
        assert_eq!(b.entry(h).name, "int8_scalar");
        let h = b.array("int8", vec![vec![0i8, 1, 2], vec![3, 4, 5]]).unwrap();
        assert_eq!(b.entry(h).name, "int8_2D");
        assert_eq!(b.entry(h).shape, vec![2, 3]);
        let h = b.empty::<f32>("float32").unwrap();
        assert_eq!(b.entry(h).name, "float32_empty");
        assert_eq!(b.entry(h).variant, Variant::Empty);
    }

    #[test]
    fn duplicate_names_rejected() {
        let (_dir, mut b) = builder();
        b.scalar("x", 1u8).unwrap();
        let err = b.scalar("x", 2u8).unwrap_err();
        assert!(matches!(err, FixtureError::DuplicateName(ref n) if n == "x_scalar"));
        assert_eq!(b.entries().len(), 1);
    }

    #[test]
    fn dangling_reference_rejected() {
        let (_dir, mut b) = builder();
        let err = b.create_reference("reference", "compound_1D", None).unwrap_err();
        assert!(matches!(err, FixtureError::DanglingReference { ref target, .. } if target == "compound_1D"));
        assert!(b.entries().is_empty());
    }

    #[test]
    fn region_must_fit_target() {
        let (_dir, mut b) = builder();
        b.array("v", vec![1i32, 2, 3]).unwrap();
        let err = b
            .create_reference("r", "v_1D", Some(Region::slice(vec![2..5])))
            .unwrap_err();
        assert!(matches!(
            err,
            FixtureError::InvalidValue {
                source: ValueError::BadRegion(_),
                ..
            }
        ));
        b.create_reference("r", "v_1D", Some(Region::slice(vec![0..1]))).unwrap();
        assert_eq!(b.writer.heap().len(), 1);
    }

    #[test]
    fn failed_entry_leaves_state_unchanged() {
        let (_dir, mut b) = builder();
        let ty = ElementType::vlen(ElementType::int(IntKind::I8));
        // second element overflows int8 after the first payload is staged
        let bad = Value::rows([
            Value::Seq(vec![Value::Int(1)]),
            Value::Seq(vec![Value::Int(1000)]),
        ]);
        assert!(b.create_array("vlen_int8", bad, ty, None).is_err());
        assert!(b.entries().is_empty());
        assert!(b.writer.heap().is_empty());
        assert!(b.lookup("vlen_int8_1D").is_none());
    }

    #[test]
    fn explicit_shape_reshapes_flat_values() {
        let (_dir, mut b) = builder();
        let h = b
            .create_array(
                "flat",
                Value::from(vec![0i16, 1, 2, 3, 4, 5]),
                ElementType::int(IntKind::I16),
                Some(&[2, 3]),
            )
            .unwrap();
        assert_eq!(b.entry(h).name, "flat_2D");
        assert_eq!(b.entry(h).shape, vec![2, 3]);
    }

    #[test]
    fn empty_native_arrays_keep_their_rank() {
        let (_dir, mut b) = builder();
        let h = b.array("x", Vec::<Vec<i8>>::new()).unwrap();
        assert_eq!(b.entry(h).name, "x_2D");
        assert_eq!(b.entry(h).shape, vec![0, 0]);
        let h = b.array("y", vec![Vec::<f64>::new(); 3]).unwrap();
        assert_eq!(b.entry(h).name, "y_2D");
        assert_eq!(b.entry(h).shape, vec![3, 0]);
    }

    #[test]
    fn oversized_bitfield_is_an_error() {
        let (_dir, mut b) = builder();
        let err = b
            .create_scalar("bits", Value::Int(1), ElementType::Bitfield(16, Encoding::Native))
            .unwrap_err();
        assert!(matches!(err, FixtureError::UnsupportedPlatformType { ref type_name } if type_name == "bitfield128"));
        assert!(b.entries().is_empty());
    }

    #[test]
    fn lossy_floats_are_errors() {
        let (_dir, mut b) = builder();
        let err = b
            .create_scalar("f", Value::real(1e300), ElementType::float(FloatKind::F32))
            .unwrap_err();
        assert!(matches!(
            err,
            FixtureError::InvalidValue {
                source: ValueError::FloatOverflow { .. },
                ..
            }
        ));
        let err = b
            .create_scalar("g", Value::Int(i128::from(i64::MAX)), ElementType::float(FloatKind::F16))
            .unwrap_err();
        assert!(matches!(
            err,
            FixtureError::InvalidValue {
                source: ValueError::InexactInteger { .. },
                ..
            }
        ));
        assert!(b.entries().is_empty());
    }

    #[test]
    fn finish_writes_file() {
        let (dir, mut b) = builder();
        b.scalar("float64_pi", std::f64::consts::PI).unwrap();
        b.create_scalar("c", Value::complex(1.0, 2.0), ElementType::complex(FloatKind::F64))
            .unwrap();
        let summary = b.finish().unwrap();
        assert_eq!(summary.entries, 2);
        let on_disk = fs::metadata(dir.path().join("out/sample.h5")).unwrap().len();
        assert_eq!(on_disk, summary.bytes);
    }

    #[test]
    fn dropped_builder_removes_file() {
        let (dir, mut b) = builder();
        b.scalar("a", 1u8).unwrap();
        drop(b);
        assert!(!dir.path().join("out/sample.h5").exists());
    }
}
