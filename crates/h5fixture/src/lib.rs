//! Deterministic builder for the `sample.h5` HDF5 conformance fixture.
//!
//! The fixture exercises every HDF5 datatype class in its empty, scalar and
//! N-dimensional variants, with native and big-endian byte orders and the
//! boundary values readers most often get wrong.
//!
//! # Example
//!
//! ```no_run
//! use h5fixture::{FixtureBuilder, FixtureConfig};
//!
//! let mut builder = FixtureBuilder::create(FixtureConfig::new("dist/sample.h5")).unwrap();
//! builder.scalar("int8", i8::MIN).unwrap();
//! builder.array("int8", vec![vec![0i8, 1, 2], vec![3, 4, 5]]).unwrap();
//! builder.create_reference("reference", "int8_2D", None).unwrap();
//! builder.finish().unwrap();
//! ```
//!
//! [`matrix::build`] writes the complete fixture.

pub mod builder;
pub mod config;
pub mod container;
mod encode;
pub mod error;
pub mod matrix;
pub mod naming;
pub mod types;
pub mod value;

pub use builder::{Entry, EntryHandle, FixtureBuilder, FixtureSummary, Region};
pub use config::{FixtureConfig, DEFAULT_OUTPUT};
pub use error::{FixtureError, Result, ValueError};
pub use matrix::build;
pub use naming::Variant;
pub use types::{CompoundSchema, ElementType, Encoding, EnumSchema, FloatKind, IntKind, TypeClass};
pub use value::{NativeArray, NativeValue, Real, Value};

pub use h5fixture_format::datatype::CharacterSet;
