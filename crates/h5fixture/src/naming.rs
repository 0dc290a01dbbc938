//! Entry naming grammar.
//!
//! A stored name is a base, optional variant segments (`_BE`, `_nan`, ...)
//! and a suffix for the dataspace variant: `_empty`, `_scalar` or `_{R}D`.

use std::fmt;

/// Dataspace variant of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Empty,
    Scalar,
    Array(usize),
}

impl Variant {
    pub fn suffix(self) -> String {
        match self {
            Variant::Empty => "_empty".into(),
            Variant::Scalar => "_scalar".into(),
            Variant::Array(rank) => format!("_{rank}D"),
        }
    }

    /// The variant a stored name ends with, if any.
    pub fn of_name(name: &str) -> Option<Variant> {
        if name.ends_with("_empty") {
            return Some(Variant::Empty);
        }
        if name.ends_with("_scalar") {
            return Some(Variant::Scalar);
        }
        let stem = name.strip_suffix('D')?;
        let digits = &stem[stem.rfind('_')? + 1..];
        match digits.parse::<usize>() {
            Ok(rank) if rank > 0 && !digits.starts_with('0') => Some(Variant::Array(rank)),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Empty => f.write_str("empty"),
            Variant::Scalar => f.write_str("scalar"),
            Variant::Array(rank) => write!(f, "{rank}D array"),
        }
    }
}

/// Name segment marking a byte-order or special-value variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    BigEndian,
    Nan,
    Inf,
    NegInf,
    Zero,
    NegZero,
    Pi,
    False,
    True,
    NotATime,
    Region,
}

impl Segment {
    pub fn as_str(self) -> &'static str {
        match self {
            Segment::BigEndian => "BE",
            Segment::Nan => "nan",
            Segment::Inf => "inf",
            Segment::NegInf => "ninf",
            Segment::Zero => "zero",
            Segment::NegZero => "nzero",
            Segment::Pi => "pi",
            Segment::False => "false",
            Segment::True => "true",
            Segment::NotATime => "not-a-time",
            Segment::Region => "region",
        }
    }
}

/// `base` followed by `_segment` for each segment.
pub fn segmented(base: &str, segments: &[Segment]) -> String {
    let mut name = String::from(base);
    for s in segments {
        name.push('_');
        name.push_str(s.as_str());
    }
    name
}

/// The stored name of an entry.
pub fn entry_name(base: &str, variant: Variant) -> String {
    format!("{base}{}", variant.suffix())
}
