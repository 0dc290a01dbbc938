//! HDF5 on-disk structures for writing conformance fixtures.
//!
//! Every message this crate writes has a matching parser so files can be
//! checked byte-for-byte after they are produced. The writer side targets a
//! single layout: superblock v3, v2 object headers, a compact root group
//! that tracks link creation order, contiguous datasets and at most one
//! global heap collection.
//!
//! It supports `no_std` environments with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod checksum;
pub mod data_layout;
pub mod dataspace;
pub mod datatype;
pub mod error;
pub mod file_writer;
pub mod global_heap;
pub mod group_info;
pub mod link_info;
pub mod link_message;
pub mod message_type;
pub mod object_header;
pub mod object_header_writer;
pub mod raw_data;
pub mod reference;
pub mod selection;
pub mod superblock;
pub mod vl_data;

/// Size in bytes of file addresses written by this crate.
pub const OFFSET_SIZE: u8 = 8;
/// Size in bytes of lengths written by this crate.
pub const LENGTH_SIZE: u8 = 8;
/// The undefined address (all bits set).
pub const UNDEF_ADDR: u64 = u64::MAX;
