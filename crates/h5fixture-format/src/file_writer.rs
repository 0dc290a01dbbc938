//! HDF5 file image assembly.
//!
//! Produces a complete file with a v3 superblock, a compact root group whose
//! links track creation order, one v2 object header per dataset, an optional
//! global heap collection and contiguous raw data. Addresses embedded in
//! element data are recorded as fixups and patched once the layout is known.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec, vec::Vec};

use crate::data_layout::{fill_value_message, ContiguousLayout};
use crate::dataspace::Dataspace;
use crate::datatype::Datatype;
use crate::error::FormatError;
use crate::global_heap::GlobalHeapWriter;
use crate::group_info::GroupInfoMessage;
use crate::link_info::LinkInfoMessage;
use crate::link_message::LinkMessage;
use crate::message_type::MessageType;
use crate::object_header_writer::{ObjectHeaderWriter, MSG_FLAG_CONSTANT};
use crate::raw_data::{AddressTarget, DatasetId, RawData};
use crate::superblock::{Superblock, SUPERBLOCK_SIZE};

struct PendingDataset {
    name: String,
    datatype: Datatype,
    dataspace: Dataspace,
    data: RawData,
}

/// Placement of the file's parts, computed before anything is encoded.
struct Layout {
    root_address: u64,
    header_addresses: Vec<u64>,
    heap_address: Option<u64>,
    data_addresses: Vec<Option<u64>>,
    eof: u64,
}

impl Layout {
    fn resolve(&self, target: AddressTarget) -> Result<u64, FormatError> {
        match target {
            AddressTarget::GlobalHeap => self.heap_address.ok_or(FormatError::MissingGlobalHeap),
            AddressTarget::Dataset(DatasetId(i)) => self
                .header_addresses
                .get(i)
                .copied()
                .ok_or(FormatError::UnknownDataset(i)),
        }
    }
}

/// Builds an HDF5 file in memory, root-level datasets only.
#[derive(Default)]
pub struct FileWriter {
    datasets: Vec<PendingDataset>,
    heap: GlobalHeapWriter,
}

impl FileWriter {
    /// A writer whose root group tracks and indexes link creation order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of datasets added so far.
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.datasets.iter().any(|d| d.name == name)
    }

    /// Add a dataset under the root group.
    ///
    /// `data` must hold exactly `num_elements * type_size` bytes; a null
    /// dataspace takes no data.
    pub fn add_dataset(
        &mut self,
        name: &str,
        datatype: Datatype,
        dataspace: Dataspace,
        data: RawData,
    ) -> Result<DatasetId, FormatError> {
        if self.contains(name) {
            return Err(FormatError::DuplicateLinkName(name.into()));
        }
        let expected = dataspace.num_elements() * u64::from(datatype.type_size());
        if data.len() as u64 != expected {
            return Err(FormatError::DataSizeMismatch {
                expected,
                actual: data.len() as u64,
            });
        }
        let id = DatasetId(self.datasets.len());
        self.datasets.push(PendingDataset {
            name: name.into(),
            datatype,
            dataspace,
            data,
        });
        Ok(id)
    }

    /// Store an object in the file's global heap collection.
    pub fn insert_heap_object(&mut self, object: RawData) -> Result<u16, FormatError> {
        self.heap.insert(object)
    }

    pub fn heap(&self) -> &GlobalHeapWriter {
        &self.heap
    }

    fn root_header(&self, header_addresses: &[u64]) -> ObjectHeaderWriter {
        let mut w = ObjectHeaderWriter::new();
        let count = self.datasets.len();
        w.add_message(MessageType::LinkInfo, LinkInfoMessage::tracked(count as u64).serialize());
        w.add_message(MessageType::GroupInfo, GroupInfoMessage::compact_for(count).serialize());
        for (i, d) in self.datasets.iter().enumerate() {
            let link = LinkMessage::hard(&d.name, header_addresses[i], Some(i as u64));
            w.add_message(MessageType::Link, link.serialize());
        }
        w
    }

    fn dataset_header(d: &PendingDataset, layout: ContiguousLayout) -> ObjectHeaderWriter {
        let mut w = ObjectHeaderWriter::new();
        w.add_message_with_flags(MessageType::Datatype, d.datatype.serialize(), MSG_FLAG_CONSTANT);
        w.add_message(MessageType::Dataspace, d.dataspace.serialize());
        w.add_message_with_flags(MessageType::FillValue, fill_value_message(), MSG_FLAG_CONSTANT);
        w.add_message(MessageType::DataLayout, layout.serialize());
        w
    }

    fn data_layout(d: &PendingDataset, address: Option<u64>) -> ContiguousLayout {
        match address {
            Some(address) => ContiguousLayout {
                address: Some(address),
                size: d.data.len() as u64,
            },
            None => ContiguousLayout::unallocated(),
        }
    }

    /// Header sizes do not depend on the addresses they contain, so a
    /// single sizing pass fixes every address.
    fn plan(&self) -> Layout {
        let dummy = vec![0u64; self.datasets.len()];
        let root_len = self.root_header(&dummy).encoded_len();
        let mut cursor = (SUPERBLOCK_SIZE + root_len) as u64;

        let mut header_addresses = Vec::with_capacity(self.datasets.len());
        for d in &self.datasets {
            header_addresses.push(cursor);
            let sizing = Self::data_layout(d, (!d.data.is_empty()).then_some(0));
            cursor += Self::dataset_header(d, sizing).encoded_len() as u64;
        }

        let heap_address = if self.heap.is_empty() {
            None
        } else {
            let addr = cursor;
            cursor += self.heap.encoded_len() as u64;
            Some(addr)
        };

        let mut data_addresses = Vec::with_capacity(self.datasets.len());
        for d in &self.datasets {
            if d.data.is_empty() {
                data_addresses.push(None);
            } else {
                data_addresses.push(Some(cursor));
                cursor += d.data.len() as u64;
            }
        }

        Layout {
            root_address: SUPERBLOCK_SIZE as u64,
            header_addresses,
            heap_address,
            data_addresses,
            eof: cursor,
        }
    }

    /// Lay out and encode the whole file.
    pub fn finish(self) -> Result<Vec<u8>, FormatError> {
        let layout = self.plan();
        let mut buf = Vec::with_capacity(layout.eof as usize);

        buf.extend_from_slice(&Superblock::v3(layout.root_address, layout.eof).serialize());
        buf.extend_from_slice(&self.root_header(&layout.header_addresses).serialize()?);
        for (d, &addr) in self.datasets.iter().zip(&layout.data_addresses) {
            buf.extend_from_slice(&Self::dataset_header(d, Self::data_layout(d, addr)).serialize()?);
        }
        if layout.heap_address.is_some() {
            buf.extend_from_slice(&self.heap.serialize(|t| layout.resolve(t))?);
        }
        for d in &self.datasets {
            buf.extend_from_slice(&d.data.resolve(|t| layout.resolve(t))?);
        }

        debug_assert_eq!(buf.len() as u64, layout.eof);
        Ok(buf)
    }
}
