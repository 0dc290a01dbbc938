//! Minimal fixture reader built from the format crate's parsers.

#![allow(dead_code)]

use std::path::Path;

use h5fixture_format::data_layout::ContiguousLayout;
use h5fixture_format::dataspace::Dataspace;
use h5fixture_format::datatype::Datatype;
use h5fixture_format::global_heap::GlobalHeapCollection;
use h5fixture_format::link_info::LinkInfoMessage;
use h5fixture_format::link_message::LinkMessage;
use h5fixture_format::message_type::MessageType;
use h5fixture_format::object_header::ObjectHeader;
use h5fixture_format::superblock::Superblock;
use h5fixture_format::vl_data::VlElement;

/// A dataset's metadata as stored in its object header.
#[derive(Debug)]
pub struct DatasetView {
    pub address: u64,
    pub datatype: Datatype,
    pub dataspace: Dataspace,
    pub layout: ContiguousLayout,
}

pub struct Fixture {
    pub bytes: Vec<u8>,
    pub superblock: Superblock,
    pub link_info: LinkInfoMessage,
    pub links: Vec<LinkMessage>,
}

impl Fixture {
    pub fn open(path: &Path) -> Fixture {
        Fixture::from_bytes(std::fs::read(path).unwrap())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Fixture {
        let superblock = Superblock::parse(&bytes).unwrap();
        assert_eq!(superblock.eof_address, bytes.len() as u64);
        let root = ObjectHeader::parse(&bytes, superblock.root_group_address as usize).unwrap();
        let link_info =
            LinkInfoMessage::parse(&root.find(MessageType::LinkInfo).unwrap().data).unwrap();
        let links = root
            .find_all(MessageType::Link)
            .map(|m| LinkMessage::parse(&m.data).unwrap())
            .collect();
        Fixture {
            bytes,
            superblock,
            link_info,
            links,
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.links.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn address_of(&self, name: &str) -> u64 {
        self.links
            .iter()
            .find(|l| l.name == name)
            .unwrap_or_else(|| panic!("no link {name}"))
            .object_header_address
    }

    pub fn dataset(&self, name: &str) -> DatasetView {
        let address = self.address_of(name);
        let oh = ObjectHeader::parse(&self.bytes, address as usize).unwrap();
        let (datatype, _) = Datatype::parse(&oh.find(MessageType::Datatype).unwrap().data).unwrap();
        let dataspace = Dataspace::parse(&oh.find(MessageType::Dataspace).unwrap().data).unwrap();
        let layout = ContiguousLayout::parse(&oh.find(MessageType::DataLayout).unwrap().data).unwrap();
        DatasetView {
            address,
            datatype,
            dataspace,
            layout,
        }
    }

    /// Raw element bytes of a dataset.
    pub fn raw(&self, name: &str) -> &[u8] {
        let layout = self.dataset(name).layout;
        match layout.address {
            Some(addr) => &self.bytes[addr as usize..(addr + layout.size) as usize],
            None => &[],
        }
    }

    /// Payload of the VL element at `offset` within `raw`.
    pub fn vl_payload(&self, raw: &[u8], offset: usize) -> (u32, Vec<u8>) {
        let elem = VlElement::parse(raw, offset).unwrap();
        let data = self.heap_object(elem.collection_address, elem.object_index as u16);
        (elem.length, data)
    }

    pub fn heap_object(&self, collection_address: u64, index: u16) -> Vec<u8> {
        let heap = GlobalHeapCollection::parse(&self.bytes, collection_address as usize).unwrap();
        heap.get(collection_address, index).unwrap().data.clone()
    }
}
