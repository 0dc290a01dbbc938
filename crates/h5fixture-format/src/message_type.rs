//! Header message type identifiers used by fixture files.

/// Header message types written or recognized by this crate.
///
/// Version 2 object headers store the type in a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Nil,
    Dataspace,
    LinkInfo,
    Datatype,
    FillValue,
    Link,
    DataLayout,
    GroupInfo,
    ObjectHeaderContinuation,
    /// Any other message, kept with its raw type id.
    Unknown(u8),
}

impl MessageType {
    /// Raw type id as stored in a v2 header.
    pub fn code(self) -> u8 {
        match self {
            MessageType::Nil => 0x00,
            MessageType::Dataspace => 0x01,
            MessageType::LinkInfo => 0x02,
            MessageType::Datatype => 0x03,
            MessageType::FillValue => 0x05,
            MessageType::Link => 0x06,
            MessageType::DataLayout => 0x08,
            MessageType::GroupInfo => 0x0A,
            MessageType::ObjectHeaderContinuation => 0x10,
            MessageType::Unknown(v) => v,
        }
    }
}

impl From<u8> for MessageType {
    fn from(code: u8) -> Self {
        match code {
            0x00 => MessageType::Nil,
            0x01 => MessageType::Dataspace,
            0x02 => MessageType::LinkInfo,
            0x03 => MessageType::Datatype,
            0x05 => MessageType::FillValue,
            0x06 => MessageType::Link,
            0x08 => MessageType::DataLayout,
            0x0A => MessageType::GroupInfo,
            0x10 => MessageType::ObjectHeaderContinuation,
            other => MessageType::Unknown(other),
        }
    }
}
