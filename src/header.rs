use crate::ndef_type::NdefType;

const MESSAGE_BEGIN: u8 = 0b1000_0000;
const MESSAGE_END: u8 = 0b0100_0000;
const CHUNKED: u8 = 0b0010_0000;
const SHORT_RECORD: u8 = 0b0001_0000;
const HAS_ID_LENGTH: u8 = 0b0000_1000;

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct NdefHeader {
    pub message_begin: bool,
    pub message_end: bool,
    pub chunked: bool,
    pub short_record: bool,
    pub has_id_length: bool,
    pub type_name_format: NdefType,
    pub type_length: u8,
    pub payload_length: u32,
    pub id_length: Option<u8>,
}

impl NdefHeader {
    pub fn flag_byte(&self) -> u8 {
        let mut byte = self.type_name_format.code();

        if self.message_begin {
            byte |= MESSAGE_BEGIN;
        }

        if self.message_end {
            byte |= MESSAGE_END;
        }

        if self.chunked {
            byte |= CHUNKED;
        }

        if self.short_record {
            byte |= SHORT_RECORD;
        }

        if self.has_id_length {
            byte |= HAS_ID_LENGTH;
        }

        byte
    }

    /// Serialized size of the header itself in bytes
    pub fn byte_len(&self) -> usize {
        let payload_length_bytes = if self.short_record { 1 } else { 4 };
        let id_length_bytes = if self.has_id_length { 1 } else { 0 };

        2 + payload_length_bytes + id_length_bytes
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.flag_byte());
        out.push(self.type_length);

        if self.short_record {
            out.push(self.payload_length as u8);
        } else {
            out.extend_from_slice(&self.payload_length.to_be_bytes());
        }

        if let Some(id_length) = self.id_length {
            out.push(id_length);
        }
    }
}
