use crate::{
    header::NdefHeader,
    ndef_type::NdefType,
    payload::{NdefPayload, TextPayload, TextPayloadFormat},
};

/// Record type of an Android application record, `android.com:pkg`
pub const APPLICATION_RECORD_TYPE: &[u8] = b"android.com:pkg";

const SHORT_RECORD_MAX: usize = u8::MAX as usize;

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct NdefRecord {
    pub type_name_format: NdefType,
    pub type_: Vec<u8>,
    pub id: Option<Vec<u8>>,
    pub payload: NdefPayload,
}

impl NdefRecord {
    /// External (domain-specific) record, typed `domain:type`
    pub fn external(domain: &str, type_: &str, payload: Vec<u8>) -> Self {
        let qualified = format!("{}:{}", domain.trim(), type_.trim()).to_lowercase();

        Self {
            type_name_format: NdefType::External,
            type_: qualified.into_bytes(),
            id: None,
            payload: NdefPayload::Data(payload),
        }
    }

    /// Record that tells the host platform which application should handle
    /// the rest of the message
    pub fn application(package: &str) -> Self {
        Self {
            type_name_format: NdefType::External,
            type_: APPLICATION_RECORD_TYPE.to_vec(),
            id: None,
            payload: NdefPayload::Data(package.as_bytes().to_vec()),
        }
    }

    pub fn text(language: &str, text: &str) -> Self {
        Self {
            type_name_format: NdefType::WellKnown,
            type_: b"T".to_vec(),
            id: None,
            payload: NdefPayload::Text(TextPayload {
                format: TextPayloadFormat::Utf8,
                language: language.to_string(),
                text: text.to_string(),
            }),
        }
    }

    pub fn uri(uri: &str) -> Self {
        Self {
            type_name_format: NdefType::WellKnown,
            type_: b"U".to_vec(),
            id: None,
            payload: NdefPayload::Uri(uri.to_string()),
        }
    }

    fn header(&self, message_begin: bool, message_end: bool) -> NdefHeader {
        let payload_length = self.payload.byte_len();

        NdefHeader {
            message_begin,
            message_end,
            chunked: false,
            short_record: payload_length <= SHORT_RECORD_MAX,
            has_id_length: self.id.is_some(),
            type_name_format: self.type_name_format,
            type_length: self.type_.len() as u8,
            payload_length: payload_length as u32,
            id_length: self.id.as_ref().map(|id| id.len() as u8),
        }
    }

    /// Serialized size of the record at any message position
    pub fn serialized_len(&self) -> usize {
        let header = self.header(false, false);
        let id_length = self.id.as_ref().map_or(0, Vec::len);

        header.byte_len() + self.type_.len() + id_length + self.payload.byte_len()
    }

    pub fn encode_into(&self, out: &mut Vec<u8>, message_begin: bool, message_end: bool) {
        self.header(message_begin, message_end).encode_into(out);
        out.extend_from_slice(&self.type_);

        if let Some(id) = &self.id {
            out.extend_from_slice(id);
        }

        out.extend_from_slice(&self.payload.to_bytes());
    }
}
