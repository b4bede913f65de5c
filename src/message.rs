use crate::record::NdefRecord;

/// An NDEF message, an ordered run of records; immutable once constructed
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Object)]
pub struct NdefMessage {
    records: Vec<NdefRecord>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error, uniffi::Error)]
pub enum NdefMessageError {
    #[error("an NDEF message needs at least one record")]
    Empty,

    #[error("record type is longer than 255 bytes")]
    TypeTooLong,

    #[error("record id is longer than 255 bytes")]
    IdTooLong,
}

pub type Error = NdefMessageError;
type Result<T, E = Error> = std::result::Result<T, E>;

#[uniffi::export]
impl NdefMessage {
    #[uniffi::constructor]
    pub fn try_new(records: Vec<NdefRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(NdefMessageError::Empty);
        }

        for record in &records {
            if record.type_.len() > u8::MAX as usize {
                return Err(NdefMessageError::TypeTooLong);
            }

            if let Some(id) = &record.id {
                if id.len() > u8::MAX as usize {
                    return Err(NdefMessageError::IdTooLong);
                }
            }
        }

        Ok(Self { records })
    }

    /// Serialize the message, begin and end flags set on the outer records
    #[uniffi::method]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_len());
        let last_index = self.records.len() - 1;

        for (index, record) in self.records.iter().enumerate() {
            record.encode_into(&mut out, index == 0, index == last_index);
        }

        out
    }

    #[uniffi::method]
    pub fn byte_len(&self) -> u64 {
        self.serialized_len() as u64
    }

    #[uniffi::method]
    pub fn record_count(&self) -> u32 {
        self.records.len() as u32
    }
}

impl NdefMessage {
    pub fn records(&self) -> &[NdefRecord] {
        &self.records
    }

    /// Serialized size in bytes, computed without encoding
    pub fn serialized_len(&self) -> usize {
        self.records.iter().map(NdefRecord::serialized_len).sum()
    }
}
