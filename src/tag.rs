use std::sync::Arc;

/// Tag technologies the writer cares about. Platform reported names and the
/// short spellings both parse; anything else is simply not one of these.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString, uniffi::Enum,
)]
#[strum(ascii_case_insensitive)]
pub enum TagTechnology {
    #[strum(
        to_string = "ultralight",
        serialize = "mifare-ultralight",
        serialize = "android.nfc.tech.MifareUltralight"
    )]
    Ultralight,

    #[strum(
        to_string = "nfc-a",
        serialize = "nfca",
        serialize = "android.nfc.tech.NfcA"
    )]
    NfcA,

    #[strum(to_string = "ndef", serialize = "android.nfc.tech.Ndef")]
    Ndef,

    #[strum(
        to_string = "ndef-formatable",
        serialize = "android.nfc.tech.NdefFormatable"
    )]
    NdefFormatable,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, uniffi::Error)]
pub enum TransportError {
    #[error("tag connection failed: {reason}")]
    Connection { reason: String },

    #[error("tag i/o failed: {reason}")]
    Io { reason: String },
}

/// One physically tapped tag. Owned by the discovery collaborator and only
/// valid for the duration of a single tap callback.
#[uniffi::export(with_foreign)]
pub trait TagHandle: Send + Sync {
    /// Technology names the tag reports, in the platform's spelling
    fn probe_capabilities(&self) -> Vec<String>;

    /// Read/write session over an already NDEF formatted tag, if the tag has one
    fn ndef_interface(&self) -> Option<Arc<dyn NdefInterface>>;

    /// First-format session for a tag that only supports being formatted
    fn formatable_interface(&self) -> Option<Arc<dyn FormatableInterface>>;
}

#[uniffi::export(with_foreign)]
pub trait NdefInterface: Send + Sync {
    fn connect(&self) -> Result<(), TransportError>;

    /// Only meaningful once connected
    fn is_writable(&self) -> bool;

    /// Only meaningful once connected
    fn max_payload_bytes(&self) -> u32;

    fn write_message(&self, bytes: Vec<u8>) -> Result<(), TransportError>;

    /// Permanently converts the tag to read-only
    fn lock(&self) -> Result<(), TransportError>;

    fn close(&self) -> Result<(), TransportError>;
}

#[uniffi::export(with_foreign)]
pub trait FormatableInterface: Send + Sync {
    fn connect(&self) -> Result<(), TransportError>;

    /// Write an NDEF structure onto an unformatted tag in one step
    fn format_and_write(&self, bytes: Vec<u8>) -> Result<(), TransportError>;

    fn close(&self) -> Result<(), TransportError>;
}
