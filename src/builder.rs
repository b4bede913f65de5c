use crate::{
    impl_default_for,
    message::{NdefMessage, NdefMessageError},
    record::NdefRecord,
};

/// What goes on the tag: an external record carrying a one byte marker
/// followed by an ASCII identifier, plus an optional application record
/// naming a companion app. The marker byte and record type are plain
/// configuration, nothing downstream assigns meaning to them.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct MessageConfig {
    pub domain: String,
    pub record_type: String,
    pub identifier: String,
    #[uniffi(default = 1)]
    pub marker_byte: u8,
    #[uniffi(default = None)]
    pub companion_package: Option<String>,
}

impl_default_for!(MessageConfig);

impl MessageConfig {
    pub fn new() -> Self {
        Self {
            domain: "com.example.tapwrite".to_string(),
            record_type: "tag".to_string(),
            identifier: "hello tag".to_string(),
            marker_byte: 0x01,
            companion_package: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, uniffi::Error)]
pub enum BuildError {
    #[error("identifier must be ASCII text")]
    IdentifierNotAscii,

    #[error("invalid message: {reason}")]
    InvalidMessage { reason: String },
}

impl From<NdefMessageError> for BuildError {
    fn from(error: NdefMessageError) -> Self {
        Self::InvalidMessage {
            reason: error.to_string(),
        }
    }
}

pub type Error = BuildError;
type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBuilder {
    config: MessageConfig,
}

impl_default_for!(MessageBuilder);

impl MessageBuilder {
    pub fn new() -> Self {
        Self::with_config(MessageConfig::new())
    }

    pub fn with_config(config: MessageConfig) -> Self {
        Self { config }
    }

    /// Build the message to write; pure and deterministic given the config
    pub fn build(&self) -> Result<NdefMessage> {
        let config = &self.config;

        if !config.identifier.is_ascii() {
            return Err(BuildError::IdentifierNotAscii);
        }

        let mut payload = Vec::with_capacity(1 + config.identifier.len());
        payload.push(config.marker_byte);
        payload.extend_from_slice(config.identifier.as_bytes());

        let mut records = vec![NdefRecord::external(
            &config.domain,
            &config.record_type,
            payload,
        )];

        if let Some(package) = &config.companion_package {
            records.push(NdefRecord::application(package));
        }

        Ok(NdefMessage::try_new(records)?)
    }
}
