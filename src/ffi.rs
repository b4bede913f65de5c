use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    TagWriter, WriteOutcome,
    builder::{BuildError, MessageBuilder, MessageConfig},
    message::NdefMessage,
    parser::DecodeError,
    tag::TagHandle,
};

/// The writer as the platform shell sees it: constructed once with the
/// write-protect choice, then handed one tag per tap callback
#[derive(Debug, uniffi::Object)]
pub struct FfiTagWriter(Mutex<TagWriter>);

#[uniffi::export]
impl FfiTagWriter {
    #[uniffi::constructor(default(write_protect = false))]
    pub fn new(write_protect: bool) -> Self {
        Self(Mutex::new(TagWriter::with_write_protect(write_protect)))
    }

    #[uniffi::method]
    pub fn handle_tag(&self, message: Arc<NdefMessage>, tag: Arc<dyn TagHandle>) -> WriteOutcome {
        self.0.lock().handle_tag(&message, tag.as_ref())
    }

    #[uniffi::method]
    pub fn check_writable(&self, tag: Arc<dyn TagHandle>) -> bool {
        self.0.lock().check_writable(tag.as_ref())
    }

    #[uniffi::method]
    pub fn write(&self, message: Arc<NdefMessage>, tag: Arc<dyn TagHandle>) -> WriteOutcome {
        self.0.lock().write(&message, tag.as_ref())
    }

    #[uniffi::method]
    pub fn is_supported(&self, capabilities: Vec<String>) -> bool {
        crate::is_supported(&capabilities)
    }
}

#[uniffi::export]
pub fn default_message_config() -> MessageConfig {
    MessageConfig::new()
}

#[uniffi::export]
pub fn build_message(config: MessageConfig) -> Result<Arc<NdefMessage>, BuildError> {
    MessageBuilder::with_config(config).build().map(Arc::new)
}

#[uniffi::export]
pub fn decode_message(bytes: Vec<u8>) -> Result<Arc<NdefMessage>, DecodeError> {
    crate::parser::decode_message(&bytes).map(Arc::new)
}

#[uniffi::export]
pub fn write_outcome_succeeded(outcome: WriteOutcome) -> bool {
    outcome.succeeded()
}

#[uniffi::export]
pub fn write_outcome_detail(outcome: WriteOutcome) -> String {
    outcome.detail()
}
