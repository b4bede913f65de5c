use tracing::{debug, info, warn};

use crate::{
    message::NdefMessage,
    tag::{NdefInterface, TagHandle, TagTechnology, TransportError},
};

uniffi::setup_scaffolding!();

pub mod builder;
pub mod ffi;
pub mod header;
pub mod macros;
pub mod message;
pub mod ndef_type;
pub mod parser;
pub mod payload;
pub mod record;
pub mod tag;

/// Outcome of one write attempt; every failure is terminal, the user retries
/// by re-tapping, which starts over with a fresh tag handle
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum WriteOutcome {
    /// Wrote to an already formatted tag
    Wrote,

    /// Formatted an unformatted tag and wrote the message in one step
    FormattedAndWrote,

    Failed { reason: WriteFailure },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, uniffi::Enum)]
pub enum WriteFailure {
    #[error("This tag type is not supported")]
    UnsupportedTag,

    #[error("Tag is read-only")]
    ReadOnly,

    #[error("Tag capacity is {max} bytes, message is {size} bytes.")]
    CapacityExceeded { max: u32, size: u32 },

    #[error("Failed to format tag.")]
    FormatFailed,

    #[error("Tag doesn't support NDEF.")]
    NdefUnsupported,

    #[error("Failed to write tag")]
    Transport,
}

impl WriteOutcome {
    pub fn succeeded(&self) -> bool {
        !matches!(self, WriteOutcome::Failed { .. })
    }

    pub fn detail(&self) -> String {
        match self {
            WriteOutcome::Wrote => "Wrote message to pre-formatted tag.".to_string(),
            WriteOutcome::FormattedAndWrote => "Formatted tag and wrote message".to_string(),
            WriteOutcome::Failed { reason } => reason.to_string(),
        }
    }
}

/// True only when the tag reports an ultralight class memory technology, an
/// NFC-A class radio technology, and NDEF or NDEF-formatable support.
/// Unrecognized names match nothing; an empty list is unsupported.
pub fn is_supported(capabilities: &[String]) -> bool {
    let mut ultralight = false;
    let mut nfc_a = false;
    let mut ndef = false;

    for capability in capabilities {
        match capability.parse::<TagTechnology>() {
            Ok(TagTechnology::Ultralight) => ultralight = true,
            Ok(TagTechnology::NfcA) => nfc_a = true,
            Ok(TagTechnology::Ndef | TagTechnology::NdefFormatable) => ndef = true,
            Err(_) => {}
        }
    }

    ultralight && nfc_a && ndef
}

/// Decides whether a tapped tag can take a message and writes it.
/// Borrows the tag handle for one operation, holds no state across taps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagWriter {
    write_protect: bool,
}

crate::impl_default_for!(TagWriter);

impl TagWriter {
    pub fn new() -> Self {
        Self {
            write_protect: false,
        }
    }

    /// A writer that permanently locks the tag after a successful write
    pub fn with_write_protect(write_protect: bool) -> Self {
        Self { write_protect }
    }

    /// The per tap pipeline: capability check, writability check, write.
    /// Linear and terminal on the first failure, no retries.
    pub fn handle_tag(&self, message: &NdefMessage, tag: &dyn TagHandle) -> WriteOutcome {
        if !is_supported(&tag.probe_capabilities()) {
            debug!("tag technologies not supported");
            return WriteOutcome::Failed {
                reason: WriteFailure::UnsupportedTag,
            };
        }

        if !self.check_writable(tag) {
            return WriteOutcome::Failed {
                reason: WriteFailure::ReadOnly,
            };
        }

        self.write(message, tag)
    }

    /// Probe whether the tag will accept a write. The session is released on
    /// every exit path. A tag that only offers a formatable interface reports
    /// writable; the format attempt is what decides it.
    pub fn check_writable(&self, tag: &dyn TagHandle) -> bool {
        let Some(ndef) = tag.ndef_interface() else {
            return tag.formatable_interface().is_some();
        };

        let writable = match ndef.connect() {
            Ok(()) => {
                let writable = ndef.is_writable();
                if !writable {
                    info!("tag is read-only");
                }
                writable
            }
            Err(error) => {
                warn!("writability probe could not connect: {error}");
                false
            }
        };

        release_ndef(ndef.as_ref());
        writable
    }

    /// Write the message to the tag, formatting first when the tag only
    /// offers a formatable interface. Unexpected transport errors never
    /// escape; they become a generic failed outcome.
    pub fn write(&self, message: &NdefMessage, tag: &dyn TagHandle) -> WriteOutcome {
        let bytes = message.to_bytes();
        debug!(size = bytes.len(), "writing ndef message");

        match self.write_bytes(&bytes, tag) {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!("tag transport failed: {error}");
                WriteOutcome::Failed {
                    reason: WriteFailure::Transport,
                }
            }
        }
    }

    fn write_bytes(&self, bytes: &[u8], tag: &dyn TagHandle) -> Result<WriteOutcome, TransportError> {
        if let Some(ndef) = tag.ndef_interface() {
            let result = ndef
                .connect()
                .and_then(|()| self.write_formatted(ndef.as_ref(), bytes));

            release_ndef(ndef.as_ref());
            return result;
        }

        if let Some(formatable) = tag.formatable_interface() {
            let result = formatable
                .connect()
                .and_then(|()| formatable.format_and_write(bytes.to_vec()));

            if let Err(error) = formatable.close() {
                warn!("failed to release tag session: {error}");
            }

            let outcome = match result {
                Ok(()) => WriteOutcome::FormattedAndWrote,
                Err(error) => {
                    warn!("failed to format tag: {error}");
                    WriteOutcome::Failed {
                        reason: WriteFailure::FormatFailed,
                    }
                }
            };

            return Ok(outcome);
        }

        Ok(WriteOutcome::Failed {
            reason: WriteFailure::NdefUnsupported,
        })
    }

    fn write_formatted(
        &self,
        ndef: &dyn NdefInterface,
        bytes: &[u8],
    ) -> Result<WriteOutcome, TransportError> {
        if !ndef.is_writable() {
            return Ok(WriteOutcome::Failed {
                reason: WriteFailure::ReadOnly,
            });
        }

        let max = ndef.max_payload_bytes();
        let size = bytes.len() as u32;

        // capacity gate comes before the write, a known overflow is never sent
        if max < size {
            return Ok(WriteOutcome::Failed {
                reason: WriteFailure::CapacityExceeded { max, size },
            });
        }

        ndef.write_message(bytes.to_vec())?;

        if self.write_protect {
            ndef.lock()?;
            info!("tag permanently write protected");
        }

        Ok(WriteOutcome::Wrote)
    }
}

fn release_ndef(ndef: &dyn NdefInterface) {
    if let Err(error) = ndef.close() {
        warn!("failed to release tag session: {error}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{builder::MessageBuilder, tag::FormatableInterface};

    #[derive(Debug, Default)]
    struct FakeNdef {
        writable: bool,
        capacity: u32,
        connect_error: bool,
        write_error: bool,
        lock_error: bool,
        events: Mutex<Vec<&'static str>>,
    }

    impl FakeNdef {
        fn writable(capacity: u32) -> Arc<Self> {
            Arc::new(Self {
                writable: true,
                capacity,
                ..Self::default()
            })
        }

        fn events(&self) -> Vec<&'static str> {
            self.events.lock().clone()
        }
    }

    impl NdefInterface for FakeNdef {
        fn connect(&self) -> Result<(), TransportError> {
            self.events.lock().push("connect");

            if self.connect_error {
                return Err(TransportError::Connection {
                    reason: "no response".to_string(),
                });
            }

            Ok(())
        }

        fn is_writable(&self) -> bool {
            self.writable
        }

        fn max_payload_bytes(&self) -> u32 {
            self.capacity
        }

        fn write_message(&self, _bytes: Vec<u8>) -> Result<(), TransportError> {
            self.events.lock().push("write");

            if self.write_error {
                return Err(TransportError::Io {
                    reason: "write rejected".to_string(),
                });
            }

            Ok(())
        }

        fn lock(&self) -> Result<(), TransportError> {
            self.events.lock().push("lock");

            if self.lock_error {
                return Err(TransportError::Io {
                    reason: "lock rejected".to_string(),
                });
            }

            Ok(())
        }

        fn close(&self) -> Result<(), TransportError> {
            self.events.lock().push("close");
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct FakeFormatable {
        format_error: bool,
        events: Mutex<Vec<&'static str>>,
    }

    impl FakeFormatable {
        fn events(&self) -> Vec<&'static str> {
            self.events.lock().clone()
        }
    }

    impl FormatableInterface for FakeFormatable {
        fn connect(&self) -> Result<(), TransportError> {
            self.events.lock().push("connect");
            Ok(())
        }

        fn format_and_write(&self, _bytes: Vec<u8>) -> Result<(), TransportError> {
            self.events.lock().push("format");

            if self.format_error {
                return Err(TransportError::Io {
                    reason: "format rejected".to_string(),
                });
            }

            Ok(())
        }

        fn close(&self) -> Result<(), TransportError> {
            self.events.lock().push("close");
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct FakeTag {
        technologies: Vec<String>,
        ndef: Option<Arc<FakeNdef>>,
        formatable: Option<Arc<FakeFormatable>>,
    }

    impl FakeTag {
        fn with_ndef(ndef: Arc<FakeNdef>) -> Self {
            Self {
                technologies: supported_technologies(),
                ndef: Some(ndef),
                formatable: None,
            }
        }

        fn with_formatable(formatable: Arc<FakeFormatable>) -> Self {
            Self {
                technologies: supported_technologies(),
                ndef: None,
                formatable: Some(formatable),
            }
        }
    }

    impl TagHandle for FakeTag {
        fn probe_capabilities(&self) -> Vec<String> {
            self.technologies.clone()
        }

        fn ndef_interface(&self) -> Option<Arc<dyn NdefInterface>> {
            self.ndef
                .clone()
                .map(|ndef| ndef as Arc<dyn NdefInterface>)
        }

        fn formatable_interface(&self) -> Option<Arc<dyn FormatableInterface>> {
            self.formatable
                .clone()
                .map(|formatable| formatable as Arc<dyn FormatableInterface>)
        }
    }

    fn supported_technologies() -> Vec<String> {
        vec![
            "android.nfc.tech.MifareUltralight".to_string(),
            "android.nfc.tech.NfcA".to_string(),
            "android.nfc.tech.Ndef".to_string(),
        ]
    }

    fn message() -> NdefMessage {
        MessageBuilder::new().build().unwrap()
    }

    fn techs(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn supported_needs_all_three_technology_buckets() {
        assert!(is_supported(&supported_technologies()));
        assert!(is_supported(&techs(&["ultralight", "nfc-a", "ndef-formatable"])));

        // any one bucket missing fails
        assert!(!is_supported(&techs(&["nfc-a", "ndef"])));
        assert!(!is_supported(&techs(&["ultralight", "ndef"])));
        assert!(!is_supported(&techs(&["ultralight", "nfc-a"])));
        assert!(!is_supported(&[]));
    }

    #[test]
    fn unrecognized_technologies_are_ignored_not_errors() {
        assert!(is_supported(&techs(&[
            "android.nfc.tech.IsoDep",
            "ultralight",
            "nfc-a",
            "ndef",
            "???",
        ])));

        assert!(!is_supported(&techs(&["android.nfc.tech.IsoDep", "???"])));
    }

    #[test]
    fn read_only_tag_is_rejected_before_writing() {
        let ndef = Arc::new(FakeNdef {
            writable: false,
            capacity: 1024,
            ..FakeNdef::default()
        });
        let tag = FakeTag::with_ndef(ndef.clone());

        let outcome = TagWriter::new().write(&message(), &tag);

        assert_eq!(
            outcome,
            WriteOutcome::Failed {
                reason: WriteFailure::ReadOnly
            }
        );
        assert_eq!(outcome.detail(), "Tag is read-only");
        assert_eq!(ndef.events(), vec!["connect", "close"]);
    }

    #[test]
    fn capacity_check_precedes_the_write() {
        let ndef = FakeNdef::writable(8);
        let tag = FakeTag::with_ndef(ndef.clone());
        let message = message();
        let size = message.serialized_len() as u32;

        let outcome = TagWriter::new().write(&message, &tag);

        assert_eq!(
            outcome,
            WriteOutcome::Failed {
                reason: WriteFailure::CapacityExceeded { max: 8, size }
            }
        );
        assert_eq!(
            outcome.detail(),
            format!("Tag capacity is 8 bytes, message is {size} bytes.")
        );

        // the write never reached the tag, the session was still released
        assert_eq!(ndef.events(), vec!["connect", "close"]);
    }

    #[test]
    fn successful_write_never_locks_without_write_protect() {
        let ndef = FakeNdef::writable(1024);
        let tag = FakeTag::with_ndef(ndef.clone());

        let outcome = TagWriter::new().write(&message(), &tag);

        assert_eq!(outcome, WriteOutcome::Wrote);
        assert_eq!(outcome.detail(), "Wrote message to pre-formatted tag.");
        assert_eq!(ndef.events(), vec!["connect", "write", "close"]);
    }

    #[test]
    fn write_protect_locks_exactly_once_after_the_write() {
        let ndef = FakeNdef::writable(1024);
        let tag = FakeTag::with_ndef(ndef.clone());

        let outcome = TagWriter::with_write_protect(true).write(&message(), &tag);

        assert_eq!(outcome, WriteOutcome::Wrote);
        assert_eq!(ndef.events(), vec!["connect", "write", "lock", "close"]);
    }

    #[test]
    fn formatable_tag_is_formatted_and_written() {
        let formatable = Arc::new(FakeFormatable::default());
        let tag = FakeTag::with_formatable(formatable.clone());

        let outcome = TagWriter::new().write(&message(), &tag);

        assert_eq!(outcome, WriteOutcome::FormattedAndWrote);
        assert_eq!(outcome.detail(), "Formatted tag and wrote message");
        assert_eq!(formatable.events(), vec!["connect", "format", "close"]);
    }

    #[test]
    fn format_failure_reports_and_releases() {
        let formatable = Arc::new(FakeFormatable {
            format_error: true,
            ..FakeFormatable::default()
        });
        let tag = FakeTag::with_formatable(formatable.clone());

        let outcome = TagWriter::new().write(&message(), &tag);

        assert_eq!(
            outcome,
            WriteOutcome::Failed {
                reason: WriteFailure::FormatFailed
            }
        );
        assert_eq!(outcome.detail(), "Failed to format tag.");
        assert_eq!(formatable.events(), vec!["connect", "format", "close"]);
    }

    #[test]
    fn tag_with_neither_interface_is_unsupported() {
        let tag = FakeTag {
            technologies: supported_technologies(),
            ndef: None,
            formatable: None,
        };

        let outcome = TagWriter::new().write(&message(), &tag);

        assert_eq!(
            outcome,
            WriteOutcome::Failed {
                reason: WriteFailure::NdefUnsupported
            }
        );
        assert_eq!(outcome.detail(), "Tag doesn't support NDEF.");
    }

    #[test]
    fn transport_error_during_write_becomes_generic_failure() {
        let ndef = Arc::new(FakeNdef {
            writable: true,
            capacity: 1024,
            write_error: true,
            ..FakeNdef::default()
        });
        let tag = FakeTag::with_ndef(ndef.clone());

        let outcome = TagWriter::new().write(&message(), &tag);

        assert_eq!(
            outcome,
            WriteOutcome::Failed {
                reason: WriteFailure::Transport
            }
        );
        assert_eq!(outcome.detail(), "Failed to write tag");
        assert_eq!(ndef.events(), vec!["connect", "write", "close"]);
    }

    #[test]
    fn connect_failure_still_releases_the_session() {
        let ndef = Arc::new(FakeNdef {
            writable: true,
            capacity: 1024,
            connect_error: true,
            ..FakeNdef::default()
        });
        let tag = FakeTag::with_ndef(ndef.clone());

        let outcome = TagWriter::new().write(&message(), &tag);

        assert_eq!(
            outcome,
            WriteOutcome::Failed {
                reason: WriteFailure::Transport
            }
        );
        assert_eq!(ndef.events(), vec!["connect", "close"]);
    }

    #[test]
    fn lock_failure_surfaces_as_transport_failure() {
        let ndef = Arc::new(FakeNdef {
            writable: true,
            capacity: 1024,
            lock_error: true,
            ..FakeNdef::default()
        });
        let tag = FakeTag::with_ndef(ndef.clone());

        let outcome = TagWriter::with_write_protect(true).write(&message(), &tag);

        assert_eq!(
            outcome,
            WriteOutcome::Failed {
                reason: WriteFailure::Transport
            }
        );
        assert_eq!(ndef.events(), vec!["connect", "write", "lock", "close"]);
    }

    #[test]
    fn check_writable_releases_on_every_path() {
        let writable = FakeNdef::writable(1024);
        let tag = FakeTag::with_ndef(writable.clone());
        assert!(TagWriter::new().check_writable(&tag));
        assert_eq!(writable.events(), vec!["connect", "close"]);

        let read_only = Arc::new(FakeNdef {
            capacity: 1024,
            ..FakeNdef::default()
        });
        let tag = FakeTag::with_ndef(read_only.clone());
        assert!(!TagWriter::new().check_writable(&tag));
        assert_eq!(read_only.events(), vec!["connect", "close"]);

        let unreachable = Arc::new(FakeNdef {
            connect_error: true,
            ..FakeNdef::default()
        });
        let tag = FakeTag::with_ndef(unreachable.clone());
        assert!(!TagWriter::new().check_writable(&tag));
        assert_eq!(unreachable.events(), vec!["connect", "close"]);
    }

    #[test]
    fn check_writable_trusts_a_format_only_tag() {
        let tag = FakeTag::with_formatable(Arc::new(FakeFormatable::default()));
        assert!(TagWriter::new().check_writable(&tag));

        let bare = FakeTag {
            technologies: supported_technologies(),
            ndef: None,
            formatable: None,
        };
        assert!(!TagWriter::new().check_writable(&bare));
    }

    #[test]
    fn pipeline_rejects_unsupported_tags_without_touching_them() {
        let ndef = FakeNdef::writable(1024);
        let tag = FakeTag {
            technologies: techs(&["android.nfc.tech.NfcA", "android.nfc.tech.Ndef"]),
            ndef: Some(ndef.clone()),
            formatable: None,
        };

        let outcome = TagWriter::new().handle_tag(&message(), &tag);

        assert_eq!(
            outcome,
            WriteOutcome::Failed {
                reason: WriteFailure::UnsupportedTag
            }
        );
        assert_eq!(outcome.detail(), "This tag type is not supported");
        assert!(ndef.events().is_empty());
    }

    #[test]
    fn pipeline_writes_a_supported_writable_tag() {
        let ndef = FakeNdef::writable(1024);
        let tag = FakeTag::with_ndef(ndef.clone());

        let outcome = TagWriter::new().handle_tag(&message(), &tag);

        assert_eq!(outcome, WriteOutcome::Wrote);
        assert!(outcome.succeeded());

        // writability probe session, then the write session
        assert_eq!(
            ndef.events(),
            vec!["connect", "close", "connect", "write", "close"]
        );
    }
}
