#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum NdefPayload {
    Text(TextPayload),
    Uri(String),
    Data(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct TextPayload {
    pub format: TextPayloadFormat,
    pub language: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum TextPayloadFormat {
    Utf8,
    Utf16,
}

/// URI prefix codes as defined in NFC Forum RTD URI specification
pub const URI_PREFIXES: &[&str] = &[
    "",                           // 0x00 - no prepending
    "http://www.",                // 0x01
    "https://www.",               // 0x02
    "http://",                    // 0x03
    "https://",                   // 0x04
    "tel:",                       // 0x05
    "mailto:",                    // 0x06
    "ftp://anonymous:anonymous@", // 0x07
    "ftp://ftp.",                 // 0x08
    "ftps://",                    // 0x09
    "sftp://",                    // 0x0A
    "smb://",                     // 0x0B
    "nfs://",                     // 0x0C
    "ftp://",                     // 0x0D
    "dav://",                     // 0x0E
    "news:",                      // 0x0F
    "telnet://",                  // 0x10
    "imap:",                      // 0x11
    "rtsp://",                    // 0x12
    "urn:",                       // 0x13
    "pop:",                       // 0x14
    "sip:",                       // 0x15
    "sips:",                      // 0x16
    "tftp:",                      // 0x17
    "btspp://",                   // 0x18
    "btl2cap://",                 // 0x19
    "btgoep://",                  // 0x1A
    "tcpobex://",                 // 0x1B
    "irdaobex://",                // 0x1C
    "file://",                    // 0x1D
    "urn:epc:id:",                // 0x1E
    "urn:epc:tag:",               // 0x1F
    "urn:epc:pat:",               // 0x20
    "urn:epc:raw:",               // 0x21
    "urn:epc:",                   // 0x22
    "urn:nfc:",                   // 0x23
];

/// Split a URI into its RTD URI prefix code and the remainder, picking the
/// longest matching prefix. Code 0 means the URI is stored verbatim.
pub fn compress_uri(uri: &str) -> (u8, &str) {
    let mut code = 0;
    let mut matched_len = 0;

    for (index, prefix) in URI_PREFIXES.iter().enumerate().skip(1) {
        if uri.starts_with(prefix) && prefix.len() > matched_len {
            code = index as u8;
            matched_len = prefix.len();
        }
    }

    (code, &uri[matched_len..])
}

pub fn expand_uri(code: u8, rest: &str) -> String {
    let prefix = URI_PREFIXES.get(code as usize).copied().unwrap_or("");
    format!("{prefix}{rest}")
}

impl NdefPayload {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            NdefPayload::Text(text) => text.to_bytes(),

            NdefPayload::Uri(uri) => {
                let (code, rest) = compress_uri(uri);
                let mut bytes = Vec::with_capacity(1 + rest.len());
                bytes.push(code);
                bytes.extend_from_slice(rest.as_bytes());
                bytes
            }

            NdefPayload::Data(data) => data.clone(),
        }
    }

    pub fn byte_len(&self) -> usize {
        match self {
            NdefPayload::Text(text) => 1 + text.language.len() + text.text_byte_len(),
            NdefPayload::Uri(uri) => {
                let (_code, rest) = compress_uri(uri);
                1 + rest.len()
            }
            NdefPayload::Data(data) => data.len(),
        }
    }
}

impl TextPayload {
    fn text_byte_len(&self) -> usize {
        match self.format {
            TextPayloadFormat::Utf8 => self.text.len(),
            TextPayloadFormat::Utf16 => self.text.encode_utf16().count() * 2,
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        // status byte: bit 7 = utf16, bits 5..0 = language code length
        let utf16 = matches!(self.format, TextPayloadFormat::Utf16);
        let status = (self.language.len() as u8 & 0x3F) | if utf16 { 0x80 } else { 0 };

        let mut bytes = Vec::with_capacity(1 + self.language.len() + self.text_byte_len());
        bytes.push(status);
        bytes.extend_from_slice(self.language.as_bytes());

        match self.format {
            TextPayloadFormat::Utf8 => bytes.extend_from_slice(self.text.as_bytes()),
            TextPayloadFormat::Utf16 => {
                bytes.extend(self.text.encode_utf16().flat_map(u16::to_be_bytes));
            }
        }

        bytes
    }
}
