pub mod stream;

use stream::Stream;
use winnow::{
    ModalResult, Parser,
    binary::{
        be_u32,
        bits::{bits, bool as take_bool, take as take_bits},
    },
    error::{ContextError, ErrMode},
    token::{any, take},
};

use crate::{
    header::NdefHeader,
    message::NdefMessage,
    ndef_type::NdefType,
    payload::{NdefPayload, TextPayload, TextPayloadFormat, expand_uri},
    record::NdefRecord,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, uniffi::Error)]
pub enum DecodeError {
    #[error("empty NDEF image")]
    Empty,

    #[error("malformed NDEF image: {0}")]
    Malformed(String),

    #[error("trailing bytes after the end-of-message record")]
    TrailingBytes,
}

/// Decode a complete serialized NDEF message, used to verify written images
pub fn decode_message(bytes: &[u8]) -> Result<NdefMessage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let mut input = stream::new(bytes);
    let mut records = Vec::new();

    loop {
        let (header, record) =
            parse_record(&mut input).map_err(|error| DecodeError::Malformed(error.to_string()))?;

        let message_end = header.message_end;
        records.push(record);

        if message_end {
            break;
        }

        if input.is_empty() {
            return Err(DecodeError::Malformed(
                "missing end-of-message record".to_string(),
            ));
        }
    }

    if !input.is_empty() {
        return Err(DecodeError::TrailingBytes);
    }

    NdefMessage::try_new(records).map_err(|error| DecodeError::Malformed(error.to_string()))
}

pub fn parse_record(input: &mut Stream<'_>) -> ModalResult<(NdefHeader, NdefRecord)> {
    let header = parse_header.parse_next(input)?;
    let type_ = parse_type(input, header.type_length)?;
    let id = parse_id(input, header.id_length)?;
    let payload = parse_payload(input, header.payload_length, header.type_name_format, &type_)?;

    let record = NdefRecord {
        type_name_format: header.type_name_format,
        type_,
        id,
        payload,
    };

    Ok((header, record))
}

// private

fn parse_header_byte(input: &mut Stream<'_>) -> ModalResult<(bool, bool, bool, bool, bool, u8)> {
    bits::<_, _, ErrMode<ContextError>, _, _>((
        take_bool,
        take_bool,
        take_bool,
        take_bool,
        take_bool,
        take_bits(3_u8),
    ))
    .parse_next(input)
}

fn parse_header(input: &mut Stream<'_>) -> ModalResult<NdefHeader> {
    let (message_begin, message_end, chunked, short_record, has_id_length, type_name_format) =
        parse_header_byte(input)?;

    let type_name_format = NdefType::from_code(type_name_format);
    let type_length = winnow::binary::u8.parse_next(input)?;

    let payload_length = if short_record {
        any.map(|x: u8| x as u32).parse_next(input)?
    } else {
        be_u32.parse_next(input)?
    };

    let id_length = if has_id_length {
        Some(any.parse_next(input)?)
    } else {
        None
    };

    Ok(NdefHeader {
        message_begin,
        message_end,
        chunked,
        short_record,
        has_id_length,
        type_name_format,
        type_length,
        payload_length,
        id_length,
    })
}

fn parse_type(input: &mut Stream<'_>, type_length: u8) -> ModalResult<Vec<u8>> {
    take(type_length as usize)
        .map(|s: &[u8]| s.to_vec())
        .parse_next(input)
}

fn parse_id(input: &mut Stream<'_>, id_length: Option<u8>) -> ModalResult<Option<Vec<u8>>> {
    if let Some(id_len) = id_length {
        take(id_len as usize)
            .map(|s: &[u8]| Some(s.to_vec()))
            .parse_next(input)
    } else {
        Ok(None)
    }
}

fn parse_payload(
    input: &mut Stream<'_>,
    payload_length: u32,
    type_name_format: NdefType,
    type_: &[u8],
) -> ModalResult<NdefPayload> {
    if type_name_format == NdefType::WellKnown && type_ == b"T" && payload_length > 0 {
        let (is_utf16, language_code_length): (bool, u8) =
            bits::<_, _, ErrMode<ContextError>, _, _>((take_bool, take_bits(7_u8)))
                .parse_next(input)?;

        let Some(text_length) = payload_length.checked_sub(language_code_length as u32 + 1) else {
            return Err(ErrMode::Cut(ContextError::new()));
        };

        let language_code = take(language_code_length as usize).parse_next(input)?;
        let text = take(text_length as usize).parse_next(input)?;

        let parsed_text = if is_utf16 {
            String::from_utf16_lossy(
                &text
                    .chunks_exact(2)
                    .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
                    .collect::<Vec<u16>>(),
            )
        } else {
            String::from_utf8_lossy(text).to_string()
        };

        let payload = TextPayload {
            format: if is_utf16 {
                TextPayloadFormat::Utf16
            } else {
                TextPayloadFormat::Utf8
            },
            language: String::from_utf8_lossy(language_code).to_string(),
            text: parsed_text,
        };

        return Ok(NdefPayload::Text(payload));
    }

    if type_name_format == NdefType::WellKnown && type_ == b"U" && payload_length > 0 {
        let code = any.parse_next(input)?;
        let rest = take(payload_length as usize - 1).parse_next(input)?;
        let uri = expand_uri(code, &String::from_utf8_lossy(rest));

        return Ok(NdefPayload::Uri(uri));
    }

    take(payload_length as usize)
        .map(|s: &[u8]| NdefPayload::Data(s.to_vec()))
        .parse_next(input)
}
