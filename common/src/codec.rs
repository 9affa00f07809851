//! Device report envelopes in, bus payloads out.
//!
//! Reports arrive as a form body (`data=<percent-encoded xml>`). Every
//! element of the document becomes one `(tag, text)` pair in document order;
//! the engine decides which pairs it keeps.

use crate::{error::CodecError, state::ObservedState};

pub const MAX_COMMAND_PAYLOAD_BYTES: usize = 512;

const FORM_FIELD_PREFIX: &str = "data=";

pub type ReportField = (String, Option<String>);

pub fn decode_report(body: &[u8], min_len: usize) -> Result<Vec<ReportField>, CodecError> {
    let decoded = String::from_utf8(urlencoding::decode_binary(body).into_owned())?;
    let xml = decoded.trim();
    let xml = xml.strip_prefix(FORM_FIELD_PREFIX).unwrap_or(xml);

    if xml.len() < min_len {
        return Err(CodecError::TooShort {
            len: xml.len(),
            min: min_len,
        });
    }

    let doc = roxmltree::Document::parse(xml)?;
    let fields = doc
        .root_element()
        .descendants()
        .filter(|node| node.is_element())
        .map(|node| {
            (
                node.tag_name().name().to_string(),
                node.text().map(str::to_string),
            )
        })
        .collect();

    Ok(fields)
}

/// Bus commands are plain UTF-8 strings taken as-is.
pub fn decode_command(payload: &[u8]) -> Result<&str, CodecError> {
    if payload.len() > MAX_COMMAND_PAYLOAD_BYTES {
        return Err(CodecError::OversizedPayload {
            len: payload.len(),
            max: MAX_COMMAND_PAYLOAD_BYTES,
        });
    }
    Ok(std::str::from_utf8(payload)?)
}

/// Flat JSON object of strings; fields reported without text become `""`.
pub fn encode_telemetry(observed: &ObservedState) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(observed)
}
