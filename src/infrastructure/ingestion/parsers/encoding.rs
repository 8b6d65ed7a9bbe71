//! Byte-to-text decoding shared by the text-based parsers

use encoding_rs::{Encoding, ISO_8859_15, UTF_8, WINDOWS_1252};
use tracing::{debug, warn};

use crate::domain::ingestion::{DocumentMetadata, ParserContent};
use crate::domain::DomainError;

/// Decoded text and how it was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    pub text: String,
    /// Lowercase WHATWG name of the encoding actually used
    pub encoding: String,
    /// Undecodable bytes were replaced with U+FFFD
    pub lossy: bool,
}

impl DecodedText {
    fn clean(text: String, encoding: &'static Encoding) -> Self {
        Self {
            text,
            encoding: encoding.name().to_lowercase(),
            lossy: false,
        }
    }

    /// Record the encoding (and lossy flag) in document metadata
    pub fn annotate(&self, metadata: DocumentMetadata) -> DocumentMetadata {
        let metadata = metadata.with_encoding(self.encoding.clone());

        if self.lossy {
            metadata.with_custom("lossy_decoding", serde_json::Value::Bool(true))
        } else {
            metadata
        }
    }
}

/// Resolve an encoding label such as `latin1` or `utf-16le`
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, DomainError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| DomainError::configuration(format!("Unknown text encoding '{}'", label)))
}

/// Decode bytes without ever failing.
///
/// Order: byte-order mark, declared encoding, the fallback list, and finally
/// lossy UTF-8.
pub fn decode_bytes(bytes: &[u8], declared: Option<&'static Encoding>) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);

        if !had_errors {
            debug!(encoding = encoding.name(), "Decoded using byte-order mark");
            return DecodedText::clean(text.into_owned(), encoding);
        }
    }

    let fallbacks: [&'static Encoding; 3] = [UTF_8, WINDOWS_1252, ISO_8859_15];
    let candidates = declared.into_iter().chain(fallbacks);

    for encoding in candidates {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            return DecodedText::clean(text.into_owned(), encoding);
        }

        debug!(encoding = encoding.name(), "Encoding rejected input");
    }

    warn!(bytes = bytes.len(), "No encoding decoded the input cleanly, using lossy UTF-8");

    DecodedText {
        text: String::from_utf8_lossy(bytes).into_owned(),
        encoding: UTF_8.name().to_lowercase(),
        lossy: true,
    }
}

/// Decode parser content; text input is already UTF-8
pub fn decode_content(content: &ParserContent, declared: Option<&'static Encoding>) -> DecodedText {
    match content {
        ParserContent::Text(text) => DecodedText::clean(text.clone(), UTF_8),
        ParserContent::Bytes(bytes) => decode_bytes(bytes, declared),
    }
}
