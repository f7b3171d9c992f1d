//! Text encodings accepted by `read_file`.

use std::{fmt, str::FromStr};

use bytes::Bytes;

use crate::error::Error;

/// Number of leading bytes shown in a binary preview.
pub const PREVIEW_BYTES: usize = 100;

/// A supported text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Ascii,
    Latin1,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Ascii => "ascii",
            Self::Latin1 => "latin-1",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
        }
    }

    /// Decodes `content`, handing the bytes back inside [`Error::Decode`] on
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if `content` is not valid in this encoding.
    pub fn decode(self, content: Bytes) -> Result<String, Error> {
        let decoded = match self {
            Self::Utf8 => std::str::from_utf8(&content).ok().map(str::to_owned),
            Self::Ascii => content
                .is_ascii()
                .then(|| content.iter().map(|&b| char::from(b)).collect()),
            Self::Latin1 => Some(content.iter().map(|&b| char::from(b)).collect()),
            Self::Utf16Le => decode_utf16(&content, u16::from_le_bytes),
            Self::Utf16Be => decode_utf16(&content, u16::from_be_bytes),
        };
        decoded.ok_or_else(|| Error::Decode {
            encoding: self.name().to_string(),
            content,
        })
    }
}

fn decode_utf16(content: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if content.len() % 2 != 0 {
        return None;
    }
    let units = content.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase().replace('_', "-");
        match name.as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "ascii" | "us-ascii" => Ok(Self::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(Self::Latin1),
            "utf-16le" | "utf-16-le" => Ok(Self::Utf16Le),
            "utf-16be" | "utf-16-be" => Ok(Self::Utf16Be),
            _ => Err(Error::Validation(format!("unsupported encoding '{s}'"))),
        }
    }
}

/// Renders a short, escaped preview of undecodable content.
///
/// ```
/// use sharepoint_core::text::binary_preview;
///
/// assert_eq!(
///     binary_preview(b"\x89PNG\r\n"),
///     r"Binary file content (6 bytes): \x89PNG\r\n..."
/// );
/// ```
pub fn binary_preview(content: &[u8]) -> String {
    let head = &content[..content.len().min(PREVIEW_BYTES)];
    let escaped: String = head
        .iter()
        .flat_map(|&b| std::ascii::escape_default(b))
        .map(char::from)
        .collect();
    format!("Binary file content ({} bytes): {escaped}...", content.len())
}
