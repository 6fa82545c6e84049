//! Text encodings tried when decoding an uploaded file.
//!
//! Decoding is an explicit, bounded chain: the primary encoding first, then one
//! fallback. The order is fixed because a single-byte encoding happily
//! mis-decodes valid UTF-8, so it must only ever run after UTF-8 has failed.

use serde::Serialize;
use std::fmt;

const UTF8_BOM: char = '\u{FEFF}';

/// Windows-1252 code points for bytes 0x80..=0x9F; `None` marks the five bytes
/// the code page leaves undefined.
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None,             Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None,             Some('\u{017D}'), None,
    None,             Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None,             Some('\u{017E}'), Some('\u{0178}'),
];

/// A candidate text encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
pub enum Encoding {
    /// UTF-8; a leading byte order mark is dropped.
    #[value(name = "utf-8", alias = "utf8")]
    #[serde(rename = "utf-8")]
    Utf8,
    /// ISO-8859-1. Every byte maps to the code point of the same value.
    #[value(name = "latin-1", alias = "latin1", alias = "iso-8859-1")]
    #[serde(rename = "latin-1")]
    Latin1,
    /// Windows-1252. Fails on the undefined bytes 0x81, 0x8D, 0x8F, 0x90 and 0x9D.
    #[value(name = "windows-1252", alias = "cp1252")]
    #[serde(rename = "windows-1252")]
    Windows1252,
}

impl Encoding {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin-1",
            Self::Windows1252 => "windows-1252",
        }
    }

    /// Decode `bytes`, or `None` if they are not valid in this encoding.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Utf8 => {
                let text = std::str::from_utf8(bytes).ok()?;
                Some(text.strip_prefix(UTF8_BOM).unwrap_or(text).to_string())
            }
            Self::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
            Self::Windows1252 => bytes
                .iter()
                .map(|&b| match b {
                    0x80..=0x9F => CP1252_HIGH[usize::from(b - 0x80)],
                    _ => Some(char::from(b)),
                })
                .collect(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Primary encoding plus exactly one fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EncodingChain {
    pub primary: Encoding,
    pub fallback: Encoding,
}

impl Default for EncodingChain {
    fn default() -> Self {
        Self { primary: Encoding::Utf8, fallback: Encoding::Latin1 }
    }
}

/// Outcome of running the chain over some bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoded {
    /// The text, tagged with the encoding that produced it.
    Text { text: String, encoding: Encoding },
    /// Every candidate failed.
    Undecodable { tried: [Encoding; 2] },
}

impl EncodingChain {
    /// Chain with UTF-8 first and the given fallback.
    #[must_use]
    pub const fn with_fallback(fallback: Encoding) -> Self {
        Self { primary: Encoding::Utf8, fallback }
    }

    #[must_use]
    pub const fn candidates(&self) -> [Encoding; 2] {
        [self.primary, self.fallback]
    }

    /// Try each candidate in order and report the first that succeeds.
    #[must_use]
    pub fn decode(&self, bytes: &[u8]) -> Decoded {
        for encoding in self.candidates() {
            if let Some(text) = encoding.decode(bytes) {
                return Decoded::Text { text, encoding };
            }
            log::debug!("bytes are not valid {encoding}, trying next candidate");
        }
        Decoded::Undecodable { tried: self.candidates() }
    }
}
