use crate::error::{Error, Result};
use crate::registry::{FrameStrategy, Registry};
use crate::util::{escape_code, unescape_code};
use log::debug;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A 3-byte (v2.2) or 4-byte (v2.3/v2.4) frame identifier, kept as raw bytes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(Vec<u8>);

impl FrameId {
    pub fn new(id: &[u8]) -> Option<Self> {
        matches!(id.len(), 3 | 4).then(|| FrameId(id.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Upper-case letters and digits only, as the format requires.
    pub fn is_well_formed(&self) -> bool {
        self.0.iter().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    }

    pub fn escaped(&self) -> String {
        escape_code(&self.0)
    }
}

impl fmt::Debug for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.escaped())
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.escaped())
    }
}

impl Serialize for FrameId {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.escaped())
    }
}

impl<'de> Deserialize<'de> for FrameId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        let bytes = unescape_code(&s).map_err(serde::de::Error::custom)?;
        FrameId::new(&bytes)
            .ok_or_else(|| serde::de::Error::custom(format!("'{s}' is not a 3 or 4 byte frame id")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    Latin1,
    /// UTF-16 with a byte order mark on every string.
    Utf16,
    Utf16Be,
    Utf8,
}

impl TextEncoding {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(TextEncoding::Latin1),
            1 => Some(TextEncoding::Utf16),
            2 => Some(TextEncoding::Utf16Be),
            3 => Some(TextEncoding::Utf8),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            TextEncoding::Latin1 => 0,
            TextEncoding::Utf16 => 1,
            TextEncoding::Utf16Be => 2,
            TextEncoding::Utf8 => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameContent {
    /// Text information frame. A terminating null shows up as a trailing
    /// empty string.
    Text {
        encoding: TextEncoding,
        values: Vec<String>,
    },
    Url(String),
    Binary(Vec<u8>),
    /// A frame that failed to decode, kept verbatim.
    Opaque { data: Vec<u8>, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub id: FrameId,
    /// Status and format flags; always zero for v2.2.
    pub flags: u16,
    pub content: FrameContent,
}

impl Frame {
    pub fn text(id: FrameId, encoding: TextEncoding, value: &str) -> Self {
        Frame {
            id,
            flags: 0,
            content: FrameContent::Text {
                encoding,
                values: vec![value.to_string()],
            },
        }
    }

    /// Payload bytes as they go on disk after the frame header.
    pub fn data(&self) -> Result<Vec<u8>> {
        match &self.content {
            FrameContent::Text { encoding, values } => encode_text(*encoding, values),
            FrameContent::Url(url) => encode_latin1(url),
            FrameContent::Binary(data) | FrameContent::Opaque { data, .. } => Ok(data.clone()),
        }
    }

    /// Decode a frame payload according to the registry. Failures are
    /// returned to the caller, which applies the frame error policy.
    pub fn decode(
        id: FrameId,
        flags: u16,
        data: Vec<u8>,
        major_version: u8,
        reg: &Registry,
    ) -> Result<Frame> {
        if !id.is_well_formed() {
            return Err(Error::InvalidFrame(format!("frame id '{id}' has invalid characters")));
        }
        let structured = if has_transforming_flags(major_version, flags) {
            None
        } else {
            match reg.lookup_frame(&id) {
                FrameStrategy::Text => Some(decode_text(&data)?),
                FrameStrategy::Url => Some(FrameContent::Url(decode_latin1(&data))),
                FrameStrategy::Binary | FrameStrategy::Unknown => None,
            }
        };
        let content = match structured {
            Some(content) => {
                let probe = Frame { id: id.clone(), flags, content };
                if probe.data().ok().as_deref() == Some(data.as_slice()) {
                    probe.content
                } else {
                    debug!("frame '{id}' does not re-encode identically, keeping raw bytes");
                    FrameContent::Binary(data)
                }
            }
            None => FrameContent::Binary(data),
        };
        Ok(Frame { id, flags, content })
    }
}

/// Compression, encryption, grouping, unsynchronisation or a data length
/// indicator change what the payload bytes mean.
fn has_transforming_flags(major_version: u8, flags: u16) -> bool {
    match major_version {
        3 => flags & 0x00E0 != 0,
        4 => flags & 0x004F != 0,
        _ => false,
    }
}

fn decode_latin1(data: &[u8]) -> String {
    data.iter().map(|&b| b as char).collect()
}

fn encode_latin1(s: &str) -> Result<Vec<u8>> {
    s.chars()
        .map(|c| {
            u8::try_from(u32::from(c))
                .map_err(|_| Error::InvalidFrame(format!("'{c}' cannot be encoded as ISO-8859-1")))
        })
        .collect()
}

fn utf16_units(data: &[u8], big_endian: bool) -> Vec<u16> {
    data.chunks_exact(2)
        .map(|p| if big_endian { u16::from_be_bytes([p[0], p[1]]) } else { u16::from_le_bytes([p[0], p[1]]) })
        .collect()
}

fn split_utf16(body: &[u8]) -> Vec<&[u8]> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + 1 < body.len() {
        if body[i] == 0 && body[i + 1] == 0 {
            out.push(&body[start..i]);
            start = i + 2;
        }
        i += 2;
    }
    out.push(&body[start..]);
    out
}

fn decode_text(data: &[u8]) -> Result<FrameContent> {
    let (&enc, body) = data
        .split_first()
        .ok_or_else(|| Error::InvalidFrame("empty text frame".into()))?;
    let encoding = TextEncoding::from_byte(enc)
        .ok_or_else(|| Error::InvalidFrame(format!("unknown text encoding {enc}")))?;

    let values = match encoding {
        TextEncoding::Latin1 => body.split(|&b| b == 0).map(decode_latin1).collect(),
        TextEncoding::Utf8 => body
            .split(|&b| b == 0)
            .map(|s| {
                String::from_utf8(s.to_vec())
                    .map_err(|e| Error::InvalidFrame(format!("invalid UTF-8 text: {e}")))
            })
            .collect::<Result<Vec<_>>>()?,
        TextEncoding::Utf16 | TextEncoding::Utf16Be => {
            if body.len() % 2 != 0 {
                return Err(Error::InvalidFrame(format!(
                    "UTF-16 text has odd length {}",
                    body.len()
                )));
            }
            split_utf16(body)
                .into_iter()
                .map(|seg| {
                    let (seg, big_endian) = match seg {
                        [0xFF, 0xFE, rest @ ..] if encoding == TextEncoding::Utf16 => (rest, false),
                        [0xFE, 0xFF, rest @ ..] if encoding == TextEncoding::Utf16 => (rest, true),
                        _ => (seg, encoding == TextEncoding::Utf16Be),
                    };
                    String::from_utf16(&utf16_units(seg, big_endian))
                        .map_err(|e| Error::InvalidFrame(format!("invalid UTF-16 text: {e}")))
                })
                .collect::<Result<Vec<_>>>()?
        }
    };
    Ok(FrameContent::Text { encoding, values })
}

/// Inverse of `decode_text`. UTF-16 strings are written little-endian with a BOM.
fn encode_text(encoding: TextEncoding, values: &[String]) -> Result<Vec<u8>> {
    let mut out = vec![encoding.as_byte()];
    for (i, v) in values.iter().enumerate() {
        match encoding {
            TextEncoding::Latin1 => {
                if i > 0 {
                    out.push(0);
                }
                out.extend(encode_latin1(v)?);
            }
            TextEncoding::Utf8 => {
                if i > 0 {
                    out.push(0);
                }
                out.extend_from_slice(v.as_bytes());
            }
            TextEncoding::Utf16 => {
                if i > 0 {
                    out.extend_from_slice(&[0, 0]);
                }
                if !v.is_empty() {
                    out.extend_from_slice(&[0xFF, 0xFE]);
                    out.extend(v.encode_utf16().flat_map(u16::to_le_bytes));
                }
            }
            TextEncoding::Utf16Be => {
                if i > 0 {
                    out.extend_from_slice(&[0, 0]);
                }
                out.extend(v.encode_utf16().flat_map(u16::to_be_bytes));
            }
        }
    }
    Ok(out)
}
