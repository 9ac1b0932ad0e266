use crate::util::{escape_code, unescape_code};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub fn as_str_lossy(&self) -> String {
        self.0.iter().map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
    /// Escaped form that maps back to the exact four bytes.
    pub fn escaped(&self) -> String {
        escape_code(&self.0)
    }
}
impl fmt::Debug for FourCC { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.escaped()) } }
impl fmt::Display for FourCC { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str_lossy()) } }

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.escaped())
    }
}

impl<'de> Deserialize<'de> for FourCC {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        let bytes = unescape_code(&s).map_err(serde::de::Error::custom)?;
        let arr: [u8; 4] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom(format!("'{s}' is not a four-byte code")))?;
        Ok(FourCC(arr))
    }
}

/// How a box encodes its size field on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeForm {
    /// 32-bit size.
    #[default]
    Compact,
    /// 32-bit `1` followed by a 64-bit size.
    Extended,
    /// 32-bit `0`: the box runs to the end of its enclosing scope.
    ToEnd,
}

#[derive(Debug, Clone)]
pub struct BoxHeader {
    pub size: u64,          // total size including header, or 0=to parent end
    pub typ: FourCC,        // 4CC or b"uuid"
    pub uuid: Option<[u8;16]>,
    pub header_size: u64,   // 8, 16, or 24/32 with uuid
    pub start: u64,         // offset of header start within the stream
    pub form: SizeForm,
}

impl BoxHeader {
    pub fn key(&self) -> BoxKey {
        match self.uuid {
            Some(u) => BoxKey::Uuid(u),
            None => BoxKey::FourCC(self.typ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BoxKey {
    FourCC(FourCC),
    Uuid([u8; 16]),
}

impl fmt::Display for BoxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxKey::FourCC(cc) => write!(f, "{}", cc.escaped()),
            BoxKey::Uuid(u) => write!(f, "uuid:{}", hex::encode(u)),
        }
    }
}

/// Payload of a parsed box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxPayload {
    /// Registered leaf, bytes kept verbatim.
    Data(Vec<u8>),
    /// Registered container. `header` holds the fixed bytes in front of the
    /// children, `trailer` any slack too short to be a box.
    Container {
        header: Vec<u8>,
        children: Vec<Mp4Box>,
        trailer: Vec<u8>,
    },
    /// Unregistered box kept as raw bytes.
    Opaque(Vec<u8>),
    /// Unregistered box whose payload parsed cleanly as a box sequence.
    GenericContainer(Vec<Mp4Box>),
}

impl BoxPayload {
    pub fn children(&self) -> Option<&[Mp4Box]> {
        match self {
            BoxPayload::Container { children, .. } | BoxPayload::GenericContainer(children) => {
                Some(children)
            }
            BoxPayload::Data(_) | BoxPayload::Opaque(_) => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, BoxPayload::Opaque(_) | BoxPayload::GenericContainer(_))
    }
}

/// One node of the atom tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mp4Box {
    pub typ: FourCC,
    pub uuid: Option<[u8; 16]>,
    /// Declared size as read, or as last recomputed.
    pub size: u64,
    pub form: SizeForm,
    pub payload: BoxPayload,
}

impl Mp4Box {
    pub fn key(&self) -> BoxKey {
        match self.uuid {
            Some(u) => BoxKey::Uuid(u),
            None => BoxKey::FourCC(self.typ),
        }
    }

    pub fn header_len(&self) -> u64 {
        header_len(self.form, self.uuid.is_some())
    }

    pub fn children(&self) -> Option<&[Mp4Box]> {
        self.payload.children()
    }
}

pub(crate) fn header_len(form: SizeForm, has_uuid: bool) -> u64 {
    let base = if form == SizeForm::Extended { 16 } else { 8 };
    if has_uuid { base + 16 } else { base }
}

/// Root pseudo-box: the top-level boxes spanning a whole stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomTree {
    pub boxes: Vec<Mp4Box>,
}

impl AtomTree {
    /// Find the first top-level box of the given type.
    pub fn find(&self, typ: &[u8; 4]) -> Option<&Mp4Box> {
        self.boxes.iter().find(|b| &b.typ.0 == typ)
    }

    /// Refresh every `size` field from the actual serialized lengths.
    pub fn recompute_sizes(&mut self) {
        fn walk(b: &mut Mp4Box) {
            match &mut b.payload {
                BoxPayload::Container { children, .. } | BoxPayload::GenericContainer(children) => {
                    children.iter_mut().for_each(walk)
                }
                BoxPayload::Data(_) | BoxPayload::Opaque(_) => {}
            }
            b.size = crate::writer::serialized_len(b);
        }
        self.boxes.iter_mut().for_each(walk);
    }
}
