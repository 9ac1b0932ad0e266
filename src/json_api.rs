use crate::{
    api::Model,
    boxes::{AtomTree, BoxKey, BoxPayload, FourCC, Mp4Box, SizeForm},
    config::Config,
    error::{Error, Result},
    id3::{Frame, FrameContent, FrameId, Tag, TextEncoding},
    registry::Registry,
    schema::{atom_schema, tag_schema, ElementShape, Schema, UnknownTypes},
};
use log::debug;
use serde::{Deserialize, Serialize};

/// External representation of a parsed file.
///
/// Serializes to JSON tagged by `format`; every byte payload is a hex string
/// and every type code an escaped string, so the binary can be rebuilt
/// exactly with [`from_document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum Document {
    AtomTree(AtomDocument),
    TagFrame(TagDocument),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomDocument {
    pub schema: Schema,
    pub boxes: Vec<BoxElement>,
}

/// A JSON-serializable representation of a single box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxElement {
    /// Four-character box type code, escaped (e.g. "moov", "\\xa9nam")
    pub typ: FourCC,
    /// Extended type for `uuid` boxes (hex)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// Total size as parsed; ignored when rebuilding
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "is_compact")]
    pub size_form: SizeForm,
    /// Human-readable box name from the registry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(flatten)]
    pub body: BoxBody,
}

fn is_compact(f: &SizeForm) -> bool {
    *f == SizeForm::Compact
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoxBody {
    Data {
        data: String,
    },
    Container {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        header: String,
        children: Vec<BoxElement>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        trailer: String,
    },
    Opaque {
        data: String,
    },
    Generic {
        children: Vec<BoxElement>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDocument {
    pub schema: Schema,
    pub version: u8,
    pub revision: u8,
    /// Raw header flags (0x80 unsync, 0x40 extended header, 0x20
    /// experimental, 0x10 footer)
    pub flags: u8,
    /// Header size a write would produce; ignored when rebuilding
    #[serde(default)]
    pub tag_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_header: Option<String>,
    pub frames: Vec<FrameElement>,
    #[serde(default)]
    pub padding: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameElement {
    pub id: FrameId,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub flags: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub body: FrameBody,
}

fn is_zero(v: &u16) -> bool {
    *v == 0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameBody {
    Text {
        encoding: TextEncoding,
        values: Vec<String>,
    },
    Url {
        url: String,
    },
    Binary {
        data: String,
    },
    Opaque {
        data: String,
        reason: String,
    },
}

// ---------- model -> document ----------

/// Build the external document for a model. Unknown types are collected
/// while walking and declared once each in `schema.extensions`.
pub fn to_document(model: &Model, cfg: &Config, reg: &Registry) -> Result<Document> {
    let mut unknown = UnknownTypes::new();
    match model {
        Model::AtomTree(tree) => {
            let boxes = tree
                .boxes
                .iter()
                .map(|b| build_box(b, reg, &mut unknown))
                .collect();
            let mut schema = atom_schema();
            debug!("{} unknown box types in document", unknown.len());
            schema.extensions = unknown.into_extensions(cfg.schema)?;
            Ok(Document::AtomTree(AtomDocument { schema, boxes }))
        }
        Model::Tag(tag) => {
            let frames = tag
                .frames
                .iter()
                .map(|f| build_frame(f, reg, &mut unknown))
                .collect();
            let mut schema = tag_schema();
            schema.extensions = unknown.into_extensions(cfg.schema)?;
            Ok(Document::TagFrame(TagDocument {
                schema,
                version: tag.major_version,
                revision: tag.revision,
                flags: tag.flags,
                tag_size: tag.tag_size()?,
                extended_header: tag.extended_header.as_ref().map(hex::encode),
                frames,
                padding: tag.padding,
            }))
        }
    }
}

fn build_box(b: &Mp4Box, reg: &Registry, unknown: &mut UnknownTypes) -> BoxElement {
    let key = b.key();
    let body = match &b.payload {
        BoxPayload::Data(bytes) => BoxBody::Data { data: hex::encode(bytes) },
        BoxPayload::Container { header, children, trailer } => BoxBody::Container {
            header: hex::encode(header),
            children: children.iter().map(|c| build_box(c, reg, unknown)).collect(),
            trailer: hex::encode(trailer),
        },
        BoxPayload::Opaque(bytes) => {
            unknown.observe(key.to_string(), ElementShape::Leaf);
            BoxBody::Opaque { data: hex::encode(bytes) }
        }
        BoxPayload::GenericContainer(children) => {
            unknown.observe(key.to_string(), ElementShape::Container);
            BoxBody::Generic {
                children: children.iter().map(|c| build_box(c, reg, unknown)).collect(),
            }
        }
    };
    BoxElement {
        typ: b.typ,
        uuid: b.uuid.map(hex::encode),
        size: b.size,
        size_form: b.form,
        full_name: reg.box_name(&key).map(str::to_string),
        body,
    }
}

fn build_frame(f: &Frame, reg: &Registry, unknown: &mut UnknownTypes) -> FrameElement {
    if !reg.is_registered_frame(&f.id) {
        unknown.observe(f.id.escaped(), ElementShape::Frame);
    }
    let body = match &f.content {
        FrameContent::Text { encoding, values } => FrameBody::Text {
            encoding: *encoding,
            values: values.clone(),
        },
        FrameContent::Url(url) => FrameBody::Url { url: url.clone() },
        FrameContent::Binary(data) => FrameBody::Binary { data: hex::encode(data) },
        FrameContent::Opaque { data, reason } => FrameBody::Opaque {
            data: hex::encode(data),
            reason: reason.clone(),
        },
    };
    FrameElement {
        id: f.id.clone(),
        flags: f.flags,
        name: reg.frame_name(&f.id).map(str::to_string),
        body,
    }
}

// ---------- document -> model ----------

/// Rebuild a fresh model from a document. Sizes in the document are not
/// trusted; the writers recompute them.
pub fn from_document(doc: &Document, reg: &Registry) -> Result<Model> {
    match doc {
        Document::AtomTree(d) => {
            let boxes = d
                .boxes
                .iter()
                .map(|e| restore_box(e, &d.schema, reg))
                .collect::<Result<Vec<_>>>()?;
            let mut tree = AtomTree { boxes };
            tree.recompute_sizes();
            Ok(Model::AtomTree(tree))
        }
        Document::TagFrame(d) => {
            let frames = d
                .frames
                .iter()
                .map(|e| restore_frame(e, &d.schema, reg))
                .collect::<Result<Vec<_>>>()?;
            let extended_header = d.extended_header.as_deref().map(hex::decode).transpose()?;
            let tag = Tag {
                major_version: d.version,
                revision: d.revision,
                flags: d.flags,
                extended_header,
                frames,
                padding: d.padding,
            };
            tag.validate()?;
            Ok(Model::Tag(tag))
        }
    }
}

fn restore_box(e: &BoxElement, schema: &Schema, reg: &Registry) -> Result<Mp4Box> {
    let uuid = match &e.uuid {
        Some(u) => {
            let bytes = hex::decode(u)?;
            let arr: [u8; 16] = bytes
                .try_into()
                .map_err(|_| Error::InvalidCode(format!("uuid '{u}' is not 16 bytes")))?;
            Some(arr)
        }
        None => None,
    };
    let key = match uuid {
        Some(u) => BoxKey::Uuid(u),
        None => BoxKey::FourCC(e.typ),
    };

    let restore_all = |children: &[BoxElement]| -> Result<Vec<Mp4Box>> {
        children.iter().map(|c| restore_box(c, schema, reg)).collect()
    };
    let (payload, shape) = match &e.body {
        BoxBody::Data { data } => (BoxPayload::Data(hex::decode(data)?), ElementShape::Leaf),
        BoxBody::Container { header, children, trailer } => (
            BoxPayload::Container {
                header: hex::decode(header)?,
                children: restore_all(children)?,
                trailer: hex::decode(trailer)?,
            },
            ElementShape::Container,
        ),
        BoxBody::Opaque { data } => (BoxPayload::Opaque(hex::decode(data)?), ElementShape::Leaf),
        BoxBody::Generic { children } => (
            BoxPayload::GenericContainer(restore_all(children)?),
            ElementShape::Container,
        ),
    };
    if !reg.is_registered_box(&key) {
        schema.check(&key.to_string(), shape)?;
    }

    Ok(Mp4Box {
        typ: e.typ,
        uuid,
        size: 0,
        form: e.size_form,
        payload,
    })
}

fn restore_frame(e: &FrameElement, schema: &Schema, reg: &Registry) -> Result<Frame> {
    if !reg.is_registered_frame(&e.id) {
        schema
            .check(&e.id.escaped(), ElementShape::Frame)
            .map_err(|err| err.in_frame(e.id.escaped()))?;
    }
    let content = match &e.body {
        FrameBody::Text { encoding, values } => FrameContent::Text {
            encoding: *encoding,
            values: values.clone(),
        },
        FrameBody::Url { url } => FrameContent::Url(url.clone()),
        FrameBody::Binary { data } => FrameContent::Binary(hex::decode(data)?),
        FrameBody::Opaque { data, reason } => FrameContent::Opaque {
            data: hex::decode(data)?,
            reason: reason.clone(),
        },
    };
    Ok(Frame {
        id: e.id.clone(),
        flags: e.flags,
        content,
    })
}
