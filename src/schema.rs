//! Schema carried by every projected document: a fixed description of the
//! built-in element kinds plus one extension per unknown type seen in the run.

use crate::config::SchemaPolicy;
use crate::error::{Error, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

pub const SCHEMA_VERSION: u32 = 1;

/// Structural shape of an element in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementShape {
    Leaf,
    Container,
    Frame,
    /// Seen both as a leaf and as a container.
    Mixed,
}

impl ElementShape {
    fn as_str(self) -> &'static str {
        match self {
            ElementShape::Leaf => "leaf",
            ElementShape::Container => "container",
            ElementShape::Frame => "frame",
            ElementShape::Mixed => "mixed",
        }
    }

    pub fn admits(self, found: ElementShape) -> bool {
        self == found || (self == ElementShape::Mixed && found != ElementShape::Frame)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSchema {
    pub kind: String,
    pub description: String,
    pub fields: Vec<String>,
}

/// Declares an unregistered type and the shape its elements take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    #[serde(rename = "type")]
    pub typ: String,
    pub shape: ElementShape,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub version: u32,
    pub elements: Vec<ElementSchema>,
    #[serde(default)]
    pub extensions: Vec<Extension>,
}

impl Schema {
    pub fn extension(&self, typ: &str) -> Option<ElementShape> {
        self.extensions.iter().find(|e| e.typ == typ).map(|e| e.shape)
    }

    /// Check that an element of an unregistered type is declared with a
    /// compatible shape.
    pub fn check(&self, typ: &str, found: ElementShape) -> Result<()> {
        match self.extension(typ) {
            None => Err(Error::UndeclaredExtension(typ.to_string())),
            Some(declared) if declared.admits(found) => Ok(()),
            Some(declared) => Err(Error::SchemaExtensionConflict {
                typ: typ.to_string(),
                declared: declared.as_str().to_string(),
                found: found.as_str().to_string(),
            }),
        }
    }
}

fn element(kind: &str, description: &str, base: &[&str], extra: &[&str]) -> ElementSchema {
    ElementSchema {
        kind: kind.to_string(),
        description: description.to_string(),
        fields: base.iter().chain(extra).map(|f| f.to_string()).collect(),
    }
}

const BOX_FIELDS: &[&str] = &["typ", "uuid", "size", "size_form", "full_name", "kind"];
const FRAME_FIELDS: &[&str] = &["id", "flags", "name", "kind"];

pub fn atom_schema() -> Schema {
    let b = BOX_FIELDS;
    Schema {
        version: SCHEMA_VERSION,
        elements: vec![
            element("data", "registered leaf box, payload as hex", b, &["data"]),
            element(
                "container",
                "registered container box; header and trailer are hex bytes around the children",
                b,
                &["header", "children", "trailer"],
            ),
            element("opaque", "unregistered box kept as raw hex bytes", b, &["data"]),
            element("generic", "unregistered box whose payload is a box sequence", b, &["children"]),
        ],
        extensions: Vec::new(),
    }
}

pub fn tag_schema() -> Schema {
    let f = FRAME_FIELDS;
    Schema {
        version: SCHEMA_VERSION,
        elements: vec![
            element("text", "text information frame", f, &["encoding", "values"]),
            element("url", "URL link frame, ISO-8859-1", f, &["url"]),
            element("binary", "frame payload as hex", f, &["data"]),
            element("opaque", "undecodable frame preserved as hex", f, &["data", "reason"]),
        ],
        extensions: Vec::new(),
    }
}

/// Unknown types observed while projecting one model, with every shape
/// each one took. Extensions come out once per type, in first-seen order.
#[derive(Debug, Default)]
pub struct UnknownTypes {
    order: Vec<String>,
    shapes: HashMap<String, BTreeSet<ElementShape>>,
}

impl UnknownTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time `typ` is seen.
    pub fn observe(&mut self, typ: String, shape: ElementShape) -> bool {
        let first = !self.shapes.contains_key(&typ);
        if first {
            self.order.push(typ.clone());
        }
        self.shapes.entry(typ).or_default().insert(shape);
        first
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_extensions(mut self, policy: SchemaPolicy) -> Result<Vec<Extension>> {
        let mut out = Vec::with_capacity(self.order.len());
        for typ in self.order {
            let shapes = self.shapes.remove(&typ).unwrap_or_default();
            let mut it = shapes.iter().copied();
            let shape = match (it.next(), it.next()) {
                (Some(only), None) => only,
                (Some(a), Some(b)) => {
                    if policy == SchemaPolicy::Strict {
                        return Err(Error::SchemaExtensionConflict {
                            typ,
                            declared: a.as_str().to_string(),
                            found: b.as_str().to_string(),
                        });
                    }
                    warn!("unknown type '{typ}' appears as both {} and {}", a.as_str(), b.as_str());
                    ElementShape::Mixed
                }
                (None, _) => continue,
            };
            out.push(Extension { typ, shape });
        }
        Ok(out)
    }
}
