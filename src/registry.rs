use crate::boxes::BoxKey;
use crate::boxes::FourCC;
use crate::id3::frame::FrameId;
use crate::known_boxes::{self, Shape};
use crate::known_frames::{self, FrameShape};
use std::collections::HashMap;
use std::sync::OnceLock;

/// How the parser treats a box payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Store the payload verbatim.
    Leaf,
    /// Skip `header_len` fixed bytes, then parse children.
    Container { header_len: u64 },
    /// Unregistered: container if the payload is an exact box sequence,
    /// opaque bytes otherwise.
    Unknown,
}

impl From<Shape> for Strategy {
    fn from(shape: Shape) -> Self {
        match shape {
            Shape::Leaf => Strategy::Leaf,
            Shape::Container { header_len } => Strategy::Container { header_len },
        }
    }
}

/// How the tag codec treats a frame payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStrategy {
    Text,
    Url,
    Binary,
    Unknown,
}

impl From<FrameShape> for FrameStrategy {
    fn from(shape: FrameShape) -> Self {
        match shape {
            FrameShape::Text => FrameStrategy::Text,
            FrameShape::Url => FrameStrategy::Url,
            FrameShape::Binary => FrameStrategy::Binary,
        }
    }
}

struct Entry<S> {
    strategy: S,
    name: String,
}

/// Registry of parsing strategies keyed by box key (4CC or UUID) and frame id.
///
/// The registry is immutable once constructed; use [`Registry::with_box`] and
/// [`Registry::with_frame`] to build it fluently.
pub struct Registry {
    boxes: HashMap<BoxKey, Entry<Strategy>>,
    frames: HashMap<FrameId, Entry<FrameStrategy>>,
}

impl Registry {
    /// Create an empty registry. Every lookup resolves to the unknown strategy.
    pub fn new() -> Self {
        Self {
            boxes: HashMap::new(),
            frames: HashMap::new(),
        }
    }

    /// Return a new registry with the given box strategy added.
    ///
    /// `name` is human-readable and carried into the projected document.
    pub fn with_box(mut self, key: BoxKey, name: &str, strategy: Strategy) -> Self {
        self.boxes.insert(
            key,
            Entry {
                strategy,
                name: name.to_string(),
            },
        );
        self
    }

    pub fn with_frame(mut self, id: FrameId, name: &str, strategy: FrameStrategy) -> Self {
        self.frames.insert(
            id,
            Entry {
                strategy,
                name: name.to_string(),
            },
        );
        self
    }

    /// Never fails: unregistered keys resolve to [`Strategy::Unknown`].
    pub fn lookup_box(&self, key: &BoxKey) -> Strategy {
        self.boxes
            .get(key)
            .map(|e| e.strategy)
            .unwrap_or(Strategy::Unknown)
    }

    pub fn box_name(&self, key: &BoxKey) -> Option<&str> {
        self.boxes.get(key).map(|e| e.name.as_str())
    }

    pub fn is_registered_box(&self, key: &BoxKey) -> bool {
        self.boxes.contains_key(key)
    }

    /// Never fails: unregistered ids resolve to [`FrameStrategy::Unknown`].
    pub fn lookup_frame(&self, id: &FrameId) -> FrameStrategy {
        self.frames
            .get(id)
            .map(|e| e.strategy)
            .unwrap_or(FrameStrategy::Unknown)
    }

    pub fn frame_name(&self, id: &FrameId) -> Option<&str> {
        self.frames.get(id).map(|e| e.name.as_str())
    }

    pub fn is_registered_frame(&self, id: &FrameId) -> bool {
        self.frames.contains_key(id)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// A fresh registry populated from the built-in box and frame tables.
pub fn builtin_registry() -> Registry {
    let reg = known_boxes::KNOWN_BOXES.iter().fold(Registry::new(), |reg, k| {
        reg.with_box(BoxKey::FourCC(FourCC(k.code)), k.name, k.shape.into())
    });
    known_frames::KNOWN_FRAMES.iter().fold(reg, |reg, k| match FrameId::new(k.id) {
        Some(id) => reg.with_frame(id, k.name, k.shape.into()),
        None => reg,
    })
}

/// Process-wide registry, built on first use and read-only afterwards.
pub fn default_registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(builtin_registry)
}
