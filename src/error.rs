use crate::boxes::FourCC;

/// Errors produced by the box and tag codecs and the JSON projection.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("truncated stream: {what} needs {needed} bytes, {available} available")]
    Truncated {
        what: String,
        needed: u64,
        available: u64,
    },
    #[error("malformed size: {0}")]
    MalformedSize(String),
    #[error("invalid tag: {0}")]
    InvalidTag(String),
    #[error("undecodable frame payload: {0}")]
    InvalidFrame(String),
    #[error("unsupported tag version 2.{major}.{revision}")]
    UnsupportedVersion { major: u8, revision: u8 },
    #[error("schema extension conflict for '{typ}': declared {declared}, found {found}")]
    SchemaExtensionConflict {
        typ: String,
        declared: String,
        found: String,
    },
    #[error("type '{0}' is not registered and has no schema extension")]
    UndeclaredExtension(String),
    #[error("no '{0}' box at the top level")]
    BoxNotFound(FourCC),
    #[error("invalid type code '{0}'")]
    InvalidCode(String),
    #[error("cannot determine format of '{0}'")]
    UnknownFormat(String),
    #[error("in '{typ}' box at offset {offset:#x}")]
    InBox {
        typ: FourCC,
        offset: u64,
        #[source]
        source: Box<Error>,
    },
    #[error("in frame '{id}'")]
    InFrame {
        id: String,
        #[source]
        source: Box<Error>,
    },
    #[error("i/o failure")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON document")]
    Json(#[from] serde_json::Error),
    #[error("invalid hex payload")]
    Hex(#[from] hex::FromHexError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Innermost error, skipping the `InBox`/`InFrame` location wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::InBox { source, .. } | Error::InFrame { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn truncated(what: impl Into<String>, needed: u64, available: u64) -> Self {
        Error::Truncated {
            what: what.into(),
            needed,
            available,
        }
    }

    pub(crate) fn in_frame(self, id: impl Into<String>) -> Self {
        Error::InFrame {
            id: id.into(),
            source: Box::new(self),
        }
    }

    pub(crate) fn in_box(self, typ: FourCC, offset: u64) -> Self {
        Error::InBox {
            typ,
            offset,
            source: Box::new(self),
        }
    }
}

/// Render an error and all of its sources, outermost first.
pub fn cause_chain(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = Some(err);
    while let Some(e) = cur {
        out.push(e.to_string());
        cur = e.source();
    }
    out
}
