use crate::{
    boxes::AtomTree,
    brands::BrandInfo,
    config::Config,
    error::{Error, Result},
    id3::Tag,
    json_api::{self, Document},
    parser,
    registry::default_registry,
    util::stream_len,
    writer,
};
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

/// Which codec handles a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// ISO BMFF atom tree (MP4, M4A, MOV, ...).
    AtomTree,
    /// ID3v2 frame tag (MP3).
    TagFrame,
}

/// In-memory model produced by one codec invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Model {
    AtomTree(AtomTree),
    Tag(Tag),
}

impl Model {
    pub fn format(&self) -> Format {
        match self {
            Model::AtomTree(_) => Format::AtomTree,
            Model::Tag(_) => Format::TagFrame,
        }
    }
}

/// Pick a format from the file extension alone.
pub fn format_from_name(path: impl AsRef<Path>) -> Option<Format> {
    let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "mp3" | "id3" => Some(Format::TagFrame),
        "mp4" | "m4a" | "m4v" | "m4b" | "m4p" | "mov" | "3gp" | "3g2" | "heic" | "avif" => {
            Some(Format::AtomTree)
        }
        _ => None,
    }
}

/// Pick a format from the first bytes of a stream.
pub fn sniff_format(head: &[u8]) -> Option<Format> {
    if head.starts_with(b"ID3") {
        Some(Format::TagFrame)
    } else if head.len() >= 8 && &head[4..8] == b"ftyp" {
        Some(Format::AtomTree)
    } else {
        None
    }
}

/// Decide the codec for `path`: by extension first, then by sniffing the
/// file's first bytes.
pub fn detect_format(path: impl AsRef<Path>) -> Result<Format> {
    let path = path.as_ref();
    if let Some(f) = format_from_name(path) {
        return Ok(f);
    }
    let mut head = Vec::with_capacity(12);
    File::open(path)?.take(12).read_to_end(&mut head)?;
    sniff_format(&head).ok_or_else(|| Error::UnknownFormat(path.display().to_string()))
}

/// Parse a stream from its current position to its end.
///
/// # Example
/// ```no_run
/// use parsley::{parse_file, Config, Format};
/// use std::fs::File;
///
/// let mut file = File::open("video.mp4")?;
/// let model = parse_file(&mut file, Format::AtomTree, &Config::default())?;
/// # Ok::<(), parsley::Error>(())
/// ```
pub fn parse_file<R: Read + Seek>(r: &mut R, format: Format, cfg: &Config) -> Result<Model> {
    let reg = default_registry();
    match format {
        Format::AtomTree => {
            let len = stream_len(r)? - r.stream_position()?;
            Ok(Model::AtomTree(parser::parse(r, len, reg)?))
        }
        Format::TagFrame => Ok(Model::Tag(Tag::parse(r, cfg, reg)?)),
    }
}

pub fn project_to_external(model: &Model, cfg: &Config) -> Result<Document> {
    json_api::to_document(model, cfg, default_registry())
}

pub fn project_from_external(doc: &Document) -> Result<Model> {
    json_api::from_document(doc, default_registry())
}

/// Serialize a model back to its binary form with recomputed sizes.
pub fn write_binary<W: Write>(model: &Model, w: &mut W) -> Result<()> {
    match model {
        Model::AtomTree(tree) => writer::write_tree(w, tree),
        Model::Tag(tag) => tag.write(w),
    }
}

pub fn extract_brands<R: Read + Seek>(r: &mut R) -> Result<BrandInfo> {
    crate::brands::extract_brands(r)
}
