use crate::boxes::{AtomTree, BoxHeader, BoxPayload, FourCC, Mp4Box, SizeForm};
use crate::error::{Error, Result};
use crate::registry::{Registry, Strategy};
use crate::util::read_vec;
use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use log::{debug, trace};
use std::io::{Cursor, Read, Seek, SeekFrom};

/// Nesting deeper than this is rejected for registered containers and
/// left opaque for unknown boxes.
pub const MAX_DEPTH: usize = 64;

/// Read one box header. `available` is the number of bytes left in the
/// enclosing scope; a header that does not fit is reported as `Truncated`.
pub fn read_box_header<R: Read + Seek>(r: &mut R, available: u64) -> Result<BoxHeader> {
    let start = r.stream_position()?;
    if available < 8 {
        return Err(Error::truncated("box header", 8, available));
    }
    let size32 = r.read_u32::<BigEndian>()?;
    let mut typ = [0u8; 4]; r.read_exact(&mut typ)?;
    let mut size = size32 as u64;

    let form = match size32 {
        0 => SizeForm::ToEnd,
        1 => SizeForm::Extended,
        _ => SizeForm::Compact,
    };
    if form == SizeForm::Extended {
        if available < 16 {
            return Err(Error::truncated("extended box size", 16, available));
        }
        size = r.read_u64::<BigEndian>()?;
    }

    let mut uuid = None;
    if &typ == b"uuid" {
        let needed = crate::boxes::header_len(form, true);
        if available < needed {
            return Err(Error::truncated("uuid box header", needed, available));
        }
        let mut u = [0u8; 16];
        r.read_exact(&mut u)?;
        uuid = Some(u);
    }

    let header_size = crate::boxes::header_len(form, uuid.is_some());

    if form != SizeForm::ToEnd && size < header_size {
        let err = Error::MalformedSize(format!(
            "box declares {size} bytes but its header alone is {header_size}"
        ));
        return Err(err.in_box(FourCC(typ), start));
    }

    Ok(BoxHeader { size, typ: FourCC(typ), uuid, header_size, start, form })
}

/// Parse a whole stream of `len` bytes, starting at the current position,
/// into an [`AtomTree`].
pub fn parse<R: Read + Seek>(r: &mut R, len: u64, reg: &Registry) -> Result<AtomTree> {
    let start = r.stream_position()?;
    let (boxes, _) = parse_scope(r, start + len, Scope::Stream, reg, 0)?;
    trace!("parsed {} top-level boxes", boxes.len());
    Ok(AtomTree { boxes })
}

/// Parse the children of a container whose payload ends at `parent_end`.
/// Returns the children and any trailing bytes too short to form a box.
pub fn parse_children<R: Read + Seek>(
    r: &mut R,
    parent_end: u64,
    reg: &Registry,
) -> Result<(Vec<Mp4Box>, Vec<u8>)> {
    parse_scope(r, parent_end, Scope::Parent, reg, 1)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Top level: running out of bytes means the stream is truncated.
    Stream,
    /// Inside a box: overrunning the parent is a size inconsistency.
    Parent,
}

impl Scope {
    fn overrun(self, err: Error) -> Error {
        match (self, err) {
            (Scope::Parent, Error::Truncated { what, needed, available }) => Error::MalformedSize(
                format!("{what} needs {needed} bytes but the parent has {available} left"),
            ),
            (_, err) => err,
        }
    }
}

fn parse_scope<R: Read + Seek>(
    r: &mut R,
    end: u64,
    scope: Scope,
    reg: &Registry,
    depth: usize,
) -> Result<(Vec<Mp4Box>, Vec<u8>)> {
    let mut kids = Vec::new();
    let mut trailer = Vec::new();
    loop {
        let pos = r.stream_position()?;
        if pos >= end {
            break;
        }
        let remaining = end - pos;
        if scope == Scope::Parent && remaining < 8 {
            trailer = read_vec(r, remaining, remaining, "container trailer")?;
            break;
        }

        let h = read_box_header(r, remaining).map_err(|e| scope.overrun(e))?;
        let extent = if h.form == SizeForm::ToEnd { remaining } else { h.size };
        if extent > remaining {
            let err = Error::truncated(format!("box '{}'", h.typ.escaped()), extent, remaining);
            return Err(scope.overrun(err).in_box(h.typ, h.start));
        }

        let payload_len = extent - h.header_size;
        let payload = parse_payload(r, &h, payload_len, reg, depth)
            .map_err(|e| e.in_box(h.typ, h.start))?;

        // Skip to end of box
        r.seek(SeekFrom::Start(h.start + extent))?;
        kids.push(Mp4Box {
            typ: h.typ,
            uuid: h.uuid,
            size: extent,
            form: h.form,
            payload,
        });
    }
    Ok((kids, trailer))
}

fn parse_payload<R: Read + Seek>(
    r: &mut R,
    h: &BoxHeader,
    payload_len: u64,
    reg: &Registry,
    depth: usize,
) -> Result<BoxPayload> {
    match reg.lookup_box(&h.key()) {
        Strategy::Leaf => Ok(BoxPayload::Data(read_vec(r, payload_len, payload_len, "box payload")?)),
        Strategy::Container { header_len } => {
            if depth >= MAX_DEPTH {
                return Err(Error::MalformedSize(format!(
                    "containers nested deeper than {MAX_DEPTH} levels"
                )));
            }
            let header_len = container_header_len(r, h, header_len, payload_len)?;
            if payload_len < header_len {
                return Err(Error::MalformedSize(format!(
                    "payload of {payload_len} bytes is shorter than the {header_len}-byte container header"
                )));
            }
            let header = read_vec(r, header_len, payload_len, "container header")?;
            let end = r.stream_position()? + (payload_len - header_len);
            let (children, trailer) = parse_scope(r, end, Scope::Parent, reg, depth + 1)?;
            Ok(BoxPayload::Container { header, children, trailer })
        }
        Strategy::Unknown => {
            let bytes = read_vec(r, payload_len, payload_len, "box payload")?;
            Ok(parse_unknown(bytes, h, reg, depth))
        }
    }
}

/// QuickTime writes `meta` without the version/flags word, in which case
/// the handler box starts right at the payload.
fn container_header_len<R: Read + Seek>(
    r: &mut R,
    h: &BoxHeader,
    header_len: u64,
    payload_len: u64,
) -> Result<u64> {
    if &h.typ.0 != b"meta" || payload_len < 8 {
        return Ok(header_len);
    }
    let here = r.stream_position()?;
    let mut peek = [0u8; 8];
    r.read_exact(&mut peek)?;
    r.seek(SeekFrom::Start(here))?;
    Ok(if &peek[4..8] == b"hdlr" { 0 } else { header_len })
}

fn parse_unknown(bytes: Vec<u8>, h: &BoxHeader, reg: &Registry, depth: usize) -> BoxPayload {
    if depth >= MAX_DEPTH || !is_box_sequence(&bytes) {
        return BoxPayload::Opaque(bytes);
    }
    let len = bytes.len() as u64;
    let mut cur = Cursor::new(bytes.as_slice());
    match parse_scope(&mut cur, len, Scope::Parent, reg, depth + 1) {
        Ok((children, trailer)) if trailer.is_empty() => {
            debug!(
                "unregistered box '{}' holds {} children, keeping it as a container",
                h.typ.escaped(),
                children.len()
            );
            BoxPayload::GenericContainer(children)
        }
        Ok(_) => BoxPayload::Opaque(bytes),
        Err(e) => {
            debug!(
                "unregistered box '{}' looked like a container but failed to parse ({e}); keeping raw bytes",
                h.typ.escaped()
            );
            BoxPayload::Opaque(bytes)
        }
    }
}

/// True when `bytes` is exactly a non-empty run of boxes with explicit
/// sizes, each at least as large as its own header.
pub fn is_box_sequence(bytes: &[u8]) -> bool {
    let len = bytes.len() as u64;
    let mut pos = 0u64;
    let mut count = 0usize;
    while pos < len {
        let rest = &bytes[pos as usize..];
        if rest.len() < 8 {
            return false;
        }
        let size32 = BigEndian::read_u32(&rest[0..4]);
        let (size, mut header) = match size32 {
            0 => return false,
            1 if rest.len() >= 16 => (BigEndian::read_u64(&rest[8..16]), 16),
            1 => return false,
            n => (n as u64, 8),
        };
        if &rest[4..8] == b"uuid" {
            header += 16;
        }
        if size < header || size > len - pos {
            return false;
        }
        pos += size;
        count += 1;
    }
    count > 0
}
