use crate::boxes::{header_len, AtomTree, BoxPayload, Mp4Box, SizeForm};
use crate::error::Result;
use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;

fn payload_len(p: &BoxPayload) -> u64 {
    match p {
        BoxPayload::Data(bytes) | BoxPayload::Opaque(bytes) => bytes.len() as u64,
        BoxPayload::Container { header, children, trailer } => {
            header.len() as u64 + children.iter().map(serialized_len).sum::<u64>() + trailer.len() as u64
        }
        BoxPayload::GenericContainer(children) => children.iter().map(serialized_len).sum(),
    }
}

/// Size form actually written: a compact box that outgrew 32 bits is
/// promoted to the extended form.
fn written_form(b: &Mp4Box, body: u64) -> SizeForm {
    let has_uuid = b.uuid.is_some();
    if b.form == SizeForm::Compact && header_len(SizeForm::Compact, has_uuid) + body > u32::MAX as u64 {
        SizeForm::Extended
    } else {
        b.form
    }
}

/// Serialized length of a box, computed from its payload rather than the
/// stored `size`.
pub fn serialized_len(b: &Mp4Box) -> u64 {
    let body = payload_len(&b.payload);
    header_len(written_form(b, body), b.uuid.is_some()) + body
}

/// Serialize one box, depth-first, with freshly computed sizes.
pub fn write_box<W: Write>(w: &mut W, b: &Mp4Box) -> Result<()> {
    let body = payload_len(&b.payload);
    let form = written_form(b, body);
    let total = header_len(form, b.uuid.is_some()) + body;

    match form {
        SizeForm::Compact => w.write_u32::<BigEndian>(total as u32)?,
        SizeForm::ToEnd => w.write_u32::<BigEndian>(0)?,
        SizeForm::Extended => w.write_u32::<BigEndian>(1)?,
    }
    w.write_all(&b.typ.0)?;
    if form == SizeForm::Extended {
        w.write_u64::<BigEndian>(total)?;
    }
    if let Some(u) = &b.uuid {
        w.write_all(u)?;
    }

    match &b.payload {
        BoxPayload::Data(bytes) | BoxPayload::Opaque(bytes) => w.write_all(bytes)?,
        BoxPayload::Container { header, children, trailer } => {
            w.write_all(header)?;
            for c in children {
                write_box(w, c)?;
            }
            w.write_all(trailer)?;
        }
        BoxPayload::GenericContainer(children) => {
            for c in children {
                write_box(w, c)?;
            }
        }
    }
    Ok(())
}

pub fn write_tree<W: Write>(w: &mut W, tree: &AtomTree) -> Result<()> {
    for b in &tree.boxes {
        write_box(w, b)?;
    }
    Ok(())
}

pub fn to_bytes(tree: &AtomTree) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_tree(&mut out, tree)?;
    Ok(out)
}
