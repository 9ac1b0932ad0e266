use super::frame::{Frame, FrameContent, FrameId};
use super::header::{
    check_version, decode_synchsafe, encode_synchsafe, TagHeader, FLAG_EXTENDED, FOOTER_LEN,
    HEADER_LEN, SYNCHSAFE_MAX,
};
use super::unsync::{stuff, unstuff};
use crate::config::{Config, FrameErrorPolicy};
use crate::error::{Error, Result};
use crate::registry::Registry;
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use log::{debug, warn};
use std::io::{Read, Write};

/// An ID3v2 tag: header fields, optional extended header, frames in file
/// order and the amount of trailing padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub major_version: u8,
    pub revision: u8,
    /// Header flags. The extended-header bit is derived from
    /// `extended_header` when writing.
    pub flags: u8,
    /// Raw extended header, including its own size field.
    pub extended_header: Option<Vec<u8>>,
    pub frames: Vec<Frame>,
    pub padding: usize,
}

pub fn frame_header_len(major_version: u8) -> usize {
    if major_version == 2 { 6 } else { 10 }
}

fn id_len(major_version: u8) -> usize {
    if major_version == 2 { 3 } else { 4 }
}

fn read_up_to<R: Read>(r: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    r.take(len).read_to_end(&mut buf)?;
    Ok(buf)
}

impl Tag {
    pub fn new(major_version: u8) -> Self {
        Tag {
            major_version,
            revision: 0,
            flags: 0,
            extended_header: None,
            frames: Vec::new(),
            padding: 0,
        }
    }

    /// Parse a tag starting at the current position of `r`.
    pub fn parse<R: Read>(r: &mut R, cfg: &Config, reg: &Registry) -> Result<Tag> {
        let raw = read_up_to(r, HEADER_LEN as u64)?;
        let raw: [u8; HEADER_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| Error::truncated("tag header", HEADER_LEN as u64, raw.len() as u64))?;
        let header = TagHeader::parse(&raw)?;
        debug!(
            "ID3v2.{}.{} flags={:#04x} size={}",
            header.major_version, header.revision, header.flags, header.size
        );

        let body = read_up_to(r, header.size as u64)?;
        if body.len() < header.size as usize {
            return Err(Error::truncated("tag body", header.size as u64, body.len() as u64));
        }
        let body = if header.unsynchronised() { unstuff(&body) } else { body };

        let mut pos = 0usize;
        let extended_header = if header.has_extended_header() {
            let ext = read_extended_header(&body, header.major_version)?;
            pos = ext.len();
            Some(ext)
        } else {
            None
        };

        let (frames, padding) = parse_frames(&body[pos..], header.major_version, cfg.frame_errors, reg)?;

        if header.has_footer() {
            let footer = read_up_to(r, FOOTER_LEN as u64)?;
            if footer.len() < FOOTER_LEN {
                return Err(Error::truncated("tag footer", FOOTER_LEN as u64, footer.len() as u64));
            }
            if &footer[0..3] != b"3DI" || footer[3] != header.major_version {
                return Err(Error::InvalidTag("footer does not match the header".into()));
            }
        }

        Ok(Tag {
            major_version: header.major_version,
            revision: header.revision,
            flags: header.flags,
            extended_header,
            frames,
            padding,
        })
    }

    /// Check the header fields the way `parse` would on read-back. The
    /// extended header must exist only from v2.3 on and must span exactly its
    /// own declared length.
    pub fn validate(&self) -> Result<()> {
        check_version(self.major_version, self.revision, self.flags)?;
        if let Some(ext) = &self.extended_header {
            if self.major_version < 3 {
                return Err(Error::InvalidTag(format!(
                    "ID3v2.{} has no extended header",
                    self.major_version
                )));
            }
            let declared = read_extended_header(ext, self.major_version)?.len();
            if declared != ext.len() {
                return Err(Error::MalformedSize(format!(
                    "extended header declares {declared} bytes but holds {}",
                    ext.len()
                )));
            }
        }
        Ok(())
    }

    fn header_flags(&self) -> u8 {
        match self.extended_header {
            Some(_) if self.major_version >= 3 => self.flags | FLAG_EXTENDED,
            _ => self.flags & !FLAG_EXTENDED,
        }
    }

    fn header(&self, size: u32) -> TagHeader {
        TagHeader {
            major_version: self.major_version,
            revision: self.revision,
            flags: self.header_flags(),
            size,
        }
    }

    /// Everything between header and footer, as it goes on disk.
    fn body(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        if let Some(ext) = &self.extended_header {
            out.extend_from_slice(ext);
        }
        for f in &self.frames {
            write_frame(&mut out, f, self.major_version)
                .map_err(|e| e.in_frame(f.id.escaped()))?;
        }
        out.resize(out.len() + self.padding, 0);
        if self.header(0).unsynchronised() {
            out = stuff(&out);
        }
        Ok(out)
    }

    /// Header size value a fresh write needs: extended header, frames and
    /// padding, recomputed from the current frames.
    pub fn tag_size(&self) -> Result<u32> {
        let len = self.body()?.len();
        u32::try_from(len)
            .ok()
            .filter(|&n| n <= SYNCHSAFE_MAX)
            .ok_or_else(|| Error::MalformedSize(format!("tag body of {len} bytes exceeds 2^28 - 1")))
    }

    /// Total bytes written, header and footer included.
    pub fn total_len(&self) -> Result<u64> {
        let footer = if self.header(0).has_footer() { FOOTER_LEN } else { 0 };
        Ok((HEADER_LEN + footer) as u64 + self.tag_size()? as u64)
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        self.validate()?;
        let body = self.body()?;
        let size = u32::try_from(body.len())
            .map_err(|_| Error::MalformedSize(format!("tag body of {} bytes", body.len())))?;
        let header = self.header(size);
        w.write_all(&header.to_bytes()?)?;
        w.write_all(&body)?;
        if header.has_footer() {
            w.write_all(&header.footer_bytes()?)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write(&mut out)?;
        Ok(out)
    }
}

fn read_extended_header(body: &[u8], major_version: u8) -> Result<Vec<u8>> {
    if body.len() < 4 {
        return Err(Error::MalformedSize("extended header size runs past the tag".into()));
    }
    let size_bytes = [body[0], body[1], body[2], body[3]];
    let total = if major_version == 3 {
        // v2.3 counts the bytes after the size field
        BigEndian::read_u32(&size_bytes) as usize + 4
    } else {
        decode_synchsafe(size_bytes).ok_or_else(|| {
            Error::MalformedSize("extended header size is not synchsafe".into())
        })? as usize
    };
    if total < 6 || total > body.len() {
        return Err(Error::MalformedSize(format!(
            "extended header of {total} bytes does not fit a {}-byte tag body",
            body.len()
        )));
    }
    Ok(body[..total].to_vec())
}

fn parse_frames(
    body: &[u8],
    major_version: u8,
    policy: FrameErrorPolicy,
    reg: &Registry,
) -> Result<(Vec<Frame>, usize)> {
    let hl = frame_header_len(major_version);
    let il = id_len(major_version);
    let mut frames = Vec::new();
    let mut pos = 0usize;

    while pos < body.len() {
        let rest = &body[pos..];
        if rest.len() < hl || rest[0] == 0 {
            if rest.iter().any(|&b| b != 0) {
                warn!(
                    "{} bytes after the last frame are not all zero; they will be written back as zero padding",
                    rest.len()
                );
            }
            return Ok((frames, rest.len()));
        }

        let id_bytes = &rest[..il];
        let id_str = crate::util::escape_code(id_bytes);
        let (size, flags) = match major_version {
            2 => (BigEndian::read_u24(&rest[3..6]) as usize, 0u16),
            3 => (BigEndian::read_u32(&rest[4..8]) as usize, BigEndian::read_u16(&rest[8..10])),
            _ => {
                let size = decode_synchsafe([rest[4], rest[5], rest[6], rest[7]]).ok_or_else(|| {
                    Error::MalformedSize("frame size is not synchsafe".into()).in_frame(&id_str)
                })?;
                (size as usize, BigEndian::read_u16(&rest[8..10]))
            }
        };
        if size > rest.len() - hl {
            let err = Error::MalformedSize(format!(
                "frame declares {size} bytes but only {} remain in the tag",
                rest.len() - hl
            ));
            return Err(err.in_frame(id_str));
        }
        let data = rest[hl..hl + size].to_vec();
        pos += hl + size;

        let id = FrameId::new(id_bytes).ok_or_else(|| {
            Error::InvalidFrame(format!("frame id of {} bytes", id_bytes.len())).in_frame(&id_str)
        })?;
        match Frame::decode(id.clone(), flags, data.clone(), major_version, reg) {
            Ok(frame) => frames.push(frame),
            Err(e) => match policy {
                FrameErrorPolicy::Preserve => {
                    warn!("frame '{id}' kept as raw bytes: {e}");
                    frames.push(Frame {
                        id,
                        flags,
                        content: FrameContent::Opaque { data, reason: e.to_string() },
                    });
                }
                FrameErrorPolicy::Skip => warn!("frame '{id}' dropped: {e}"),
                FrameErrorPolicy::Fail => return Err(e.in_frame(id_str)),
            },
        }
    }
    Ok((frames, 0))
}

fn write_frame(out: &mut Vec<u8>, f: &Frame, major_version: u8) -> Result<()> {
    let il = id_len(major_version);
    if f.id.as_bytes().len() != il {
        return Err(Error::InvalidFrame(format!(
            "a v2.{major_version} frame id needs {il} bytes"
        )));
    }
    let data = f.data()?;
    out.extend_from_slice(f.id.as_bytes());
    match major_version {
        2 => {
            if data.len() > 0xFF_FFFF {
                return Err(Error::MalformedSize(format!("frame of {} bytes", data.len())));
            }
            out.write_u24::<BigEndian>(data.len() as u32)?;
        }
        3 => {
            let len = u32::try_from(data.len())
                .map_err(|_| Error::MalformedSize(format!("frame of {} bytes", data.len())))?;
            out.write_u32::<BigEndian>(len)?;
            out.write_u16::<BigEndian>(f.flags)?;
        }
        _ => {
            let size = u32::try_from(data.len())
                .ok()
                .and_then(encode_synchsafe)
                .ok_or_else(|| Error::MalformedSize(format!("frame of {} bytes", data.len())))?;
            out.extend_from_slice(&size);
            out.write_u16::<BigEndian>(f.flags)?;
        }
    }
    out.extend_from_slice(&data);
    Ok(())
}
