use crate::boxes::{FourCC, SizeForm};
use crate::error::{Error, Result};
use crate::parser::read_box_header;
use crate::util::{read_vec, stream_len};
use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;
use std::fmt;
use std::io::{Read, Seek, SeekFrom};

const FTYP: FourCC = FourCC(*b"ftyp");

/// Brands declared by the `ftyp` box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandInfo {
    pub major_brand: FourCC,
    pub minor_version: u32,
    pub compatible_brands: Vec<FourCC>,
}

impl fmt::Display for BrandInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let compat: Vec<String> = self.compatible_brands.iter().map(|b| b.escaped()).collect();
        write!(
            f,
            "major={} minor={} compatible={:?}",
            self.major_brand.escaped(),
            self.minor_version,
            compat
        )
    }
}

/// Locate the top-level `ftyp` box by hopping over sibling headers and
/// decode its brands. Payloads of other boxes are never read.
pub fn extract_brands<R: Read + Seek>(r: &mut R) -> Result<BrandInfo> {
    let end = stream_len(r)?;
    loop {
        let pos = r.stream_position()?;
        if pos >= end {
            return Err(Error::BoxNotFound(FTYP));
        }
        let remaining = end - pos;
        let h = read_box_header(r, remaining)?;
        let extent = if h.form == SizeForm::ToEnd { remaining } else { h.size };
        if extent > remaining {
            return Err(Error::truncated(
                format!("box '{}'", h.typ.escaped()),
                extent,
                remaining,
            ));
        }
        if h.typ == FTYP {
            let payload = read_vec(r, extent - h.header_size, remaining, "ftyp payload")?;
            return decode_ftyp(&payload).map_err(|e| e.in_box(h.typ, h.start));
        }
        r.seek(SeekFrom::Start(h.start + extent))?;
    }
}

/// Decode an `ftyp` payload: major brand, minor version, compatible brands.
pub fn decode_ftyp(payload: &[u8]) -> Result<BrandInfo> {
    if payload.len() < 8 {
        return Err(Error::MalformedSize(format!(
            "ftyp payload is {} bytes, needs at least 8",
            payload.len()
        )));
    }
    let rest = &payload[8..];
    if rest.len() % 4 != 0 {
        return Err(Error::MalformedSize(format!(
            "{} bytes of compatible brands is not a multiple of 4",
            rest.len()
        )));
    }
    let mut major = [0u8; 4];
    major.copy_from_slice(&payload[0..4]);
    let compatible_brands = rest
        .chunks_exact(4)
        .map(|c| FourCC([c[0], c[1], c[2], c[3]]))
        .collect();
    Ok(BrandInfo {
        major_brand: FourCC(major),
        minor_version: BigEndian::read_u32(&payload[4..8]),
        compatible_brands,
    })
}
