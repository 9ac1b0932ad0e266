use crate::error::{Error, Result};
use std::io::{Read, Seek, SeekFrom};

/// Read `len` bytes at the current position, failing with `Truncated`
/// before allocating when the stream cannot supply them.
pub fn read_vec<R: Read>(r: &mut R, len: u64, available: u64, what: &str) -> Result<Vec<u8>> {
    if len > available {
        return Err(Error::truncated(what, len, available));
    }
    let mut v = vec![0u8; len as usize];
    r.read_exact(&mut v)?;
    Ok(v)
}

pub fn stream_len<R: Seek>(r: &mut R) -> Result<u64> {
    let pos = r.stream_position()?;
    let end = r.seek(SeekFrom::End(0))?;
    r.seek(SeekFrom::Start(pos))?;
    Ok(end)
}

/// Printable ASCII passes through, `\` doubles, anything else becomes `\xHH`.
pub fn escape_code(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out
}

pub fn unescape_code(s: &str) -> Result<Vec<u8>> {
    let bad = || Error::InvalidCode(s.to_string());
    let mut out = Vec::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\\') => out.push(b'\\'),
                Some('x') => {
                    let hi = chars.next().and_then(|c| c.to_digit(16)).ok_or_else(bad)?;
                    let lo = chars.next().and_then(|c| c.to_digit(16)).ok_or_else(bad)?;
                    out.push((hi * 16 + lo) as u8);
                }
                _ => return Err(bad()),
            },
            ' '..='~' => out.push(c as u8),
            _ => return Err(bad()),
        }
    }
    Ok(out)
}
