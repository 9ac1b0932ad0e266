use crate::error::{Error, Result};

pub const HEADER_LEN: usize = 10;
pub const FOOTER_LEN: usize = 10;

pub const FLAG_UNSYNC: u8 = 0x80;
pub const FLAG_EXTENDED: u8 = 0x40;
pub const FLAG_FOOTER: u8 = 0x10;
/// In v2.2 the second flag bit means the whole tag is compressed.
pub const FLAG_V22_COMPRESSION: u8 = 0x40;

/// Largest value a 4-byte synchsafe integer can carry.
pub const SYNCHSAFE_MAX: u32 = (1 << 28) - 1;

/// The fixed 10-byte ID3v2 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub major_version: u8,
    pub revision: u8,
    pub flags: u8,
    /// Bytes after the header, excluding any footer.
    pub size: u32,
}

impl TagHeader {
    pub fn parse(b: &[u8; HEADER_LEN]) -> Result<Self> {
        if &b[0..3] != b"ID3" {
            return Err(Error::InvalidTag(format!(
                "expected 'ID3', found '{}'",
                crate::util::escape_code(&b[0..3])
            )));
        }
        let (major_version, revision, flags) = (b[3], b[4], b[5]);
        check_version(major_version, revision, flags)?;
        let size = decode_synchsafe([b[6], b[7], b[8], b[9]]).ok_or_else(|| {
            Error::InvalidTag(format!("tag size bytes {:02x?} are not synchsafe", &b[6..10]))
        })?;
        Ok(TagHeader { major_version, revision, flags, size })
    }

    pub fn to_bytes(&self) -> Result<[u8; HEADER_LEN]> {
        self.encode(*b"ID3")
    }

    /// The v2.4 footer repeats the header with a reversed identifier.
    pub fn footer_bytes(&self) -> Result<[u8; FOOTER_LEN]> {
        self.encode(*b"3DI")
    }

    fn encode(&self, ident: [u8; 3]) -> Result<[u8; HEADER_LEN]> {
        let size = encode_synchsafe(self.size).ok_or_else(|| {
            Error::MalformedSize(format!("tag body of {} bytes exceeds 2^28 - 1", self.size))
        })?;
        let mut out = [0u8; HEADER_LEN];
        out[0..3].copy_from_slice(&ident);
        out[3] = self.major_version;
        out[4] = self.revision;
        out[5] = self.flags;
        out[6..10].copy_from_slice(&size);
        Ok(out)
    }

    pub fn unsynchronised(&self) -> bool {
        self.flags & FLAG_UNSYNC != 0
    }

    pub fn has_extended_header(&self) -> bool {
        self.major_version >= 3 && self.flags & FLAG_EXTENDED != 0
    }

    pub fn has_footer(&self) -> bool {
        self.major_version == 4 && self.flags & FLAG_FOOTER != 0
    }
}

/// Version and flag rules shared by the header reader and by tags built
/// from a document.
pub fn check_version(major_version: u8, revision: u8, flags: u8) -> Result<()> {
    if major_version == 0xFF || revision == 0xFF {
        return Err(Error::InvalidTag(format!(
            "version bytes {major_version:#04x} {revision:#04x} are reserved"
        )));
    }
    if !(2..=4).contains(&major_version) {
        return Err(Error::UnsupportedVersion { major: major_version, revision });
    }
    if major_version == 2 && flags & FLAG_V22_COMPRESSION != 0 {
        return Err(Error::InvalidTag("compressed ID3v2.2 tags are not supported".into()));
    }
    Ok(())
}

/// Encode the low 28 bits of `v` as four 7-bit groups, most significant first.
/// Returns `None` when `v` does not fit.
pub fn encode_synchsafe(v: u32) -> Option<[u8; 4]> {
    if v > SYNCHSAFE_MAX {
        return None;
    }
    Some([
        ((v >> 21) & 0x7F) as u8,
        ((v >> 14) & 0x7F) as u8,
        ((v >> 7) & 0x7F) as u8,
        (v & 0x7F) as u8,
    ])
}

/// Returns `None` if any byte has its high bit set.
pub fn decode_synchsafe(b: [u8; 4]) -> Option<u32> {
    if b.iter().any(|&x| x & 0x80 != 0) {
        return None;
    }
    Some(b.iter().fold(0u32, |acc, &x| (acc << 7) | x as u32))
}
