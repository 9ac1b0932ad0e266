//! ID3v2 unsynchronisation: a `0x00` is inserted after every `0xFF` that is
//! followed by `0x00`, by a byte `>= 0xE0`, or by nothing at all, so that
//! tag data never contains an MPEG frame sync pattern.

pub fn stuff(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 16);
    for (i, &b) in data.iter().enumerate() {
        out.push(b);
        if b == 0xFF {
            match data.get(i + 1) {
                None => out.push(0),
                Some(&next) if next == 0 || next >= 0xE0 => out.push(0),
                Some(_) => {}
            }
        }
    }
    out
}

/// Drop the `0x00` of every `0xFF 0x00` pair.
pub fn unstuff(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        let b = data[i];
        out.push(b);
        i += if b == 0xFF && data.get(i + 1) == Some(&0) { 2 } else { 1 };
    }
    out
}

