use crate::boxes::FourCC;

/// Structural shape of a registered box type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Leaf,
    /// Children follow `header_len` fixed bytes of the payload.
    Container { header_len: u64 },
}

#[derive(Debug, Clone, Copy)]
pub struct KnownBox {
    pub code: [u8; 4],
    pub name: &'static str,
    pub shape: Shape,
}

const fn leaf(code: &[u8; 4], name: &'static str) -> KnownBox {
    KnownBox { code: *code, name, shape: Shape::Leaf }
}

const fn container(code: &[u8; 4], name: &'static str, header_len: u64) -> KnownBox {
    KnownBox { code: *code, name, shape: Shape::Container { header_len } }
}

/// Box types the default registry understands. Anything else goes through
/// the unknown-box heuristic.
pub const KNOWN_BOXES: &[KnownBox] = &[
    // File-level / top-level
    leaf(b"ftyp", "File Type Box"),
    container(b"moov", "Movie Box", 0),
    leaf(b"mdat", "Media Data Box"),
    leaf(b"free", "Free Space Box"),
    leaf(b"skip", "Free Space Box"),
    leaf(b"wide", "Wide Placeholder Box"),
    container(b"meta", "Meta Box", 4),
    leaf(b"pssh", "Protection System Specific Header Box"),
    leaf(b"sidx", "Segment Index Box"),
    leaf(b"ssix", "Subsegment Index Box"),
    leaf(b"prft", "Producer Reference Time Box"),
    leaf(b"styp", "Segment Type Box"),
    leaf(b"emsg", "Event Message Box"),
    container(b"mfra", "Movie Fragment Random Access Box", 0),
    leaf(b"mfro", "Movie Fragment Random Access Offset Box"),
    // moov / trak
    leaf(b"mvhd", "Movie Header Box"),
    container(b"trak", "Track Box", 0),
    container(b"mvex", "Movie Extends Box", 0),
    container(b"udta", "User Data Box", 0),
    leaf(b"tkhd", "Track Header Box"),
    container(b"edts", "Edit Box", 0),
    container(b"mdia", "Media Box", 0),
    container(b"tref", "Track Reference Box", 0),
    leaf(b"elst", "Edit List Box"),
    // mdia / minf
    leaf(b"mdhd", "Media Header Box"),
    leaf(b"hdlr", "Handler Reference Box"),
    container(b"minf", "Media Information Box", 0),
    leaf(b"vmhd", "Video Media Header Box"),
    leaf(b"smhd", "Sound Media Header Box"),
    leaf(b"hmhd", "Hint Media Header Box"),
    leaf(b"nmhd", "Null Media Header Box"),
    container(b"dinf", "Data Information Box", 0),
    container(b"dref", "Data Reference Box", 8),
    leaf(b"url ", "Data Entry URL Box"),
    leaf(b"urn ", "Data Entry URN Box"),
    container(b"stbl", "Sample Table Box", 0),
    // stbl
    container(b"stsd", "Sample Description Box", 8),
    leaf(b"stts", "Decoding Time to Sample Box"),
    leaf(b"ctts", "Composition Time to Sample Box"),
    leaf(b"stsc", "Sample To Chunk Box"),
    leaf(b"stsz", "Sample Size Box"),
    leaf(b"stz2", "Compact Sample Size Box"),
    leaf(b"stco", "Chunk Offset Box"),
    leaf(b"co64", "64-bit Chunk Offset Box"),
    leaf(b"stss", "Sync Sample Box"),
    leaf(b"stsh", "Shadow Sync Sample Box"),
    leaf(b"sdtp", "Independent and Disposable Samples Box"),
    leaf(b"sgpd", "Sample Group Description Box"),
    leaf(b"sbgp", "Sample To Group Box"),
    leaf(b"subs", "Sub-Sample Information Box"),
    // fragments
    leaf(b"mehd", "Movie Extends Header Box"),
    leaf(b"trex", "Track Extends Box"),
    container(b"moof", "Movie Fragment Box", 0),
    leaf(b"mfhd", "Movie Fragment Header Box"),
    container(b"traf", "Track Fragment Box", 0),
    leaf(b"tfhd", "Track Fragment Header Box"),
    leaf(b"tfdt", "Track Fragment Decode Time Box"),
    leaf(b"trun", "Track Fragment Run Box"),
    leaf(b"tfra", "Track Fragment Random Access Box"),
    // meta / HEIF
    leaf(b"iloc", "Item Location Box"),
    leaf(b"iinf", "Item Information Box"),
    container(b"iref", "Item Reference Box", 4),
    container(b"iprp", "Item Properties Box", 0),
    container(b"ipco", "Item Property Container Box", 0),
    leaf(b"ipma", "Item Property Association Box"),
    leaf(b"ispe", "Image Spatial Extents Box"),
    leaf(b"pitm", "Primary Item Box"),
    leaf(b"colr", "Colour Information Box"),
    leaf(b"pasp", "Pixel Aspect Ratio Box"),
    // iTunes-style metadata
    container(b"ilst", "Metadata Item List Box", 0),
    leaf(b"data", "Metadata Value Box"),
    leaf(b"mean", "Metadata Mean Box"),
    leaf(b"name", "Metadata Name Box"),
    // protection
    container(b"sinf", "Protection Scheme Information Box", 0),
    leaf(b"frma", "Original Format Box"),
    leaf(b"schm", "Scheme Type Box"),
    container(b"schi", "Scheme Information Box", 0),
    leaf(b"tenc", "Track Encryption Box"),
    leaf(b"saio", "Sample Auxiliary Information Offsets Box"),
    leaf(b"saiz", "Sample Auxiliary Information Sizes Box"),
    leaf(b"senc", "Sample Encryption Box"),
    // sample entries keep their codec-specific layout verbatim
    leaf(b"avc1", "AVC Sample Entry"),
    leaf(b"avc3", "AVC Sample Entry"),
    leaf(b"hev1", "HEVC Sample Entry"),
    leaf(b"hvc1", "HEVC Sample Entry"),
    leaf(b"mp4v", "MPEG-4 Visual Sample Entry"),
    leaf(b"vp09", "VP9 Sample Entry"),
    leaf(b"av01", "AV1 Sample Entry"),
    leaf(b"mp4a", "MPEG-4 Audio Sample Entry"),
    leaf(b"ac-3", "AC-3 Sample Entry"),
    leaf(b"ec-3", "E-AC-3 Sample Entry"),
    leaf(b"Opus", "Opus Sample Entry"),
    leaf(b"alac", "ALAC Sample Entry"),
    leaf(b"fLaC", "FLAC Sample Entry"),
    leaf(b"avcC", "AVC Configuration Box"),
    leaf(b"hvcC", "HEVC Configuration Box"),
    leaf(b"esds", "Elementary Stream Descriptor Box"),
    // misc
    leaf(b"cprt", "Copyright Box"),
    leaf(b"chpl", "Chapter List Box"),
];

pub fn lookup(cc: FourCC) -> Option<&'static KnownBox> {
    KNOWN_BOXES.iter().find(|k| k.code == cc.0)
}
