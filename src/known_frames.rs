/// How a registered frame's payload is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameShape {
    /// Encoding byte followed by one or more strings.
    Text,
    /// ISO-8859-1 URL, no encoding byte.
    Url,
    /// Kept as raw bytes.
    Binary,
}

#[derive(Debug, Clone, Copy)]
pub struct KnownFrame {
    pub id: &'static [u8],
    pub name: &'static str,
    pub shape: FrameShape,
}

const fn frame(id: &'static [u8], name: &'static str, shape: FrameShape) -> KnownFrame {
    KnownFrame { id, name, shape }
}

use FrameShape::{Binary, Text, Url};

pub const KNOWN_FRAMES: &[KnownFrame] = &[
    // ID3v2.3 / v2.4
    frame(b"AENC", "Audio encryption", Binary),
    frame(b"APIC", "Attached picture", Binary),
    frame(b"ASPI", "Audio seek point index", Binary),
    frame(b"COMM", "Comments", Binary),
    frame(b"COMR", "Commercial frame", Binary),
    frame(b"ENCR", "Encryption method registration", Binary),
    frame(b"EQU2", "Equalisation (2)", Binary),
    frame(b"EQUA", "Equalization", Binary),
    frame(b"ETCO", "Event timing codes", Binary),
    frame(b"GEOB", "General encapsulated object", Binary),
    frame(b"GRID", "Group identification registration", Binary),
    frame(b"IPLS", "Involved people list", Binary),
    frame(b"LINK", "Linked information", Binary),
    frame(b"MCDI", "Music CD identifier", Binary),
    frame(b"MLLT", "MPEG location lookup table", Binary),
    frame(b"OWNE", "Ownership frame", Binary),
    frame(b"PCNT", "Play counter", Binary),
    frame(b"POPM", "Popularimeter", Binary),
    frame(b"POSS", "Position synchronisation frame", Binary),
    frame(b"PRIV", "Private frame", Binary),
    frame(b"RBUF", "Recommended buffer size", Binary),
    frame(b"RVA2", "Relative volume adjustment (2)", Binary),
    frame(b"RVAD", "Relative volume adjustment", Binary),
    frame(b"RVRB", "Reverb", Binary),
    frame(b"SEEK", "Seek frame", Binary),
    frame(b"SIGN", "Signature frame", Binary),
    frame(b"SYLT", "Synchronised lyric/text", Binary),
    frame(b"SYTC", "Synchronised tempo codes", Binary),
    frame(b"TALB", "Album/Movie/Show title", Text),
    frame(b"TBPM", "BPM (beats per minute)", Text),
    frame(b"TCOM", "Composer", Text),
    frame(b"TCON", "Content type", Text),
    frame(b"TCOP", "Copyright message", Text),
    frame(b"TDAT", "Date", Text),
    frame(b"TDEN", "Encoding time", Text),
    frame(b"TDLY", "Playlist delay", Text),
    frame(b"TDOR", "Original release time", Text),
    frame(b"TDRC", "Recording time", Text),
    frame(b"TDRL", "Release time", Text),
    frame(b"TDTG", "Tagging time", Text),
    frame(b"TENC", "Encoded by", Text),
    frame(b"TEXT", "Lyricist/Text writer", Text),
    frame(b"TFLT", "File type", Text),
    frame(b"TIME", "Time", Text),
    frame(b"TIPL", "Involved people list", Text),
    frame(b"TIT1", "Content group description", Text),
    frame(b"TIT2", "Title/songname/content description", Text),
    frame(b"TIT3", "Subtitle/Description refinement", Text),
    frame(b"TKEY", "Initial key", Text),
    frame(b"TLAN", "Language(s)", Text),
    frame(b"TLEN", "Length", Text),
    frame(b"TMCL", "Musician credits list", Text),
    frame(b"TMED", "Media type", Text),
    frame(b"TMOO", "Mood", Text),
    frame(b"TOAL", "Original album/movie/show title", Text),
    frame(b"TOFN", "Original filename", Text),
    frame(b"TOLY", "Original lyricist(s)/text writer(s)", Text),
    frame(b"TOPE", "Original artist(s)/performer(s)", Text),
    frame(b"TORY", "Original release year", Text),
    frame(b"TOWN", "File owner/licensee", Text),
    frame(b"TPE1", "Lead performer(s)/Soloist(s)", Text),
    frame(b"TPE2", "Band/orchestra/accompaniment", Text),
    frame(b"TPE3", "Conductor/performer refinement", Text),
    frame(b"TPE4", "Interpreted, remixed, or otherwise modified by", Text),
    frame(b"TPOS", "Part of a set", Text),
    frame(b"TPRO", "Produced notice", Text),
    frame(b"TPUB", "Publisher", Text),
    frame(b"TRCK", "Track number/Position in set", Text),
    frame(b"TRDA", "Recording dates", Text),
    frame(b"TRSN", "Internet radio station name", Text),
    frame(b"TRSO", "Internet radio station owner", Text),
    frame(b"TSIZ", "Size", Text),
    frame(b"TSOA", "Album sort order", Text),
    frame(b"TSOP", "Performer sort order", Text),
    frame(b"TSOT", "Title sort order", Text),
    frame(b"TSRC", "ISRC (international standard recording code)", Text),
    frame(b"TSSE", "Software/Hardware and settings used for encoding", Text),
    frame(b"TSST", "Set subtitle", Text),
    frame(b"TYER", "Year", Text),
    frame(b"TXXX", "User defined text information frame", Binary),
    frame(b"UFID", "Unique file identifier", Binary),
    frame(b"USER", "Terms of use", Binary),
    frame(b"USLT", "Unsynchronised lyric/text transcription", Binary),
    frame(b"WCOM", "Commercial information", Url),
    frame(b"WCOP", "Copyright/Legal information", Url),
    frame(b"WOAF", "Official audio file webpage", Url),
    frame(b"WOAR", "Official artist/performer webpage", Url),
    frame(b"WOAS", "Official audio source webpage", Url),
    frame(b"WORS", "Official Internet radio station homepage", Url),
    frame(b"WPAY", "Payment", Url),
    frame(b"WPUB", "Publishers official webpage", Url),
    frame(b"WXXX", "User defined URL link frame", Binary),
    // ID3v2.2
    frame(b"BUF", "Recommended buffer size", Binary),
    frame(b"CNT", "Play counter", Binary),
    frame(b"COM", "Comments", Binary),
    frame(b"GEO", "General encapsulated object", Binary),
    frame(b"PIC", "Attached picture", Binary),
    frame(b"POP", "Popularimeter", Binary),
    frame(b"TAL", "Album/Movie/Show title", Text),
    frame(b"TBP", "BPM (Beats Per Minute)", Text),
    frame(b"TCM", "Composer", Text),
    frame(b"TCO", "Content type", Text),
    frame(b"TCR", "Copyright message", Text),
    frame(b"TEN", "Encoded by", Text),
    frame(b"TLE", "Length", Text),
    frame(b"TP1", "Lead artist(s)/Lead performer(s)/Soloist(s)/Performing group", Text),
    frame(b"TP2", "Band/Orchestra/Accompaniment", Text),
    frame(b"TPA", "Part of a set", Text),
    frame(b"TRK", "Track number/Position in set", Text),
    frame(b"TT1", "Content group description", Text),
    frame(b"TT2", "Title/Songname/Content description", Text),
    frame(b"TT3", "Subtitle/Description refinement", Text),
    frame(b"TXT", "Lyricist/text writer", Text),
    frame(b"TYE", "Year", Text),
    frame(b"TXX", "User defined text information frame", Binary),
    frame(b"ULT", "Unsychronized lyric/text transcription", Binary),
    frame(b"UFI", "Unique file identifier", Binary),
    frame(b"WAR", "Official artist/performer webpage", Url),
    frame(b"WXX", "User defined URL link frame", Binary),
];

pub fn lookup(id: &[u8]) -> Option<&'static KnownFrame> {
    KNOWN_FRAMES.iter().find(|k| k.id == id)
}
