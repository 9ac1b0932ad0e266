//! ID3v2.2 / v2.3 / v2.4 tag codec.

pub mod frame;
pub mod header;
pub mod tag;
pub mod unsync;

pub use frame::{Frame, FrameContent, FrameId, TextEncoding};
pub use header::{decode_synchsafe, encode_synchsafe, TagHeader};
pub use tag::Tag;
