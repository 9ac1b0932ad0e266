use parsley::config::{Config, FrameErrorPolicy};
use parsley::default_registry;
use parsley::error::Error;
use parsley::id3::unsync::stuff;
use parsley::id3::{encode_synchsafe, Frame, FrameContent, FrameId, Tag, TextEncoding};
use std::io::Cursor;

fn frame_v3(id: &[u8; 4], flags: u16, data: &[u8]) -> Vec<u8> {
    let mut v = id.to_vec();
    v.extend_from_slice(&(data.len() as u32).to_be_bytes());
    v.extend_from_slice(&flags.to_be_bytes());
    v.extend_from_slice(data);
    v
}

fn frame_v4(id: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut v = id.to_vec();
    v.extend_from_slice(&encode_synchsafe(data.len() as u32).unwrap());
    v.extend_from_slice(&[0, 0]);
    v.extend_from_slice(data);
    v
}

fn frame_v2(id: &[u8; 3], data: &[u8]) -> Vec<u8> {
    let mut v = id.to_vec();
    v.extend_from_slice(&(data.len() as u32).to_be_bytes()[1..]);
    v.extend_from_slice(data);
    v
}

fn tag_bytes(version: u8, flags: u8, body: &[u8]) -> Vec<u8> {
    let mut v = b"ID3".to_vec();
    v.extend_from_slice(&[version, 0, flags]);
    v.extend_from_slice(&encode_synchsafe(body.len() as u32).unwrap());
    v.extend_from_slice(body);
    v
}

fn latin1(s: &str) -> Vec<u8> {
    let mut v = vec![0];
    v.extend_from_slice(s.as_bytes());
    v
}

fn parse_with(data: &[u8], policy: FrameErrorPolicy) -> parsley::Result<Tag> {
    let cfg = Config {
        frame_errors: policy,
        ..Config::default()
    };
    Tag::parse(&mut Cursor::new(data), &cfg, default_registry())
}

fn parse_tag(data: &[u8]) -> parsley::Result<Tag> {
    parse_with(data, FrameErrorPolicy::Preserve)
}

#[test]
fn v23_tag_size_counts_frames_and_padding() {
    // frames of 20, 15 and 40 bytes, then 30 bytes of padding
    let mut body = frame_v3(b"TIT2", 0, &latin1("abcdefghi"));
    body.extend(frame_v3(b"TPE1", 0, &latin1("abcd")));
    body.extend(frame_v3(b"TALB", 0, &latin1(&"z".repeat(29))));
    assert_eq!(body.len(), 75);
    body.extend_from_slice(&[0u8; 30]);
    let data = tag_bytes(3, 0, &body);

    let tag = parse_tag(&data).unwrap();
    assert_eq!(tag.major_version, 3);
    assert_eq!(tag.frames.len(), 3);
    assert_eq!(tag.padding, 30);
    assert_eq!(
        tag.frames[0].content,
        FrameContent::Text {
            encoding: TextEncoding::Latin1,
            values: vec!["abcdefghi".to_string()],
        }
    );
    assert_eq!(tag.tag_size().unwrap(), 105);
    assert_eq!(tag.total_len().unwrap(), 115);
    assert_eq!(tag.to_bytes().unwrap(), data);
}

#[test]
fn v22_tag_round_trips() {
    let mut body = frame_v2(b"TT2", &latin1("xy"));
    body.extend(frame_v2(b"TP1", &latin1("band")));
    let data = tag_bytes(2, 0, &body);

    let tag = parse_tag(&data).unwrap();
    assert_eq!(tag.frames.len(), 2);
    assert_eq!(tag.frames[0].id, FrameId::new(b"TT2").unwrap());
    assert!(matches!(tag.frames[0].content, FrameContent::Text { .. }));
    assert_eq!(tag.padding, 0);
    assert_eq!(tag.to_bytes().unwrap(), data);
}

#[test]
fn v22_compression_is_rejected() {
    let data = tag_bytes(2, 0x40, &frame_v2(b"TT2", &latin1("xy")));
    assert!(matches!(parse_tag(&data), Err(Error::InvalidTag(_))));
}

#[test]
fn v24_footer_round_trips() {
    let body = frame_v4(b"TIT2", &[3, b'h', b'i']);
    let mut data = tag_bytes(4, 0x10, &body);
    let mut footer = b"3DI".to_vec();
    footer.extend_from_slice(&data[3..10]);
    data.extend(footer);

    let tag = parse_tag(&data).unwrap();
    assert_eq!(tag.frames.len(), 1);
    assert_eq!(tag.total_len().unwrap(), data.len() as u64);
    assert_eq!(tag.to_bytes().unwrap(), data);
}

#[test]
fn v24_footer_mismatch_is_invalid() {
    let body = frame_v4(b"TIT2", &[3, b'h', b'i']);
    let mut data = tag_bytes(4, 0x10, &body);
    data.extend_from_slice(b"ID3\x04\x00\x10\x00\x00\x00\x00");
    assert!(matches!(parse_tag(&data), Err(Error::InvalidTag(_))));
}

#[test]
fn unsynchronised_tag_is_restored_exactly() {
    let body = frame_v3(b"PRIV", 0, &[0xFF, 0xE0, 0x01, 0xFF]);
    let stuffed = stuff(&body);
    assert!(stuffed.len() > body.len());
    let data = tag_bytes(3, 0x80, &stuffed);

    let tag = parse_tag(&data).unwrap();
    assert_eq!(
        tag.frames[0].content,
        FrameContent::Binary(vec![0xFF, 0xE0, 0x01, 0xFF])
    );
    assert_eq!(tag.to_bytes().unwrap(), data);
}

#[test]
fn extended_header_is_kept_verbatim() {
    // v2.3: size counts the bytes after itself
    let ext3 = [0, 0, 0, 6, 0, 0, 0, 0, 0, 0];
    let mut body = ext3.to_vec();
    body.extend(frame_v3(b"TIT2", 0, &latin1("t")));
    let data = tag_bytes(3, 0x40, &body);
    let tag = parse_tag(&data).unwrap();
    assert_eq!(tag.extended_header.as_deref(), Some(&ext3[..]));
    assert_eq!(tag.frames.len(), 1);
    assert_eq!(tag.to_bytes().unwrap(), data);

    // v2.4: synchsafe size counts the whole extended header
    let ext4 = [0, 0, 0, 6, 1, 0];
    let mut body = ext4.to_vec();
    body.extend(frame_v4(b"TIT2", &latin1("t")));
    let data = tag_bytes(4, 0x40, &body);
    let tag = parse_tag(&data).unwrap();
    assert_eq!(tag.extended_header.as_deref(), Some(&ext4[..]));
    assert_eq!(tag.to_bytes().unwrap(), data);
}

#[test]
fn oversized_extended_header_is_malformed() {
    let mut body = vec![0, 0, 0, 0x7F, 0, 0];
    body.extend(frame_v3(b"TIT2", 0, &latin1("t")));
    let err = parse_tag(&tag_bytes(3, 0x40, &body)).unwrap_err();
    assert!(matches!(err, Error::MalformedSize(_)), "{err:?}");
}

#[test]
fn undecodable_frame_follows_policy() {
    let mut body = frame_v3(b"TIT2", 0, &[7, b'x']);
    body.extend(frame_v3(b"TPE1", 0, &latin1("ok")));
    let data = tag_bytes(3, 0, &body);

    let tag = parse_with(&data, FrameErrorPolicy::Preserve).unwrap();
    assert_eq!(tag.frames.len(), 2);
    match &tag.frames[0].content {
        FrameContent::Opaque { data, reason } => {
            assert_eq!(data, &vec![7, b'x']);
            assert!(reason.contains("encoding"), "{reason}");
        }
        other => panic!("expected opaque frame, got {other:?}"),
    }
    assert_eq!(tag.to_bytes().unwrap(), data);

    let tag = parse_with(&data, FrameErrorPolicy::Skip).unwrap();
    assert_eq!(tag.frames.len(), 1);
    assert_eq!(tag.frames[0].id, FrameId::new(b"TPE1").unwrap());

    let err = parse_with(&data, FrameErrorPolicy::Fail).unwrap_err();
    assert!(matches!(err, Error::InFrame { ref id, .. } if id == "TIT2"), "{err:?}");
    assert!(matches!(err.root(), Error::InvalidFrame(_)));
}

#[test]
fn badly_formed_frame_id_follows_policy() {
    let data = tag_bytes(3, 0, &frame_v3(b"ab!d", 0, &[1, 2]));
    let tag = parse_tag(&data).unwrap();
    assert!(matches!(tag.frames[0].content, FrameContent::Opaque { .. }));
    assert!(parse_with(&data, FrameErrorPolicy::Fail).is_err());
}

#[test]
fn frame_past_end_of_tag_is_malformed() {
    let mut body = frame_v3(b"TIT2", 0, &latin1("abc"));
    body[7] = 0x40;
    let err = parse_tag(&tag_bytes(3, 0, &body)).unwrap_err();
    assert!(matches!(err, Error::InFrame { .. }), "{err:?}");
    assert!(matches!(err.root(), Error::MalformedSize(_)));
}

#[test]
fn invalid_headers_are_rejected() {
    let err = parse_tag(b"TAG\x03\x00\x00\x00\x00\x00\x00").unwrap_err();
    assert!(matches!(err, Error::InvalidTag(_)), "{err:?}");

    let err = parse_tag(b"ID3\x05\x00\x00\x00\x00\x00\x00").unwrap_err();
    assert!(matches!(err, Error::UnsupportedVersion { major: 5, revision: 0 }), "{err:?}");

    let err = parse_tag(b"ID3\xFF\x00\x00\x00\x00\x00\x00").unwrap_err();
    assert!(matches!(err, Error::InvalidTag(_)), "{err:?}");

    let err = parse_tag(b"ID3\x03\x00\x00\x00\x00\x80\x00").unwrap_err();
    assert!(matches!(err, Error::InvalidTag(_)), "{err:?}");
}

#[test]
fn short_input_is_truncated() {
    let err = parse_tag(b"ID3\x03").unwrap_err();
    assert!(matches!(err, Error::Truncated { .. }), "{err:?}");

    let mut data = tag_bytes(3, 0, &[0u8; 100]);
    data.truncate(40);
    let err = parse_tag(&data).unwrap_err();
    assert!(matches!(err, Error::Truncated { needed: 100, available: 30, .. }), "{err:?}");
}

#[test]
fn non_zero_padding_is_rewritten_as_zeros() {
    let mut body = frame_v3(b"TIT2", 0, &latin1("a"));
    body.extend_from_slice(&[0, 1, 2]);
    let tag = parse_tag(&tag_bytes(3, 0, &body)).unwrap();
    assert_eq!(tag.padding, 3);

    let out = tag.to_bytes().unwrap();
    assert_eq!(&out[out.len() - 3..], &[0, 0, 0]);
}

#[test]
fn tag_built_in_memory_reparses() {
    let mut tag = Tag::new(4);
    tag.frames.push(Frame::text(FrameId::new(b"TIT2").unwrap(), TextEncoding::Utf8, "h\u{e9}llo"));
    tag.frames.push(Frame::text(FrameId::new(b"TPE1").unwrap(), TextEncoding::Utf16, "b\u{f6}b"));
    tag.frames.push(Frame {
        id: FrameId::new(b"WOAR").unwrap(),
        flags: 0,
        content: FrameContent::Url("http://example.com".into()),
    });
    tag.padding = 10;

    let bytes = tag.to_bytes().unwrap();
    assert_eq!(bytes.len() as u64, tag.total_len().unwrap());
    assert_eq!(parse_tag(&bytes).unwrap(), tag);
}

#[test]
fn v22_ids_are_refused_in_v24_tags() {
    let mut tag = Tag::new(4);
    tag.frames.push(Frame::text(FrameId::new(b"TT2").unwrap(), TextEncoding::Latin1, "x"));
    let err = tag.to_bytes().unwrap_err();
    assert!(matches!(err.root(), Error::InvalidFrame(_)), "{err:?}");
}

#[test]
fn text_that_does_not_reencode_stays_binary() {
    // big-endian BOM is valid but would come back little-endian
    let payload = [1, 0xFE, 0xFF, 0x00, 0x41];
    let data = tag_bytes(3, 0, &frame_v3(b"TIT2", 0, &payload));
    let tag = parse_tag(&data).unwrap();
    assert_eq!(tag.frames[0].content, FrameContent::Binary(payload.to_vec()));
    assert_eq!(tag.to_bytes().unwrap(), data);
}

#[test]
fn terminated_and_multi_value_text() {
    let data = tag_bytes(4, 0, &frame_v4(b"TPE1", b"\x00one\x00two\x00"));
    let tag = parse_tag(&data).unwrap();
    assert_eq!(
        tag.frames[0].content,
        FrameContent::Text {
            encoding: TextEncoding::Latin1,
            values: vec!["one".into(), "two".into(), String::new()],
        }
    );
    assert_eq!(tag.to_bytes().unwrap(), data);
}

#[test]
fn compressed_frame_is_not_decoded() {
    let data = tag_bytes(3, 0, &frame_v3(b"TIT2", 0x0080, &latin1("abc")));
    let tag = parse_tag(&data).unwrap();
    assert_eq!(tag.frames[0].flags, 0x0080);
    assert!(matches!(tag.frames[0].content, FrameContent::Binary(_)));
    assert_eq!(tag.to_bytes().unwrap(), data);
}

#[test]
fn write_refuses_headers_the_reader_would_reject() {
    let err = Tag::new(9).to_bytes().unwrap_err();
    assert!(matches!(err, Error::UnsupportedVersion { major: 9, .. }), "{err:?}");

    let mut tag = Tag::new(2);
    tag.extended_header = Some(vec![0, 0, 0, 6, 0, 0, 0, 0, 0, 0]);
    assert!(matches!(tag.to_bytes(), Err(Error::InvalidTag(_))));

    let mut tag = Tag::new(4);
    tag.extended_header = Some(vec![0, 0, 0, 6, 1, 0]);
    assert!(tag.validate().is_ok());
    tag.extended_header = Some(vec![0, 0, 0, 9, 1, 0]);
    assert!(matches!(tag.validate(), Err(Error::MalformedSize(_))));
}
