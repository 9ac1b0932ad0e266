use parsley::boxes::{BoxPayload, FourCC, SizeForm};
use parsley::default_registry;
use parsley::error::Error;
use parsley::parser::{is_box_sequence, parse, parse_children, read_box_header};
use parsley::writer::to_bytes;
use std::io::{Cursor, Seek, SeekFrom};

fn bx(typ: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&(8 + payload.len() as u32).to_be_bytes());
    v.extend_from_slice(typ);
    v.extend_from_slice(payload);
    v
}

fn make_minimal_file() -> Vec<u8> {
    // [ftyp box]
    // size: 24 (0x18), type: "ftyp", payload: 16 bytes
    let mut payload = Vec::new();
    payload.extend_from_slice(b"isom");
    payload.extend_from_slice(&512u32.to_be_bytes());
    payload.extend_from_slice(b"isom");
    payload.extend_from_slice(b"avc1");
    bx(b"ftyp", &payload)
}

fn parse_bytes(data: &[u8]) -> parsley::Result<parsley::AtomTree> {
    let mut cur = Cursor::new(data);
    parse(&mut cur, data.len() as u64, default_registry())
}

#[test]
fn read_single_ftyp_header() {
    let data = make_minimal_file();
    let len = data.len() as u64;
    let mut cur = Cursor::new(data);

    let hdr = read_box_header(&mut cur, len).expect("read_box_header failed");

    assert_eq!(hdr.start, 0);
    assert_eq!(hdr.size, 24);
    assert_eq!(hdr.typ, FourCC(*b"ftyp"));
    assert_eq!(hdr.header_size, 8);
    assert_eq!(hdr.form, SizeForm::Compact);
}

#[test]
fn parse_children_no_children_for_leaf() {
    let data = make_minimal_file();
    let mut cur = Cursor::new(data);
    let len = cur.get_ref().len() as u64;

    let hdr = read_box_header(&mut cur, len).expect("read_box_header failed");
    // seek past payload so parse_children sees no additional boxes
    cur.seek(SeekFrom::Start(hdr.start + hdr.size)).unwrap();

    let (children, trailer) =
        parse_children(&mut cur, len, default_registry()).expect("parse_children failed");
    assert!(children.is_empty());
    assert!(trailer.is_empty());
}

#[test]
fn nested_tree_round_trips_byte_for_byte() {
    let trak = bx(b"trak", &bx(b"tkhd", &[7u8; 12]));
    let mut moov_payload = bx(b"mvhd", &[1u8; 20]);
    moov_payload.extend(trak);

    let mut data = make_minimal_file();
    data.extend(bx(b"moov", &moov_payload));
    data.extend(bx(b"free", &[]));
    data.extend(bx(b"mdat", &[0xAB; 9]));

    let tree = parse_bytes(&data).unwrap();
    let types: Vec<_> = tree.boxes.iter().map(|b| b.typ).collect();
    assert_eq!(
        types,
        vec![FourCC(*b"ftyp"), FourCC(*b"moov"), FourCC(*b"free"), FourCC(*b"mdat")]
    );

    let moov = tree.find(b"moov").unwrap();
    let kids = moov.children().unwrap();
    assert_eq!(kids.len(), 2);
    assert_eq!(kids[1].typ, FourCC(*b"trak"));
    assert_eq!(kids[1].children().unwrap()[0].typ, FourCC(*b"tkhd"));

    assert_eq!(to_bytes(&tree).unwrap(), data);
}

#[test]
fn extended_size_is_kept() {
    let mut data = Vec::new();
    data.extend_from_slice(&1u32.to_be_bytes());
    data.extend_from_slice(b"mdat");
    data.extend_from_slice(&20u64.to_be_bytes());
    data.extend_from_slice(&[1, 2, 3, 4]);

    let tree = parse_bytes(&data).unwrap();
    let mdat = &tree.boxes[0];
    assert_eq!(mdat.form, SizeForm::Extended);
    assert_eq!(mdat.size, 20);
    assert_eq!(mdat.header_len(), 16);
    assert_eq!(mdat.payload, BoxPayload::Data(vec![1, 2, 3, 4]));
    assert_eq!(to_bytes(&tree).unwrap(), data);
}

#[test]
fn zero_size_box_runs_to_end_of_stream() {
    let mut data = bx(b"free", &[]);
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend_from_slice(b"mdat");
    data.extend_from_slice(&[9u8; 5]);

    let tree = parse_bytes(&data).unwrap();
    let mdat = &tree.boxes[1];
    assert_eq!(mdat.form, SizeForm::ToEnd);
    assert_eq!(mdat.size, 13);
    assert_eq!(to_bytes(&tree).unwrap(), data);
}

#[test]
fn uuid_box_keeps_extended_type() {
    let uuid = [0x11u8; 16];
    let mut data = Vec::new();
    data.extend_from_slice(&27u32.to_be_bytes());
    data.extend_from_slice(b"uuid");
    data.extend_from_slice(&uuid);
    data.extend_from_slice(b"xyz");

    let tree = parse_bytes(&data).unwrap();
    let b = &tree.boxes[0];
    assert_eq!(b.uuid, Some(uuid));
    assert_eq!(b.header_len(), 24);
    assert_eq!(b.payload, BoxPayload::Opaque(b"xyz".to_vec()));
    assert_eq!(to_bytes(&tree).unwrap(), data);
}

#[test]
fn short_slack_inside_container_is_a_trailer() {
    let mut payload = bx(b"mvhd", &[0u8; 4]);
    payload.extend_from_slice(&[0xDE, 0xAD, 0x00]);
    let data = bx(b"moov", &payload);

    let tree = parse_bytes(&data).unwrap();
    match &tree.boxes[0].payload {
        BoxPayload::Container { header, children, trailer } => {
            assert!(header.is_empty());
            assert_eq!(children.len(), 1);
            assert_eq!(trailer, &vec![0xDE, 0xAD, 0x00]);
        }
        other => panic!("expected container, got {other:?}"),
    }
    assert_eq!(to_bytes(&tree).unwrap(), data);
}

#[test]
fn meta_header_depends_on_flavour() {
    let hdlr = bx(b"hdlr", &[0u8; 4]);

    // ISO full box: version/flags word before the children
    let mut iso = vec![0u8; 4];
    iso.extend_from_slice(&hdlr);
    let iso = bx(b"meta", &iso);
    // QuickTime: children start right away
    let qt = bx(b"meta", &hdlr);

    for (data, header_len) in [(iso, 4), (qt, 0)] {
        let tree = parse_bytes(&data).unwrap();
        match &tree.boxes[0].payload {
            BoxPayload::Container { header, children, .. } => {
                assert_eq!(header.len(), header_len);
                assert_eq!(children[0].typ, FourCC(*b"hdlr"));
            }
            other => panic!("expected container, got {other:?}"),
        }
        assert_eq!(to_bytes(&tree).unwrap(), data);
    }
}

#[test]
fn sample_description_skips_entry_count() {
    let mut payload = vec![0, 0, 0, 0, 0, 0, 0, 1];
    payload.extend(bx(b"avc1", &[0u8; 6]));
    let data = bx(b"stsd", &payload);

    let tree = parse_bytes(&data).unwrap();
    match &tree.boxes[0].payload {
        BoxPayload::Container { header, children, .. } => {
            assert_eq!(header, &vec![0, 0, 0, 0, 0, 0, 0, 1]);
            assert_eq!(children[0].typ, FourCC(*b"avc1"));
        }
        other => panic!("expected container, got {other:?}"),
    }
    assert_eq!(to_bytes(&tree).unwrap(), data);
}

#[test]
fn size_below_header_is_malformed() {
    let mut data = Vec::new();
    data.extend_from_slice(&7u32.to_be_bytes());
    data.extend_from_slice(b"free");
    let err = parse_bytes(&data).unwrap_err();
    assert!(matches!(err.root(), Error::MalformedSize(_)), "{err:?}");

    let mut inner = Vec::new();
    inner.extend_from_slice(&4u32.to_be_bytes());
    inner.extend_from_slice(b"mvhd");
    let err = parse_bytes(&bx(b"moov", &inner)).unwrap_err();
    assert!(matches!(err, Error::InBox { typ: FourCC(t), .. } if &t == b"moov"));
    assert!(matches!(err.root(), Error::MalformedSize(_)), "{err:?}");
}

#[test]
fn size_exactly_header_is_an_empty_box() {
    let tree = parse_bytes(&bx(b"free", &[])).unwrap();
    assert_eq!(tree.boxes[0].payload, BoxPayload::Data(Vec::new()));
}

#[test]
fn box_past_end_of_stream_is_truncated() {
    let mut data = Vec::new();
    data.extend_from_slice(&100u32.to_be_bytes());
    data.extend_from_slice(b"mdat");
    data.extend_from_slice(&[0u8; 12]);
    let err = parse_bytes(&data).unwrap_err();
    assert!(matches!(err.root(), Error::Truncated { needed: 100, available: 20, .. }), "{err:?}");

    let err = parse_bytes(&[0, 0, 0]).unwrap_err();
    assert!(matches!(err.root(), Error::Truncated { .. }), "{err:?}");
}

#[test]
fn child_past_end_of_parent_is_malformed() {
    let mut inner = Vec::new();
    inner.extend_from_slice(&32u32.to_be_bytes());
    inner.extend_from_slice(b"mvhd");
    inner.extend_from_slice(&[0u8; 8]);
    let err = parse_bytes(&bx(b"moov", &inner)).unwrap_err();
    assert!(matches!(err.root(), Error::MalformedSize(_)), "{err:?}");
}

#[test]
fn unknown_box_with_box_payload_becomes_container() {
    let mut payload = bx(b"free", &[]);
    payload.extend(bx(b"zzzz", &[1, 2]));
    let data = bx(b"abcd", &payload);

    let tree = parse_bytes(&data).unwrap();
    match &tree.boxes[0].payload {
        BoxPayload::GenericContainer(children) => {
            assert_eq!(children.len(), 2);
            assert_eq!(children[1].payload, BoxPayload::Opaque(vec![1, 2]));
        }
        other => panic!("expected generic container, got {other:?}"),
    }
    assert_eq!(to_bytes(&tree).unwrap(), data);
}

#[test]
fn unknown_box_with_plain_payload_stays_opaque() {
    let data = bx(b"abcd", b"hello world");
    let tree = parse_bytes(&data).unwrap();
    assert_eq!(tree.boxes[0].payload, BoxPayload::Opaque(b"hello world".to_vec()));
    assert!(tree.boxes[0].payload.is_unknown());
    assert_eq!(to_bytes(&tree).unwrap(), data);
}

#[test]
fn unknown_box_falls_back_to_opaque_when_children_fail() {
    // a moov whose only child claims 100 bytes
    let broken_moov = bx(b"moov", &[0, 0, 0, 100, b'm', b'v', b'h', b'd']);
    let data = bx(b"abcd", &broken_moov);
    assert!(is_box_sequence(&broken_moov));

    let tree = parse_bytes(&data).unwrap();
    assert_eq!(tree.boxes[0].payload, BoxPayload::Opaque(broken_moov));
    assert_eq!(to_bytes(&tree).unwrap(), data);
}

#[test]
fn box_sequence_heuristic() {
    assert!(is_box_sequence(&bx(b"free", &[])));
    assert!(!is_box_sequence(&[]));
    assert!(!is_box_sequence(b"hello world"));
    // zero size is never accepted inside an unknown payload
    assert!(!is_box_sequence(&[0, 0, 0, 0, b'f', b'r', b'e', b'e']));
    let mut with_slack = bx(b"free", &[]);
    with_slack.push(0);
    assert!(!is_box_sequence(&with_slack));
}

#[test]
fn nesting_limit_is_enforced() {
    let mut data = bx(b"moov", &[]);
    for _ in 0..70 {
        data = bx(b"moov", &data);
    }
    let err = parse_bytes(&data).unwrap_err();
    assert!(matches!(err.root(), Error::MalformedSize(_)), "{err:?}");
}

#[test]
fn sizes_follow_edits() {
    let data = bx(b"moov", &bx(b"mvhd", &[0u8; 4]));
    let mut tree = parse_bytes(&data).unwrap();

    if let BoxPayload::Container { children, .. } = &mut tree.boxes[0].payload {
        children[0].payload = BoxPayload::Data(vec![0u8; 10]);
    }
    tree.recompute_sizes();
    assert_eq!(tree.boxes[0].size, 8 + 8 + 10);

    let bytes = to_bytes(&tree).unwrap();
    assert_eq!(bytes, bx(b"moov", &bx(b"mvhd", &[0u8; 10])));
    assert_eq!(parse_bytes(&bytes).unwrap(), tree);
}

#[test]
fn cause_chain_lists_outermost_first() {
    let mut inner = Vec::new();
    inner.extend_from_slice(&4u32.to_be_bytes());
    inner.extend_from_slice(b"mvhd");
    let err = parse_bytes(&bx(b"moov", &inner)).unwrap_err();

    let chain = parsley::error::cause_chain(&err);
    assert_eq!(chain.len(), 3);
    assert!(chain[0].starts_with("in 'moov' box"), "{chain:?}");
    assert!(chain[1].starts_with("in 'mvhd' box"), "{chain:?}");
    assert!(chain[2].starts_with("malformed size"), "{chain:?}");
}
