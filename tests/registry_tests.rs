use parsley::boxes::{BoxKey, BoxPayload, FourCC};
use parsley::id3::FrameId;
use parsley::parser::parse;
use parsley::registry::{builtin_registry, FrameStrategy};
use parsley::{default_registry, Registry, Strategy};
use std::io::Cursor;

fn key(code: &[u8; 4]) -> BoxKey {
    BoxKey::FourCC(FourCC(*code))
}

fn bx(typ: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&(8 + payload.len() as u32).to_be_bytes());
    v.extend_from_slice(typ);
    v.extend_from_slice(payload);
    v
}

#[test]
fn default_registry_knows_common_boxes() {
    let reg = default_registry();
    assert_eq!(reg.lookup_box(&key(b"moov")), Strategy::Container { header_len: 0 });
    assert_eq!(reg.lookup_box(&key(b"stsd")), Strategy::Container { header_len: 8 });
    assert_eq!(reg.lookup_box(&key(b"ftyp")), Strategy::Leaf);
    assert_eq!(reg.box_name(&key(b"moov")), Some("Movie Box"));
    assert!(reg.is_registered_box(&key(b"mdat")));
}

#[test]
fn unregistered_keys_resolve_to_unknown() {
    let reg = default_registry();
    assert_eq!(reg.lookup_box(&key(b"zzzz")), Strategy::Unknown);
    assert_eq!(reg.lookup_box(&BoxKey::Uuid([7u8; 16])), Strategy::Unknown);
    assert!(reg.box_name(&key(b"zzzz")).is_none());

    let id = FrameId::new(b"XYZW").unwrap();
    assert_eq!(reg.lookup_frame(&id), FrameStrategy::Unknown);
    assert!(!reg.is_registered_frame(&id));
}

#[test]
fn default_registry_knows_frames() {
    let reg = default_registry();
    let tit2 = FrameId::new(b"TIT2").unwrap();
    assert_eq!(reg.lookup_frame(&tit2), FrameStrategy::Text);
    assert_eq!(reg.frame_name(&tit2), Some("Title/songname/content description"));
    assert_eq!(reg.lookup_frame(&FrameId::new(b"TT2").unwrap()), FrameStrategy::Text);
    assert_eq!(reg.lookup_frame(&FrameId::new(b"WOAR").unwrap()), FrameStrategy::Url);
    assert_eq!(reg.lookup_frame(&FrameId::new(b"PRIV").unwrap()), FrameStrategy::Binary);
}

#[test]
fn empty_registry_treats_everything_as_unknown() {
    let reg = Registry::new();
    assert_eq!(reg.lookup_box(&key(b"moov")), Strategy::Unknown);

    // without a registration, moov is still recognised as a box sequence
    let data = bx(b"moov", &bx(b"mvhd", &[0u8; 4]));
    let tree = parse(&mut Cursor::new(&data), data.len() as u64, &reg).unwrap();
    assert!(matches!(tree.boxes[0].payload, BoxPayload::GenericContainer(_)));
}

#[test]
fn custom_registrations_drive_the_parser() {
    let uuid = [0x42u8; 16];
    let reg = builtin_registry()
        .with_box(key(b"test"), "Test Box", Strategy::Container { header_len: 2 })
        .with_box(BoxKey::Uuid(uuid), "Vendor Box", Strategy::Leaf)
        .with_frame(FrameId::new(b"XYZW").unwrap(), "Custom text", FrameStrategy::Text);

    assert_eq!(reg.box_name(&BoxKey::Uuid(uuid)), Some("Vendor Box"));
    assert!(reg.is_registered_frame(&FrameId::new(b"XYZW").unwrap()));
    // the shared default is untouched
    assert!(!default_registry().is_registered_box(&key(b"test")));

    let mut payload = vec![0xAA, 0xBB];
    payload.extend(bx(b"free", &[]));
    let data = bx(b"test", &payload);
    let tree = parse(&mut Cursor::new(&data), data.len() as u64, &reg).unwrap();
    match &tree.boxes[0].payload {
        BoxPayload::Container { header, children, trailer } => {
            assert_eq!(header, &vec![0xAA, 0xBB]);
            assert_eq!(children[0].typ, FourCC(*b"free"));
            assert!(trailer.is_empty());
        }
        other => panic!("expected container, got {other:?}"),
    }
}
