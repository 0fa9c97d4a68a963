use ofp_wire::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

fn iterate(obj: &mut Object<'_>, list: NodeId, cursor: NodeId) -> Vec<(usize, usize)> {
    let mut seen = Vec::new();
    match obj.first_element(list, cursor) {
        Ok(()) => {}
        Err(Error::OutOfRange) => return seen,
        Err(err) => panic!("first element: {:?}", err),
    }
    loop {
        seen.push((obj[cursor].offset() - obj[list].offset(), obj[cursor].length()));
        match obj.next_element(list, cursor) {
            Ok(()) => {}
            Err(Error::OutOfRange) => return seen,
            Err(err) => panic!("next element: {:?}", err),
        }
    }
}

#[test]
fn test_hello_list_build_and_iterate() {
    let mut hello = Object::create_with_capacity(Version::V1_3, ObjectType::Hello, 64).unwrap();
    let list = hello.hello_elements().unwrap();
    for len in [8, 12, 8] {
        let elem = hello
            .new_child(Version::V1_3, ObjectType::HelloElemVersionbitmap, Some(len))
            .unwrap();
        hello.append_bind(list, elem).unwrap();
    }
    assert_eq!(hello.length(), 8 + 8 + 12 + 8);
    assert_eq!(hello.header().unwrap().length(), 36);

    let cursor = hello
        .new_child(Version::V1_3, ObjectType::HelloElem, None)
        .unwrap();
    assert_eq!(iterate(&mut hello, list, cursor), vec![(0, 8), (8, 12), (20, 8)]);
    assert_eq!(hello.next(list, cursor), Err(Error::OutOfRange));
}

#[test]
fn test_hello_roundtrip_through_parse() {
    let mut hello = Object::create_with_capacity(Version::V1_3, ObjectType::Hello, 64).unwrap();
    hello.set_xid(0x1000).unwrap();
    let list = hello.hello_elements().unwrap();
    let elem = hello
        .new_child(Version::V1_3, ObjectType::HelloElemVersionbitmap, Some(8))
        .unwrap();
    hello.append_bind(list, elem).unwrap();
    hello.set_hello_elem_bitmap(elem, 0, 0b1_0010).unwrap();

    let bytes = hello.steal().unwrap();
    assert_eq!(bytes.len(), 16);

    let mut parsed = Object::new_from_message(bytes, 16).unwrap();
    assert_eq!(parsed.xid(), Ok(0x1000));
    let list = parsed.hello_elements().unwrap();
    let cursor = parsed
        .new_child(Version::V1_3, ObjectType::HelloElem, None)
        .unwrap();
    parsed.first_element(list, cursor).unwrap();
    assert_eq!(parsed.hello_elem_bitmaps(cursor), Ok(vec![0b1_0010]));
}

#[test]
fn test_packet_out_build_steal_parse() {
    let mut msg = Object::create(Version::V1_0, ObjectType::PacketOut).unwrap();
    msg.set_xid(77).unwrap();
    msg.set_packet_out_buffer_id(0xFFFF_FFFF).unwrap();
    msg.set_packet_out_in_port(0xFFF8).unwrap();

    let actions = msg.packet_out_actions().unwrap();
    for port in [1, 2] {
        let output = msg
            .new_child(Version::V1_0, ObjectType::ActionOutput, None)
            .unwrap();
        msg.append_bind(actions, output).unwrap();
        msg.set_action_output_port(output, port).unwrap();
    }
    let vlan = msg
        .new_child(Version::V1_0, ObjectType::ActionSetVlanVid, None)
        .unwrap();
    msg.append_bind(actions, vlan).unwrap();
    assert_eq!(msg.length(), 16 + 24);

    let bytes = msg.steal().unwrap();
    assert!(validate_message(&bytes).is_ok());

    let mut parsed = Object::new_from_message(bytes, 40).unwrap();
    assert_eq!(parsed.root().object_type(), ObjectType::PacketOut);
    assert_eq!(parsed.packet_out_in_port(), Ok(0xFFF8));

    let actions = parsed.packet_out_actions().unwrap();
    assert_eq!(parsed[actions].length(), 24);
    let cursor = parsed
        .new_child(Version::V1_0, ObjectType::Action, None)
        .unwrap();
    assert_eq!(
        iterate(&mut parsed, actions, cursor),
        vec![(0, 8), (8, 8), (16, 8)]
    );
    assert_eq!(parsed[cursor].object_type(), ObjectType::ActionSetVlanVid);

    parsed.first_element(actions, cursor).unwrap();
    parsed.next_element(actions, cursor).unwrap();
    assert_eq!(parsed.action_output_port(cursor), Ok(2));
}

#[test]
fn test_parsed_buffer_cannot_grow() {
    let mut bytes = vec![0x04, 13, 0x00, 24, 0, 0, 0, 1];
    bytes.extend_from_slice(&[0xFF; 8]);
    bytes.extend_from_slice(&[0; 8]);
    let mut parsed = Object::new_from_message(bytes, 24).unwrap();
    let actions = parsed.packet_out_actions().unwrap();
    let group = parsed
        .new_child(Version::V1_3, ObjectType::ActionGroup, None)
        .unwrap();
    assert_eq!(
        parsed.append_bind(actions, group),
        Err(Error::ResourceExhausted {
            needed: 32,
            available: 24
        })
    );
    assert_eq!(parsed.length(), 24);
}

#[test]
fn test_preallocated_parse_and_in_place_edit() {
    let mut buffer = [0u8; 64];
    buffer[..24].copy_from_slice(&[
        0x02, 13, 0x00, 24, 0, 0, 0, 5, // header
        0, 0, 1, 0, 0, 0, 0, 3, // buffer id, in port
        0, 0, 0, 0, 0, 0, 0, 0, // actions len, pad
    ]);
    {
        let mut storage = ObjectStorage::new();
        let obj = Object::new_from_message_preallocated(&mut storage, &mut buffer, 24).unwrap();
        assert_eq!(obj.root().version(), Version::V1_1);
        assert_eq!(obj.packet_out_buffer_id(), Ok(256));
        obj.set_packet_out_in_port(4).unwrap();
        obj.set_xid(6).unwrap();
    }
    assert_eq!(&buffer[4..8], &[0, 0, 0, 6]);
    assert_eq!(&buffer[12..16], &[0, 0, 0, 4]);
}

#[test]
fn test_bound_buffer_release_and_delete_callbacks() {
    let released = Rc::new(RefCell::new(None));
    let deleted = Rc::new(RefCell::new(None));

    let mut obj = Object::new(0).unwrap();
    let sink = Rc::clone(&released);
    obj.buffer_bind(
        vec![0x01, 0x00, 0x00, 0x08, 0, 0, 0, 3, 0xEE],
        8,
        Some(Box::new(move |bytes: Vec<u8>| *sink.borrow_mut() = Some(bytes))),
    )
    .unwrap();
    let sink = Rc::clone(&deleted);
    obj.set_delete_callback(move |obj| *sink.borrow_mut() = Some(obj.xid()));

    obj.delete();
    assert_eq!(*deleted.borrow(), Some(Ok(3)));
    assert_eq!(
        *released.borrow(),
        Some(vec![0x01, 0x00, 0x00, 0x08, 0, 0, 0, 3, 0xEE])
    );
}

#[test]
fn test_duplicate_element_out_of_list() {
    let mut hello = Object::create_with_capacity(Version::V1_3, ObjectType::Hello, 64).unwrap();
    let list = hello.hello_elements().unwrap();
    let elem = hello
        .new_child(Version::V1_3, ObjectType::HelloElemVersionbitmap, Some(8))
        .unwrap();
    hello.append_bind(list, elem).unwrap();
    hello.set_hello_elem_bitmap(elem, 0, 0x10).unwrap();

    let mut copy = hello.duplicate(elem).unwrap();
    copy.set_hello_elem_bitmap(NodeId::ROOT, 0, 0x08).unwrap();
    assert_eq!(hello.hello_elem_bitmaps(elem), Ok(vec![0x10]));
    assert_eq!(copy.hello_elem_bitmaps(NodeId::ROOT), Ok(vec![0x08]));
}

#[test]
#[should_panic(expected = "maximum parent depth")]
fn test_nesting_beyond_depth_bound_panics() {
    let config = ObjectConfig::new().with_max_parent_depth(3);
    let mut hello = Object::with_config(64, config).unwrap();
    hello
        .init(NodeId::ROOT, Version::V1_3, ObjectType::Hello, None, true)
        .unwrap();
    let list = hello.hello_elements().unwrap();
    let elem = hello
        .new_child(Version::V1_3, ObjectType::HelloElemVersionbitmap, Some(8))
        .unwrap();
    hello.append_bind(list, elem).unwrap();

    let word = hello
        .new_child(Version::V1_3, ObjectType::HelloElem, None)
        .unwrap();
    hello.attach_child(elem, word, 4, 0).unwrap();
    let _ = hello.propagate_length_delta(word, 0);
}
