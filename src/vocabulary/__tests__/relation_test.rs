use crate::types::{IntegerType, RawType, TextType};
use crate::vocabulary::{
    Agg, Checksum, Data, Field, HashFunction, Sha1Hash, Size, Symbol, Value,
};
use crate::{IVariable, Memory};
use std::rc::Rc;

#[test]
fn checksum_digests_its_target() {
    let payload: Rc<dyn IVariable> = Rc::new(Data::new("payload", Rc::new(RawType::fixed(3))));
    let digest = Rc::new(Checksum::new("crc", &payload, Rc::new(Sha1Hash)));
    let symbol = Symbol::new(
        "signed",
        vec![Field::new("payload", payload), Field::new("crc", digest)],
    );

    let mut memory = Memory::new();
    let (message, structure) = symbol.specialize_seeded(&mut memory, None, 3).unwrap();
    assert_eq!(message.len(), 3 + 20);

    let payload_bytes = structure.get("payload").unwrap();
    assert_eq!(
        structure.get("crc").unwrap(),
        Sha1Hash.calculate(payload_bytes).as_slice()
    );
}

#[test]
fn little_endian_checksums_reverse_the_digest() {
    let payload: Rc<dyn IVariable> = Rc::new(Data::new("payload", Rc::new(RawType::fixed(3))));
    let digest = Rc::new(Checksum::new("crc", &payload, Rc::new(Sha1Hash)).little_endian());
    let symbol = Symbol::new(
        "signed",
        vec![Field::new("payload", payload), Field::new("crc", digest)],
    );

    let mut memory = Memory::new();
    let (message, structure) = symbol.specialize_seeded(&mut memory, None, 5).unwrap();
    let mut expected = Sha1Hash.calculate(structure.get("payload").unwrap());
    expected.reverse();
    assert_eq!(structure.get("crc").unwrap(), expected.as_slice());

    // The flipped digest parses back against the same template.
    let mut fresh = Memory::new();
    assert!(symbol.parse(&message, &mut fresh).is_some());
}

#[test]
fn little_endian_counts_encode_the_low_byte_first() {
    let payload: Rc<dyn IVariable> = Rc::new(Data::new("payload", Rc::new(RawType::fixed(3))));
    let length = Rc::new(Size::new(
        "len",
        &payload,
        IntegerType::u16().little_endian(),
    ));
    let symbol = Symbol::new(
        "frame",
        vec![Field::new("len", length), Field::new("payload", payload)],
    );

    let mut memory = Memory::new();
    let (message, _) = symbol.specialize_seeded(&mut memory, None, 9).unwrap();
    assert_eq!(message[..2], [3u8, 0]);

    let mut fresh = Memory::new();
    assert!(symbol.parse(&message, &mut fresh).is_some());
}

#[test]
fn size_counts_targets_on_either_side() {
    // The count sits before its target: emitted through a deferred pass.
    let before: Rc<dyn IVariable> = Rc::new(Data::new("body", Rc::new(RawType::new(2, 9))));
    let leading = Rc::new(Size::new("len", &before, IntegerType::u8()));
    let prefixed = Symbol::new(
        "prefixed",
        vec![Field::new("len", leading), Field::new("body", before)],
    );

    // The count sits after its target: emitted in place.
    let after: Rc<dyn IVariable> = Rc::new(Data::new("body", Rc::new(RawType::new(2, 9))));
    let trailing = Rc::new(Size::new("len", &after, IntegerType::u8()));
    let suffixed = Symbol::new(
        "suffixed",
        vec![Field::new("body", after), Field::new("len", trailing)],
    );

    let mut memory = Memory::new();
    for seed in 0..10 {
        let (message, structure) = prefixed.specialize_seeded(&mut memory, None, seed).unwrap();
        assert_eq!(message[0] as usize, structure.get("body").unwrap().len());

        let (message, structure) = suffixed.specialize_seeded(&mut memory, None, seed).unwrap();
        assert_eq!(
            *message.last().unwrap() as usize,
            structure.get("body").unwrap().len()
        );
    }
}

#[test]
fn value_mirrors_its_target() {
    let token: Rc<dyn IVariable> = Rc::new(Data::new("token", Rc::new(TextType::ascii(2, 6))));
    let echo = Rc::new(Value::new("echo", &token));
    let symbol = Symbol::new(
        "echoed",
        vec![Field::new("token", token), Field::new("echo", echo)],
    );

    let mut memory = Memory::new();
    let (message, structure) = symbol.specialize_seeded(&mut memory, None, 11).unwrap();
    let token_bytes = structure.get("token").unwrap();
    assert_eq!(structure.get("echo").unwrap(), token_bytes);
    assert_eq!(message.len(), token_bytes.len() * 2);

    // And the emission parses back.
    let mut fresh = Memory::new();
    let parsed = symbol.parse(&message, &mut fresh).expect("round trip");
    assert_eq!(parsed, structure);
}

#[test]
fn value_recalls_previous_exchanges() {
    let token: Rc<dyn IVariable> = Rc::new(Data::new("token", Rc::new(TextType::ascii(4, 4))));
    let hello = Symbol::new("hello", vec![Field::new("token", Rc::clone(&token))]);
    let echo = Rc::new(Value::new("echo", &token));
    let reply = Symbol::new("reply", vec![Field::from("ACK "), Field::new("echo", echo)]);

    let mut memory = Memory::new();
    hello.parse(b"abcd", &mut memory).expect("hello should parse");
    assert!(reply.parse(b"ACK abcd", &mut memory).is_some());
    assert!(reply.parse(b"ACK zzzz", &mut memory).is_none());
}

#[test]
fn sized_payload_parses_back() {
    let payload: Rc<dyn IVariable> = Rc::new(Data::new("payload", Rc::new(RawType::new(1, 16))));
    let length = Rc::new(Size::new("len", &payload, IntegerType::u8()));
    let symbol = Symbol::new(
        "frame",
        vec![Field::new("len", length), Field::new("payload", payload)],
    );

    let mut memory = Memory::new();
    let structure = symbol.parse(b"\x05hello", &mut memory).expect("should parse");
    assert_eq!(structure.get("payload"), Some(&b"hello"[..]));

    // A count disagreeing with the payload is rejected.
    assert!(symbol.parse(b"\x04hello", &mut memory).is_none());
}

#[test]
fn relation_cycles_are_rejected_at_registration() {
    let blob = Rc::new(Agg::init("blob"));
    let blob_dyn: Rc<dyn IVariable> = blob.clone();
    let length = Rc::new(Size::new("len", &blob_dyn, IntegerType::u8()));
    blob.set_children(vec![length, Rc::new(Data::constant("x", "X"))])
        .unwrap();
    let symbol = Symbol::new("cyclic", vec![Field::new("blob", blob_dyn)]);

    let error = symbol.validate().expect_err("the cycle should be rejected");
    assert_eq!(error.what(), "CircularRelation");
}

#[test]
fn shared_structural_positions_are_rejected() {
    let shared: Rc<dyn IVariable> = Rc::new(Data::constant("x", "X"));
    let symbol = Symbol::new(
        "doubled",
        vec![
            Field::new("first", Rc::clone(&shared)),
            Field::new("second", shared),
        ],
    );
    let error = symbol.validate().expect_err("sharing should be rejected");
    assert_eq!(error.what(), "SharedDomain");
}
