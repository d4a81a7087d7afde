use crate::types::{IntegerType, RawType, TextType};
use crate::vocabulary::{Alt, Checksum, Data, Field, Preset, Sha1Hash, Size, Symbol};
use crate::{GenerationError, IVariable, Memory};
use std::rc::Rc;

#[test]
fn size_prefix_counts_the_chosen_letter() {
    let letter: Rc<dyn IVariable> = Rc::new(Alt::of_constants("letter", vec!["A", "B", "C"]));
    let size = Rc::new(Size::new("len", &letter, IntegerType::u8()));
    let symbol = Symbol::new(
        "sized",
        vec![Field::new("len", size), Field::new("letter", letter)],
    );

    let mut memory = Memory::new();
    let (message, structure) = symbol.specialize_seeded(&mut memory, None, 7).unwrap();
    assert_eq!(message.len(), 2);
    assert_eq!(message[0], 1);
    assert!([b'A', b'B', b'C'].contains(&message[1]));
    assert_eq!(structure.get("len"), Some(&[1u8][..]));
}

#[test]
fn selector_callback_pins_the_alternative() {
    let verdict = Alt::of_constants("verdict", vec!["AA", "BB", "CC"]);
    verdict.set_selector(Rc::new(|_, _| 1)).unwrap();
    let symbol = Symbol::new("alt", vec![Field::new("verdict", Rc::new(verdict))]);

    let mut memory = Memory::new();
    for _ in 0..5 {
        let (message, _) = symbol.specialize(&mut memory, None).unwrap();
        assert_eq!(message, b"BB".to_vec());
    }
}

#[test]
fn negative_selector_indices_wrap_from_the_end() {
    let verdict = Alt::of_constants("verdict", vec!["AA", "BB", "CC"]);
    verdict.set_selector(Rc::new(|_, _| -1)).unwrap();
    let symbol = Symbol::new("alt", vec![Field::new("verdict", Rc::new(verdict))]);

    let mut memory = Memory::new();
    let (message, _) = symbol.specialize(&mut memory, None).unwrap();
    assert_eq!(message, b"CC".to_vec());
}

#[test]
fn out_of_range_selection_fails_the_call() {
    let verdict = Alt::of_constants("verdict", vec!["AA", "BB"]);
    verdict.set_selector(Rc::new(|_, _| 5)).unwrap();
    let symbol = Symbol::new("alt", vec![Field::new("verdict", Rc::new(verdict))]);

    let mut memory = Memory::new();
    assert!(matches!(
        symbol.specialize(&mut memory, None),
        Err(GenerationError::InvalidSelection(_))
    ));
}

#[test]
fn specialize_then_parse_round_trips() {
    let payload: Rc<dyn IVariable> = Rc::new(Data::new("payload", Rc::new(RawType::new(1, 16))));
    let length = Rc::new(Size::new("len", &payload, IntegerType::u8()));
    let digest = Rc::new(Checksum::new("crc", &payload, Rc::new(Sha1Hash)));
    let symbol = Symbol::new(
        "report",
        vec![
            Field::new("len", length),
            Field::new("payload", payload),
            Field::new("crc", digest),
        ],
    );

    for seed in 0..20 {
        let mut memory = Memory::new();
        let (message, structure) = symbol.specialize_seeded(&mut memory, None, seed).unwrap();

        let mut fresh = Memory::new();
        let parsed = symbol.parse(&message, &mut fresh).expect("round trip");
        assert_eq!(parsed, structure);
        assert_eq!(parsed.message(), message);
    }
}

#[test]
fn presets_pin_field_emissions() {
    let code: Rc<dyn IVariable> = Rc::new(Data::new("code", Rc::new(TextType::ascii(1, 8))));
    let symbol = Symbol::new(
        "login",
        vec![Field::from("USER "), Field::new("code", code)],
    );

    let preset = Preset::new().pin_field("code", "s3cret");
    let mut memory = Memory::new();
    let (message, structure) = symbol.specialize(&mut memory, Some(&preset)).unwrap();
    assert_eq!(message, b"USER s3cret".to_vec());
    assert_eq!(structure.get("code"), Some(&b"s3cret"[..]));
    assert!(preset.matches(&structure));
}

#[test]
fn value_pools_drain_to_exhaustion() {
    let code: Rc<dyn IVariable> = Rc::new(Data::new("code", Rc::new(TextType::ascii(1, 8))));
    let symbol = Symbol::new("login", vec![Field::new("code", code)]);

    let preset = Preset::new().pool_field("code", vec![b"one".to_vec(), b"two".to_vec()]);
    let mut memory = Memory::new();
    assert_eq!(
        symbol.specialize(&mut memory, Some(&preset)).unwrap().0,
        b"one".to_vec()
    );
    assert_eq!(
        symbol.specialize(&mut memory, Some(&preset)).unwrap().0,
        b"two".to_vec()
    );
    assert!(matches!(
        symbol.specialize(&mut memory, Some(&preset)),
        Err(GenerationError::ValuesExhausted(_))
    ));
}

#[test]
fn variable_keyed_pins_bypass_field_names() {
    let code = Rc::new(Data::new("code", Rc::new(TextType::ascii(1, 8))));
    let code_id = code.id();
    let symbol = Symbol::new("login", vec![Field::new("code", code)]);

    let pinned = Preset::new().pin_variable(code_id, "fixed");
    let mut memory = Memory::new();
    assert_eq!(
        symbol.specialize(&mut memory, Some(&pinned)).unwrap().0,
        b"fixed".to_vec()
    );

    let pooled = Preset::new().pool_variable(code_id, vec![b"one".to_vec()]);
    assert_eq!(
        symbol.specialize(&mut memory, Some(&pooled)).unwrap().0,
        b"one".to_vec()
    );
    assert!(matches!(
        symbol.specialize(&mut memory, Some(&pooled)),
        Err(GenerationError::ValuesExhausted(_))
    ));
}

#[test]
fn pattern_text_cannot_be_drawn_at_random() {
    let word: Rc<dyn IVariable> = Rc::new(Data::new(
        "word",
        Rc::new(TextType::pattern(r"^[a-z]+$", 1, 4).unwrap()),
    ));
    let symbol = Symbol::new("word", vec![Field::new("word", word)]);

    let mut memory = Memory::new();
    assert!(matches!(
        symbol.specialize(&mut memory, None),
        Err(GenerationError::Unsupported(_))
    ));

    // A preset pin makes it well defined again.
    let preset = Preset::new().pin_field("word", "abc");
    assert_eq!(
        symbol.specialize(&mut memory, Some(&preset)).unwrap().0,
        b"abc".to_vec()
    );
}

#[test]
fn empty_symbol_specializes_to_nothing() {
    let mut memory = Memory::new();
    let (message, structure) = Symbol::empty().specialize(&mut memory, None).unwrap();
    assert!(message.is_empty());
    assert!(structure.entries().is_empty());
}
