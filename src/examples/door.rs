//! A door lock dialogue.
//!
//! ```text
//! client                       server
//!   |---- OPEN <code> ----------->|      open_request
//!   |<--- GRANTED | DENIED -------|      open_granted / open_denied
//!   |---- <len><payload><crc> --->|      report
//!   |            (close)          |
//! ```
//!
//! The server grants access when the code matches the expected one, which
//! the client pins through a preset. The report carries a size relation
//! and a SHA-1 checksum over its payload.

use crate::grammar::{Automaton, Transition};
use crate::types::{IntegerType, RawType, TextType};
use crate::vocabulary::{Checksum, Data, Field, Preset, Sha1Hash, Size, Symbol};
use crate::IVariable;
use std::rc::Rc;

/// The code granting access in this demo.
pub const DOOR_CODE: &str = "1234";

/// The symbols of the door dialogue. Build one bundle per actor: symbol
/// identity drives transition matching, so an actor's automaton and its
/// catalogue must come from the same bundle.
pub struct DoorProtocol {
    pub open_request: Rc<Symbol>,
    pub open_granted: Rc<Symbol>,
    pub open_denied: Rc<Symbol>,
    pub report: Rc<Symbol>,
}

impl DoorProtocol {
    pub fn new() -> Self {
        let code = Rc::new(Data::new("code", Rc::new(TextType::ascii(4, 4))));
        let open_request = Rc::new(Symbol::new(
            "open_request",
            vec![Field::from("OPEN "), Field::new("code", code)],
        ));
        let open_granted = Rc::new(Symbol::new("open_granted", vec![Field::from("GRANTED")]));
        let open_denied = Rc::new(Symbol::new("open_denied", vec![Field::from("DENIED")]));

        let payload: Rc<dyn IVariable> =
            Rc::new(Data::new("payload", Rc::new(RawType::new(1, 16))));
        let length = Rc::new(Size::new("len", &payload, IntegerType::u8()));
        let digest = Rc::new(Checksum::new("crc", &payload, Rc::new(Sha1Hash)));
        let report = Rc::new(Symbol::new(
            "report",
            vec![
                Field::new("len", length),
                Field::new("payload", payload),
                Field::new("crc", digest),
            ],
        ));

        Self {
            open_request,
            open_granted,
            open_denied,
            report,
        }
    }

    /// The catalogue registered on the abstraction layer.
    pub fn catalogue(&self) -> Vec<Rc<Symbol>> {
        vec![
            Rc::clone(&self.open_request),
            Rc::clone(&self.open_granted),
            Rc::clone(&self.open_denied),
            Rc::clone(&self.report),
        ]
    }

    /// The initiator endpoint: authenticate, upload a report, close.
    pub fn client_automaton(&self) -> Automaton {
        let mut automaton = Automaton::new("door-client");
        let s0 = automaton.add_state("s0");
        let s1 = automaton.add_state("s1");
        let s2 = automaton.add_state("s2");
        let s3 = automaton.add_state("s3");
        let s4 = automaton.add_state("s4");
        automaton.add_transition(Transition::open_channel("open", s0, s1));
        automaton.add_transition(
            Transition::new(
                "request",
                s1,
                s2,
                &self.open_request,
                vec![
                    Rc::clone(&self.open_granted),
                    Rc::clone(&self.open_denied),
                ],
            )
            .with_input_preset(Preset::new().pin_field("code", DOOR_CODE)),
        );
        automaton.add_transition(Transition::new(
            "send_report",
            s2,
            s3,
            &self.report,
            Vec::new(),
        ));
        automaton.add_transition(Transition::close_channel("close", s3, s4));
        automaton
    }

    /// The responder endpoint: grant or deny, collect the report, close.
    pub fn server_automaton(&self) -> Automaton {
        let mut automaton = Automaton::new("door-server");
        let s0 = automaton.add_state("s0");
        let s1 = automaton.add_state("s1");
        let s2 = automaton.add_state("s2");
        let s3 = automaton.add_state("s3");
        let s4 = automaton.add_state("s4");
        automaton.add_transition(Transition::open_channel("open", s0, s1));
        automaton.add_transition(
            Transition::new(
                "serve_ok",
                s1,
                s2,
                &self.open_request,
                vec![Rc::clone(&self.open_granted)],
            )
            .with_input_preset(Preset::new().pin_field("code", DOOR_CODE)),
        );
        automaton.add_transition(Transition::new(
            "serve_ko",
            s1,
            s2,
            &self.open_request,
            vec![Rc::clone(&self.open_denied)],
        ));
        automaton.add_transition(Transition::new(
            "collect",
            s2,
            s3,
            &self.report,
            Vec::new(),
        ));
        automaton.add_transition(Transition::close_channel("close", s3, s4));
        automaton
    }
}

impl Default for DoorProtocol {
    fn default() -> Self {
        DoorProtocol::new()
    }
}
