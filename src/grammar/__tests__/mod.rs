use crate::grammar::{Automaton, Transition, TransitionKind};
use crate::vocabulary::Symbol;
use std::rc::Rc;

#[test]
fn the_first_state_is_the_initial_one() {
    let mut automaton = Automaton::new("g");
    let s0 = automaton.add_state("s0");
    let s1 = automaton.add_state("s1");
    assert_eq!(automaton.initial(), Some(s0));

    automaton.set_initial(s1);
    assert_eq!(automaton.initial(), Some(s1));
}

#[test]
fn transitions_attach_to_their_start_state() {
    let mut automaton = Automaton::new("g");
    let s0 = automaton.add_state("s0");
    let s1 = automaton.add_state("s1");
    automaton.add_transition(Transition::open_channel("open", s0, s1));
    automaton.add_transition(Transition::close_channel("close", s1, s0));

    assert_eq!(automaton.state(s0).transitions().len(), 1);
    assert_eq!(automaton.state(s1).transitions().len(), 1);
    assert_eq!(automaton.state(s0).transitions()[0].end_state(), s1);
}

#[test]
fn copied_states_are_isolated_from_their_original() {
    let mut automaton = Automaton::new("g");
    let s0 = automaton.add_state("s0");
    let s1 = automaton.add_state("s1");
    automaton.add_transition(Transition::open_channel("open", s0, s1));

    let original = automaton.state(s0).copy();
    let mut copied = original.copy();
    copied.transitions.push(Transition::close_channel("close", s0, s1));
    copied.add_filter_callback(Rc::new(|transitions, _, _, _| transitions));

    assert_eq!(original.transitions().len(), 1);
    assert_eq!(copied.transitions().len(), 2);
    assert_eq!(original.filter_callbacks.len(), 0);
    assert_eq!(copied.filter_callbacks.len(), 1);
}

#[test]
fn copied_transitions_are_isolated_from_their_original() {
    let mut automaton = Automaton::new("g");
    let s0 = automaton.add_state("s0");
    let s1 = automaton.add_state("s1");
    let symbol = Rc::new(Symbol::new("ping", vec!["PING".into()]));
    let original = Transition::new("t", s0, s1, &symbol, Vec::new()).with_probability(70);

    let copied = original.copy().with_probability(30);
    assert_eq!(original.probability(), 70);
    assert_eq!(copied.probability(), 30);
    assert!(matches!(copied.kind(), TransitionKind::Message(_)));
}

#[test]
#[should_panic(expected = "out of 0..=100")]
fn probabilities_above_100_are_rejected() {
    let mut automaton = Automaton::new("g");
    let s0 = automaton.add_state("s0");
    let s1 = automaton.add_state("s1");
    let _ = Transition::open_channel("open", s0, s1).with_probability(101);
}

#[test]
fn automata_describe_their_graph() {
    let mut automaton = Automaton::new("door");
    let s0 = automaton.add_state("s0");
    let s1 = automaton.add_state("s1");
    automaton.add_transition(Transition::open_channel("open", s0, s1));

    let tree = automaton.describe();
    assert_eq!(tree.label(), "door");
}
