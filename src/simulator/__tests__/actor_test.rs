use crate::grammar::{Automaton, StateId, Transition};
use crate::simulator::{pipe, AbstractionLayer, Actor, Channel, PipeChannel};
use crate::vocabulary::Symbol;
use crate::{ActorError, ChannelError};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn actor_over_pipe(
    automaton: Automaton,
    catalogue: Vec<Rc<Symbol>>,
    initiator: bool,
) -> (Actor, PipeChannel) {
    let (mine, peer) = pipe();
    let layer = AbstractionLayer::new(Box::new(mine), catalogue)
        .unwrap()
        .with_timeout(Duration::from_millis(200));
    (Actor::new("actor", automaton, layer, initiator), peer)
}

fn abc_symbols() -> (Rc<Symbol>, Rc<Symbol>, Rc<Symbol>) {
    (
        Rc::new(Symbol::new("a", vec!["AAA".into()])),
        Rc::new(Symbol::new("b", vec!["BBB".into()])),
        Rc::new(Symbol::new("c", vec!["CCC".into()])),
    )
}

/// A responder expecting symbol `a` and answering with symbol `b`.
fn responder_automaton(a: &Rc<Symbol>, b: &Rc<Symbol>) -> (Automaton, StateId) {
    let mut automaton = Automaton::new("responder");
    let s0 = automaton.add_state("s0");
    let s1 = automaton.add_state("s1");
    let s2 = automaton.add_state("s2");
    automaton.add_transition(Transition::open_channel("open", s0, s1));
    automaton.add_transition(Transition::new("t", s1, s2, a, vec![Rc::clone(b)]));
    (automaton, s0)
}

#[test]
fn role_selection_truth_table() {
    let (a, b, _) = abc_symbols();
    let mut automaton = Automaton::new("roles");
    let s0 = automaton.add_state("s0");
    let s1 = automaton.add_state("s1");
    automaton.add_transition(Transition::new("straight", s0, s1, &a, vec![Rc::clone(&b)]));
    automaton.add_transition(
        Transition::new("inverse", s0, s1, &a, vec![Rc::clone(&b)]).with_inverse_initiator(true),
    );

    for (initiator, inverse, expect_receiving) in [
        (true, false, false),
        (true, true, true),
        (false, false, true),
        (false, true, false),
    ] {
        let (actor, _peer) = actor_over_pipe(automaton.copy(), Vec::new(), initiator);
        let index = usize::from(inverse);
        let transition = &actor.automaton().state(s0).transitions()[index];
        assert_eq!(actor.is_receiving(transition), expect_receiving);
        assert_eq!(actor.is_sending(transition), !expect_receiving);
    }
}

#[test]
fn transition_choice_follows_the_probabilities() {
    let (a, b, _) = abc_symbols();
    let mut automaton = Automaton::new("weights");
    let s0 = automaton.add_state("s0");
    let s1 = automaton.add_state("s1");
    automaton
        .add_transition(Transition::new("often", s0, s1, &a, Vec::new()).with_probability(70));
    automaton
        .add_transition(Transition::new("seldom", s0, s1, &b, Vec::new()).with_probability(30));

    let (mut actor, _peer) = actor_over_pipe(automaton, Vec::new(), true);
    let available: Vec<Transition> = actor.automaton().state(s0).transitions().to_vec();

    let mut often = 0usize;
    for _ in 0..10_000 {
        let transition = actor.pick_next_transition(&available).unwrap();
        if transition.name() == "often" {
            often += 1;
        }
    }
    // 3 sigma around 7000 over 10 000 draws.
    assert!((6850..=7150).contains(&often), "often chosen {} times", often);
}

#[test]
fn forced_transitions_are_deterministic() {
    let (a, b, _) = abc_symbols();
    let mut automaton = Automaton::new("forced");
    let s0 = automaton.add_state("s0");
    let s1 = automaton.add_state("s1");
    automaton
        .add_transition(Transition::new("weighted", s0, s1, &a, Vec::new()).with_probability(70));
    automaton
        .add_transition(Transition::new("forced", s0, s1, &b, Vec::new()).with_probability(100));

    let (mut actor, _peer) = actor_over_pipe(automaton, Vec::new(), true);
    let available: Vec<Transition> = actor.automaton().state(s0).transitions().to_vec();
    for _ in 0..100 {
        assert_eq!(
            actor.pick_next_transition(&available).unwrap().name(),
            "forced"
        );
    }
}

struct FailingChannel {
    opens: Arc<AtomicUsize>,
}

impl Channel for FailingChannel {
    fn open(&mut self) -> Result<(), ChannelError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Err(ChannelError::Io("connection refused".into()))
    }

    fn close(&mut self) {}

    fn write(&mut self, _data: &[u8]) -> Result<usize, ChannelError> {
        Err(ChannelError::Closed)
    }

    fn read(&mut self, _timeout: Duration) -> Result<Vec<u8>, ChannelError> {
        Err(ChannelError::Timeout)
    }

    fn check_received(&mut self) -> bool {
        false
    }
}

#[test]
fn open_channel_transitions_reach_their_end_state() {
    for initiator in [true, false] {
        let mut automaton = Automaton::new("open");
        let s0 = automaton.add_state("s0");
        let s1 = automaton.add_state("s1");
        automaton.add_transition(Transition::open_channel("open", s0, s1));

        let (mut actor, _peer) = actor_over_pipe(automaton, Vec::new(), initiator);
        assert_eq!(actor.execute_state(s0).unwrap(), Some(s1));
        assert!(!actor.automaton().state(s0).is_active());
    }
}

#[test]
fn open_channel_transitions_surface_transport_errors() {
    for initiator in [true, false] {
        let mut automaton = Automaton::new("open");
        let s0 = automaton.add_state("s0");
        let s1 = automaton.add_state("s1");
        automaton.add_transition(Transition::open_channel("open", s0, s1));

        let opens = Arc::new(AtomicUsize::new(0));
        let layer = AbstractionLayer::new(
            Box::new(FailingChannel {
                opens: Arc::clone(&opens),
            }),
            Vec::new(),
        )
        .unwrap();
        let mut actor = Actor::new("actor", automaton, layer, initiator);

        let result = actor.execute_state(s0);
        assert!(matches!(result, Err(ActorError::Transport(_))));
        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert!(!actor.automaton().state(s0).is_active());
    }
}

#[test]
fn responders_answer_expected_symbols() {
    let (a, b, c) = abc_symbols();
    let (automaton, _) = responder_automaton(&a, &b);
    let (mut actor, mut peer) = actor_over_pipe(automaton, vec![a, b, c], false);

    peer.open().unwrap();
    peer.write(b"AAA").unwrap();
    actor.run().unwrap();

    assert!(actor
        .visit_log()
        .iter()
        .any(|line| line.contains("corresponds to transition 't")));
    assert_eq!(peer.read(Duration::from_millis(200)).unwrap(), b"BBB");
}

#[test]
fn unexpected_symbols_fail_without_a_callback() {
    let (a, b, c) = abc_symbols();
    let (automaton, _) = responder_automaton(&a, &b);
    let (mut actor, mut peer) = actor_over_pipe(automaton, vec![a, b, c], false);

    peer.open().unwrap();
    peer.write(b"CCC").unwrap();
    let error = actor.run().unwrap_err();
    assert!(matches!(error, ActorError::UnexpectedSymbol { .. }));
}

#[test]
fn unexpected_symbols_invoke_the_registered_callback() {
    let (a, b, c) = abc_symbols();
    let (automaton, _) = responder_automaton(&a, &b);
    let (mut actor, mut peer) = actor_over_pipe(automaton, vec![a, b, c], false);

    let seen = Rc::new(Cell::new(false));
    let witness = Rc::clone(&seen);
    actor.set_on_unexpected_symbol(Rc::new(move |_, _, _, _, _| witness.set(true)));

    peer.open().unwrap();
    peer.write(b"CCC").unwrap();
    actor.run().unwrap();
    assert!(seen.get());
}

#[test]
fn unknown_bytes_abstract_to_the_unknown_symbol() {
    let (a, b, c) = abc_symbols();
    let (automaton, _) = responder_automaton(&a, &b);
    let (mut actor, mut peer) = actor_over_pipe(automaton, vec![a, b, c], false);

    peer.open().unwrap();
    peer.write(b"\x00\x01\x02").unwrap();
    let error = actor.run().unwrap_err();
    assert!(matches!(error, ActorError::UnknownSymbol { .. }));
}

#[test]
fn unknown_bytes_invoke_the_registered_callback() {
    let (a, b, c) = abc_symbols();
    let (automaton, _) = responder_automaton(&a, &b);
    let (mut actor, mut peer) = actor_over_pipe(automaton, vec![a, b, c], false);

    let seen = Rc::new(Cell::new(false));
    let witness = Rc::clone(&seen);
    actor.set_on_unknown_symbol(Rc::new(move |_, _, _| witness.set(true)));

    peer.open().unwrap();
    peer.write(b"\x00\x01\x02").unwrap();
    actor.run().unwrap();
    assert!(seen.get());
}

#[test]
fn timeouts_follow_the_empty_symbol_transition() {
    let (_, b, _) = abc_symbols();
    let quiet = Rc::new(Symbol::empty());
    let mut automaton = Automaton::new("quiet");
    let s0 = automaton.add_state("s0");
    let s1 = automaton.add_state("s1");
    let s2 = automaton.add_state("s2");
    automaton.add_transition(Transition::open_channel("open", s0, s1));
    automaton.add_transition(Transition::new("silence", s1, s2, &quiet, vec![Rc::clone(&b)]));

    let (mut actor, mut peer) = actor_over_pipe(automaton, vec![Rc::clone(&b)], false);
    peer.open().unwrap();
    actor.run().unwrap();

    assert!(actor
        .visit_log()
        .iter()
        .any(|line| line.contains("Receiving no symbol (EmptySymbol)")));
    assert_eq!(peer.read(Duration::from_millis(200)).unwrap(), b"BBB");
}

#[test]
fn timeouts_without_empty_transitions_invoke_the_callback() {
    let (a, b, _) = abc_symbols();
    let (automaton, _) = responder_automaton(&a, &b);
    let (mut actor, mut peer) = actor_over_pipe(automaton, vec![a, b], false);

    let seen = Rc::new(Cell::new(false));
    let witness = Rc::clone(&seen);
    actor.set_on_symbol_timeout(Rc::new(move |_, _| witness.set(true)));

    peer.open().unwrap();
    actor.run().unwrap();
    assert!(seen.get());
    assert!(actor
        .visit_log()
        .iter()
        .any(|line| line.contains("Timeout waiting for an input symbol")));
}

#[test]
fn stop_requests_surface_at_the_next_blocking_point() {
    let (a, b, _) = abc_symbols();
    let (automaton, _) = responder_automaton(&a, &b);
    let (mut actor, mut peer) = actor_over_pipe(automaton, vec![a, b], false);

    peer.open().unwrap();
    actor.controller().stop();
    actor.run().unwrap();

    assert!(actor
        .visit_log()
        .iter()
        .any(|line| line.contains("Stop requested")));
}
