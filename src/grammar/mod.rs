//! The dialogue model of a protocol: an [Automaton] of states joined by
//! transitions.
//!
//! Three transition kinds drive an actor. A message transition consumes an
//! input symbol and emits one of its output symbols. Which endpoint sends
//! and which receives depends on the actor's initiator flag combined with
//! the transition's `inverse_initiator` flag. Open and close channel
//! transitions act on the transport and behave identically in both roles.
//!
//! States and transitions are plain values: cloning an automaton gives an
//! actor an isolated view whose `active` flags and callback lists can be
//! mutated freely without touching the original.
mod automaton;
mod state;
mod transition;

#[cfg(test)]
mod __tests__;

use crate::simulator::IoLog;
use crate::vocabulary::{Preset, Symbol};
use crate::{Memory, Operation, Structure};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// Index of a state within its automaton.
pub struct StateId(pub(crate) usize);

/// Callback reducing the transitions considered at a state. It receives a
/// cloned list and returns the (possibly reduced) list to use.
pub type FilterTransitionsFn = dyn Fn(Vec<Transition>, &State, &IoLog, &Memory) -> Vec<Transition>;

/// Callback replacing the transition retained at a state. It receives the
/// cloned available list and the currently retained transition.
pub type ModifyTransitionFn =
    dyn Fn(Vec<Transition>, Transition, &State, &IoLog, &Memory) -> Transition;

/// Callback run after an I/O step of a message transition, with the symbol,
/// the raw message, its structure and the annotated operation.
pub type ActionFn = dyn Fn(&Rc<Symbol>, &[u8], &Structure, Operation, &State, &mut Memory);

#[derive(Clone)]
/// A directed graph of states driving one protocol dialogue.
pub struct Automaton {
    name: String,
    states: Vec<State>,
    initial: Option<StateId>,
}

#[derive(Clone)]
/// A state of the automaton: outgoing transitions plus the callback lists
/// consulted before choosing one.
pub struct State {
    id: StateId,
    name: String,
    pub(crate) active: bool,
    pub(crate) transitions: Vec<Transition>,
    pub(crate) filter_callbacks: Vec<Rc<FilterTransitionsFn>>,
    pub(crate) modify_callbacks: Vec<Rc<ModifyTransitionFn>>,
}

#[derive(Clone)]
/// An edge of the automaton.
///
/// The probability weights the choice among the transitions of a state; the
/// value 100 forces the transition (first forced one in list order wins,
/// states are expected to carry at most one).
pub struct Transition {
    name: String,
    start: StateId,
    end: StateId,
    pub(crate) probability: u8,
    pub(crate) kind: TransitionKind,
}

#[derive(Clone)]
/// What a transition does when executed.
pub enum TransitionKind {
    Message(MessageTransition),
    OpenChannel,
    CloseChannel,
}

#[derive(Clone)]
/// The symbol exchange of a message transition.
pub struct MessageTransition {
    pub(crate) input_symbol: Rc<Symbol>,
    pub(crate) input_preset: Option<Preset>,
    pub(crate) output_symbols: Vec<Rc<Symbol>>,
    pub(crate) output_presets: Vec<Option<Preset>>,
    pub(crate) output_probabilities: Vec<u8>,
    pub(crate) inverse_initiator: bool,
    pub(crate) actions: Vec<Rc<ActionFn>>,
}
