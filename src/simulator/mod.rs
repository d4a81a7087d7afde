//! The execution side of the engine: actors walking an automaton and the
//! abstraction layer converting symbols to and from framed bytes.
//!
//! An [Actor] drives one endpoint of a dialogue on its own thread. It owns
//! a cloned [Automaton](crate::grammar::Automaton), an [AbstractionLayer]
//! and a [Memory](crate::Memory); none of these are shared between actors.
//! Cooperative cancellation goes through an [ActorController]: the stop
//! flag is polled at every blocking read and surfaces as
//! [ChannelError::Stopped](crate::ChannelError).
mod abstraction_layer;
mod actor;
mod channel;

#[cfg(test)]
mod __tests__;

pub use channel::pipe;

use crate::grammar::{Automaton, State, Transition};
use crate::vocabulary::Symbol;
use crate::{ChannelError, Memory, Structure};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

/// The transport seam of the engine: a bidirectional channel carrying
/// framed byte messages. The engine only ever consumes this trait; the
/// crate ships a single in-process implementation, [pipe], used by tests
/// and demos.
pub trait Channel {
    fn open(&mut self) -> Result<(), ChannelError>;

    fn close(&mut self);

    /// Send one framed message.
    fn write(&mut self, data: &[u8]) -> Result<usize, ChannelError>;

    /// Receive one framed message, waiting at most `timeout`.
    fn read(&mut self, timeout: Duration) -> Result<Vec<u8>, ChannelError>;

    /// Non blocking peek: whether a frame is already waiting.
    fn check_received(&mut self) -> bool;
}

/// One end of an in-process channel pair backed by queues. Both ends are
/// `Send`: build each actor, automaton included, on its own thread and
/// move one end there.
pub struct PipeChannel {
    sender: Sender<Vec<u8>>,
    receiver: Receiver<Vec<u8>>,
    pending: VecDeque<Vec<u8>>,
    opened: bool,
}

#[derive(Clone, Default)]
/// The last exchanged symbols, messages and structures, recorded by the
/// abstraction layer and handed to the grammar callbacks.
pub struct IoLog {
    pub last_sent_symbol: Option<Rc<Symbol>>,
    pub last_sent_message: Option<Vec<u8>>,
    pub last_sent_structure: Option<Structure>,
    pub last_received_symbol: Option<Rc<Symbol>>,
    pub last_received_message: Option<Vec<u8>>,
    pub last_received_structure: Option<Structure>,
}

/// The engine's view of a transport plus symbol (de)serialisation.
///
/// The layer owns the symbol catalogue: written symbols are specialized to
/// bytes, received bytes are abstracted by trying every catalogue entry in
/// order and falling back to the unknown symbol.
pub struct AbstractionLayer {
    channel: Box<dyn Channel>,
    symbols: Vec<Rc<Symbol>>,
    unknown: Rc<Symbol>,
    timeout: Duration,
    io_log: IoLog,
    stop: Arc<AtomicBool>,
}

/// An execution instance driving one endpoint of a protocol dialogue.
pub struct Actor {
    name: String,
    automaton: Automaton,
    abstraction_layer: AbstractionLayer,
    memory: Memory,
    visit_log: Vec<String>,
    initiator: bool,
    stop: Arc<AtomicBool>,
    on_symbol_timeout: Option<Rc<SymbolTimeoutFn>>,
    on_unknown_symbol: Option<Rc<UnknownSymbolFn>>,
    on_unexpected_symbol: Option<Rc<UnexpectedSymbolFn>>,
}

#[derive(Clone)]
/// A cloneable handle signalling an [Actor] to stop at its next blocking
/// point.
pub struct ActorController {
    stop: Arc<AtomicBool>,
}

/// Callback invoked when no symbol arrived within the read timeout and no
/// transition expects the empty symbol.
pub type SymbolTimeoutFn = dyn Fn(&State, Option<&Transition>);

/// Callback invoked when received bytes abstracted to the unknown symbol.
pub type UnknownSymbolFn = dyn Fn(&State, Option<&Transition>, &[u8]);

/// Callback invoked when a known symbol arrived on a state with no matching
/// transition.
pub type UnexpectedSymbolFn = dyn Fn(&State, Option<&Transition>, &Rc<Symbol>, &[u8], &Structure);
