//! Protogram is a library to simulate, test and fuzz communication protocols
//! by driving one endpoint of a dialogue (client or server) from a protocol
//! description.
//!
//! # Overview
//! A protocol is described by two coupled models. The *vocabulary* gives the
//! format of every message: a [Symbol] is an ordered list of [Field]s, and
//! each field holds a tree of variables ([Data] leafs typed by a wire data
//! type, [Size]/[Value]/[Checksum] relation leafs derived from other
//! variables, and [Agg]/[Alt]/[Repeat] composition nodes). The *grammar*
//! gives the dialogue: an [Automaton] of states joined by transitions, walked
//! by an [Actor] which reads and writes framed bytes through an abstraction
//! layer.
//!
//! Parsing and specializing are dual operations over the same variable tree:
//! parsing consumes received bytes into per-field assignments, specializing
//! draws concrete bytes satisfying every constraint, relations included.
//!
//! [Symbol]: crate::vocabulary::Symbol
//! [Field]: crate::vocabulary::Field
//! [Data]: crate::vocabulary::Data
//! [Size]: crate::vocabulary::Size
//! [Value]: crate::vocabulary::Value
//! [Checksum]: crate::vocabulary::Checksum
//! [Agg]: crate::vocabulary::Agg
//! [Alt]: crate::vocabulary::Alt
//! [Repeat]: crate::vocabulary::Repeat
//! [Automaton]: crate::grammar::Automaton
//! [Actor]: crate::simulator::Actor
//!
//! # Example
//!
//! A length prefixed login command, specialized to bytes and parsed back:
//!
//! ```
//! use protogram::types::{IntegerType, TextType};
//! use protogram::vocabulary::{Agg, Data, Field, Size, Symbol};
//! use protogram::{IVariable, Memory};
//! use std::rc::Rc;
//!
//! // [len:u8]["LOGIN "][user]
//! let user = Rc::new(Data::new("user", Rc::new(TextType::ascii(3, 8))));
//! let body: Rc<dyn IVariable> = Rc::new(Agg::new(
//!     "body",
//!     vec![
//!         Rc::new(Data::constant("keyword", "LOGIN ")) as Rc<dyn IVariable>,
//!         user,
//!     ],
//! ));
//! let length = Rc::new(Size::new("len", &body, IntegerType::u8()));
//!
//! let login = Symbol::new(
//!     "login",
//!     vec![Field::new("len", length), Field::new("body", body)],
//! );
//!
//! let mut memory = Memory::new();
//! let (message, structure) = login.specialize(&mut memory, None).unwrap();
//! assert_eq!(message[0] as usize, message.len() - 1);
//!
//! let parsed = login.parse(&message, &mut memory).expect("round trip");
//! assert_eq!(parsed, structure);
//! ```
//!
//! # License
//! [protogram](crate) is provided under the MIT license.
mod error;
pub mod examples;
pub mod grammar;
mod memory;
mod path;
pub mod simulator;
pub mod types;
pub mod util;
pub mod vocabulary;

use rand::rngs::StdRng;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub use util::{Log, TreeView};
use vocabulary::ResolvedPreset;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// Stable identity of a variable. Relations, memories and paths compare
/// variables by identity, never by structure.
pub struct VariableId(usize);

impl VariableId {
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        VariableId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// Stable identity of a symbol. Transitions match received symbols by
/// identity.
pub struct SymbolId(usize);

impl SymbolId {
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        SymbolId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The I/O step a transition action callback annotates: a message was just
/// specialized and sent, or received bytes were just abstracted to a symbol.
pub enum Operation {
    Specialize,
    Abstract,
}

#[derive(Debug)]
/// An error returned due to failed validation of a vocabulary or grammar
/// description. Configuration errors are detected at registration, before
/// an actor runs.
pub struct ConfigurationError {
    message: String,
    what: String,
}

#[derive(Debug, Clone)]
/// An error raised while specializing a symbol to bytes. Specializing never
/// backtracks: the first invalid configuration fails the whole call.
pub enum GenerationError {
    /// A preset value pool ran dry.
    ValuesExhausted(String),
    /// A relation could not be resolved from the emitted variables.
    UnresolvedDependency(String),
    /// An alternative selection callback returned an out of range index.
    InvalidSelection(String),
    /// The requested drawing is not defined for the type.
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// An error surfaced by a communication channel.
pub enum ChannelError {
    /// No frame arrived within the configured delay.
    Timeout,
    /// The actor owning the channel was asked to stop.
    Stopped,
    /// The peer endpoint is gone.
    Closed,
    /// Any other transport failure.
    Io(String),
}

#[derive(Debug)]
/// An error terminating an actor run.
pub enum ActorError {
    /// Received bytes abstracted to the unknown symbol and no callback was
    /// registered to handle them.
    UnknownSymbol { state: String, message: Vec<u8> },
    /// A known symbol arrived on a state with no matching transition and no
    /// callback was registered to handle it.
    UnexpectedSymbol {
        state: String,
        symbol: String,
        message: Vec<u8>,
    },
    Generation(GenerationError),
    Configuration(ConfigurationError),
    Transport(ChannelError),
}

#[derive(Debug, Clone, Default)]
/// A per-actor scratchpad holding the last bytes observed or emitted for
/// each variable. Relation leafs consult it when their target lives in a
/// previously exchanged message.
pub struct Memory {
    values: HashMap<VariableId, Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// The structured outcome of parsing or specializing a symbol: one byte
/// slice per field, in field order.
pub struct Structure {
    entries: Vec<(String, Vec<u8>)>,
}

#[derive(Clone)]
/// Transient state of one parsing branch: per-variable buffer assignments,
/// consumed bytes, ordered leaf results and the deferred relation checks
/// registered so far. Duplicating a path clones the maps while keeping the
/// variable identities stable.
pub struct ParsingPath {
    assigned: HashMap<VariableId, Vec<u8>>,
    consumed: HashMap<VariableId, Vec<u8>>,
    results: Vec<(VariableId, Vec<u8>)>,
    memory: Memory,
    deferred: Vec<DeferredCheck>,
}

#[derive(Clone)]
/// A relation equality check postponed until the whole message is consumed,
/// registered when a relation leaf is parsed before its target.
pub struct DeferredCheck {
    pub(crate) relation: VariableId,
    pub(crate) label: String,
    pub(crate) expected: Rc<dyn Fn(&ParsingPath) -> Option<Vec<u8>>>,
}

#[derive(Clone)]
/// Transient state of a specialization: the ordered byte emissions, the
/// spans covered by each variable, the deferred relation emissions, the
/// active preset and the random generator driving the drawing.
pub struct SpecializingPath {
    results: Vec<(VariableId, Vec<u8>)>,
    spans: HashMap<VariableId, (usize, usize)>,
    unresolved: HashSet<usize>,
    deferred: Vec<DeferredEmission>,
    memory: Memory,
    preset: Rc<ResolvedPreset>,
    rng: StdRng,
}

#[derive(Clone)]
/// A relation emission postponed until its target is emitted, holding the
/// placeholder entry to patch.
pub struct DeferredEmission {
    pub(crate) entry: usize,
    pub(crate) label: String,
    pub(crate) compute: Rc<dyn Fn(&SpecializingPath) -> Option<Vec<u8>>>,
}

/// The lazy sequence of continuation paths produced by parsing one variable:
/// each item is one successful branch, the empty sequence is a failure.
pub type ParseBranches<'v> = Box<dyn Iterator<Item = ParsingPath> + 'v>;

/// A trait implemented by every node of a variable tree.
///
/// Parsing is a non-deterministic generator: given a path carrying the bytes
/// assigned to this variable, [parse](IVariable::parse) lazily produces one
/// continuation per acceptable consumption. Specializing never backtracks:
/// [specialize](IVariable::specialize) either extends the path with this
/// variable's emission or fails the whole call.
pub trait IVariable: Display {
    /// The stable identity of the variable.
    fn id(&self) -> VariableId;

    /// The display label of the variable.
    fn label(&self) -> &str;

    /// Structural children, empty for leafs.
    fn children(&self) -> Vec<Rc<dyn IVariable>>;

    /// Identities of the variables this one derives its value from. Empty
    /// for everything but relation leafs.
    fn dependencies(&self) -> Vec<VariableId> {
        Vec::new()
    }

    /// Validate the subtree: children must be wired, alternatives non-empty,
    /// and every variable must occupy exactly one structural position.
    fn validate(&self, visited: &mut HashSet<VariableId>) -> Result<(), ConfigurationError>;

    /// Consume the bytes assigned to this variable on `path`, yielding one
    /// continuation path per acceptable branch.
    fn parse<'v>(&'v self, path: ParsingPath) -> ParseBranches<'v>;

    /// Extend `path` with this variable's byte emission.
    fn specialize(&self, path: SpecializingPath) -> Result<SpecializingPath, GenerationError>;

    /// A printable tree of the subtree labels.
    fn describe(&self) -> TreeView {
        TreeView::new(
            format!("{}", self),
            self.children()
                .iter()
                .map(|child| child.describe())
                .collect(),
        )
    }
}
