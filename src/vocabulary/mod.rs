//! A module consist of the building blocks of a protocol vocabulary.
//!
//! A [Symbol] is a named message template made of [Field]s; each field holds
//! one variable tree. Leaf variables carry concrete wire values: [Data]
//! wraps a data type from [types](crate::types), while [Size], [Value] and
//! [Checksum] derive their bytes from another variable of the message (or of
//! a previously exchanged message, through the actor
//! [Memory](crate::Memory)). Composition nodes build structured regions:
//! [Agg] concatenates its children, [Alt] parses the first matching
//! alternative and specializes a selected one, [Repeat] loops a child
//! within count bounds, delimiter included if one is given.
mod leafs;
mod nodes;
mod preset;
mod symbol;

#[cfg(test)]
mod __tests__;

use crate::types::{Endianness, IDataType, IntegerType};
use crate::util::Log;
use crate::{IVariable, SpecializingPath, SymbolId, VariableId};
use once_cell::unsync::OnceCell;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Selection callback of an [Alt] node: given the current path and the
/// alternatives, return the index to specialize. Negative indices wrap from
/// the end (`-1` is the last child).
pub type AltSelectorFn = dyn Fn(&SpecializingPath, &[Rc<dyn IVariable>]) -> isize;

/// The digest computation behind a [Checksum] leaf. Implement this trait to
/// plug a custom hash relationship.
pub trait HashFunction {
    /// Digest `data`.
    fn calculate(&self, data: &[u8]) -> Vec<u8>;

    /// Width of the serialised digest, in bits.
    fn bit_size(&self) -> usize;

    fn name(&self) -> &'static str;
}

/// MD5 digest, 128 bits.
pub struct Md5Hash;

/// SHA-1 digest, 160 bits.
pub struct Sha1Hash;

/// SHA-256 digest, 256 bits.
pub struct Sha256Hash;

pub(crate) struct VarHelper {
    id: VariableId,
    label: String,
    debugger: OnceCell<Log<&'static str>>,
}

impl VarHelper {
    fn new(label: impl Into<String>) -> Self {
        Self {
            id: VariableId::fresh(),
            label: label.into(),
            debugger: OnceCell::new(),
        }
    }

    fn assign_debugger(&self, debugger: Log<&'static str>) -> Result<(), String> {
        self.debugger
            .set(debugger)
            .map_err(|err| format!("Debugger {} is already set for this variable.", err))
    }
}

trait DomainLogger {
    fn debugger(&self) -> Option<&Log<&'static str>>;

    fn log_entry(&self) {
        #[cfg(debug_assertions)]
        if let Some(log_label) = self.debugger() {
            if log_label.order() >= Log::Verbose(()).order() {
                println!("Entering '{}'", log_label)
            }
        }
    }

    fn log_parse_success(&self, _consumed: usize) {
        #[cfg(debug_assertions)]
        if let Some(log_label) = self.debugger() {
            if log_label.order() >= Log::Success(()).order() {
                println!("[{}; ParseSuccess]: consumed {} bytes", log_label, _consumed)
            }
        }
    }

    fn log_parse_failure(&self, _available: usize) {
        #[cfg(debug_assertions)]
        if let Some(log_label) = self.debugger() {
            if log_label.order() >= Log::Result(()).order() {
                println!(
                    "[{}; ParseFailure]: no branch over {} bytes",
                    log_label, _available
                )
            }
        }
    }

    fn log_specialized(&self, _emitted: usize) {
        #[cfg(debug_assertions)]
        if let Some(log_label) = self.debugger() {
            if log_label.order() >= Log::Success(()).order() {
                println!("[{}; Specialized]: emitted {} bytes", log_label, _emitted)
            }
        }
    }
}

impl DomainLogger for VarHelper {
    fn debugger(&self) -> Option<&Log<&'static str>> {
        self.debugger.get()
    }
}

/// A leaf variable holding a concrete wire value typed by a data type.
///
/// A data leaf with a constant value accepts exactly that value while
/// parsing and emits it while specializing; an unconstrained leaf accepts
/// any valid value of its type and draws one at random (or from the active
/// preset) while specializing.
pub struct Data {
    helper: VarHelper,
    dtype: Rc<dyn IDataType>,
    value: Option<Vec<u8>>,
}

/// A relation leaf whose value is the byte count of its target, encoded
/// with its own integer type.
///
/// # Example
/// ```
/// use protogram::types::IntegerType;
/// use protogram::vocabulary::{Data, Field, Size, Symbol};
/// use protogram::types::RawType;
/// use protogram::{IVariable, Memory};
/// use std::rc::Rc;
///
/// let payload: Rc<dyn IVariable> = Rc::new(Data::new("payload", Rc::new(RawType::new(1, 4))));
/// let header = Rc::new(Size::new("len", &payload, IntegerType::u8()));
/// let frame = Symbol::new("frame", vec![Field::new("len", header), Field::new("payload", payload)]);
///
/// let mut memory = Memory::new();
/// let (message, _) = frame.specialize(&mut memory, None).unwrap();
/// assert_eq!(message[0] as usize, message.len() - 1);
/// ```
pub struct Size {
    helper: VarHelper,
    target: Rc<dyn IVariable>,
    dtype: IntegerType,
}

/// A relation leaf mirroring the bytes of its target verbatim.
pub struct Value {
    helper: VarHelper,
    target: Rc<dyn IVariable>,
}

/// A relation leaf carrying a digest of its target.
///
/// The digest is right aligned to the declared bit size of the hash
/// function and serialised with the declared endianness.
pub struct Checksum {
    helper: VarHelper,
    target: Rc<dyn IVariable>,
    hash: Rc<dyn HashFunction>,
    endianness: Endianness,
}

/// A composition node deriving the concatenation of its children.
///
/// While parsing, the assigned buffer is threaded left to right: every
/// acceptable consumption of a child feeds the remainder to the next one,
/// and the node yields the cross product of the per-child branches.
pub struct Agg {
    helper: VarHelper,
    children: OnceCell<Vec<Rc<dyn IVariable>>>,
}

/// A composition node deriving one of its children.
///
/// Parsing tries every alternative in list order on a duplicate of the
/// path. Specializing selects a single child: the preset pinned value if
/// one applies, else the selection callback, else a uniformly random child.
///
/// # Example
/// ```
/// use protogram::vocabulary::{Alt, Field, Symbol};
/// use protogram::Memory;
///
/// let verdict = Alt::of_constants("verdict", vec!["GRANTED", "DENIED"]);
/// let answer = Symbol::new("answer", vec![Field::new("verdict", std::rc::Rc::new(verdict))]);
///
/// let mut memory = Memory::new();
/// assert!(answer.parse(b"GRANTED", &mut memory).is_some());
/// assert!(answer.parse(b"REFUSED", &mut memory).is_none());
/// ```
pub struct Alt {
    helper: VarHelper,
    children: OnceCell<Vec<Rc<dyn IVariable>>>,
    selector: OnceCell<Rc<AltSelectorFn>>,
}

/// A composition node repeating a child between `min` and `max` times,
/// optionally separated by a delimiter.
///
/// Parsing yields a continuation for every legal count, longest first;
/// specializing draws a count within the bounds.
pub struct Repeat {
    helper: VarHelper,
    child: Rc<dyn IVariable>,
    delimiter: Option<Rc<dyn IVariable>>,
    min: usize,
    max: usize,
}

#[derive(Clone)]
/// A partial assignment pinning chosen fields or variables during
/// specialization, and matching received structures on transitions.
///
/// A pin either fixes one byte value or draws from an ordered pool shared
/// across calls; an exhausted pool fails specialization with
/// [GenerationError::ValuesExhausted](crate::GenerationError), which is how
/// a fuzzing run signals completion.
pub struct Preset {
    pins: Vec<(PresetKey, PresetValue)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Addressing of one preset pin.
pub enum PresetKey {
    /// The whole domain of the named field.
    Field(String),
    /// One precise variable.
    Variable(VariableId),
}

#[derive(Clone)]
/// The value side of a preset pin.
pub enum PresetValue {
    Fixed(Vec<u8>),
    Pool(Rc<RefCell<VecDeque<Vec<u8>>>>),
}

/// A preset whose field pins were resolved to variable identities for one
/// symbol, ready to be consulted by a specializing path.
pub(crate) struct ResolvedPreset {
    by_variable: HashMap<VariableId, PresetValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Nature of a symbol within a catalogue.
pub enum SymbolKind {
    /// A regular message template.
    Message,
    /// The zero byte message; always matches an empty buffer. Transitions
    /// use it to react to reception timeouts.
    Empty,
    /// The fallback symbol covering bytes no catalogue entry parses.
    Unknown,
}

/// A named protocol message template, made of fields.
pub struct Symbol {
    id: SymbolId,
    name: String,
    kind: SymbolKind,
    fields: Vec<Field>,
}

/// A named subregion of a symbol holding one variable tree.
pub struct Field {
    name: String,
    domain: Rc<dyn IVariable>,
}
