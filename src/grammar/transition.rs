use crate::grammar::{ActionFn, MessageTransition, StateId, Transition, TransitionKind};
use crate::vocabulary::{Preset, Symbol};
use std::fmt::Display;
use std::rc::Rc;

impl Transition {
    /// Create a message transition between `start` and `end`.
    ///
    /// In the sending role the actor specializes `input_symbol`, emits it
    /// and waits for one of `output_symbols`; in the receiving role it
    /// waits for `input_symbol` and answers with one of `output_symbols`.
    /// An empty output list means the exchange stops after the input
    /// symbol.
    pub fn new(
        name: &str,
        start: StateId,
        end: StateId,
        input_symbol: &Rc<Symbol>,
        output_symbols: Vec<Rc<Symbol>>,
    ) -> Self {
        let output_presets = vec![None; output_symbols.len()];
        let output_probabilities = vec![50; output_symbols.len()];
        Self {
            name: name.into(),
            start,
            end,
            probability: 50,
            kind: TransitionKind::Message(MessageTransition {
                input_symbol: Rc::clone(input_symbol),
                input_preset: None,
                output_symbols,
                output_presets,
                output_probabilities,
                inverse_initiator: false,
                actions: Vec::new(),
            }),
        }
    }

    /// Create a transition opening the communication channel. Opening is
    /// role agnostic.
    pub fn open_channel(name: &str, start: StateId, end: StateId) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            probability: 50,
            kind: TransitionKind::OpenChannel,
        }
    }

    /// Create a transition closing the communication channel. Closing is
    /// role agnostic.
    pub fn close_channel(name: &str, start: StateId, end: StateId) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            probability: 50,
            kind: TransitionKind::CloseChannel,
        }
    }

    /// Weight the transition in the state level choice, `0..=100`. The
    /// value 100 forces the transition.
    pub fn with_probability(mut self, probability: u8) -> Self {
        assert!(
            probability <= 100,
            "Transition probability {} is out of 0..=100.",
            probability
        );
        self.probability = probability;
        self
    }

    /// Swap the sending and receiving roles of a message transition.
    pub fn with_inverse_initiator(mut self, inverse: bool) -> Self {
        match &mut self.kind {
            TransitionKind::Message(message) => message.inverse_initiator = inverse,
            _ => panic!("Only message transitions carry an initiator role."),
        }
        self
    }

    /// Pin the input symbol emission, and require received structures to
    /// match the pins in the receiving role.
    pub fn with_input_preset(mut self, preset: Preset) -> Self {
        match &mut self.kind {
            TransitionKind::Message(message) => message.input_preset = Some(preset),
            _ => panic!("Only message transitions carry presets."),
        }
        self
    }

    /// Pin the output symbol emissions, one entry per output symbol.
    pub fn with_output_presets(mut self, presets: Vec<Option<Preset>>) -> Self {
        match &mut self.kind {
            TransitionKind::Message(message) => {
                assert!(
                    presets.len() == message.output_symbols.len(),
                    "Expected {} output presets, got {}.",
                    message.output_symbols.len(),
                    presets.len()
                );
                message.output_presets = presets;
            }
            _ => panic!("Only message transitions carry presets."),
        }
        self
    }

    /// Weight the output symbol choice, one entry per output symbol.
    pub fn with_output_probabilities(mut self, probabilities: Vec<u8>) -> Self {
        match &mut self.kind {
            TransitionKind::Message(message) => {
                assert!(
                    probabilities.len() == message.output_symbols.len(),
                    "Expected {} output probabilities, got {}.",
                    message.output_symbols.len(),
                    probabilities.len()
                );
                message.output_probabilities = probabilities;
            }
            _ => panic!("Only message transitions carry output symbols."),
        }
        self
    }

    /// Register an action callback, run after each I/O step of the
    /// transition in registration order.
    pub fn with_action(mut self, action: Rc<ActionFn>) -> Self {
        match &mut self.kind {
            TransitionKind::Message(message) => message.actions.push(action),
            _ => panic!("Only message transitions carry actions."),
        }
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn start_state(&self) -> StateId {
        self.start
    }

    #[inline]
    pub fn end_state(&self) -> StateId {
        self.end
    }

    #[inline]
    pub fn probability(&self) -> u8 {
        self.probability
    }

    #[inline]
    pub fn kind(&self) -> &TransitionKind {
        &self.kind
    }

    pub(crate) fn message(&self) -> Option<&MessageTransition> {
        match &self.kind {
            TransitionKind::Message(message) => Some(message),
            _ => None,
        }
    }

    /// Copy the transition. The copy shares the symbols and callbacks but
    /// owns its lists: mutating it leaves the original unchanged.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}

impl Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            TransitionKind::Message(message) => {
                write!(f, "{} ({})", self.name, message.input_symbol)
            }
            TransitionKind::OpenChannel => write!(f, "{} (open channel)", self.name),
            TransitionKind::CloseChannel => write!(f, "{} (close channel)", self.name),
        }
    }
}
