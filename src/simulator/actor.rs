use crate::grammar::{
    Automaton, FilterTransitionsFn, MessageTransition, StateId, Transition, TransitionKind,
};
use crate::simulator::{
    AbstractionLayer, Actor, ActorController, SymbolTimeoutFn, UnexpectedSymbolFn, UnknownSymbolFn,
};
use crate::vocabulary::{Symbol, SymbolKind};
use crate::{ActorError, ChannelError, ConfigurationError, Memory, Operation, Structure};
use rand::Rng;
use std::fmt::Display;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Weighted draw over `weights`; zero weights all around fall back to a
/// uniform draw.
fn weighted_index(weights: &[u32], rng: &mut impl Rng) -> usize {
    let total: u32 = weights.iter().sum();
    if total == 0 {
        return rng.gen_range(0..weights.len());
    }
    let mut draw = rng.gen_range(0..total);
    for (index, weight) in weights.iter().enumerate() {
        if draw < *weight {
            return index;
        }
        draw -= weight;
    }
    weights.len() - 1
}

impl ActorController {
    /// Ask the actor to stop. The signal surfaces at its next blocking
    /// point.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Actor {
    /// Create an actor walking `automaton` over `abstraction_layer`.
    ///
    /// The initiator flag combines with each message transition's
    /// `inverse_initiator` flag to decide the sending and receiving roles:
    /// the actor sends the input symbol of a transition when exactly one of
    /// the two flags is set.
    pub fn new(
        name: &str,
        automaton: Automaton,
        mut abstraction_layer: AbstractionLayer,
        initiator: bool,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        abstraction_layer.bind_stop(Arc::clone(&stop));
        Self {
            name: name.into(),
            automaton,
            abstraction_layer,
            memory: Memory::new(),
            visit_log: Vec::new(),
            initiator,
            stop,
            on_symbol_timeout: None,
            on_unknown_symbol: None,
            on_unexpected_symbol: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn initiator(&self) -> bool {
        self.initiator
    }

    #[inline]
    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    #[inline]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    #[inline]
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// The audit trail of the dialogue, one textual event per step.
    #[inline]
    pub fn visit_log(&self) -> &[String] {
        &self.visit_log
    }

    #[inline]
    pub fn abstraction_layer(&self) -> &AbstractionLayer {
        &self.abstraction_layer
    }

    /// A handle stopping this actor from another thread.
    pub fn controller(&self) -> ActorController {
        ActorController {
            stop: Arc::clone(&self.stop),
        }
    }

    pub fn set_on_symbol_timeout(&mut self, callback: Rc<SymbolTimeoutFn>) {
        self.on_symbol_timeout = Some(callback);
    }

    pub fn set_on_unknown_symbol(&mut self, callback: Rc<UnknownSymbolFn>) {
        self.on_unknown_symbol = Some(callback);
    }

    pub fn set_on_unexpected_symbol(&mut self, callback: Rc<UnexpectedSymbolFn>) {
        self.on_unexpected_symbol = Some(callback);
    }

    /// Walk the automaton from its initial state until no state remains, a
    /// stop is requested, or the transport ends the dialogue. Unhandled
    /// unknown or unexpected symbols fail the run.
    pub fn run(&mut self) -> Result<(), ActorError> {
        self.memory.clear();
        self.visit_log.clear();
        let mut current = match self.automaton.initial() {
            Some(id) => id,
            None => {
                return Err(ActorError::Configuration(ConfigurationError::new(
                    "EmptyAutomaton".into(),
                    format!("Automaton '{}' has no initial state.", self.automaton.name()),
                )))
            }
        };
        loop {
            match self.execute_state(current) {
                Ok(Some(next)) => current = next,
                Ok(None) => break,
                Err(ActorError::Transport(err)) => {
                    self.visit_log
                        .push(format!("  [+] Transport ended the dialogue: {}", err));
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    pub(crate) fn execute_state(&mut self, id: StateId) -> Result<Option<StateId>, ActorError> {
        let state_name = self.automaton.state(id).name().to_string();
        self.visit_log.push(format!("  [+] At state '{}'", state_name));

        // If necessary, filter available transitions.
        let mut available: Vec<Transition> = self
            .automaton
            .state(id)
            .transitions()
            .iter()
            .map(Transition::copy)
            .collect();
        let filters: Vec<Rc<FilterTransitionsFn>> =
            self.automaton.state(id).filter_callbacks.clone();
        for callback in &filters {
            available = callback(
                available,
                self.automaton.state(id),
                self.abstraction_layer.io_log(),
                &self.memory,
            );
            self.visit_log
                .push("  [+]   Filtering available transitions through callback".to_string());
        }

        // A pending frame switches the state to the receiving flow, as long
        // as one available transition can accept it.
        if self.abstraction_layer.check_received()
            && available.iter().any(|transition| self.is_receiving(transition))
        {
            self.visit_log.push(format!(
                "  [+] At state '{}', received packet on communication channel. Switching to execution as not initiator.",
                state_name
            ));
            return self.execute_as_not_initiator(id, available);
        }

        self.visit_log.push(
            "  [+]   Randomly choosing a transition to execute or to wait for an input symbol"
                .to_string(),
        );
        let next = match self.pick_next_transition(&available) {
            Some(transition) => transition,
            None => return Ok(None),
        };

        if self.is_receiving(&next) {
            return self.execute_as_not_initiator(id, available);
        }

        let next = self.modify_current_transition(id, next, &available);
        self.execute_as_initiator(id, next)
    }

    /// Sending role of a message transition for this actor.
    pub(crate) fn is_sending(&self, transition: &Transition) -> bool {
        match transition.message() {
            Some(message) => self.initiator ^ message.inverse_initiator,
            None => false,
        }
    }

    /// Receiving role of a message transition for this actor. Channel
    /// transitions are role agnostic and never match.
    pub(crate) fn is_receiving(&self, transition: &Transition) -> bool {
        match transition.message() {
            Some(_) => !self.is_sending(transition),
            None => false,
        }
    }

    /// Weighted choice among the available transitions. A transition with
    /// probability 100 is forced; the first one in list order wins.
    pub(crate) fn pick_next_transition(&mut self, available: &[Transition]) -> Option<Transition> {
        if available.is_empty() {
            return None;
        }
        let chosen = match available
            .iter()
            .find(|transition| transition.probability() == 100)
        {
            Some(forced) => forced.copy(),
            None => {
                let weights: Vec<u32> = available
                    .iter()
                    .map(|transition| transition.probability() as u32)
                    .collect();
                available[weighted_index(&weights, &mut rand::thread_rng())].copy()
            }
        };
        match chosen.kind() {
            TransitionKind::Message(_) => {
                if self.is_receiving(&chosen) {
                    self.visit_log.push(
                        "  [+]   Waiting for an input symbol to decide the transition (not initiator)"
                            .to_string(),
                    );
                } else {
                    self.visit_log
                        .push(format!("  [+]   Picking transition '{}' (initiator)", chosen));
                }
            }
            TransitionKind::OpenChannel => self
                .visit_log
                .push(format!("  [+]   Picking transition '{}' (open channel)", chosen)),
            TransitionKind::CloseChannel => self
                .visit_log
                .push(format!("  [+]   Picking transition '{}' (close channel)", chosen)),
        }
        Some(chosen)
    }

    /// If callbacks are registered, let them replace the retained
    /// transition.
    fn modify_current_transition(
        &mut self,
        id: StateId,
        current: Transition,
        available: &[Transition],
    ) -> Transition {
        let callbacks = self.automaton.state(id).modify_callbacks.clone();
        let mut current = current;
        for callback in &callbacks {
            let cloned: Vec<Transition> = available.iter().map(Transition::copy).collect();
            current = callback(
                cloned,
                current,
                self.automaton.state(id),
                self.abstraction_layer.io_log(),
                &self.memory,
            );
            self.visit_log.push(format!(
                "  [+]   Changing transition to '{}' through callback",
                current
            ));
        }
        current
    }

    fn execute_as_initiator(
        &mut self,
        id: StateId,
        transition: Transition,
    ) -> Result<Option<StateId>, ActorError> {
        self.automaton.state_mut(id).active = true;
        let result = self.run_initiator(id, &transition);
        self.automaton.state_mut(id).active = false;
        result
    }

    fn run_initiator(
        &mut self,
        id: StateId,
        transition: &Transition,
    ) -> Result<Option<StateId>, ActorError> {
        match transition.kind() {
            TransitionKind::OpenChannel => {
                self.abstraction_layer.open_channel()?;
                self.log_transition_end(transition);
                Ok(Some(transition.end_state()))
            }
            TransitionKind::CloseChannel => {
                self.abstraction_layer.close_channel();
                self.log_transition_end(transition);
                Ok(Some(transition.end_state()))
            }
            TransitionKind::Message(message) => {
                let input = Rc::clone(&message.input_symbol);
                self.abstraction_layer.write_symbol(
                    &input,
                    message.input_preset.as_ref(),
                    &mut self.memory,
                )?;
                self.visit_log
                    .push(format!("  [+]   Sending symbol '{}'", input));
                self.run_actions(message, &input, Operation::Specialize, id);

                if message.output_symbols.is_empty() {
                    self.log_transition_end(transition);
                    return Ok(Some(transition.end_state()));
                }

                match self.abstraction_layer.read_symbol(&mut self.memory) {
                    Ok((symbol, bytes, structure)) => {
                        if message
                            .output_symbols
                            .iter()
                            .any(|candidate| candidate.id() == symbol.id())
                        {
                            self.visit_log
                                .push(format!("  [+]   Received expected symbol '{}'", symbol));
                            self.run_actions(message, &symbol, Operation::Abstract, id);
                            self.log_transition_end(transition);
                            Ok(Some(transition.end_state()))
                        } else {
                            self.handle_unmatched(id, symbol, bytes, structure)
                        }
                    }
                    Err(ChannelError::Timeout) => {
                        self.visit_log.push(format!(
                            "  [+]   Timeout waiting for a response to '{}'",
                            input
                        ));
                        if let Some(callback) = self.on_symbol_timeout.clone() {
                            callback(self.automaton.state(id), Some(transition));
                        }
                        Ok(None)
                    }
                    Err(ChannelError::Stopped) => {
                        self.visit_log
                            .push("  [+]   Stop requested, ending the dialogue".to_string());
                        Ok(None)
                    }
                    Err(err) => Err(ActorError::Transport(err)),
                }
            }
        }
    }

    fn execute_as_not_initiator(
        &mut self,
        id: StateId,
        available: Vec<Transition>,
    ) -> Result<Option<StateId>, ActorError> {
        self.automaton.state_mut(id).active = true;
        let result = self.run_not_initiator(id, available);
        self.automaton.state_mut(id).active = false;
        result
    }

    fn run_not_initiator(
        &mut self,
        id: StateId,
        available: Vec<Transition>,
    ) -> Result<Option<StateId>, ActorError> {
        if available.is_empty() {
            return Ok(None);
        }

        // A forced transition short circuits the choice; a lone close
        // channel transition executes without waiting for a frame.
        let forced = available
            .iter()
            .find(|transition| transition.probability() == 100)
            .map(Transition::copy);

        if let Some(transition) = &forced {
            self.visit_log.push(format!(
                "  [+]   Going to execute transition '{}'",
                transition
            ));
            match transition.kind() {
                TransitionKind::OpenChannel => {
                    self.abstraction_layer.open_channel()?;
                    self.log_transition_end(transition);
                    return Ok(Some(transition.end_state()));
                }
                TransitionKind::CloseChannel => {
                    self.abstraction_layer.close_channel();
                    self.log_transition_end(transition);
                    return Ok(Some(transition.end_state()));
                }
                TransitionKind::Message(_) => {}
            }
        } else if available.len() == 1
            && matches!(available[0].kind(), TransitionKind::CloseChannel)
        {
            let transition = available[0].copy();
            self.visit_log.push(format!(
                "  [+]   Going to execute transition '{}'",
                transition
            ));
            self.abstraction_layer.close_channel();
            self.log_transition_end(&transition);
            return Ok(Some(transition.end_state()));
        }

        let (symbol, bytes, structure) = match self.abstraction_layer.read_symbol(&mut self.memory)
        {
            Ok(received) => received,
            Err(ChannelError::Timeout) => {
                let empty_transition = available
                    .iter()
                    .find(|transition| {
                        self.is_receiving(transition)
                            && transition.message().map_or(false, |message| {
                                message.input_symbol.kind() == SymbolKind::Empty
                            })
                    })
                    .map(Transition::copy);
                match empty_transition {
                    Some(transition) => {
                        self.visit_log.push(format!(
                            "  [+]   Receiving no symbol (EmptySymbol) corresponds to transition '{}'",
                            transition
                        ));
                        return self.respond(id, &transition);
                    }
                    None => {
                        self.visit_log
                            .push("  [+]   Timeout waiting for an input symbol".to_string());
                        if let Some(callback) = self.on_symbol_timeout.clone() {
                            callback(self.automaton.state(id), None);
                        }
                        return Ok(None);
                    }
                }
            }
            Err(ChannelError::Stopped) => {
                self.visit_log
                    .push("  [+]   Stop requested, ending the dialogue".to_string());
                return Ok(None);
            }
            Err(_) => {
                self.visit_log.push(
                    "  [+]   The communication channel seems closed, stopping the actor"
                        .to_string(),
                );
                return Ok(None);
            }
        };

        // First receiving transition expecting this symbol, preset
        // included.
        let pool: Vec<Transition> = match forced {
            Some(transition) => vec![transition],
            None => available.iter().map(Transition::copy).collect(),
        };
        let matched = pool.into_iter().find(|transition| {
            self.is_receiving(transition)
                && transition.message().map_or(false, |message| {
                    message.input_symbol.id() == symbol.id()
                        && message
                            .input_preset
                            .as_ref()
                            .map_or(true, |preset| preset.matches(&structure))
                })
        });
        let matched = match matched {
            Some(transition) => self.modify_current_transition(id, transition, &available),
            None => return self.handle_unmatched(id, symbol, bytes, structure),
        };
        self.visit_log.push(format!(
            "  [+]   Input symbol '{}' corresponds to transition '{}'",
            symbol, matched
        ));

        if let Some(message) = matched.message() {
            self.run_actions(message, &symbol, Operation::Abstract, id);
        }
        self.respond(id, &matched)
    }

    /// Emit one of the output symbols of `transition` and move to its end
    /// state.
    fn respond(
        &mut self,
        id: StateId,
        transition: &Transition,
    ) -> Result<Option<StateId>, ActorError> {
        let message = match transition.message() {
            Some(message) => message,
            None => return Ok(Some(transition.end_state())),
        };
        if message.output_symbols.is_empty() {
            self.log_transition_end(transition);
            return Ok(Some(transition.end_state()));
        }

        let index = match message
            .output_probabilities
            .iter()
            .position(|probability| *probability == 100)
        {
            Some(forced) => forced,
            None => {
                let weights: Vec<u32> = message
                    .output_probabilities
                    .iter()
                    .map(|probability| *probability as u32)
                    .collect();
                weighted_index(&weights, &mut rand::thread_rng())
            }
        };
        let output = Rc::clone(&message.output_symbols[index]);
        let preset = message.output_presets[index].clone();
        self.abstraction_layer
            .write_symbol(&output, preset.as_ref(), &mut self.memory)?;
        self.visit_log
            .push(format!("  [+]   Sending symbol '{}'", output));
        self.run_actions(message, &output, Operation::Specialize, id);
        self.log_transition_end(transition);
        Ok(Some(transition.end_state()))
    }

    /// Run the action callbacks of a transition for one I/O step, in
    /// registration order.
    fn run_actions(
        &mut self,
        message: &MessageTransition,
        symbol: &Rc<Symbol>,
        operation: Operation,
        id: StateId,
    ) {
        if message.actions.is_empty() {
            return;
        }
        let (bytes, structure) = match operation {
            Operation::Specialize => (
                self.abstraction_layer
                    .io_log()
                    .last_sent_message
                    .clone()
                    .unwrap_or_default(),
                self.abstraction_layer
                    .io_log()
                    .last_sent_structure
                    .clone()
                    .unwrap_or_default(),
            ),
            Operation::Abstract => (
                self.abstraction_layer
                    .io_log()
                    .last_received_message
                    .clone()
                    .unwrap_or_default(),
                self.abstraction_layer
                    .io_log()
                    .last_received_structure
                    .clone()
                    .unwrap_or_default(),
            ),
        };
        let actions = message.actions.clone();
        for action in &actions {
            action(
                symbol,
                &bytes,
                &structure,
                operation,
                self.automaton.state(id),
                &mut self.memory,
            );
        }
    }

    /// Unknown or unexpected received symbol: invoke the registered
    /// callback and stop gracefully, else fail the actor.
    fn handle_unmatched(
        &mut self,
        id: StateId,
        symbol: Rc<Symbol>,
        bytes: Vec<u8>,
        structure: Structure,
    ) -> Result<Option<StateId>, ActorError> {
        let state_name = self.automaton.state(id).name().to_string();
        if symbol.kind() == SymbolKind::Unknown {
            self.visit_log
                .push("  [+]   Received an unknown message".to_string());
            match self.on_unknown_symbol.clone() {
                Some(callback) => {
                    callback(self.automaton.state(id), None, &bytes);
                    Ok(None)
                }
                None => Err(ActorError::UnknownSymbol {
                    state: state_name,
                    message: bytes,
                }),
            }
        } else {
            self.visit_log.push(format!(
                "  [+]   Received unexpected symbol '{}'",
                symbol
            ));
            match self.on_unexpected_symbol.clone() {
                Some(callback) => {
                    callback(self.automaton.state(id), None, &symbol, &bytes, &structure);
                    Ok(None)
                }
                None => Err(ActorError::UnexpectedSymbol {
                    state: state_name,
                    symbol: symbol.name().to_string(),
                    message: bytes,
                }),
            }
        }
    }

    fn log_transition_end(&mut self, transition: &Transition) {
        let end_name = self
            .automaton
            .state(transition.end_state())
            .name()
            .to_string();
        self.visit_log.push(format!(
            "  [+]   Transition '{}' lead to state '{}'",
            transition.name(),
            end_name
        ));
    }
}

impl Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
