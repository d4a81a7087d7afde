use crate::grammar::{Automaton, State, StateId, Transition};
use crate::util::TreeView;
use std::fmt::Display;

impl Automaton {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
            initial: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a state and return its identity. The first added state
    /// becomes the initial one unless [set_initial](Automaton::set_initial)
    /// overrides it.
    pub fn add_state(&mut self, name: &str) -> StateId {
        let id = StateId(self.states.len());
        self.states.push(State::new(id, name));
        if self.initial.is_none() {
            self.initial = Some(id);
        }
        id
    }

    pub fn set_initial(&mut self, id: StateId) {
        assert!(id.0 < self.states.len(), "Unknown state {:?}.", id);
        self.initial = Some(id);
    }

    #[inline]
    pub fn initial(&self) -> Option<StateId> {
        self.initial
    }

    /// Attach `transition` to its start state.
    pub fn add_transition(&mut self, transition: Transition) {
        let start = transition.start_state();
        assert!(
            start.0 < self.states.len() && transition.end_state().0 < self.states.len(),
            "Transition '{}' references an unknown state.",
            transition.name()
        );
        self.states[start.0].transitions.push(transition);
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.0]
    }

    pub(crate) fn state_mut(&mut self, id: StateId) -> &mut State {
        &mut self.states[id.0]
    }

    #[inline]
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Copy the automaton, giving the caller an isolated mutable view.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// A printable tree of the states and their outgoing transitions.
    pub fn describe(&self) -> TreeView {
        TreeView::new(
            self.name.clone(),
            self.states
                .iter()
                .map(|state| {
                    TreeView::new(
                        format!("{}", state),
                        state
                            .transitions
                            .iter()
                            .map(|transition| {
                                TreeView::leaf(format!(
                                    "{} -> {}",
                                    transition,
                                    self.states[transition.end_state().0].name()
                                ))
                            })
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    /// Print the automaton tree on the standard output.
    pub fn print(&self) -> std::io::Result<()> {
        self.describe().print()
    }
}

impl Display for Automaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
