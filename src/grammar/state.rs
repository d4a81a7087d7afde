use crate::grammar::{FilterTransitionsFn, ModifyTransitionFn, State, StateId, Transition};
use std::fmt::Display;
use std::rc::Rc;

impl State {
    pub(crate) fn new(id: StateId, name: &str) -> Self {
        Self {
            id,
            name: name.into(),
            active: false,
            transitions: Vec::new(),
            filter_callbacks: Vec::new(),
            modify_callbacks: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> StateId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the state is currently being executed by an actor.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Register a callback reducing the transitions considered at this
    /// state. Callbacks run in registration order on a cloned list.
    pub fn add_filter_callback(&mut self, callback: Rc<FilterTransitionsFn>) {
        self.filter_callbacks.push(callback);
    }

    /// Register a callback replacing the retained transition. Callbacks run
    /// in registration order.
    pub fn add_modify_callback(&mut self, callback: Rc<ModifyTransitionFn>) {
        self.modify_callbacks.push(callback);
    }

    /// Copy the state. The copy owns its transition and callback lists:
    /// mutating them leaves the original unchanged.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}

impl Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
