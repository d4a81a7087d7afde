use crate::vocabulary::{Alt, AltSelectorFn, Data, DomainLogger, VarHelper};
use crate::{
    ConfigurationError, GenerationError, IVariable, ParseBranches, ParsingPath, SpecializingPath,
    VariableId,
};
use once_cell::unsync::OnceCell;
use rand::Rng;
use std::collections::HashSet;
use std::fmt::Display;
use std::rc::Rc;

impl Alt {
    /// Create a new [Alt] node without alternatives.
    /// ### Arguments
    /// * `label` - A display label.
    pub fn init(label: &str) -> Self {
        Self {
            helper: VarHelper::new(label),
            children: OnceCell::new(),
            selector: OnceCell::new(),
        }
    }

    /// Create a new [Alt] node deriving one of `children`.
    pub fn new(label: &str, children: Vec<Rc<dyn IVariable>>) -> Self {
        let cell = OnceCell::new();
        if cell.set(children).is_err() {
            panic!("Internal error")
        }
        Self {
            helper: VarHelper::new(label),
            children: cell,
            selector: OnceCell::new(),
        }
    }

    /// Create an [Alt] node over constant values. Each value becomes a
    /// constant data leaf labelled after itself.
    pub fn of_constants(label: &str, values: Vec<&str>) -> Self {
        let children = values
            .into_iter()
            .map(|value| Rc::new(Data::constant(value, value)) as Rc<dyn IVariable>)
            .collect();
        Alt::new(label, children)
    }

    /// Set the alternatives of a node created with [init](Alt::init).
    pub fn set_children(&self, children: Vec<Rc<dyn IVariable>>) -> Result<(), String> {
        self.children.set(children).map_err(|err| {
            format!(
                "Children {:?} are already set for {}.",
                err.iter().map(|c| format!("{}", c)).collect::<Vec<String>>(),
                self.helper.label
            )
        })
    }

    /// Register the callback selecting the alternative to specialize.
    /// Negative indices wrap from the end: `-1` selects the last child.
    pub fn set_selector(&self, selector: Rc<AltSelectorFn>) -> Result<(), String> {
        self.selector
            .set(selector)
            .map_err(|_| format!("A selector is already set for {}.", self.helper.label))
    }

    /// Set a log label to debug the node based on the level of [Log](crate::Log).
    pub fn set_log(&self, debugger: crate::Log<&'static str>) -> Result<(), String> {
        self.helper.assign_debugger(debugger)
    }

    fn child_list(&self) -> &Vec<Rc<dyn IVariable>> {
        self.children.get_or_init(|| {
            if cfg!(debug_assertions) {
                panic!(
                    "Children are not set for {}. Validate the vocabulary before parsing.",
                    self.helper.label
                )
            }
            Vec::new()
        })
    }
}

impl Display for Alt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.helper.label)
    }
}

impl IVariable for Alt {
    fn id(&self) -> VariableId {
        self.helper.id
    }

    fn label(&self) -> &str {
        &self.helper.label
    }

    fn children(&self) -> Vec<Rc<dyn IVariable>> {
        self.child_list().clone()
    }

    fn validate(&self, visited: &mut HashSet<VariableId>) -> Result<(), ConfigurationError> {
        if !visited.insert(self.id()) {
            return Err(ConfigurationError::new(
                "SharedDomain".into(),
                format!(
                    "Variable '{}' occupies more than one structural position.",
                    self.helper.label
                ),
            ));
        }
        match self.children.get() {
            None => {
                return Err(ConfigurationError::new(
                    "InitializationError".into(),
                    format!("Children are not assigned for {:?}.", self.helper.label),
                ))
            }
            Some(children) if children.is_empty() => {
                return Err(ConfigurationError::new(
                    "EmptyAlternative".into(),
                    format!("Alternative '{}' has no children.", self.helper.label),
                ))
            }
            Some(_) => {}
        }
        for child in self.child_list() {
            child.validate(visited)?;
        }
        Ok(())
    }

    fn parse<'v>(&'v self, path: ParsingPath) -> ParseBranches<'v> {
        self.helper.log_entry();

        let data = match path.assigned(self.id()) {
            Some(data) => data.to_vec(),
            None => return Box::new(std::iter::empty()),
        };
        let id = self.id();
        Box::new(self.child_list().iter().flat_map(move |child| {
            let child_id = child.id();
            let mut entry = path.duplicate();
            entry.assign(child_id, data.clone());
            child.parse(entry).map(move |mut branch| {
                let taken = branch.consumed(child_id).map_or_else(Vec::new, <[u8]>::to_vec);
                branch.mark_consumed(id, taken);
                branch
            })
        }))
    }

    fn specialize(&self, mut path: SpecializingPath) -> Result<SpecializingPath, GenerationError> {
        if let Some(pinned) = path.preset_value(self.id()) {
            let value = pinned?;
            path.push_value(self.id(), value);
            return Ok(path);
        }
        let children = self.child_list();
        if children.is_empty() {
            return Err(GenerationError::InvalidSelection(format!(
                "alternative '{}' has no children",
                self.helper.label
            )));
        }
        let index = match self.selector.get() {
            Some(selector) => {
                let raw = selector(&path, children);
                let count = children.len() as isize;
                let wrapped = if raw < 0 { raw + count } else { raw };
                if wrapped < 0 || wrapped >= count {
                    return Err(GenerationError::InvalidSelection(format!(
                        "index {} out of {} alternatives for '{}'",
                        raw,
                        children.len(),
                        self.helper.label
                    )));
                }
                wrapped as usize
            }
            None => path.rng().gen_range(0..children.len()),
        };
        let start = path.begin_span();
        let mut branch = children[index].specialize(path)?;
        branch.close_span(self.id(), start);
        Ok(branch)
    }
}
