use crate::vocabulary::{Agg, DomainLogger, VarHelper};
use crate::{
    ConfigurationError, GenerationError, IVariable, ParseBranches, ParsingPath, SpecializingPath,
    VariableId,
};
use once_cell::unsync::OnceCell;
use std::collections::HashSet;
use std::fmt::Display;
use std::rc::Rc;

/// Thread `buffer` through `items[index..]`: every acceptable consumption
/// of an item feeds the remainder to the next one. Yields each complete
/// branch together with the total number of bytes it consumed.
///
/// Both [Agg] and [Symbol](crate::vocabulary::Symbol) sequence their parts
/// this way.
pub(crate) fn parse_sequence<'v>(
    items: &'v [Rc<dyn IVariable>],
    index: usize,
    buffer: Vec<u8>,
    used: usize,
    path: ParsingPath,
) -> Box<dyn Iterator<Item = (ParsingPath, usize)> + 'v> {
    if index == items.len() {
        return Box::new(std::iter::once((path, used)));
    }
    let item = &items[index];
    let item_id = item.id();
    let mut entry = path;
    entry.assign(item_id, buffer.clone());
    Box::new(item.parse(entry).flat_map(move |branch| {
        let taken = branch.consumed(item_id).map_or(0, <[u8]>::len);
        let rest = buffer[taken..].to_vec();
        parse_sequence(items, index + 1, rest, used + taken, branch)
    }))
}

impl Agg {
    /// Create a new [Agg] node without children.
    /// ### Arguments
    /// * `label` - A display label.
    pub fn init(label: &str) -> Self {
        Self {
            helper: VarHelper::new(label),
            children: OnceCell::new(),
        }
    }

    /// Create a new [Agg] node deriving the concatenation of `children`.
    pub fn new(label: &str, children: Vec<Rc<dyn IVariable>>) -> Self {
        let cell = OnceCell::new();
        if cell.set(children).is_err() {
            panic!("Internal error")
        }
        Self {
            helper: VarHelper::new(label),
            children: cell,
        }
    }

    /// Set the children of a node created with [init](Agg::init).
    pub fn set_children(&self, children: Vec<Rc<dyn IVariable>>) -> Result<(), String> {
        self.children.set(children).map_err(|err| {
            format!(
                "Children {:?} are already set for {}.",
                err.iter().map(|c| format!("{}", c)).collect::<Vec<String>>(),
                self.helper.label
            )
        })
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

impl Display for Agg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.helper.label)
    }
}

impl IVariable for Agg {
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
        if self.children.get().is_none() {
            return Err(ConfigurationError::new(
                "InitializationError".into(),
                format!("Children are not assigned for {:?}.", self.helper.label),
            ));
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
        let total = data.clone();
        Box::new(
            parse_sequence(self.child_list(), 0, data, 0, path).map(move |(mut branch, used)| {
                branch.mark_consumed(id, total[..used].to_vec());
                branch
            }),
        )
    }

    fn specialize(&self, mut path: SpecializingPath) -> Result<SpecializingPath, GenerationError> {
        if let Some(pinned) = path.preset_value(self.id()) {
            let value = pinned?;
            path.push_value(self.id(), value);
            return Ok(path);
        }
        let start = path.begin_span();
        let mut current = path;
        for child in self.child_list() {
            current = child.specialize(current)?;
        }
        current.close_span(self.id(), start);
        Ok(current)
    }
}
