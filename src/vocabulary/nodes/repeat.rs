use crate::vocabulary::{DomainLogger, Repeat, VarHelper};
use crate::{
    ConfigurationError, GenerationError, IVariable, ParseBranches, ParsingPath, SpecializingPath,
    VariableId,
};
use rand::Rng;
use std::collections::HashSet;
use std::fmt::Display;
use std::rc::Rc;

impl Repeat {
    /// Create a node repeating `child` between `min` and `max` times.
    /// ### Arguments
    /// * `label` - A display label.
    /// * `child` - The repeated variable.
    /// * `min`, `max` - Inclusive count bounds.
    pub fn new(label: &str, child: &Rc<dyn IVariable>, min: usize, max: usize) -> Self {
        assert!(
            min <= max,
            "Invalid repetition bounds {}..={} for '{}'.",
            min,
            max,
            label
        );
        Self {
            helper: VarHelper::new(label),
            child: Rc::clone(child),
            delimiter: None,
            min,
            max,
        }
    }

    /// Separate consecutive items with `delimiter`.
    pub fn with_delimiter(mut self, delimiter: &Rc<dyn IVariable>) -> Self {
        self.delimiter = Some(Rc::clone(delimiter));
        self
    }

    /// Set a log label to debug the node based on the level of [Log](crate::Log).
    pub fn set_log(&self, debugger: crate::Log<&'static str>) -> Result<(), String> {
        self.helper.assign_debugger(debugger)
    }
}

impl Display for Repeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}..={})", self.helper.label, self.min, self.max)
    }
}

impl IVariable for Repeat {
    fn id(&self) -> VariableId {
        self.helper.id
    }

    fn label(&self) -> &str {
        &self.helper.label
    }

    fn children(&self) -> Vec<Rc<dyn IVariable>> {
        let mut children = vec![Rc::clone(&self.child)];
        if let Some(delimiter) = &self.delimiter {
            children.push(Rc::clone(delimiter));
        }
        children
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
        self.child.validate(visited)?;
        if let Some(delimiter) = &self.delimiter {
            delimiter.validate(visited)?;
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

        // Explore the counts breadth first: per_count[k] holds every branch
        // having matched the child k times, with its consumption offset.
        let mut per_count: Vec<Vec<(ParsingPath, usize)>> = vec![vec![(path, 0)]];
        for count in 1..=self.max {
            let mut next: Vec<(ParsingPath, usize)> = Vec::new();
            for (branch, used) in &per_count[count - 1] {
                let mut seeds: Vec<(ParsingPath, usize)> = vec![(branch.duplicate(), *used)];
                if count > 1 {
                    if let Some(delimiter) = &self.delimiter {
                        let delimiter_id = delimiter.id();
                        let mut separated = Vec::new();
                        for (seed, offset) in seeds {
                            let mut entry = seed;
                            entry.assign(delimiter_id, data[offset..].to_vec());
                            for sep_branch in delimiter.parse(entry) {
                                let taken =
                                    sep_branch.consumed(delimiter_id).map_or(0, <[u8]>::len);
                                separated.push((sep_branch, offset + taken));
                            }
                        }
                        seeds = separated;
                    }
                }
                let child_id = self.child.id();
                for (seed, offset) in seeds {
                    let mut entry = seed;
                    entry.assign(child_id, data[offset..].to_vec());
                    for child_branch in self.child.parse(entry) {
                        let taken = child_branch.consumed(child_id).map_or(0, <[u8]>::len);
                        next.push((child_branch, offset + taken));
                    }
                }
            }
            let exhausted = next.is_empty();
            per_count.push(next);
            if exhausted {
                break;
            }
        }

        // Longest first: a greedy consumer takes the highest legal count,
        // a backtracking one still reaches every other length.
        let mut branches: Vec<ParsingPath> = Vec::new();
        for count in (self.min..per_count.len()).rev() {
            for (branch, used) in &per_count[count] {
                let mut complete = branch.duplicate();
                complete.mark_consumed(id, data[..*used].to_vec());
                branches.push(complete);
            }
        }
        if branches.is_empty() {
            self.helper.log_parse_failure(data.len());
        }
        Box::new(branches.into_iter())
    }

    fn specialize(&self, mut path: SpecializingPath) -> Result<SpecializingPath, GenerationError> {
        if let Some(pinned) = path.preset_value(self.id()) {
            let value = pinned?;
            path.push_value(self.id(), value);
            return Ok(path);
        }
        let count = if self.min == self.max {
            self.min
        } else {
            path.rng().gen_range(self.min..=self.max)
        };
        let start = path.begin_span();
        let mut current = path;
        for index in 0..count {
            if index > 0 {
                if let Some(delimiter) = &self.delimiter {
                    current = delimiter.specialize(current)?;
                }
            }
            current = self.child.specialize(current)?;
        }
        current.close_span(self.id(), start);
        Ok(current)
    }
}
