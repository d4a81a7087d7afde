use crate::vocabulary::{DomainLogger, Value, VarHelper};
use crate::{
    ConfigurationError, DeferredCheck, GenerationError, IVariable, ParseBranches, ParsingPath,
    SpecializingPath, VariableId,
};
use std::collections::HashSet;
use std::fmt::Display;
use std::rc::Rc;

impl Value {
    /// Create a relation leaf mirroring the bytes of `target` verbatim.
    pub fn new(label: &str, target: &Rc<dyn IVariable>) -> Self {
        Self {
            helper: VarHelper::new(label),
            target: Rc::clone(target),
        }
    }

    /// Set a log label to debug the leaf based on the level of [Log](crate::Log).
    pub fn set_log(&self, debugger: crate::Log<&'static str>) -> Result<(), String> {
        self.helper.assign_debugger(debugger)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}; value({})]",
            self.helper.label,
            self.target.label()
        )
    }
}

impl IVariable for Value {
    fn id(&self) -> VariableId {
        self.helper.id
    }

    fn label(&self) -> &str {
        &self.helper.label
    }

    fn children(&self) -> Vec<Rc<dyn IVariable>> {
        Vec::new()
    }

    fn dependencies(&self) -> Vec<VariableId> {
        vec![self.target.id()]
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
        Ok(())
    }

    fn parse<'v>(&'v self, path: ParsingPath) -> ParseBranches<'v> {
        self.helper.log_entry();

        let data = match path.assigned(self.id()) {
            Some(data) => data.to_vec(),
            None => return Box::new(std::iter::empty()),
        };
        let target = self.target.id();

        // The mirrored value bounds the consumption, so it must be known
        // here: either the target was consumed earlier in this message or
        // a previous exchange persisted it.
        let expected = match path.consumed(target) {
            Some(bytes) => bytes.to_vec(),
            None => match path.memory().recall(target) {
                Some(bytes) => bytes.to_vec(),
                None => {
                    self.helper.log_parse_failure(data.len());
                    return Box::new(std::iter::empty());
                }
            },
        };
        if !data.starts_with(&expected) {
            self.helper.log_parse_failure(data.len());
            return Box::new(std::iter::empty());
        }

        let mut branch = path;
        branch.add_result(self.id(), expected.clone());
        branch.defer_check(DeferredCheck {
            relation: self.id(),
            label: self.helper.label.clone(),
            expected: Rc::new(move |path: &ParsingPath| {
                path.consumed(target)
                    .or_else(|| path.memory().recall(target))
                    .map(<[u8]>::to_vec)
            }),
        });
        self.helper.log_parse_success(expected.len());
        Box::new(std::iter::once(branch))
    }

    fn specialize(&self, mut path: SpecializingPath) -> Result<SpecializingPath, GenerationError> {
        if let Some(pinned) = path.preset_value(self.id()) {
            let value = pinned?;
            path.push_value(self.id(), value);
            return Ok(path);
        }
        let target = self.target.id();
        match path.emitted(target) {
            Some(bytes) => {
                self.helper.log_specialized(bytes.len());
                path.push_value(self.id(), bytes);
            }
            None => {
                path.push_placeholder(
                    self.id(),
                    self.helper.label.clone(),
                    Rc::new(move |path: &SpecializingPath| {
                        path.emitted(target)
                            .or_else(|| path.memory().recall(target).map(<[u8]>::to_vec))
                    }),
                );
            }
        }
        Ok(path)
    }
}
