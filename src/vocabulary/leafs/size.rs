use crate::types::IntegerType;
use crate::vocabulary::{DomainLogger, Size, VarHelper};
use crate::{
    ConfigurationError, DeferredCheck, GenerationError, IVariable, ParseBranches, ParsingPath,
    SpecializingPath, VariableId,
};
use std::collections::HashSet;
use std::fmt::Display;
use std::rc::Rc;

impl Size {
    /// Create a relation leaf holding the byte count of `target`, encoded
    /// with `dtype`.
    /// ### Arguments
    /// * `label` - A display label.
    /// * `target` - The variable whose emission is measured.
    /// * `dtype` - Integer coding of the count on the wire.
    pub fn new(label: &str, target: &Rc<dyn IVariable>, dtype: IntegerType) -> Self {
        Self {
            helper: VarHelper::new(label),
            target: Rc::clone(target),
            dtype,
        }
    }

    /// Set a log label to debug the leaf based on the level of [Log](crate::Log).
    pub fn set_log(&self, debugger: crate::Log<&'static str>) -> Result<(), String> {
        self.helper.assign_debugger(debugger)
    }

    fn expectation(&self) -> Rc<dyn Fn(&ParsingPath) -> Option<Vec<u8>>> {
        let target = self.target.id();
        let dtype = self.dtype.clone();
        Rc::new(move |path: &ParsingPath| {
            let measured = match path.consumed(target) {
                Some(bytes) => bytes.len(),
                None => path.memory().recall(target)?.len(),
            };
            Some(dtype.encode(measured as i128))
        })
    }
}

impl Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}; size({})]",
            self.helper.label,
            self.target.label()
        )
    }
}

impl IVariable for Size {
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
        let width = self.dtype.width();
        if data.len() < width {
            self.helper.log_parse_failure(data.len());
            return Box::new(std::iter::empty());
        }

        // The equality against the measured target is checked once the
        // whole message is consumed: the target may sit after this leaf.
        let mut branch = path;
        branch.add_result(self.id(), data[..width].to_vec());
        branch.defer_check(DeferredCheck {
            relation: self.id(),
            label: self.helper.label.clone(),
            expected: self.expectation(),
        });
        self.helper.log_parse_success(width);
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
                let value = self.dtype.encode(bytes.len() as i128);
                self.helper.log_specialized(value.len());
                path.push_value(self.id(), value);
            }
            None => {
                let dtype = self.dtype.clone();
                path.push_placeholder(
                    self.id(),
                    self.helper.label.clone(),
                    Rc::new(move |path: &SpecializingPath| {
                        let measured = match path.emitted(target) {
                            Some(bytes) => bytes.len(),
                            None => path.memory().recall(target)?.len(),
                        };
                        Some(dtype.encode(measured as i128))
                    }),
                );
            }
        }
        Ok(path)
    }
}
