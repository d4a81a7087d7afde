use crate::types::{IDataType, RawType};
use crate::vocabulary::{Data, DomainLogger, VarHelper};
use crate::{
    ConfigurationError, GenerationError, IVariable, ParseBranches, ParsingPath, SpecializingPath,
    VariableId,
};
use std::collections::HashSet;
use std::fmt::Display;
use std::rc::Rc;

impl Data {
    /// Create a data leaf accepting any valid value of `dtype`.
    /// ### Arguments
    /// * `label` - A display label.
    /// * `dtype` - The wire data type of the leaf.
    pub fn new(label: &str, dtype: Rc<dyn IDataType>) -> Self {
        Self {
            helper: VarHelper::new(label),
            dtype,
            value: None,
        }
    }

    /// Create a data leaf pinned to a constant value: parsing accepts
    /// exactly that value and specializing emits it.
    pub fn constant(label: &str, value: impl Into<Vec<u8>>) -> Self {
        let value = value.into();
        assert!(
            !value.is_empty(),
            "A constant data leaf should not be empty."
        );
        Self {
            helper: VarHelper::new(label),
            dtype: Rc::new(RawType::fixed(value.len())),
            value: Some(value),
        }
    }

    /// Pin the leaf to `value` while keeping its declared type. The value
    /// must be valid for the type.
    pub fn with_value(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set a log label to debug the leaf based on the level of [Log](crate::Log).
    pub fn set_log(&self, debugger: crate::Log<&'static str>) -> Result<(), String> {
        self.helper.assign_debugger(debugger)
    }
}

impl Display for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "[{}; {:?}]", self.helper.label, value),
            None => write!(f, "[{}; {}]", self.helper.label, self.dtype),
        }
    }
}

impl IVariable for Data {
    fn id(&self) -> VariableId {
        self.helper.id
    }

    fn label(&self) -> &str {
        &self.helper.label
    }

    fn children(&self) -> Vec<Rc<dyn IVariable>> {
        Vec::new()
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
        if let Some(value) = &self.value {
            if !self.dtype.validate(value) {
                return Err(ConfigurationError::new(
                    "InvalidConstant".into(),
                    format!(
                        "The value {:?} pinned to '{}' is not a valid {}.",
                        value, self.helper.label, self.dtype
                    ),
                ));
            }
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

        match &self.value {
            Some(value) => {
                if data.starts_with(value) {
                    let mut branch = path;
                    branch.add_result(id, value.clone());
                    self.helper.log_parse_success(value.len());
                    Box::new(std::iter::once(branch))
                } else {
                    self.helper.log_parse_failure(data.len());
                    Box::new(std::iter::empty())
                }
            }
            None => Box::new(
                self.dtype
                    .candidate_lengths(&data)
                    .into_iter()
                    .filter_map(move |size| {
                        let prefix = &data[..size];
                        if self.dtype.validate(prefix) {
                            let mut branch = path.duplicate();
                            branch.add_result(id, prefix.to_vec());
                            self.helper.log_parse_success(size);
                            Some(branch)
                        } else {
                            None
                        }
                    }),
            ),
        }
    }

    fn specialize(&self, mut path: SpecializingPath) -> Result<SpecializingPath, GenerationError> {
        if let Some(pinned) = path.preset_value(self.id()) {
            let value = pinned?;
            path.push_value(self.id(), value);
            return Ok(path);
        }
        let value = match &self.value {
            Some(value) => value.clone(),
            None => self.dtype.generate(path.rng())?,
        };
        self.helper.log_specialized(value.len());
        path.push_value(self.id(), value);
        Ok(path)
    }
}
