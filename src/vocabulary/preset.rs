use crate::vocabulary::{Preset, PresetKey, PresetValue, ResolvedPreset, Symbol, SymbolKind};
use crate::{GenerationError, Structure, VariableId};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

impl Preset {
    pub fn new() -> Self {
        Self { pins: Vec::new() }
    }

    /// Pin the whole domain of the named field to a fixed value.
    pub fn pin_field(mut self, name: &str, value: impl Into<Vec<u8>>) -> Self {
        self.pins
            .push((PresetKey::Field(name.into()), PresetValue::Fixed(value.into())));
        self
    }

    /// Pin one precise variable to a fixed value.
    pub fn pin_variable(mut self, variable: VariableId, value: impl Into<Vec<u8>>) -> Self {
        self.pins
            .push((PresetKey::Variable(variable), PresetValue::Fixed(value.into())));
        self
    }

    /// Back the named field with an ordered pool of values. Each
    /// specialization pops one; an empty pool fails the call with
    /// [GenerationError::ValuesExhausted](crate::GenerationError).
    pub fn pool_field(mut self, name: &str, values: Vec<Vec<u8>>) -> Self {
        self.pins.push((
            PresetKey::Field(name.into()),
            PresetValue::Pool(Rc::new(RefCell::new(VecDeque::from(values)))),
        ));
        self
    }

    /// Back one precise variable with an ordered pool of values.
    pub fn pool_variable(mut self, variable: VariableId, values: Vec<Vec<u8>>) -> Self {
        self.pins.push((
            PresetKey::Variable(variable),
            PresetValue::Pool(Rc::new(RefCell::new(VecDeque::from(values)))),
        ));
        self
    }

    /// Whether a parsed structure satisfies every fixed field pin. Pool
    /// pins and variable pins do not constrain matching.
    pub fn matches(&self, structure: &Structure) -> bool {
        self.pins.iter().all(|(key, value)| match (key, value) {
            (PresetKey::Field(name), PresetValue::Fixed(expected)) => {
                structure.get(name) == Some(expected.as_slice())
            }
            _ => true,
        })
    }

    /// Resolve field pins to the field domain identities of `symbol`.
    pub(crate) fn resolve(&self, symbol: &Symbol) -> Result<ResolvedPreset, GenerationError> {
        let mut by_variable = HashMap::new();
        for (key, value) in &self.pins {
            let variable = match key {
                PresetKey::Variable(variable) => *variable,
                PresetKey::Field(name) => match symbol.field(name) {
                    Some(field) => field.domain().id(),
                    None => {
                        return Err(GenerationError::Unsupported(format!(
                            "the preset pins field '{}' which does not belong to symbol '{}'",
                            name,
                            symbol.name()
                        )))
                    }
                },
            };
            by_variable.insert(variable, value.clone());
        }
        Ok(ResolvedPreset { by_variable })
    }
}

impl Default for Preset {
    fn default() -> Self {
        Preset::new()
    }
}

impl ResolvedPreset {
    pub(crate) fn empty() -> Self {
        Self {
            by_variable: HashMap::new(),
        }
    }

    /// The value pinned to `variable`, popping pool backed pins.
    pub(crate) fn value_for(
        &self,
        variable: VariableId,
    ) -> Option<Result<Vec<u8>, GenerationError>> {
        match self.by_variable.get(&variable)? {
            PresetValue::Fixed(value) => Some(Ok(value.clone())),
            PresetValue::Pool(pool) => match pool.borrow_mut().pop_front() {
                Some(value) => Some(Ok(value)),
                None => Some(Err(GenerationError::ValuesExhausted(format!(
                    "{:?}",
                    variable
                )))),
            },
        }
    }
}

impl SymbolKind {
    #[inline]
    pub fn is_message(&self) -> bool {
        matches!(self, SymbolKind::Message)
    }
}
