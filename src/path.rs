use crate::vocabulary::ResolvedPreset;
use crate::{
    DeferredCheck, DeferredEmission, GenerationError, Memory, ParsingPath, SpecializingPath,
    VariableId,
};
use rand::rngs::StdRng;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

impl ParsingPath {
    pub fn new(memory: Memory) -> Self {
        Self {
            assigned: HashMap::new(),
            consumed: HashMap::new(),
            results: Vec::new(),
            memory,
            deferred: Vec::new(),
        }
    }

    /// Branch the path. Assignments are cloned; the variable identities
    /// used as keys stay stable across the copy.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// Hand `data` to `variable` for consumption.
    pub fn assign(&mut self, variable: VariableId, data: Vec<u8>) {
        self.assigned.insert(variable, data);
    }

    /// The bytes currently assigned to `variable`.
    pub fn assigned(&self, variable: VariableId) -> Option<&[u8]> {
        self.assigned.get(&variable).map(Vec::as_slice)
    }

    /// Record the bytes consumed by a composition node.
    pub fn mark_consumed(&mut self, variable: VariableId, value: Vec<u8>) {
        self.consumed.insert(variable, value);
    }

    /// Record the bytes consumed by a leaf and append them to the ordered
    /// result list.
    pub fn add_result(&mut self, variable: VariableId, value: Vec<u8>) {
        self.results.push((variable, value.clone()));
        self.consumed.insert(variable, value);
    }

    /// The bytes consumed by `variable` on this branch, if it was reached.
    pub fn consumed(&self, variable: VariableId) -> Option<&[u8]> {
        self.consumed.get(&variable).map(Vec::as_slice)
    }

    pub fn results(&self) -> &[(VariableId, Vec<u8>)] {
        &self.results
    }

    #[inline]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    #[inline]
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Register a relation check to re-run once the whole message is
    /// consumed.
    pub fn defer_check(&mut self, check: DeferredCheck) {
        self.deferred.push(check);
    }

    /// Re-run every deferred relation check against the final assignments.
    /// A check whose expectation is still not computable rejects the branch.
    pub fn run_deferred_checks(&self) -> bool {
        self.deferred.iter().all(|check| {
            match (check.expected)(self) {
                Some(expected) => self.consumed(check.relation) == Some(expected.as_slice()),
                None => false,
            }
        })
    }
}

impl SpecializingPath {
    pub(crate) fn new(memory: Memory, preset: Rc<ResolvedPreset>, rng: StdRng) -> Self {
        Self {
            results: Vec::new(),
            spans: HashMap::new(),
            unresolved: HashSet::new(),
            deferred: Vec::new(),
            memory,
            preset,
            rng,
        }
    }

    /// Branch the path. The random generator is cloned with its state, so
    /// both branches continue the same deterministic sequence.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// Index of the next emission, used to open a span over a subtree.
    pub(crate) fn begin_span(&self) -> usize {
        self.results.len()
    }

    /// Close the span opened at `start` and attribute it to `variable`.
    pub(crate) fn close_span(&mut self, variable: VariableId, start: usize) {
        self.spans.insert(variable, (start, self.results.len()));
    }

    /// Append a resolved leaf emission.
    pub(crate) fn push_value(&mut self, variable: VariableId, value: Vec<u8>) {
        let index = self.results.len();
        self.results.push((variable, value));
        self.spans.insert(variable, (index, index + 1));
    }

    /// Append a placeholder emission for a relation whose target is not
    /// emitted yet, together with the computation to run once it is.
    pub(crate) fn push_placeholder(
        &mut self,
        variable: VariableId,
        label: String,
        compute: Rc<dyn Fn(&SpecializingPath) -> Option<Vec<u8>>>,
    ) {
        let index = self.results.len();
        self.results.push((variable, Vec::new()));
        self.spans.insert(variable, (index, index + 1));
        self.unresolved.insert(index);
        self.deferred.push(DeferredEmission {
            entry: index,
            label,
            compute,
        });
    }

    /// The bytes emitted for `variable`, once every entry of its span is
    /// resolved.
    pub fn emitted(&self, variable: VariableId) -> Option<Vec<u8>> {
        let (start, end) = *self.spans.get(&variable)?;
        if (start..end).any(|index| self.unresolved.contains(&index)) {
            return None;
        }
        let mut bytes = Vec::new();
        for (_, value) in &self.results[start..end] {
            bytes.extend_from_slice(value);
        }
        Some(bytes)
    }

    /// Patch the deferred emissions to a fixpoint. Relations may target
    /// variables on either side of their own position; a round that makes
    /// no progress while emissions remain means an unresolvable
    /// configuration.
    pub(crate) fn resolve_deferred(&mut self) -> Result<(), GenerationError> {
        while !self.deferred.is_empty() {
            let pending = std::mem::take(&mut self.deferred);
            let mut remaining = Vec::new();
            let mut progressed = false;
            for emission in pending {
                match (emission.compute)(self) {
                    Some(bytes) => {
                        self.results[emission.entry].1 = bytes;
                        self.unresolved.remove(&emission.entry);
                        progressed = true;
                    }
                    None => remaining.push(emission),
                }
            }
            self.deferred = remaining;
            if !progressed && !self.deferred.is_empty() {
                return Err(GenerationError::UnresolvedDependency(
                    self.deferred[0].label.clone(),
                ));
            }
        }
        Ok(())
    }

    /// Concatenate the ordered emissions into the final message.
    pub fn assembled(&self) -> Vec<u8> {
        let mut message = Vec::new();
        for (_, value) in &self.results {
            message.extend_from_slice(value);
        }
        message
    }

    pub fn results(&self) -> &[(VariableId, Vec<u8>)] {
        &self.results
    }

    #[inline]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    #[inline]
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// The preset value pinned to `variable`, if any. Pool backed pins pop
    /// one value per call.
    pub(crate) fn preset_value(
        &self,
        variable: VariableId,
    ) -> Option<Result<Vec<u8>, GenerationError>> {
        self.preset.value_for(variable)
    }

    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
