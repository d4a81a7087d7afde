use crate::{Memory, VariableId};

impl Memory {
    pub fn new() -> Self {
        Memory::default()
    }

    /// Store the last bytes observed or emitted for `variable`.
    pub fn persist(&mut self, variable: VariableId, value: Vec<u8>) {
        self.values.insert(variable, value);
    }

    /// The last bytes observed or emitted for `variable`, if any.
    pub fn recall(&self, variable: VariableId) -> Option<&[u8]> {
        self.values.get(&variable).map(Vec::as_slice)
    }

    pub fn has(&self, variable: VariableId) -> bool {
        self.values.contains_key(&variable)
    }

    /// Drop the value recorded for `variable`.
    pub fn forget(&mut self, variable: VariableId) {
        self.values.remove(&variable);
    }

    /// Drop every recorded value. Actors clear their memory on restart.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
