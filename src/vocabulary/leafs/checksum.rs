use crate::types::Endianness;
use crate::util::bits;
use crate::vocabulary::{Checksum, DomainLogger, HashFunction, Md5Hash, Sha1Hash, Sha256Hash, VarHelper};
use crate::{
    ConfigurationError, DeferredCheck, GenerationError, IVariable, ParseBranches, ParsingPath,
    SpecializingPath, VariableId,
};
use std::collections::HashSet;
use std::fmt::Display;
use std::rc::Rc;

impl HashFunction for Md5Hash {
    fn calculate(&self, data: &[u8]) -> Vec<u8> {
        use md5::{Digest, Md5};
        let mut hasher = Md5::new();
        hasher.update(data);
        hasher.finalize().to_vec()
    }

    fn bit_size(&self) -> usize {
        128
    }

    fn name(&self) -> &'static str {
        "md5"
    }
}

impl HashFunction for Sha1Hash {
    fn calculate(&self, data: &[u8]) -> Vec<u8> {
        use sha1::{Digest, Sha1};
        let mut hasher = Sha1::new();
        hasher.update(data);
        hasher.finalize().to_vec()
    }

    fn bit_size(&self) -> usize {
        160
    }

    fn name(&self) -> &'static str {
        "sha1"
    }
}

impl HashFunction for Sha256Hash {
    fn calculate(&self, data: &[u8]) -> Vec<u8> {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(data);
        hasher.finalize().to_vec()
    }

    fn bit_size(&self) -> usize {
        256
    }

    fn name(&self) -> &'static str {
        "sha256"
    }
}

/// Serialise a digest on the declared width: right aligned, flipped for
/// little endian leafs.
fn serialise(digest: &[u8], width: usize, endianness: Endianness) -> Vec<u8> {
    let mut aligned = bits::right_align(digest, width);
    if endianness == Endianness::Little {
        aligned.reverse();
    }
    aligned
}

impl Checksum {
    /// Create a relation leaf digesting the bytes of `target` with `hash`.
    /// The digest is serialised big endian by default.
    pub fn new(label: &str, target: &Rc<dyn IVariable>, hash: Rc<dyn HashFunction>) -> Self {
        assert!(
            hash.bit_size() % 8 == 0,
            "The digest width of '{}' does not align on a byte boundary.",
            hash.name()
        );
        Self {
            helper: VarHelper::new(label),
            target: Rc::clone(target),
            hash,
            endianness: Endianness::Big,
        }
    }

    pub fn little_endian(mut self) -> Self {
        self.endianness = Endianness::Little;
        self
    }

    /// Set a log label to debug the leaf based on the level of [Log](crate::Log).
    pub fn set_log(&self, debugger: crate::Log<&'static str>) -> Result<(), String> {
        self.helper.assign_debugger(debugger)
    }

    #[inline]
    fn width(&self) -> usize {
        self.hash.bit_size() / 8
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}; {}({})]",
            self.helper.label,
            self.hash.name(),
            self.target.label()
        )
    }
}

impl IVariable for Checksum {
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
        let width = self.width();
        if data.len() < width {
            self.helper.log_parse_failure(data.len());
            return Box::new(std::iter::empty());
        }

        let target = self.target.id();
        let hash = Rc::clone(&self.hash);
        let endianness = self.endianness;
        let mut branch = path;
        branch.add_result(self.id(), data[..width].to_vec());
        branch.defer_check(DeferredCheck {
            relation: self.id(),
            label: self.helper.label.clone(),
            expected: Rc::new(move |path: &ParsingPath| {
                let bytes = path
                    .consumed(target)
                    .or_else(|| path.memory().recall(target))?;
                Some(serialise(&hash.calculate(bytes), width, endianness))
            }),
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
        let width = self.width();
        match path.emitted(target) {
            Some(bytes) => {
                let value = serialise(&self.hash.calculate(&bytes), width, self.endianness);
                self.helper.log_specialized(value.len());
                path.push_value(self.id(), value);
            }
            None => {
                let hash = Rc::clone(&self.hash);
                let endianness = self.endianness;
                path.push_placeholder(
                    self.id(),
                    self.helper.label.clone(),
                    Rc::new(move |path: &SpecializingPath| {
                        let bytes = path.emitted(target).or_else(|| {
                            path.memory().recall(target).map(<[u8]>::to_vec)
                        })?;
                        Some(serialise(&hash.calculate(&bytes), width, endianness))
                    }),
                );
            }
        }
        Ok(path)
    }
}
