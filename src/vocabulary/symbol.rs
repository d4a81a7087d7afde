use crate::util::TreeView;
use crate::vocabulary::nodes::agg::parse_sequence;
use crate::vocabulary::{Data, Field, Preset, ResolvedPreset, Symbol, SymbolKind};
use crate::{
    ConfigurationError, GenerationError, IVariable, Memory, ParsingPath, SpecializingPath,
    Structure, SymbolId, VariableId,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::rc::Rc;

impl Structure {
    pub(crate) fn push(&mut self, name: String, value: Vec<u8>) {
        self.entries.push((name, value));
    }

    /// The bytes attributed to the named field.
    pub fn get(&self, field: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_slice())
    }

    pub fn entries(&self) -> &[(String, Vec<u8>)] {
        &self.entries
    }

    /// Concatenation of the per-field slices, in field order.
    pub fn message(&self) -> Vec<u8> {
        let mut message = Vec::new();
        for (_, value) in &self.entries {
            message.extend_from_slice(value);
        }
        message
    }
}

impl Display for Structure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, (name, value)) in self.entries.iter().enumerate() {
            if index != 0 {
                write!(f, " ")?;
            }
            write!(f, "{}=", name)?;
            for byte in value {
                write!(f, "{:02x}", byte)?;
            }
        }
        Ok(())
    }
}

impl Field {
    /// Create a field holding `domain` under the given name.
    pub fn new(name: &str, domain: Rc<dyn IVariable>) -> Self {
        Self {
            name: name.into(),
            domain,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn domain(&self) -> &Rc<dyn IVariable> {
        &self.domain
    }
}

impl From<&str> for Field {
    /// A constant field named after its value.
    fn from(value: &str) -> Self {
        Field {
            name: value.to_string(),
            domain: Rc::new(Data::constant(value, value)),
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn collect_variables(variable: &Rc<dyn IVariable>, out: &mut Vec<Rc<dyn IVariable>>) {
    out.push(Rc::clone(variable));
    for child in variable.children() {
        collect_variables(&child, out);
    }
}

impl Symbol {
    /// Create a message template from its ordered fields.
    pub fn new(name: &str, fields: Vec<Field>) -> Self {
        Self {
            id: SymbolId::fresh(),
            name: name.into(),
            kind: SymbolKind::Message,
            fields,
        }
    }

    /// The zero byte symbol: parses an empty buffer, emits nothing.
    pub fn empty() -> Self {
        Self {
            id: SymbolId::fresh(),
            name: "Empty".into(),
            kind: SymbolKind::Empty,
            fields: Vec::new(),
        }
    }

    /// The fallback symbol abstracting bytes no catalogue entry parses.
    pub fn unknown() -> Self {
        Self {
            id: SymbolId::fresh(),
            name: "Unknown".into(),
            kind: SymbolKind::Unknown,
            fields: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> SymbolId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    #[inline]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Validate the field domains and the relation dependencies. Relation
    /// cycles are rejected here, at registration, rather than during
    /// specialization.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.kind.is_message() {
            return Ok(());
        }
        let mut visited = HashSet::new();
        for field in &self.fields {
            field.domain.validate(&mut visited)?;
        }
        self.validate_relations()
    }

    fn validate_relations(&self) -> Result<(), ConfigurationError> {
        let mut all: Vec<Rc<dyn IVariable>> = Vec::new();
        for field in &self.fields {
            collect_variables(&field.domain, &mut all);
        }
        let relation_labels: HashMap<VariableId, String> = all
            .iter()
            .filter(|variable| !variable.dependencies().is_empty())
            .map(|variable| (variable.id(), variable.label().to_string()))
            .collect();
        if relation_labels.is_empty() {
            return Ok(());
        }

        // One edge per relation reachable through a target subtree.
        let mut edges: HashMap<VariableId, Vec<VariableId>> = HashMap::new();
        for variable in &all {
            let dependencies = variable.dependencies();
            if dependencies.is_empty() {
                continue;
            }
            let mut reachable = Vec::new();
            for dependency in dependencies {
                if let Some(target) = all.iter().find(|candidate| candidate.id() == dependency) {
                    let mut subtree = Vec::new();
                    collect_variables(target, &mut subtree);
                    for node in subtree {
                        if relation_labels.contains_key(&node.id()) {
                            reachable.push(node.id());
                        }
                    }
                }
                // A target outside this symbol resolves through the memory
                // and does not constrain the emission order.
            }
            edges.insert(variable.id(), reachable);
        }

        let mut settled: HashSet<VariableId> = HashSet::new();
        for start in edges.keys() {
            let mut trail: Vec<VariableId> = Vec::new();
            let mut stack = vec![(*start, 0usize)];
            while let Some((node, progress)) = stack.pop() {
                if progress == 0 {
                    if settled.contains(&node) {
                        continue;
                    }
                    if trail.contains(&node) {
                        return Err(ConfigurationError::new(
                            "CircularRelation".into(),
                            format!(
                                "The relation '{}' depends on itself.",
                                relation_labels[&node]
                            ),
                        ));
                    }
                    trail.push(node);
                }
                let successors = edges.get(&node).map(Vec::as_slice).unwrap_or(&[]);
                if progress < successors.len() {
                    stack.push((node, progress + 1));
                    stack.push((successors[progress], 0));
                } else {
                    trail.pop();
                    settled.insert(node);
                }
            }
        }
        Ok(())
    }

    /// Parse `data` against the template. The whole buffer must be consumed
    /// and every relation check must hold; the first branch in emission
    /// order wins. On success the leaf values are persisted to `memory`.
    pub fn parse(&self, data: &[u8], memory: &mut Memory) -> Option<Structure> {
        match self.kind {
            SymbolKind::Empty => data.is_empty().then(Structure::default),
            SymbolKind::Unknown => {
                let mut structure = Structure::default();
                structure.push("data".into(), data.to_vec());
                Some(structure)
            }
            SymbolKind::Message => {
                let domains: Vec<Rc<dyn IVariable>> = self
                    .fields
                    .iter()
                    .map(|field| Rc::clone(&field.domain))
                    .collect();
                let path = ParsingPath::new(memory.clone());
                for (branch, used) in parse_sequence(&domains, 0, data.to_vec(), 0, path) {
                    if used != data.len() || !branch.run_deferred_checks() {
                        continue;
                    }
                    let mut structure = Structure::default();
                    for field in &self.fields {
                        structure.push(
                            field.name.clone(),
                            branch
                                .consumed(field.domain.id())
                                .map_or_else(Vec::new, <[u8]>::to_vec),
                        );
                    }
                    for (variable, value) in branch.results() {
                        memory.persist(*variable, value.clone());
                    }
                    return Some(structure);
                }
                None
            }
        }
    }

    /// Specialize the template to a concrete message, honoring `preset`
    /// pins and every relation. On success the leaf values are persisted
    /// to `memory`.
    pub fn specialize(
        &self,
        memory: &mut Memory,
        preset: Option<&Preset>,
    ) -> Result<(Vec<u8>, Structure), GenerationError> {
        self.specialize_with(memory, preset, StdRng::from_entropy())
    }

    /// Specialize with a seeded random generator, for reproducible runs.
    pub fn specialize_seeded(
        &self,
        memory: &mut Memory,
        preset: Option<&Preset>,
        seed: u64,
    ) -> Result<(Vec<u8>, Structure), GenerationError> {
        self.specialize_with(memory, preset, StdRng::seed_from_u64(seed))
    }

    fn specialize_with(
        &self,
        memory: &mut Memory,
        preset: Option<&Preset>,
        rng: StdRng,
    ) -> Result<(Vec<u8>, Structure), GenerationError> {
        match self.kind {
            SymbolKind::Empty => Ok((Vec::new(), Structure::default())),
            SymbolKind::Unknown => Err(GenerationError::Unsupported(
                "the unknown symbol cannot be specialized".into(),
            )),
            SymbolKind::Message => {
                let resolved = match preset {
                    Some(preset) => preset.resolve(self)?,
                    None => ResolvedPreset::empty(),
                };
                let mut path = SpecializingPath::new(memory.clone(), Rc::new(resolved), rng);
                for field in &self.fields {
                    path = field.domain.specialize(path)?;
                }
                path.resolve_deferred()?;

                let message = path.assembled();
                let mut structure = Structure::default();
                for field in &self.fields {
                    let value = path.emitted(field.domain.id()).ok_or_else(|| {
                        GenerationError::UnresolvedDependency(field.name.clone())
                    })?;
                    structure.push(field.name.clone(), value);
                }
                for (variable, value) in path.results() {
                    memory.persist(*variable, value.clone());
                }
                Ok((message, structure))
            }
        }
    }

    /// A printable tree of the fields and their domains.
    pub fn describe(&self) -> TreeView {
        TreeView::new(
            self.name.clone(),
            self.fields
                .iter()
                .map(|field| TreeView::new(field.name.clone(), vec![field.domain.describe()]))
                .collect(),
        )
    }

    /// Print the template tree on the standard output.
    pub fn print(&self) -> std::io::Result<()> {
        self.describe().print()
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
