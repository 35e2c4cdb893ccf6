use log::warn;

/// Templates a single chunk may define. Seen counts in real files are far
/// lower; the cap defends against crafted inputs.
pub const MAX_TEMPLATES_PER_CHUNK: usize = 256;

/// A placeholder recorded while parsing a template body: the key it will be
/// emitted under, the value type declared in the body, and the index into
/// the instance's argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateArgPair {
    pub key: String,
    pub declared_type: u16,
    pub arg_index: u16,
}

/// A template definition reduced to its observable output: literal key/value
/// pairs seen while parsing the body, plus one entry per placeholder.
///
/// Both sequences preserve insertion order, and emission order equals
/// insertion order. Duplicate keys are permitted; later insertions do not
/// overwrite earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateDescription {
    pub short_id: u32,
    fixed_pairs: Vec<(String, String)>,
    arg_pairs: Vec<TemplateArgPair>,
}

impl TemplateDescription {
    pub fn fixed_pairs(&self) -> &[(String, String)] {
        &self.fixed_pairs
    }

    pub fn arg_pairs(&self) -> &[TemplateArgPair] {
        &self.arg_pairs
    }
}

/// A chunk-scoped cache of template definitions keyed by their short id.
///
/// Templates never survive a chunk; `reset` is invoked by the chunk driver
/// before any record of the next chunk is decoded.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: Vec<TemplateDescription>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        TemplateRegistry::default()
    }

    /// Linear scan; the cardinality is small enough that a map is not worth it.
    pub fn lookup(&self, short_id: u32) -> Option<usize> {
        self.templates.iter().position(|t| t.short_id == short_id)
    }

    /// Append a new empty description, returning its index, or `None` when
    /// the per-chunk cap is reached.
    pub fn insert(&mut self, short_id: u32) -> Option<usize> {
        if self.templates.len() >= MAX_TEMPLATES_PER_CHUNK {
            warn!(
                "template table is full, skipping template {:08x}",
                short_id
            );
            return None;
        }

        self.templates.push(TemplateDescription {
            short_id,
            ..Default::default()
        });
        Some(self.templates.len() - 1)
    }

    pub fn get(&self, idx: usize) -> &TemplateDescription {
        &self.templates[idx]
    }

    pub fn register_fixed_pair(&mut self, idx: usize, key: &str, value: &str) {
        self.templates[idx]
            .fixed_pairs
            .push((key.to_owned(), value.to_owned()));
    }

    pub fn register_arg_pair(&mut self, idx: usize, key: &str, declared_type: u16, arg_index: u16) {
        self.templates[idx].arg_pairs.push(TemplateArgPair {
            key: key.to_owned(),
            declared_type,
            arg_index,
        });
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Drop all cached templates; invoked between chunks.
    pub fn reset(&mut self) {
        self.templates.clear();
    }
}
