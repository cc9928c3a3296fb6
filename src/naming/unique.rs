use std::collections::HashSet;

/// Return `candidate` if unused, else the first free `candidate-2`, `candidate-3`, ...
pub fn make_unique(candidate: &str, used: &HashSet<String>) -> String {
    if !used.contains(candidate) {
        return candidate.to_string();
    }
    (2..)
        .map(|n| format!("{}-{}", candidate, n))
        .find(|name| !used.contains(name))
        .unwrap_or_else(|| candidate.to_string())
}

/// Identifiers taken within one file during one processing run.
#[derive(Debug, Clone, Default)]
pub struct UsedNames {
    names: HashSet<String>,
}

impl UsedNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with identifiers that already exist in the file.
    pub fn seeded<'a>(existing: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            names: existing.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Make `candidate` unique and reserve it.
    pub fn claim(&mut self, candidate: &str) -> String {
        let name = make_unique(candidate, &self.names);
        self.names.insert(name.clone());
        name
    }

    /// Reserve a name as-is. Returns false if it was already taken.
    pub fn insert(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
