use std::collections::HashMap;

/// Variable store: name -> value, last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memory {
    vars: HashMap<String, i64>,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    /// `None` for a name that was never stored.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.vars.get(name).copied()
    }

    pub fn set(&mut self, name: impl Into<String>, value: i64) {
        self.vars.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Entries sorted by name.
    pub fn sorted(&self) -> Vec<(&str, i64)> {
        let mut entries: Vec<_> = self.vars.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        entries.sort_by_key(|(name, _)| *name);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_undefined() {
        assert_eq!(Memory::new().get("x"), None);
    }

    #[test]
    fn test_last_write_wins() {
        let mut mem = Memory::new();
        mem.set("x", 1);
        mem.set("x", 2);

        assert_eq!(mem.get("x"), Some(2));
        assert_eq!(mem.len(), 1);
    }

    #[test]
    fn test_sorted() {
        let mut mem = Memory::new();
        mem.set("b", 2);
        mem.set("a", 1);

        assert_eq!(mem.sorted(), vec![("a", 1), ("b", 2)]);
    }
}
