//! Append-only meaning history
//!
//! Annotations refer to what their key meant through an index into this
//! history. Entries are never removed or renumbered, so an index written to
//! disk years ago still resolves to the same meaning.

/// What a key meant when it was defined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meaning {
    /// Key the meaning was first defined for
    pub key: char,
    /// Short identifier shown next to annotations
    pub label: String,
    /// Free help text (may be empty)
    pub help: String,
}

impl Meaning {
    pub fn new(key: char, label: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            key,
            label: label.into(),
            help: help.into(),
        }
    }
}

/// Indexed log of meanings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeaningHistory {
    entries: Vec<Meaning>,
}

impl MeaningHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a meaning and return its (permanent) index
    pub fn append_meaning(
        &mut self,
        key: char,
        label: impl Into<String>,
        help: impl Into<String>,
    ) -> usize {
        self.entries.push(Meaning::new(key, label, help));
        self.entries.len() - 1
    }

    /// Meaning stored at the given index
    pub fn get(&self, index: usize) -> Option<&Meaning> {
        self.entries.get(index)
    }

    /// Index of the first meaning with the given label
    pub fn find_label(&self, label: &str) -> Option<usize> {
        self.entries.iter().position(|meaning| meaning.label == label)
    }

    /// Replace the help text of an entry, only if the new text extends it
    ///
    /// Returns true if the help text changed. Help text that rewrites rather
    /// than extends the stored text is refused, since that would reinterpret
    /// the index.
    pub fn extend_help(&mut self, index: usize, help: &str) -> bool {
        match self.entries.get_mut(index) {
            Some(meaning) if help.len() > meaning.help.len() && help.starts_with(&meaning.help) => {
                meaning.help = help.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All meanings in index order
    pub fn iter(&self) -> impl Iterator<Item = &Meaning> {
        self.entries.iter()
    }

    /// `(index, meaning)` pairs grouped by key, keys sorted case-insensitively
    ///
    /// Within a key, meanings keep their history order.
    pub fn by_key(&self) -> Vec<(char, Vec<(usize, &Meaning)>)> {
        let mut keys: Vec<char> = self.entries.iter().map(|m| m.key).collect();
        keys.sort_by_key(|key| (key.to_lowercase().collect::<String>(), *key));
        keys.dedup();

        keys.into_iter()
            .map(|key| {
                let meanings = self
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(_, meaning)| meaning.key == key)
                    .collect();
                (key, meanings)
            })
            .collect()
    }
}

impl FromIterator<Meaning> for MeaningHistory {
    fn from_iter<I: IntoIterator<Item = Meaning>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
