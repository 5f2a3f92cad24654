//! Key-assignment table and key-definition parser
//!
//! A key-definition file is user-edited text:
//!
//! ```text
//! # Musical annotations
//! s start (between pieces, before the beginning)
//! i inspired (0-9 = intensity)
//! g glitch
//! ```
//!
//! Each line is a single key, a label and optional help text, usually in
//! parentheses. Empty lines and lines starting with `#` are skipped.

use crate::meanings::history::MeaningHistory;
use crate::types::{AnnotateError, Result};

/// Delete, as sent by most terminals for the backspace key
pub const DELETE_CHAR: char = '\x7f';

/// True for characters that drive the annotation process itself
///
/// These can never be assigned a meaning: space (stop), digits (values),
/// delete, `-` (clear value) and `<`/`>` (first/last annotation).
pub fn is_reserved_key(key: char) -> bool {
    key == ' ' || key.is_ascii_digit() || matches!(key, '<' | '>' | '-' | DELETE_CHAR | '\x08')
}

/// One parsed line of a key-definition file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDefinition {
    pub key: char,
    pub label: String,
    pub help: String,
}

/// Current mapping from keystroke to meaning-history index
///
/// Assignments keep the order of the definition file so that listings look
/// like what the user wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyAssignments {
    entries: Vec<(char, usize)>,
}

impl KeyAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(key, meaning_index)` pairs
    ///
    /// Fails on reserved or duplicate keys.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (char, usize)>) -> Result<Self> {
        let mut table = Self::new();
        for (key, index) in pairs {
            table.assign(key, index).map_err(AnnotateError::FileParseError)?;
        }
        Ok(table)
    }

    fn assign(&mut self, key: char, index: usize) -> std::result::Result<(), String> {
        if is_reserved_key(key) || key.is_whitespace() {
            return Err(format!("reserved key {:?} cannot be assigned", key));
        }
        if self.get(key).is_some() {
            return Err(format!("key {:?} defined more than once", key));
        }
        self.entries.push((key, index));
        Ok(())
    }

    /// Meaning index currently assigned to a key
    pub fn get(&self, key: char) -> Option<usize> {
        self.entries
            .iter()
            .find(|(assigned, _)| *assigned == key)
            .map(|(_, index)| *index)
    }

    /// Meaning index for a key, or `UnknownKey`
    pub fn resolve(&self, key: char) -> Result<usize> {
        self.get(key).ok_or(AnnotateError::UnknownKey(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, usize)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse key-definition text
///
/// Fails with a `KeyDefinitionError` (carrying the 1-based line number) on a
/// reserved key, a key defined twice, or a malformed line.
pub fn parse_key_definitions(text: &str) -> Result<Vec<KeyDefinition>> {
    let mut definitions: Vec<KeyDefinition> = Vec::new();

    for (line_idx, raw_line) in text.lines().enumerate() {
        let line_num = line_idx + 1;
        let line = raw_line.trim_end();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut chars = line.chars();
        let key = match chars.next() {
            Some(key) => key,
            None => continue,
        };

        if is_reserved_key(key) || key.is_whitespace() {
            return Err(AnnotateError::key_definition(
                line_num,
                format!("reserved key {:?}", key),
            ));
        }

        let rest = chars.as_str();
        if !rest.starts_with(char::is_whitespace) {
            return Err(AnnotateError::key_definition(
                line_num,
                format!("expected a single key followed by a label: {:?}", line),
            ));
        }

        let rest = rest.trim_start();
        let (label, help) = match rest.split_once(char::is_whitespace) {
            Some((label, help)) => (label, help.trim()),
            None => (rest, ""),
        };
        if label.is_empty() {
            return Err(AnnotateError::key_definition(
                line_num,
                format!("missing label for key {:?}", key),
            ));
        }

        let help = if let Some(inner) = help.strip_prefix('(') {
            match inner.strip_suffix(')') {
                Some(inner) => inner.trim(),
                None => {
                    return Err(AnnotateError::key_definition(
                        line_num,
                        format!("unterminated help text for key {:?}", key),
                    ))
                }
            }
        } else {
            help
        };

        if definitions.iter().any(|def| def.key == key) {
            return Err(AnnotateError::key_definition(
                line_num,
                format!("key {:?} defined more than once", key),
            ));
        }

        definitions.push(KeyDefinition {
            key,
            label: label.to_string(),
            help: help.to_string(),
        });
    }

    Ok(definitions)
}

/// Split a legacy free-text meaning into a label and help text
///
/// `"start (between pieces)"` becomes `("start", "between pieces")`.
pub fn split_meaning_text(text: &str) -> (String, String) {
    let text = text.trim();
    let (label, help) = match text.split_once(char::is_whitespace) {
        Some((label, help)) => (label, help.trim()),
        None => (text, ""),
    };
    let help = help
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .map(str::trim)
        .unwrap_or(help);
    (label.to_string(), help.to_string())
}

/// Merge parsed definitions into the history and build the new table
///
/// A definition whose label already exists in the history reuses that
/// entry; any other label is appended. Existing entries are never removed
/// or renumbered.
pub fn merge_definitions(
    history: &mut MeaningHistory,
    definitions: &[KeyDefinition],
) -> KeyAssignments {
    let mut table = KeyAssignments::new();

    for def in definitions {
        let index = match history.find_label(&def.label) {
            Some(index) => {
                if history.extend_help(index, &def.help) {
                    log::info!("Extended help of meaning #{} ({})", index, def.label);
                } else if history.get(index).map(|m| m.help.as_str()) != Some(def.help.as_str())
                    && !def.help.is_empty()
                {
                    log::warn!(
                        "Help text for {:?} differs from meaning #{}; keeping the stored text",
                        def.label,
                        index
                    );
                }
                index
            }
            None => {
                let index = history.append_meaning(def.key, def.label.clone(), def.help.clone());
                log::debug!("New meaning #{}: {} {}", index, def.key, def.label);
                index
            }
        };

        // Keys were checked for duplicates and reservations while parsing
        table.entries.push((def.key, index));
    }

    table
}

/// Parse key-definition text and merge it into the history
///
/// On error the history is left untouched.
pub fn load_assignments(history: &mut MeaningHistory, text: &str) -> Result<KeyAssignments> {
    let definitions = parse_key_definitions(text)?;
    Ok(merge_definitions(history, &definitions))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: &str = "\
# Musical annotations

s start (between pieces, before the beginning)
i inspired (0-9 = intensity)
g glitch
";

    #[test]
    fn test_parse_definitions() {
        let defs = parse_key_definitions(KEYS).unwrap();
        assert_eq!(defs.len(), 3);
        assert_eq!(defs[0].key, 's');
        assert_eq!(defs[0].label, "start");
        assert_eq!(defs[0].help, "between pieces, before the beginning");
        assert_eq!(defs[2].label, "glitch");
        assert_eq!(defs[2].help, "");
    }

    #[test]
    fn test_reserved_keys_rejected() {
        for line in ["- minus", "3 three", "< first", "> last", " space"] {
            let err = parse_key_definitions(line).unwrap_err();
            assert!(err.is_parse_error(), "{:?} should be rejected", line);
        }
    }

    #[test]
    fn test_duplicate_key_reports_line() {
        let err = parse_key_definitions("a alpha\nb beta\na again").unwrap_err();
        match err {
            AnnotateError::KeyDefinitionError { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_lines() {
        assert!(parse_key_definitions("ab label").is_err());
        assert!(parse_key_definitions("a").is_err());
        assert!(parse_key_definitions("a label (unterminated").is_err());
    }

    #[test]
    fn test_failed_load_leaves_history_unchanged() {
        let mut history = MeaningHistory::new();
        history.append_meaning('x', "existing", "");
        let before = history.clone();

        let result = load_assignments(&mut history, "n new\n- minus\n");
        assert!(result.unwrap_err().is_parse_error());
        assert_eq!(history, before);
    }

    #[test]
    fn test_reload_reuses_labels() {
        let mut history = MeaningHistory::new();
        let first = load_assignments(&mut history, "i inspired\ng glitch (technical)").unwrap();
        assert_eq!(first.get('i'), Some(0));
        assert_eq!(first.get('g'), Some(1));

        // Same labels on new keys, one new label, one extended help text
        let second = load_assignments(
            &mut history,
            "j inspired\ng glitch (technical, 1-2 = size)\nc cut",
        )
        .unwrap();
        assert_eq!(second.get('j'), Some(0));
        assert_eq!(second.get('g'), Some(1));
        assert_eq!(second.get('c'), Some(2));
        assert_eq!(second.get('i'), None);

        assert_eq!(history.len(), 3);
        assert_eq!(history.get(1).unwrap().help, "technical, 1-2 = size");
        assert_eq!(history.get(0).unwrap().key, 'i');
    }

    #[test]
    fn test_resolve_unknown_key() {
        let table = KeyAssignments::from_pairs(vec![('i', 0)]).unwrap();
        assert_eq!(table.resolve('i').unwrap(), 0);
        assert!(matches!(table.resolve('z'), Err(AnnotateError::UnknownKey('z'))));
    }

    #[test]
    fn test_from_pairs_rejects_reserved() {
        assert!(KeyAssignments::from_pairs(vec![('5', 0)]).is_err());
        assert!(KeyAssignments::from_pairs(vec![('a', 0), ('a', 1)]).is_err());
    }

    #[test]
    fn test_split_meaning_text() {
        assert_eq!(
            split_meaning_text("start (between pieces)"),
            ("start".to_string(), "between pieces".to_string())
        );
        assert_eq!(
            split_meaning_text("uninspired"),
            ("uninspired".to_string(), String::new())
        );
        assert_eq!(
            split_meaning_text("end could be an end"),
            ("end".to_string(), "could be an end".to_string())
        );
    }
}
