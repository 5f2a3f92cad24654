//! Named bookmarks for resuming work
//!
//! A bookmark points at an event (by name) and a time in it. It does not
//! point at an annotation, so it survives any edit of the annotation list.

use crate::time::TimeValue;
use crate::types::{AnnotateError, Result};
use std::collections::BTreeMap;

/// Where a bookmark points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub event: String,
    pub timestamp: TimeValue,
}

/// Bookmarks by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkTable {
    bookmarks: BTreeMap<String, Bookmark>,
}

impl BookmarkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a bookmark
    pub fn set(&mut self, name: impl Into<String>, event: impl Into<String>, timestamp: TimeValue) {
        let name = name.into();
        let bookmark = Bookmark {
            event: event.into(),
            timestamp,
        };
        log::debug!("Bookmark {}: {} at {}", name, bookmark.event, bookmark.timestamp);
        self.bookmarks.insert(name, bookmark);
    }

    /// Event and time of a bookmark
    pub fn load(&self, name: &str) -> Result<(&str, TimeValue)> {
        self.bookmarks
            .get(name)
            .map(|bookmark| (bookmark.event.as_str(), bookmark.timestamp))
            .ok_or_else(|| AnnotateError::BookmarkNotFound(name.to_string()))
    }

    /// Remove a bookmark; absent names are ignored
    pub fn delete(&mut self, name: &str) -> Option<Bookmark> {
        self.bookmarks.remove(name)
    }

    /// Point every bookmark on `from` to `to`
    pub(crate) fn rename_event(&mut self, from: &str, to: &str) {
        for bookmark in self.bookmarks.values_mut() {
            if bookmark.event == from {
                bookmark.event = to.to_string();
            }
        }
    }

    /// Bookmarks sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bookmark)> {
        self.bookmarks.iter().map(|(name, bookmark)| (name.as_str(), bookmark))
    }

    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_load() {
        let mut table = BookmarkTable::new();
        table.set("WIP", "take1", TimeValue::from_hms(0, 2, 10.0));

        let (event, time) = table.load("WIP").unwrap();
        assert_eq!(event, "take1");
        assert_eq!(time, TimeValue::from_hms(0, 2, 10.0));

        let err = table.load("missing").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_set_overwrites() {
        let mut table = BookmarkTable::new();
        table.set("WIP", "take1", TimeValue::ZERO);
        table.set("WIP", "take2", TimeValue::from_seconds(5.0));
        assert_eq!(table.len(), 1);
        assert_eq!(table.load("WIP").unwrap().0, "take2");
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let mut table = BookmarkTable::new();
        assert!(table.delete("nothing").is_none());
        table.set("a", "take1", TimeValue::ZERO);
        assert!(table.delete("a").is_some());
        assert!(table.is_empty());
    }
}
