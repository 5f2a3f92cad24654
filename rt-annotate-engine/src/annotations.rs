//! Timestamped annotations and the per-event annotation list
//!
//! The list is kept sorted by timestamp. Annotations with the same timestamp
//! stay in insertion order, so every walk through the list is reproducible.
//!
//! Two independent positions are tracked:
//! - the **cursor**, an index in `[0, len]` marking the next annotation not
//!   yet reviewed (persisted with the list);
//! - the **additions of the current run**, so that values and deletions
//!   target what was just typed, wherever it landed in time order.

use crate::meanings::KeyAssignments;
use crate::time::TimeValue;
use crate::types::{AnnotateError, Result};

/// Largest value that can be attached to an annotation
pub const MAX_VALUE: u8 = 9;

/// One timestamped, keyed record
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Time of the annotation in the event
    pub timestamp: TimeValue,
    /// Key that was typed
    pub key: char,
    /// Index of the key's meaning in the meaning history
    pub meaning_index: usize,
    /// Optional value (0-9), e.g. an intensity
    pub value: Option<u8>,
}

impl Annotation {
    pub fn new(timestamp: TimeValue, key: char, meaning_index: usize) -> Self {
        Self {
            timestamp,
            key,
            meaning_index,
            value: None,
        }
    }

    pub fn with_value(mut self, value: u8) -> Self {
        self.value = Some(value);
        self
    }
}

/// Cursor movement used when reviewing annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    First,
    Previous,
    Next,
    Last,
}

/// Annotations of one event, sorted by timestamp, with a cursor
#[derive(Debug, Clone, Default)]
pub struct AnnotationList {
    entries: Vec<Annotation>,
    cursor: usize,
    /// Positions of annotations added during the current run, oldest first
    added: Vec<usize>,
}

impl PartialEq for AnnotationList {
    // Additions of the current run are session state, not content
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries && self.cursor == other.cursor
    }
}

impl AnnotationList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from stored entries and cursor
    ///
    /// Entries are stably sorted by timestamp and the cursor is clamped to
    /// `[0, len]`.
    pub fn from_parts(mut entries: Vec<Annotation>, cursor: usize) -> Self {
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        let cursor = cursor.min(entries.len());
        Self {
            entries,
            cursor,
            added: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Annotation> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Annotation> + ExactSizeIterator {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.entries
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor, clamped to `[0, len]`
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.entries.len());
    }

    /// Put the cursor after every annotation at or before `time`
    pub fn cursor_at_time(&mut self, time: TimeValue) {
        self.cursor = self.insert_position(time);
    }

    /// First annotation at or after the cursor
    pub fn next_annotation(&self) -> Option<&Annotation> {
        self.entries.get(self.cursor)
    }

    /// Annotation just before the cursor
    pub fn prev_annotation(&self) -> Option<&Annotation> {
        self.cursor.checked_sub(1).and_then(|index| self.entries.get(index))
    }

    /// Index where an annotation at `time` goes: after any equal timestamps
    fn insert_position(&self, time: TimeValue) -> usize {
        self.entries.partition_point(|annotation| annotation.timestamp <= time)
    }

    /// Forget the additions of the previous run
    pub fn begin_run(&mut self) {
        self.added.clear();
    }

    /// Add an annotation for `key` at `timestamp`
    ///
    /// The key is resolved through the current assignments. The annotation
    /// is inserted in timestamp order (after any annotation with the same
    /// timestamp) and the cursor moves just past it.
    pub fn add(
        &mut self,
        timestamp: TimeValue,
        key: char,
        assignments: &KeyAssignments,
    ) -> Result<&Annotation> {
        let meaning_index = assignments.resolve(key)?;
        let position = self.insert_position(timestamp);

        self.entries
            .insert(position, Annotation::new(timestamp, key, meaning_index));
        for added in self.added.iter_mut() {
            if *added >= position {
                *added += 1;
            }
        }
        self.added.push(position);
        self.cursor = position + 1;

        Ok(&self.entries[position])
    }

    /// Annotation added last during the current run (if it still exists)
    pub fn last_added(&self) -> Option<&Annotation> {
        self.added.last().and_then(|index| self.entries.get(*index))
    }

    /// Position of the annotation added last during the current run
    pub fn last_added_index(&self) -> Option<usize> {
        self.added.last().copied()
    }

    /// Set the value of the last-added annotation
    ///
    /// Returns false (and changes nothing) if nothing was added in this run
    /// or the digit is out of range.
    pub fn set_value(&mut self, digit: u8) -> bool {
        if digit > MAX_VALUE {
            return false;
        }
        match self.added.last().and_then(|index| self.entries.get_mut(*index)) {
            Some(annotation) => {
                annotation.value = Some(digit);
                true
            }
            None => false,
        }
    }

    /// Remove the value of the last-added annotation
    ///
    /// Returns true if a value was removed.
    pub fn clear_value(&mut self) -> bool {
        self.added
            .last()
            .and_then(|index| self.entries.get_mut(*index))
            .and_then(|annotation| annotation.value.take())
            .is_some()
    }

    /// Remove the last-added annotation
    ///
    /// Repeated calls remove earlier additions of the same run, newest
    /// first. The cursor keeps pointing at the same following annotation.
    pub fn delete_last(&mut self) -> Option<Annotation> {
        let position = self.added.pop()?;
        if position >= self.entries.len() {
            return None;
        }

        let removed = self.entries.remove(position);
        for added in self.added.iter_mut() {
            if *added > position {
                *added -= 1;
            }
        }
        if self.cursor > position {
            self.cursor -= 1;
        }
        self.cursor = self.cursor.min(self.entries.len());

        Some(removed)
    }

    /// Move the cursor for review and return the annotation it lands on
    ///
    /// The annotation landed on is the one just before the cursor. Returns
    /// `None`, leaving the cursor untouched, when there is nowhere to go.
    pub fn navigate(&mut self, direction: Direction) -> Option<&Annotation> {
        let len = self.entries.len();
        let cursor = match direction {
            Direction::First if len > 0 => 1,
            Direction::Last if len > 0 => len,
            Direction::Previous if self.cursor >= 2 => self.cursor - 1,
            Direction::Next if self.cursor < len => self.cursor + 1,
            _ => return None,
        };
        self.cursor = cursor;
        self.entries.get(cursor - 1)
    }

    /// Advance the cursor over annotations in `(after, until]`
    ///
    /// Used as time passes: only annotations whose timestamps were crossed
    /// move the cursor, so a cursor placed by navigation is left alone.
    /// Returns the number of annotations passed.
    pub fn advance_over(&mut self, after: TimeValue, until: TimeValue) -> usize {
        let start = self.cursor;
        while let Some(annotation) = self.entries.get(self.cursor) {
            if annotation.timestamp > after && annotation.timestamp <= until {
                self.cursor += 1;
            } else {
                break;
            }
        }
        self.cursor - start
    }

    /// Scale timestamps around `origin`: `t -> origin + (t - origin) * factor`
    ///
    /// Order and cursor are preserved since the factor must be positive.
    pub fn rescale(&mut self, origin: TimeValue, factor: f64) -> Result<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(AnnotateError::InvalidInput(format!(
                "scale factor must be a positive number, got {}",
                factor
            )));
        }
        for annotation in self.entries.iter_mut() {
            let offset = annotation.timestamp - origin;
            annotation.timestamp = origin + offset * factor;
        }
        Ok(())
    }

    /// Seconds between the first and last annotation
    pub fn time_span(&self) -> f64 {
        match (self.entries.first(), self.entries.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignments() -> KeyAssignments {
        KeyAssignments::from_pairs(vec![('i', 0), ('g', 1), ('c', 2)]).unwrap()
    }

    fn t(seconds: f64) -> TimeValue {
        TimeValue::from_seconds(seconds)
    }

    #[test]
    fn test_add_and_set_value() {
        let keys = assignments();
        let mut list = AnnotationList::new();

        list.add(TimeValue::from_hms(0, 0, 47.2), 'i', &keys).unwrap();
        assert!(list.set_value(2));

        let annotation = list.get(0).unwrap();
        assert_eq!(annotation.timestamp, TimeValue::from_hms(0, 0, 47.2));
        assert_eq!(annotation.key, 'i');
        assert_eq!(annotation.meaning_index, 0);
        assert_eq!(annotation.value, Some(2));
    }

    #[test]
    fn test_add_unknown_key() {
        let mut list = AnnotationList::new();
        let result = list.add(t(1.0), 'z', &assignments());
        assert!(matches!(result, Err(AnnotateError::UnknownKey('z'))));
        assert!(list.is_empty());
    }

    #[test]
    fn test_add_inserts_in_time_order() {
        let keys = assignments();
        let mut list = AnnotationList::new();
        list.add(t(10.0), 'i', &keys).unwrap();
        list.add(t(30.0), 'g', &keys).unwrap();
        list.add(t(20.0), 'c', &keys).unwrap();

        let keys_in_order: Vec<char> = list.iter().map(|a| a.key).collect();
        assert_eq!(keys_in_order, vec!['i', 'c', 'g']);
        assert_eq!(list.cursor(), 2);
        assert_eq!(list.last_added().unwrap().key, 'c');
    }

    #[test]
    fn test_identical_timestamps_keep_insertion_order() {
        let keys = assignments();
        let mut list = AnnotationList::new();
        let time = TimeValue::from_hms(0, 1, 24.0);
        list.add(time, 'g', &keys).unwrap();
        list.add(time, 'i', &keys).unwrap();

        assert_eq!(list.navigate(Direction::First).unwrap().key, 'g');
        assert_eq!(list.navigate(Direction::Next).unwrap().key, 'i');
        assert!(list.navigate(Direction::Next).is_none());
    }

    #[test]
    fn test_last_then_previous_visits_everything_once() {
        let keys = assignments();
        let mut list = AnnotationList::new();
        for (seconds, key) in [(5.0, 'i'), (1.0, 'g'), (5.0, 'c'), (3.0, 'i'), (1.0, 'c')] {
            list.add(t(seconds), key, &keys).unwrap();
        }

        let mut visited = vec![list.navigate(Direction::Last).unwrap().clone()];
        while let Some(annotation) = list.navigate(Direction::Previous) {
            visited.push(annotation.clone());
        }

        assert_eq!(visited.len(), list.len());
        let expected: Vec<Annotation> = list.iter().rev().cloned().collect();
        assert_eq!(visited, expected);
        let order: Vec<(f64, char)> = visited
            .iter()
            .map(|a| (a.timestamp.to_seconds(), a.key))
            .collect();
        assert_eq!(
            order,
            vec![(5.0, 'c'), (5.0, 'i'), (3.0, 'i'), (1.0, 'c'), (1.0, 'g')]
        );
    }

    #[test]
    fn test_navigate_empty_list() {
        let mut list = AnnotationList::new();
        for direction in [Direction::First, Direction::Previous, Direction::Next, Direction::Last] {
            assert!(list.navigate(direction).is_none());
        }
        assert_eq!(list.cursor(), 0);
    }

    #[test]
    fn test_clear_value_is_idempotent() {
        let keys = assignments();
        let mut list = AnnotationList::new();
        list.add(t(2.0), 'i', &keys).unwrap();
        list.set_value(7);

        assert!(list.clear_value());
        let after_first = list.clone();
        assert!(!list.clear_value());
        assert_eq!(list, after_first);
        assert_eq!(list.get(0).unwrap().value, None);
    }

    #[test]
    fn test_value_ops_without_addition_are_noops() {
        let keys = assignments();
        let mut list = AnnotationList::new();
        list.add(t(2.0), 'i', &keys).unwrap();
        list.begin_run();

        assert!(!list.set_value(3));
        assert!(!list.clear_value());
        assert!(list.delete_last().is_none());
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).unwrap().value, None);
    }

    #[test]
    fn test_set_value_rejects_large_digits() {
        let keys = assignments();
        let mut list = AnnotationList::new();
        list.add(t(2.0), 'i', &keys).unwrap();
        assert!(!list.set_value(10));
        assert_eq!(list.get(0).unwrap().value, None);
    }

    #[test]
    fn test_delete_last_undoes_additions_newest_first() {
        let keys = assignments();
        let mut list = AnnotationList::new();
        list.add(t(10.0), 'i', &keys).unwrap();
        list.add(t(30.0), 'g', &keys).unwrap();
        list.add(t(20.0), 'c', &keys).unwrap();

        assert_eq!(list.delete_last().unwrap().key, 'c');
        assert_eq!(list.cursor(), 1);
        assert_eq!(list.last_added().unwrap().key, 'g');

        assert_eq!(list.delete_last().unwrap().key, 'g');
        assert_eq!(list.delete_last().unwrap().key, 'i');
        assert!(list.delete_last().is_none());
        assert!(list.is_empty());
        assert_eq!(list.cursor(), 0);
    }

    #[test]
    fn test_delete_keeps_cursor_on_following_annotation() {
        let keys = assignments();
        let mut list = AnnotationList::new();
        list.add(t(10.0), 'i', &keys).unwrap();
        list.add(t(20.0), 'g', &keys).unwrap();
        list.add(t(30.0), 'c', &keys).unwrap();
        list.navigate(Direction::First);
        list.add(t(5.0), 'g', &keys).unwrap();
        list.navigate(Direction::Last);

        list.delete_last();
        assert_eq!(list.cursor(), 3);
        assert_eq!(list.prev_annotation().unwrap().key, 'c');
    }

    #[test]
    fn test_advance_over_crossed_annotations() {
        let keys = assignments();
        let mut list = AnnotationList::new();
        list.add(t(1.0), 'i', &keys).unwrap();
        list.add(t(2.0), 'g', &keys).unwrap();
        list.add(t(4.0), 'c', &keys).unwrap();
        list.set_cursor(0);

        assert_eq!(list.advance_over(t(0.5), t(2.0)), 2);
        assert_eq!(list.cursor(), 2);
        assert_eq!(list.advance_over(t(2.0), t(3.9)), 0);

        // Cursor placed back by navigation is not pulled forward again
        list.navigate(Direction::First);
        assert_eq!(list.advance_over(t(3.9), t(4.5)), 0);
        assert_eq!(list.cursor(), 1);
    }

    #[test]
    fn test_from_parts_sorts_and_clamps() {
        let entries = vec![
            Annotation::new(t(3.0), 'g', 1),
            Annotation::new(t(1.0), 'i', 0),
            Annotation::new(t(3.0), 'c', 2),
        ];
        let list = AnnotationList::from_parts(entries, 10);
        assert_eq!(list.cursor(), 3);
        let keys: Vec<char> = list.iter().map(|a| a.key).collect();
        assert_eq!(keys, vec!['i', 'g', 'c']);
    }

    #[test]
    fn test_rescale() {
        let keys = assignments();
        let mut list = AnnotationList::new();
        list.add(TimeValue::from_hms(1, 0, 10.0), 'i', &keys).unwrap();
        list.add(TimeValue::from_hms(1, 1, 0.0), 'g', &keys).unwrap();

        list.rescale(TimeValue::from_hms(1, 0, 0.0), 2.0).unwrap();
        assert_eq!(list.get(0).unwrap().timestamp, TimeValue::from_hms(1, 0, 20.0));
        assert_eq!(list.get(1).unwrap().timestamp, TimeValue::from_hms(1, 2, 0.0));
        assert!(list.rescale(TimeValue::ZERO, 0.0).is_err());
        assert!(list.rescale(TimeValue::ZERO, f64::NAN).is_err());
    }

    #[test]
    fn test_time_span() {
        let keys = assignments();
        let mut list = AnnotationList::new();
        assert_eq!(list.time_span(), 0.0);
        list.add(t(12.5), 'i', &keys).unwrap();
        list.add(t(72.5), 'g', &keys).unwrap();
        assert_eq!(list.time_span(), 60.0);
    }
}
