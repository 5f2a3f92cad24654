//! The in-memory store: meanings, key table, events and bookmarks
//!
//! The store is the unit that gets persisted. It is loaded once, owned by a
//! single process, and written back at save points.

use crate::annotations::{Annotation, AnnotationList};
use crate::bookmarks::BookmarkTable;
use crate::meanings::{load_assignments, KeyAssignments, Meaning, MeaningHistory};
use crate::time::TimeValue;
use crate::types::{AnnotateError, Result};
use regex::Regex;
use std::collections::BTreeMap;

/// A named subject of annotation (a recording, a take, a performance)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    /// Annotations, sorted by timestamp, with the review cursor
    pub annotations: AnnotationList,
    /// Free text note
    pub note: String,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where annotating should resume: the annotation before the cursor
    pub fn resume_time(&self) -> TimeValue {
        self.annotations
            .prev_annotation()
            .map(|annotation| annotation.timestamp)
            .unwrap_or(TimeValue::ZERO)
    }
}

/// Summary line for event listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSummary {
    pub name: String,
    pub num_annotations: usize,
    pub has_note: bool,
}

/// Root of everything that is persisted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    /// Every meaning any key ever had
    pub meaning_history: MeaningHistory,
    /// What each key means now
    pub key_assignments: KeyAssignments,
    /// Named resume points
    pub bookmarks: BookmarkTable,
    events: BTreeMap<String, Event>,
}

impl Store {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the key assignments with the given key-definition text
    ///
    /// The definitions are merged into the meaning history. On error
    /// nothing changes.
    pub fn load_keys(&mut self, definition_text: &str) -> Result<()> {
        let mut history = self.meaning_history.clone();
        let assignments = load_assignments(&mut history, definition_text)?;

        log::info!(
            "Loaded {} key assignments ({} meanings in history)",
            assignments.len(),
            history.len()
        );
        self.meaning_history = history;
        self.key_assignments = assignments;
        Ok(())
    }

    /// Event with the given name, created if it does not exist yet
    pub fn select_event(&mut self, name: &str) -> &mut Event {
        if !self.events.contains_key(name) {
            log::info!("Creating event {}", name);
        }
        self.events.entry(name.to_string()).or_default()
    }

    pub fn event(&self, name: &str) -> Option<&Event> {
        self.events.get(name)
    }

    pub fn event_mut(&mut self, name: &str) -> Option<&mut Event> {
        self.events.get_mut(name)
    }

    /// Insert (or replace) an event
    pub fn insert_event(&mut self, name: impl Into<String>, event: Event) {
        self.events.insert(name.into(), event);
    }

    /// Delete an event and its annotations
    pub fn delete_event(&mut self, name: &str) -> Result<Event> {
        self.events
            .remove(name)
            .ok_or_else(|| AnnotateError::EventNotFound(name.to_string()))
    }

    /// Rename an event; bookmarks follow it
    pub fn rename_event(&mut self, from: &str, to: &str) -> Result<()> {
        if self.events.contains_key(to) {
            return Err(AnnotateError::EventExists(to.to_string()));
        }
        let event = self
            .events
            .remove(from)
            .ok_or_else(|| AnnotateError::EventNotFound(from.to_string()))?;
        self.events.insert(to.to_string(), event);
        self.bookmarks.rename_event(from, to);
        Ok(())
    }

    /// Set the note of an existing event
    pub fn set_note(&mut self, name: &str, note: impl Into<String>) -> Result<()> {
        let event = self
            .events
            .get_mut(name)
            .ok_or_else(|| AnnotateError::EventNotFound(name.to_string()))?;
        event.note = note.into();
        Ok(())
    }

    /// Events sorted by name, optionally only those matching `filter`
    pub fn list_events(&self, filter: Option<&Regex>) -> Vec<EventSummary> {
        self.events
            .iter()
            .filter(|(name, _)| filter.map_or(true, |regex| regex.is_match(name)))
            .map(|(name, event)| EventSummary {
                name: name.clone(),
                num_annotations: event.annotations.len(),
                has_note: !event.note.is_empty(),
            })
            .collect()
    }

    /// All events sorted by name
    pub fn events(&self) -> impl Iterator<Item = (&str, &Event)> {
        self.events.iter().map(|(name, event)| (name.as_str(), event))
    }

    pub fn num_events(&self) -> usize {
        self.events.len()
    }

    /// Event and time of a bookmark whose event still exists
    pub fn load_bookmark(&self, name: &str) -> Result<(String, TimeValue)> {
        let (event, timestamp) = self.bookmarks.load(name)?;
        if !self.events.contains_key(event) {
            return Err(AnnotateError::EventNotFound(event.to_string()));
        }
        Ok((event.to_string(), timestamp))
    }

    /// Meaning of an annotation, through its history index
    pub fn meaning_of(&self, annotation: &Annotation) -> Option<&Meaning> {
        self.meaning_history.get(annotation.meaning_index)
    }

    /// Split borrows for an annotation process on one event
    ///
    /// The event is created if needed.
    pub fn process_parts(
        &mut self,
        name: &str,
    ) -> (&mut Event, &KeyAssignments, &MeaningHistory) {
        let event = self.events.entry(name.to_string()).or_default();
        (event, &self.key_assignments, &self.meaning_history)
    }
}

/// One-line presentation of an annotation: time, label and value
pub fn describe_annotation(annotation: &Annotation, history: &MeaningHistory) -> String {
    let label = history
        .get(annotation.meaning_index)
        .map(|meaning| meaning.label.as_str())
        .unwrap_or("?");
    match annotation.value {
        Some(value) => format!("{} {} [{}]", annotation.timestamp, label, value),
        None => format!("{} {}", annotation.timestamp, label),
    }
}
