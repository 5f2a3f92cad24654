//! Persistence codec: store <-> JSON annotation file
//!
//! [`save`] always writes the current schema (format version 3). [`load`]
//! reads every schema written so far:
//!
//! - **v1** has no meaning history. `key_assignments` is a list of
//!   `[text, key]` pairs and each entry is directly a meaning. Annotation
//!   bodies are `[key]` or `[key, value]`.
//! - **v2** stores the meaning history as an object mapping each key to the
//!   list of its texts. Assignments and annotations refer to meanings as
//!   `[key, index_within_key]`.
//! - **v3** stores a flat history of `[key, label, help]` records, event notes
//!   and bookmarks.

use crate::annotations::{Annotation, AnnotationList, MAX_VALUE};
use crate::meanings::{split_meaning_text, KeyAssignments, Meaning, MeaningHistory};
use crate::store::{Event, Store};
use crate::time::TimeValue;
use crate::types::{AnnotateError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Schema version written by [`save`]
pub const FORMAT_VERSION: u32 = 3;

/// Timestamp as `[hours, minutes, seconds]`
///
/// Every component carries the sign of the time (`-1.3` is `[0, 0, -1.3]`),
/// so reading the triple back gives the same `f64`. The canonical split with
/// only the hours negative is still accepted on load.
#[derive(Debug, Clone, Copy)]
struct WireTime(TimeValue);

impl WireTime {
    fn components(self) -> (i64, i64, f64) {
        let total = self.0.to_seconds();
        let (hours, minutes, seconds) = TimeValue::from_seconds(total.abs()).hms();
        let (hours, minutes, seconds) = if total < 0.0 {
            (-hours, -i64::from(minutes), -seconds)
        } else {
            (hours, i64::from(minutes), seconds)
        };

        // Same evaluation order as the reader
        let read_back = hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds;
        if read_back.to_bits() == total.to_bits() {
            (hours, minutes, seconds)
        } else {
            (0, 0, total)
        }
    }
}

impl Serialize for WireTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.components().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WireTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // Components are read as floats: older files were not strict about them
        let (hours, minutes, seconds) = <(f64, f64, f64)>::deserialize(deserializer)?;
        Ok(WireTime(TimeValue::from_seconds(
            hours * 3600.0 + minutes * 60.0 + seconds,
        )))
    }
}

/// Annotation body: `[key, meaning_index]` or `[key, meaning_index, value]`
///
/// A `null` value reads as no value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum AnnotationBody {
    Valued(char, usize, Option<u8>),
    Plain(char, usize),
}

#[derive(Debug, Serialize, Deserialize)]
struct EventRecord {
    annotation_list: Vec<(WireTime, AnnotationBody)>,
    #[serde(default)]
    cursor: usize,
    #[serde(default)]
    note: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreRecord {
    #[serde(default)]
    format_version: Vec<u32>,
    meaning_history: Vec<(char, String, String)>,
    #[serde(default)]
    key_assignments: Vec<(char, usize)>,
    #[serde(default)]
    annotations: BTreeMap<String, EventRecord>,
    #[serde(default)]
    bookmarks: BTreeMap<String, (String, WireTime)>,
}

/// Serialize a store with the current schema
pub fn save(store: &Store) -> Result<Vec<u8>> {
    let record = StoreRecord {
        format_version: vec![FORMAT_VERSION],
        meaning_history: store
            .meaning_history
            .iter()
            .map(|meaning| (meaning.key, meaning.label.clone(), meaning.help.clone()))
            .collect(),
        key_assignments: store.key_assignments.iter().collect(),
        annotations: store
            .events()
            .map(|(name, event)| (name.to_string(), event_record(event)))
            .collect(),
        bookmarks: store
            .bookmarks
            .iter()
            .map(|(name, bookmark)| {
                (
                    name.to_string(),
                    (bookmark.event.clone(), WireTime(bookmark.timestamp)),
                )
            })
            .collect(),
    };

    Ok(serde_json::to_vec_pretty(&record)?)
}

fn event_record(event: &Event) -> EventRecord {
    EventRecord {
        annotation_list: event
            .annotations
            .iter()
            .map(|annotation| {
                let body = match annotation.value {
                    Some(value) => {
                        AnnotationBody::Valued(annotation.key, annotation.meaning_index, Some(value))
                    }
                    None => AnnotationBody::Plain(annotation.key, annotation.meaning_index),
                };
                (WireTime(annotation.timestamp), body)
            })
            .collect(),
        cursor: event.annotations.cursor(),
        note: event.note.clone(),
    }
}

/// Deserialize a store written with any schema version
pub fn load(bytes: &[u8]) -> Result<Store> {
    let contents: Value = serde_json::from_slice(bytes)
        .map_err(|e| AnnotateError::FileParseError(format!("invalid JSON: {}", e)))?;

    if let Some(version) = contents
        .get("format_version")
        .and_then(|v| v.get(0))
        .and_then(Value::as_u64)
    {
        if version > u64::from(FORMAT_VERSION) {
            return Err(AnnotateError::FileParseError(format!(
                "format version {} is newer than supported version {}",
                version, FORMAT_VERSION
            )));
        }
    }

    match contents.get("meaning_history") {
        None | Some(Value::Null) => {
            log::info!("Reading annotation file without meaning history (format v1)");
            load_v1(contents)
        }
        Some(Value::Object(_)) => {
            log::info!("Reading annotation file with per-key meaning history (format v2)");
            load_v2(contents)
        }
        Some(Value::Array(_)) => load_current(contents),
        Some(other) => Err(AnnotateError::FileParseError(format!(
            "unexpected meaning_history: {}",
            other
        ))),
    }
}

fn parse_error(e: serde_json::Error) -> AnnotateError {
    AnnotateError::FileParseError(e.to_string())
}

fn check_value(value: u8) -> Result<u8> {
    if value > MAX_VALUE {
        return Err(AnnotateError::FileParseError(format!(
            "annotation value {} is out of range 0-{}",
            value, MAX_VALUE
        )));
    }
    Ok(value)
}

fn check_index(index: usize, history: &MeaningHistory) -> Result<usize> {
    if index >= history.len() {
        return Err(AnnotateError::FileParseError(format!(
            "meaning index {} is outside the meaning history ({} entries)",
            index,
            history.len()
        )));
    }
    Ok(index)
}

fn load_current(contents: Value) -> Result<Store> {
    let record: StoreRecord = serde_json::from_value(contents).map_err(parse_error)?;

    let mut store = Store::new();
    store.meaning_history = record
        .meaning_history
        .into_iter()
        .map(|(key, label, help)| Meaning::new(key, label, help))
        .collect();

    for (_, index) in &record.key_assignments {
        check_index(*index, &store.meaning_history)?;
    }
    store.key_assignments = KeyAssignments::from_pairs(record.key_assignments)?;

    for (name, event_record) in record.annotations {
        let mut entries = Vec::with_capacity(event_record.annotation_list.len());
        for (WireTime(timestamp), body) in event_record.annotation_list {
            let annotation = match body {
                AnnotationBody::Valued(key, index, Some(value)) => {
                    Annotation::new(timestamp, key, check_index(index, &store.meaning_history)?)
                        .with_value(check_value(value)?)
                }
                AnnotationBody::Valued(key, index, None) | AnnotationBody::Plain(key, index) => {
                    Annotation::new(timestamp, key, check_index(index, &store.meaning_history)?)
                }
            };
            entries.push(annotation);
        }
        store.insert_event(
            name,
            Event {
                annotations: AnnotationList::from_parts(entries, event_record.cursor),
                note: event_record.note,
            },
        );
    }

    for (name, (event, WireTime(timestamp))) in record.bookmarks {
        store.bookmarks.set(name, event, timestamp);
    }

    Ok(store)
}

/// Event entry of the legacy schemas; bodies are interpreted per version
#[derive(Debug, Deserialize)]
struct LegacyEventRecord {
    annotation_list: Vec<(WireTime, Vec<Value>)>,
    #[serde(default)]
    cursor: usize,
}

fn legacy_events(contents: &Value) -> Result<BTreeMap<String, LegacyEventRecord>> {
    match contents.get("annotations") {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(annotations) => {
            BTreeMap::<String, LegacyEventRecord>::deserialize(annotations).map_err(parse_error)
        }
    }
}

fn legacy_key(value: &Value) -> Result<char> {
    let text = value
        .as_str()
        .ok_or_else(|| AnnotateError::FileParseError(format!("expected a key, got {}", value)))?;
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(key), None) => Ok(key),
        _ => Err(AnnotateError::FileParseError(format!(
            "expected a single-character key, got {:?}",
            text
        ))),
    }
}

fn legacy_value(body: &[Value], position: usize) -> Result<Option<u8>> {
    match body.get(position) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            let number = value
                .as_u64()
                .filter(|n| *n <= u64::from(MAX_VALUE))
                .ok_or_else(|| {
                    AnnotateError::FileParseError(format!("unsupported annotation value {}", value))
                })?;
            Ok(Some(number as u8))
        }
    }
}

fn load_v1(contents: Value) -> Result<Store> {
    let old_assignments: Vec<(String, String)> = match contents.get("key_assignments") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => Vec::deserialize(value).map_err(parse_error)?,
    };

    let mut store = Store::new();
    let mut pairs = Vec::with_capacity(old_assignments.len());
    for (text, key) in &old_assignments {
        let key = legacy_key(&Value::String(key.clone()))?;
        let (label, help) = split_meaning_text(text);
        let index = store.meaning_history.append_meaning(key, label, help);
        pairs.push((key, index));
    }
    store.key_assignments = KeyAssignments::from_pairs(pairs)?;

    // Keys used by annotations but no longer assigned get one meaning each,
    // appended after the assigned ones
    let mut unassigned: HashMap<char, usize> = HashMap::new();
    for (name, record) in legacy_events(&contents)? {
        let mut entries = Vec::with_capacity(record.annotation_list.len());
        for (WireTime(timestamp), body) in record.annotation_list {
            let key = legacy_key(body.first().unwrap_or(&Value::Null))?;
            let index = match store.key_assignments.get(key) {
                Some(index) => index,
                None => *unassigned.entry(key).or_insert_with(|| {
                    log::warn!("Event {}: key {:?} has no meaning, labelling it {:?}", name, key, key);
                    store.meaning_history.append_meaning(key, key.to_string(), "")
                }),
            };
            let mut annotation = Annotation::new(timestamp, key, index);
            annotation.value = legacy_value(&body, 1)?;
            entries.push(annotation);
        }
        store.insert_event(
            name,
            Event {
                annotations: AnnotationList::from_parts(entries, record.cursor),
                note: String::new(),
            },
        );
    }

    Ok(store)
}

fn load_v2(contents: Value) -> Result<Store> {
    let per_key: BTreeMap<String, Vec<String>> = contents
        .get("meaning_history")
        .map(BTreeMap::<String, Vec<String>>::deserialize)
        .transpose()
        .map_err(parse_error)?
        .unwrap_or_default();

    // Flatten key by key; (key, index within key) -> history index
    let mut store = Store::new();
    let mut flat_index: HashMap<(char, usize), usize> = HashMap::new();
    for (key_text, texts) in &per_key {
        let key = legacy_key(&Value::String(key_text.clone()))?;
        for (key_index, text) in texts.iter().enumerate() {
            let (label, help) = split_meaning_text(text);
            let index = store.meaning_history.append_meaning(key, label, help);
            flat_index.insert((key, key_index), index);
        }
    }

    let lookup = |key: char, key_index: usize| -> Result<usize> {
        flat_index.get(&(key, key_index)).copied().ok_or_else(|| {
            AnnotateError::FileParseError(format!(
                "meaning #{} of key {:?} is not in the meaning history",
                key_index, key
            ))
        })
    };

    let old_assignments: Vec<(String, usize)> = match contents.get("key_assignments") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => Vec::deserialize(value).map_err(parse_error)?,
    };
    let mut pairs = Vec::with_capacity(old_assignments.len());
    for (key_text, key_index) in old_assignments {
        let key = legacy_key(&Value::String(key_text))?;
        pairs.push((key, lookup(key, key_index)?));
    }
    store.key_assignments = KeyAssignments::from_pairs(pairs)?;

    for (name, record) in legacy_events(&contents)? {
        let mut entries = Vec::with_capacity(record.annotation_list.len());
        for (WireTime(timestamp), body) in record.annotation_list {
            let (key, key_index): (String, usize) =
                <(String, usize)>::deserialize(body.first().unwrap_or(&Value::Null))
                    .map_err(parse_error)?;
            let key = legacy_key(&Value::String(key))?;
            let mut annotation = Annotation::new(timestamp, key, lookup(key, key_index)?);
            annotation.value = legacy_value(&body, 1)?;
            entries.push(annotation);
        }
        store.insert_event(
            name,
            Event {
                annotations: AnnotationList::from_parts(entries, record.cursor),
                note: String::new(),
            },
        );
    }

    Ok(store)
}
