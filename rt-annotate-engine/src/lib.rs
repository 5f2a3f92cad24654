//! Real-time Annotation Engine
//!
//! A library for annotating events (recordings, takes, performances) in real
//! time with single keystrokes, and for keeping those annotations in a
//! human-readable JSON file.
//!
//! # Architecture
//!
//! - Keys are bound to meanings through an append-only meaning history, so
//!   stored annotations keep their meaning when key bindings change
//! - Each event keeps a time-sorted annotation list with a review cursor
//! - An annotation process turns keystrokes into annotations while a timer
//!   runs, optionally driving an external player
//! - The store is persisted atomically under an advisory file lock; every
//!   older file format can still be loaded
//!
//! The library does NOT:
//! - Read the terminal or draw anything (see `KeySource` and `Display`)
//! - Control a specific player (see `PlayerSync`)
//!
//! Both live in the application layer (rt-annotate-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use rt_annotate_engine::{StoreFile, TimeValue};
//!
//! // Lock and load the annotation file
//! let (file, mut store) = StoreFile::open("annotations.json").unwrap();
//!
//! // Bind keys to meanings
//! store.load_keys("i inspired (musically inspired)\ng glitch").unwrap();
//!
//! // Annotate an event
//! let (event, keys, _) = store.process_parts("take1");
//! event
//!     .annotations
//!     .add(TimeValue::from_hms(0, 0, 47.2), 'i', keys)
//!     .unwrap();
//! event.annotations.set_value(2);
//!
//! file.save(&store).unwrap();
//! ```

// Public modules
pub mod annotations;
pub mod bookmarks;
pub mod codec;
pub mod config;
pub mod meanings;
pub mod persist;
pub mod player;
pub mod process;
pub mod session;
pub mod stats;
pub mod store;
pub mod time;
pub mod types;

// Re-export main types for convenience
pub use annotations::{Annotation, AnnotationList, Direction, MAX_VALUE};
pub use bookmarks::{Bookmark, BookmarkTable};
pub use config::ProcessConfig;
pub use meanings::{KeyAssignments, Meaning, MeaningHistory};
pub use persist::StoreFile;
pub use player::{NullPlayer, PlayerSync};
pub use process::{
    AnnotationProcess, Clock, Effect, Input, KeyStroke, ManualClock, ProcessState, SystemClock,
    Window,
};
pub use session::{run_session, Display, Frame, KeySource, SessionOutcome, SessionRequest};
pub use stats::StoreStats;
pub use store::{describe_annotation, Event, EventSummary, Store};
pub use time::TimeValue;
pub use types::{AnnotateError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
