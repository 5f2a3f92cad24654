//! Interactive annotation session
//!
//! Couples an `AnnotationProcess` with a key source and a display: keys are
//! read with a timeout so the display refreshes on every tick, and the
//! store is saved when the process stops.

use crate::annotations::Annotation;
use crate::config::ProcessConfig;
use crate::meanings::MeaningHistory;
use crate::persist::StoreFile;
use crate::player::PlayerSync;
use crate::process::{AnnotationProcess, Clock, Effect, Input, KeyStroke, Window};
use crate::store::{describe_annotation, Event, Store};
use crate::time::TimeValue;
use crate::types::{AnnotateError, Result};
use std::time::Duration;

/// Source of keystrokes
pub trait KeySource {
    /// Wait at most `timeout` for the next keystroke
    fn next_key(&mut self, timeout: Duration) -> Result<Option<KeyStroke>>;
}

/// Receiver of the frames produced while annotating
pub trait Display {
    fn render(&mut self, frame: &Frame<'_>) -> Result<()>;
}

/// Everything shown at one instant of the session
#[derive(Debug)]
pub struct Frame<'a> {
    pub event: &'a str,
    pub timer: TimeValue,
    pub running: bool,
    pub window: Window<'a>,
    /// Annotation just before the cursor
    pub focus: Option<&'a Annotation>,
    /// Meanings, for labels
    pub history: &'a MeaningHistory,
    /// Outcome of the last keystroke, or a player failure
    pub status: Option<String>,
}

/// What to annotate and how
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub event: String,
    /// Start time; defaults to where the event's review stopped
    pub start: Option<TimeValue>,
    pub config: ProcessConfig,
}

impl SessionRequest {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            start: None,
            config: ProcessConfig::default(),
        }
    }

    /// Builder method: set the start time
    pub fn with_start(mut self, start: TimeValue) -> Self {
        self.start = Some(start);
        self
    }

    /// Builder method: set the process configuration
    pub fn with_config(mut self, config: ProcessConfig) -> Self {
        self.config = config;
        self
    }
}

/// Summary of a finished session
#[derive(Debug)]
pub struct SessionOutcome {
    pub started_at: TimeValue,
    pub stopped_at: TimeValue,
    /// Net number of annotations added to the event
    pub added: usize,
    /// Player failures (reported, never rolled back)
    pub player_errors: Vec<AnnotateError>,
}

/// Run one annotation session on `request.event` and save the store
///
/// The process is always stopped and the store saved, even when reading
/// keys or rendering fails; that error is returned after the save.
pub fn run_session<C: Clock>(
    store: &mut Store,
    file: &StoreFile,
    request: &SessionRequest,
    player: Option<&mut dyn PlayerSync>,
    keys: &mut dyn KeySource,
    display: &mut dyn Display,
    clock: &C,
) -> Result<SessionOutcome> {
    let start = request.start.unwrap_or_else(|| {
        store
            .event(&request.event)
            .map(Event::resume_time)
            .unwrap_or(TimeValue::ZERO)
    });

    let (event, assignments, history) = store.process_parts(&request.event);
    let before = event.annotations.len();
    let mut process = AnnotationProcess::new(event, assignments, request.config.clone());
    if let Some(player) = player {
        process = process.with_player(player);
    }
    process.start(start, clock.now())?;

    let mut player_errors = Vec::new();
    let loop_result = drive(
        &mut process,
        &request.event,
        history,
        keys,
        display,
        clock,
        &mut player_errors,
    );

    let stopped_at = process.stop(clock.now());
    player_errors.extend(process.take_player_errors());
    let after = process.event().annotations.len();

    file.save(store)?;
    loop_result?;

    Ok(SessionOutcome {
        started_at: start,
        stopped_at,
        added: after.saturating_sub(before),
        player_errors,
    })
}

fn drive<C: Clock>(
    process: &mut AnnotationProcess<'_>,
    event_name: &str,
    history: &MeaningHistory,
    keys: &mut dyn KeySource,
    display: &mut dyn Display,
    clock: &C,
    player_errors: &mut Vec<AnnotateError>,
) -> Result<()> {
    let tick_interval = process.config().tick_interval();
    let mut status: Option<String> = None;

    loop {
        let now = clock.now();
        process.tick(now);

        let errors = process.take_player_errors();
        if let Some(err) = errors.last() {
            status = Some(format!("player: {}", err));
        }
        player_errors.extend(errors);

        let frame = Frame {
            event: event_name,
            timer: process.timer(now),
            running: process.is_running(),
            window: process.window(now),
            focus: process.focus(),
            history,
            status: status.clone(),
        };
        display.render(&frame)?;

        if !process.is_running() {
            return Ok(());
        }

        if let Some(stroke) = keys.next_key(tick_interval)? {
            let effect = process.handle(Input::from(stroke), clock.now());
            status = describe_effect(&effect, process, history);
        }
    }
}

fn describe_effect(
    effect: &Effect,
    process: &AnnotationProcess<'_>,
    history: &MeaningHistory,
) -> Option<String> {
    let annotations = &process.event().annotations;
    match effect {
        Effect::Added(index) => annotations
            .get(*index)
            .map(|annotation| format!("added {}", describe_annotation(annotation, history))),
        Effect::ValueSet(_) | Effect::ValueCleared => annotations
            .last_added()
            .map(|annotation| describe_annotation(annotation, history)),
        Effect::Deleted(annotation) => {
            Some(format!("deleted {}", describe_annotation(annotation, history)))
        }
        Effect::Navigated(index) => annotations
            .get(*index)
            .map(|annotation| format!("at {}", describe_annotation(annotation, history))),
        Effect::TimeSet(time) => Some(format!("time set to {}", time)),
        Effect::Stopped(time) => Some(format!("stopped at {}", time)),
        Effect::Ignored => None,
    }
}
