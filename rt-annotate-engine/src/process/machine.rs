//! The annotation process state machine
//!
//! An `AnnotationProcess` annotates one event in real time. While running,
//! its timer is `anchor_time + elapsed wall time`; every keystroke is applied
//! to the event's annotation list before the next one is read. Instants are
//! passed in by the caller so the machine itself never reads a clock.

use super::input::Input;
use super::window::{project, Window};
use crate::annotations::{Annotation, Direction};
use crate::config::ProcessConfig;
use crate::meanings::KeyAssignments;
use crate::player::PlayerSync;
use crate::store::Event;
use crate::time::TimeValue;
use crate::types::{AnnotateError, Result};
use std::time::Instant;

/// State of the annotation process
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessState {
    /// Not annotating; the timer is frozen
    Idle,
    /// Timer live, keystrokes accepted
    Running {
        anchor_time: TimeValue,
        anchor_instant: Instant,
    },
}

/// Result of handling one input
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// An annotation was added at this position
    Added(usize),
    /// The last-added annotation got a value
    ValueSet(u8),
    /// The value of the last-added annotation was removed
    ValueCleared,
    /// The last-added annotation was removed
    Deleted(Annotation),
    /// The cursor moved onto the annotation at this position
    Navigated(usize),
    /// The reference time was moved
    TimeSet(TimeValue),
    /// The process stopped at this time
    Stopped(TimeValue),
    /// Nothing happened (unassigned key, nothing to act on, not running)
    Ignored,
}

/// Real-time annotation of a single event
pub struct AnnotationProcess<'a> {
    event: &'a mut Event,
    assignments: &'a KeyAssignments,
    player: Option<&'a mut dyn PlayerSync>,
    config: ProcessConfig,
    state: ProcessState,
    /// Timer value while idle
    idle_time: TimeValue,
    /// Timer value at the last cursor update
    last_tick_time: TimeValue,
    player_errors: Vec<AnnotateError>,
}

impl<'a> AnnotationProcess<'a> {
    /// Create an idle process on `event`
    pub fn new(event: &'a mut Event, assignments: &'a KeyAssignments, config: ProcessConfig) -> Self {
        Self {
            event,
            assignments,
            player: None,
            config,
            state: ProcessState::Idle,
            idle_time: TimeValue::ZERO,
            last_tick_time: TimeValue::ZERO,
            player_errors: Vec::new(),
        }
    }

    /// Builder method: attach an external player
    pub fn with_player(mut self, player: &'a mut dyn PlayerSync) -> Self {
        self.player = Some(player);
        self
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ProcessState::Running { .. })
    }

    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    pub fn event(&self) -> &Event {
        self.event
    }

    /// Start annotating at `start`
    ///
    /// Additions of a previous run can no longer be edited. The player, if
    /// any, is moved to `start` and then started.
    pub fn start(&mut self, start: TimeValue, now: Instant) -> Result<()> {
        if self.is_running() {
            return Err(AnnotateError::InvalidInput(
                "annotation process already running".to_string(),
            ));
        }

        log::info!("Annotation process started at {}", start);
        self.event.annotations.begin_run();
        self.anchor(start, now);
        self.with_player_call("set_time", |player| player.set_time(start));
        self.with_player_call("start", |player| player.start());
        Ok(())
    }

    /// Current value of the annotation timer
    pub fn timer(&self, now: Instant) -> TimeValue {
        match self.state {
            ProcessState::Idle => self.idle_time,
            ProcessState::Running {
                anchor_time,
                anchor_instant,
            } => anchor_time + now.saturating_duration_since(anchor_instant).as_secs_f64(),
        }
    }

    /// Move the cursor over the annotations the timer passed since the last
    /// update; returns how many were passed
    pub fn tick(&mut self, now: Instant) -> usize {
        if !self.is_running() {
            return 0;
        }
        let timer = self.timer(now);
        let passed = self.event.annotations.advance_over(self.last_tick_time, timer);
        if timer > self.last_tick_time {
            self.last_tick_time = timer;
        }
        log::trace!("tick at {} ({} annotations passed)", timer, passed);
        passed
    }

    /// Apply one input
    ///
    /// Bad keystrokes are ignored (and logged); they never stop the process.
    pub fn handle(&mut self, input: Input, now: Instant) -> Effect {
        if !self.is_running() {
            log::warn!("Input {:?} ignored: annotation process not running", input);
            return Effect::Ignored;
        }
        self.tick(now);

        let effect = match input {
            Input::Annotate(key) => {
                let timer = self.timer(now);
                let added = self
                    .event
                    .annotations
                    .add(timer, key, self.assignments)
                    .map(|_| ());
                match added {
                    Ok(()) => self
                        .event
                        .annotations
                        .last_added_index()
                        .map_or(Effect::Ignored, Effect::Added),
                    Err(err) => {
                        log::warn!("Keystroke ignored: {}", err);
                        Effect::Ignored
                    }
                }
            }
            Input::Value(digit) => {
                if self.event.annotations.set_value(digit) {
                    Effect::ValueSet(digit)
                } else {
                    Effect::Ignored
                }
            }
            Input::ClearValue => {
                if self.event.annotations.clear_value() {
                    Effect::ValueCleared
                } else {
                    Effect::Ignored
                }
            }
            Input::DeleteLast => self
                .event
                .annotations
                .delete_last()
                .map_or(Effect::Ignored, Effect::Deleted),
            Input::Navigate(direction) => self.navigate(direction),
            Input::StepBack => {
                let time = self.timer(now) + (-self.config.time_step_secs);
                self.seek(time, now);
                Effect::TimeSet(time)
            }
            Input::StepForward => {
                let time = self.timer(now) + self.config.time_step_secs;
                self.seek(time, now);
                Effect::TimeSet(time)
            }
            Input::Stop => Effect::Stopped(self.stop(now)),
        };

        log::debug!("{:?} -> {:?}", input, effect);
        effect
    }

    fn navigate(&mut self, direction: Direction) -> Effect {
        if self.event.annotations.navigate(direction).is_some() {
            Effect::Navigated(self.event.annotations.cursor() - 1)
        } else {
            Effect::Ignored
        }
    }

    /// Move the reference time to `time` without pausing
    ///
    /// The cursor is placed after the annotations at or before `time` and
    /// the player, if any, follows.
    pub fn seek(&mut self, time: TimeValue, now: Instant) {
        if !self.is_running() {
            self.idle_time = time;
            return;
        }
        self.anchor(time, now);
        self.with_player_call("set_time", |player| player.set_time(time));
    }

    /// Stop annotating; returns the timer value at the stop
    pub fn stop(&mut self, now: Instant) -> TimeValue {
        if !self.is_running() {
            return self.idle_time;
        }
        self.tick(now);
        let time = self.timer(now);
        self.state = ProcessState::Idle;
        self.idle_time = time;
        self.with_player_call("stop", |player| player.stop());
        log::info!("Annotation process stopped at {}", time);
        time
    }

    /// Scrolling window around the current timer
    pub fn window(&self, now: Instant) -> Window<'_> {
        project(
            self.event.annotations.as_slice(),
            self.timer(now),
            self.config.highlight_secs,
            self.config.previous_lines,
        )
    }

    /// Annotation just before the cursor (the review focus)
    pub fn focus(&self) -> Option<&Annotation> {
        self.event.annotations.prev_annotation()
    }

    /// Player failures collected since the last call
    pub fn take_player_errors(&mut self) -> Vec<AnnotateError> {
        std::mem::take(&mut self.player_errors)
    }

    fn anchor(&mut self, time: TimeValue, now: Instant) {
        self.state = ProcessState::Running {
            anchor_time: time,
            anchor_instant: now,
        };
        self.event.annotations.cursor_at_time(time);
        self.last_tick_time = time;
    }

    fn with_player_call<F>(&mut self, operation: &str, call: F)
    where
        F: FnOnce(&mut dyn PlayerSync) -> Result<()>,
    {
        if let Some(player) = self.player.as_deref_mut() {
            if let Err(err) = call(player) {
                log::warn!("Player {} failed: {}", operation, err);
                self.player_errors.push(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::input::KeyStroke;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingPlayer {
        calls: Vec<String>,
        fail_set_time: bool,
    }

    impl PlayerSync for RecordingPlayer {
        fn start(&mut self) -> Result<()> {
            self.calls.push("start".to_string());
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            self.calls.push("stop".to_string());
            Ok(())
        }

        fn set_time(&mut self, time: TimeValue) -> Result<()> {
            self.calls.push(format!("set_time {}", time));
            if self.fail_set_time {
                Err(AnnotateError::PlayerSyncError("seek refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn keys() -> KeyAssignments {
        KeyAssignments::from_pairs(vec![('i', 0), ('g', 1)]).unwrap()
    }

    fn key(c: char) -> Input {
        Input::from(KeyStroke::Char(c))
    }

    #[test]
    fn test_timer_follows_wall_clock() {
        let mut event = Event::new();
        let keys = keys();
        let mut process = AnnotationProcess::new(&mut event, &keys, ProcessConfig::new());
        let t0 = Instant::now();

        process.start(TimeValue::from_seconds(10.0), t0).unwrap();
        assert!(process.is_running());
        assert_eq!(
            process.timer(t0 + Duration::from_millis(2500)),
            TimeValue::from_seconds(12.5)
        );
        assert!(process.start(TimeValue::ZERO, t0).is_err());

        let stopped = process.stop(t0 + Duration::from_secs(3));
        assert_eq!(stopped, TimeValue::from_seconds(13.0));
        assert_eq!(process.timer(t0 + Duration::from_secs(60)), stopped);
    }

    #[test]
    fn test_keystrokes_edit_annotations() {
        let mut event = Event::new();
        let keys = keys();
        let mut process = AnnotationProcess::new(&mut event, &keys, ProcessConfig::new());
        let t0 = Instant::now();
        process.start(TimeValue::ZERO, t0).unwrap();

        let t1 = t0 + Duration::from_secs(1);
        assert_eq!(process.handle(key('i'), t1), Effect::Added(0));
        assert_eq!(process.handle(key('3'), t1), Effect::ValueSet(3));
        assert_eq!(process.handle(key('z'), t1), Effect::Ignored);
        assert_eq!(process.handle(key('-'), t1), Effect::ValueCleared);
        assert_eq!(process.handle(key('-'), t1), Effect::Ignored);
        assert_eq!(process.handle(key('g'), t1), Effect::Added(1));
        assert!(matches!(
            process.handle(Input::from(KeyStroke::Delete), t1),
            Effect::Deleted(Annotation { key: 'g', .. })
        ));
        assert!(process.is_running());
        assert_eq!(process.handle(key(' '), t1), Effect::Stopped(TimeValue::from_seconds(1.0)));
        assert_eq!(process.handle(key('i'), t1), Effect::Ignored);

        assert_eq!(event.annotations.len(), 1);
        assert_eq!(event.annotations.get(0).unwrap().value, None);
    }

    #[test]
    fn test_navigation_leaves_timer_alone() {
        let mut event = Event::new();
        let keys = keys();
        let mut process = AnnotationProcess::new(&mut event, &keys, ProcessConfig::new());
        let t0 = Instant::now();
        process.start(TimeValue::ZERO, t0).unwrap();
        process.handle(key('i'), t0 + Duration::from_secs(1));
        process.handle(key('g'), t0 + Duration::from_secs(2));

        let now = t0 + Duration::from_secs(3);
        assert_eq!(process.handle(key('<'), now), Effect::Navigated(0));
        assert_eq!(process.focus().unwrap().key, 'i');
        assert_eq!(process.handle(Input::from(KeyStroke::Right), now), Effect::Navigated(1));
        assert_eq!(process.handle(Input::from(KeyStroke::Right), now), Effect::Ignored);
        assert_eq!(process.timer(now), TimeValue::from_seconds(3.0));
    }

    #[test]
    fn test_time_steps_move_player() {
        let mut event = Event::new();
        let keys = keys();
        let mut player = RecordingPlayer::default();
        let t0 = Instant::now();
        {
            let mut process = AnnotationProcess::new(&mut event, &keys, ProcessConfig::new())
                .with_player(&mut player);
            process.start(TimeValue::from_seconds(10.0), t0).unwrap();

            let effect = process.handle(Input::from(KeyStroke::Up), t0);
            assert_eq!(effect, Effect::TimeSet(TimeValue::from_seconds(8.0)));
            let effect = process.handle(Input::from(KeyStroke::Down), t0 + Duration::from_secs(1));
            assert_eq!(effect, Effect::TimeSet(TimeValue::from_seconds(11.0)));
            process.stop(t0 + Duration::from_secs(1));
        }

        assert_eq!(
            player.calls,
            vec![
                "set_time 0:00:10.0",
                "start",
                "set_time 0:00:08.0",
                "set_time 0:00:11.0",
                "stop"
            ]
        );
    }

    #[test]
    fn test_player_failure_keeps_annotation() {
        let mut event = Event::new();
        let keys = keys();
        let mut player = RecordingPlayer {
            fail_set_time: true,
            ..Default::default()
        };
        let t0 = Instant::now();
        let mut process = AnnotationProcess::new(&mut event, &keys, ProcessConfig::new())
            .with_player(&mut player);

        process.start(TimeValue::ZERO, t0).unwrap();
        assert_eq!(process.handle(key('i'), t0), Effect::Added(0));
        process.handle(Input::from(KeyStroke::Down), t0);

        let errors = process.take_player_errors();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], AnnotateError::PlayerSyncError(_)));
        assert!(process.take_player_errors().is_empty());
        assert!(process.is_running());
        assert_eq!(process.event().annotations.len(), 1);
    }

    #[test]
    fn test_tick_advances_cursor_over_passed_annotations() {
        let mut event = Event::new();
        let keys = keys();
        let config = ProcessConfig::new();
        for seconds in [1.0, 2.0, 4.0] {
            event
                .annotations
                .add(TimeValue::from_seconds(seconds), 'i', &keys)
                .unwrap();
        }
        let mut process = AnnotationProcess::new(&mut event, &keys, config);
        let t0 = Instant::now();
        process.start(TimeValue::ZERO, t0).unwrap();
        assert_eq!(process.event().annotations.cursor(), 0);

        assert_eq!(process.tick(t0 + Duration::from_millis(2500)), 2);
        assert_eq!(process.event().annotations.cursor(), 2);

        let window = process.window(t0 + Duration::from_millis(2500));
        assert_eq!(window.next.unwrap().index, 1);
        assert!(window.next.unwrap().highlighted);
    }
}
