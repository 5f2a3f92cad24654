//! Terminal front end of the annotation process
//!
//! Keys are read in raw mode with crossterm; each frame redraws the whole
//! (alternate) screen.

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use rt_annotate_engine::{describe_annotation, Display, Frame, KeySource, KeyStroke, Result};
use std::io::{self, Stdout, Write};
use std::time::Duration;

const HELP: &str = "space: stop  0-9: value  -: clear value  del: delete  \
                    left/right/</>: review  up/down: time -/+";

/// Raw mode and alternate screen, restored on drop
pub struct RawTerminal;

impl RawTerminal {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        if let Err(err) = execute!(io::stdout(), EnterAlternateScreen, Hide) {
            let _ = terminal::disable_raw_mode();
            return Err(err);
        }
        Ok(RawTerminal)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Keyboard of the controlling terminal
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn next_key(&mut self, timeout: Duration) -> Result<Option<KeyStroke>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => Ok(translate(key)),
            _ => Ok(None),
        }
    }
}

/// Map a terminal key event to a keystroke
pub fn translate(key: KeyEvent) -> Option<KeyStroke> {
    // Ctrl-C does not interrupt in raw mode; treat it as stop
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(KeyStroke::Char(' ')),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char(c) => Some(KeyStroke::Char(c)),
        KeyCode::Backspace | KeyCode::Delete => Some(KeyStroke::Delete),
        KeyCode::Left => Some(KeyStroke::Left),
        KeyCode::Right => Some(KeyStroke::Right),
        KeyCode::Up => Some(KeyStroke::Up),
        KeyCode::Down => Some(KeyStroke::Down),
        KeyCode::Home => Some(KeyStroke::Char('<')),
        KeyCode::End => Some(KeyStroke::Char('>')),
        _ => None,
    }
}

/// One screen line; emphasized lines are drawn in reverse video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub emphasized: bool,
}

impl Line {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasized: false,
        }
    }
}

/// Screen contents for a frame
pub fn frame_lines(frame: &Frame<'_>, legend: &[String]) -> Vec<Line> {
    let state = if frame.running { "annotating" } else { "stopped" };
    let mut lines = vec![
        Line::plain(format!("{}  [{}]  {}", frame.event, state, frame.timer)),
        Line::plain(""),
    ];

    match &frame.window.next {
        Some(next) => lines.push(Line {
            text: format!("next: {}", describe_annotation(next.annotation, frame.history)),
            emphasized: next.highlighted,
        }),
        None => lines.push(Line::plain("next: -")),
    }
    for annotation in &frame.window.previous {
        lines.push(Line::plain(format!(
            "      {}",
            describe_annotation(annotation, frame.history)
        )));
    }

    lines.push(Line::plain(""));
    if let Some(focus) = frame.focus {
        lines.push(Line::plain(format!(
            "cursor after: {}",
            describe_annotation(focus, frame.history)
        )));
    }
    if let Some(status) = &frame.status {
        lines.push(Line::plain(status.clone()));
    }

    lines.push(Line::plain(""));
    lines.extend(legend.iter().map(|entry| Line::plain(entry.clone())));
    lines.push(Line::plain(HELP));
    lines
}

/// Full-screen display of the annotation frames
pub struct TerminalDisplay {
    out: Stdout,
    legend: Vec<String>,
}

impl TerminalDisplay {
    pub fn new(legend: Vec<String>) -> Self {
        Self {
            out: io::stdout(),
            legend,
        }
    }
}

impl Display for TerminalDisplay {
    fn render(&mut self, frame: &Frame<'_>) -> Result<()> {
        queue!(self.out, Clear(ClearType::All))?;
        for (row, line) in frame_lines(frame, &self.legend).iter().enumerate() {
            let row = u16::try_from(row).unwrap_or(u16::MAX);
            queue!(self.out, MoveTo(0, row))?;
            if line.emphasized {
                queue!(
                    self.out,
                    SetAttribute(Attribute::Reverse),
                    Print(&line.text),
                    SetAttribute(Attribute::Reset)
                )?;
            } else {
                queue!(self.out, Print(&line.text))?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rt_annotate_engine::process::project;
    use rt_annotate_engine::{Annotation, MeaningHistory, TimeValue};

    #[test]
    fn test_translate_keys() {
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(translate(key(KeyCode::Char('i'))), Some(KeyStroke::Char('i')));
        assert_eq!(translate(key(KeyCode::Backspace)), Some(KeyStroke::Delete));
        assert_eq!(translate(key(KeyCode::Up)), Some(KeyStroke::Up));
        assert_eq!(translate(key(KeyCode::End)), Some(KeyStroke::Char('>')));
        assert_eq!(translate(key(KeyCode::F(1))), None);
        assert_eq!(
            translate(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(KeyStroke::Char(' '))
        );
    }

    #[test]
    fn test_frame_lines() {
        let mut history = MeaningHistory::new();
        history.append_meaning('i', "inspired", "");
        let entries = vec![
            Annotation::new(TimeValue::from_seconds(1.0), 'i', 0),
            Annotation::new(TimeValue::from_seconds(5.0), 'i', 0).with_value(4),
        ];
        let timer = TimeValue::from_seconds(5.5);
        let frame = Frame {
            event: "take1",
            timer,
            running: true,
            window: project(&entries, timer, 1.0, 10),
            focus: entries.last(),
            history: &history,
            status: Some("time set to 0:00:05.5".to_string()),
        };

        let lines = frame_lines(&frame, &["i  inspired".to_string()]);
        assert_eq!(lines[0].text, "take1  [annotating]  0:00:05.5");
        assert_eq!(lines[2].text, "next: 0:00:05.0 inspired [4]");
        assert!(lines[2].emphasized);
        assert_eq!(lines[3].text, "      0:00:01.0 inspired");
        assert!(lines.iter().any(|line| line.text == "i  inspired"));
    }
}
