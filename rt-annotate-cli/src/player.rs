//! Player adapters
//!
//! The command player runs one external program per player operation, e.g.
//! `playerctl` or a small script talking to a media player.

use crate::config::{PlayerConfig, PlayerKind};
use rt_annotate_engine::{AnnotateError, NullPlayer, PlayerSync, Result, TimeValue};
use std::process::Command;

/// Player running configured external commands
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    start: Vec<String>,
    stop: Vec<String>,
    set_time: Vec<String>,
}

impl CommandPlayer {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            start: config.start.clone(),
            stop: config.stop.clone(),
            set_time: config.set_time.clone(),
        }
    }
}

impl PlayerSync for CommandPlayer {
    fn start(&mut self) -> Result<()> {
        run(&self.start)
    }

    fn stop(&mut self) -> Result<()> {
        run(&self.stop)
    }

    fn set_time(&mut self, time: TimeValue) -> Result<()> {
        let args: Vec<String> = self
            .set_time
            .iter()
            .map(|arg| substitute_time(arg, time))
            .collect();
        run(&args)
    }
}

/// Player selected by the configuration
pub fn build_player(config: &PlayerConfig) -> Box<dyn PlayerSync> {
    match config.kind {
        PlayerKind::None => Box::new(NullPlayer),
        PlayerKind::Command => Box::new(CommandPlayer::new(config)),
    }
}

/// Replace the time placeholders of a command argument
pub fn substitute_time(arg: &str, time: TimeValue) -> String {
    let (hours, minutes, _) = time.hms();
    arg.replace("{time}", &time.to_string())
        .replace("{seconds}", &format!("{:.3}", time.to_seconds()))
        .replace("{hours}", &hours.to_string())
        .replace("{minutes}", &minutes.to_string())
}

fn run(argv: &[String]) -> Result<()> {
    let Some((program, args)) = argv.split_first() else {
        return Ok(());
    };

    log::debug!("Running player command {:?}", argv);
    let status = Command::new(program).args(args).status().map_err(|e| {
        AnnotateError::PlayerSyncError(format!("cannot run {}: {}", program, e))
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(AnnotateError::PlayerSyncError(format!(
            "{} exited with {}",
            program, status
        )))
    }
}
