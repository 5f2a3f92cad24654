//! Player synchronization contract
//!
//! An external player (music player, video player, MIDI device...) can
//! follow the annotation process: it is started and stopped with it, and
//! moved whenever the annotation timer is set. The annotation record stays
//! the source of truth; a failing player never undoes an annotation.

use crate::time::TimeValue;
use crate::types::Result;

/// The three operations an external player must provide
///
/// Calls are synchronous: a slow implementation stalls the annotation loop.
pub trait PlayerSync {
    /// Begin playback (the annotation process starts)
    fn start(&mut self) -> Result<()>;

    /// End playback (the annotation process stops)
    fn stop(&mut self) -> Result<()>;

    /// Move the play head
    fn set_time(&mut self, time: TimeValue) -> Result<()>;
}

/// Player that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPlayer;

impl PlayerSync for NullPlayer {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_time(&mut self, _time: TimeValue) -> Result<()> {
        Ok(())
    }
}
