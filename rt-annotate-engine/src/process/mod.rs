//! Real-time annotation process
//!
//! - `input`: keystrokes and what they mean to the process
//! - `machine`: the Idle/Running state machine
//! - `window`: the scrolling window shown around the live timer
//! - `clock`: monotonic time sources

pub mod clock;
pub mod input;
pub mod machine;
pub mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use input::{Input, KeyStroke};
pub use machine::{AnnotationProcess, Effect, ProcessState};
pub use window::{project, NextAnnotation, Window};
