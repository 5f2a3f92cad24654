//! Scrolling window over an annotation list
//!
//! The window is a pure projection of `(annotations, timer)`: the upcoming
//! annotation, highlighted for a short while once the timer has passed it,
//! and the most recent annotations already demoted to the history part.

use crate::annotations::Annotation;
use crate::time::TimeValue;

/// The "next annotation" slot of the window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextAnnotation<'a> {
    /// Position in the annotation list
    pub index: usize,
    pub annotation: &'a Annotation,
    /// True while the timer has passed the annotation by less than the
    /// highlight duration
    pub highlighted: bool,
}

/// What the display shows around the live timer
#[derive(Debug, Clone, PartialEq)]
pub struct Window<'a> {
    pub next: Option<NextAnnotation<'a>>,
    /// Previous annotations, newest first
    pub previous: Vec<&'a Annotation>,
}

/// Project a sorted annotation slice around `timer`
///
/// # Arguments
/// * `entries` - Annotations sorted by timestamp
/// * `timer` - Current annotation timer
/// * `highlight_secs` - How long a passed annotation stays in the "next" slot
/// * `previous_lines` - Maximum number of previous annotations returned
pub fn project(
    entries: &[Annotation],
    timer: TimeValue,
    highlight_secs: f64,
    previous_lines: usize,
) -> Window<'_> {
    let demoted_until = timer + (-highlight_secs.max(0.0));
    let split = entries.partition_point(|annotation| annotation.timestamp <= demoted_until);

    let next = entries.get(split).map(|annotation| NextAnnotation {
        index: split,
        annotation,
        highlighted: annotation.timestamp <= timer,
    });
    let previous = entries[..split].iter().rev().take(previous_lines).collect();

    Window { next, previous }
}
