//! Accumulator
//!
//! Checkpointed view-time accumulation. Every tick adds the time since the
//! previous checkpoint and moves the checkpoint to `now`, so any number of
//! ticks over an interval adds up to the interval itself.

use std::time::Duration;

use crate::clock::Timestamp;
use crate::element::TrackedElement;

/// Result of one accumulation tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub elapsed: Duration,
    pub total: Duration,
    /// New formatted total, only when it differs from the last one written
    pub formatted: Option<String>,
}

/// Add the time since the last checkpoint to the element's total.
///
/// A missing checkpoint counts as zero elapsed time.
pub fn tick(element: &mut TrackedElement, now: Timestamp) -> TickOutcome {
    tracing::trace!("Running interval {}", element.id);

    let elapsed = element
        .last_view_started
        .map(|started| now.saturating_duration_since(started))
        .unwrap_or_default();
    if element.last_view_started.is_none() {
        tracing::debug!("{} ticked without a checkpoint", element.id);
    }

    element.total_view_time += elapsed;
    element.last_view_started = Some(now);

    let text = format_view_time(element.total_view_time);
    let formatted = if element.last_formatted.as_deref() == Some(text.as_str()) {
        None
    } else {
        element.last_formatted = Some(text.clone());
        Some(text)
    };

    TickOutcome {
        elapsed,
        total: element.total_view_time,
        formatted,
    }
}

/// Format as `M:SS`, seconds floored
pub fn format_view_time(total: Duration) -> String {
    let secs = total.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
