//! Accumulation Timers
//!
//! One periodic timer per visible element, keyed by element id.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::element::ElementId;

/// Opaque handle returned by a [`TimerFacility`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u32);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Host facility for recurring callbacks.
///
/// Firings are delivered back to the tracker as
/// [`PageEvent::TimerFired`](crate::PageEvent::TimerFired).
pub trait TimerFacility {
    /// Schedule a recurring firing every `period`
    fn set_interval(&mut self, period: Duration) -> TimerHandle;

    /// Cancel a recurring firing. Unknown handles are ignored.
    fn clear_interval(&mut self, handle: TimerHandle);
}

/// Active timer per element
#[derive(Debug, Default)]
pub struct TimerRegistry {
    by_element: HashMap<ElementId, TimerHandle>,
    by_handle: HashMap<TimerHandle, ElementId>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a timer for `element` unless one is already running.
    ///
    /// Returns the live handle either way.
    pub fn start<T: TimerFacility>(
        &mut self,
        facility: &mut T,
        element: &ElementId,
        period: Duration,
    ) -> TimerHandle {
        if let Some(&handle) = self.by_element.get(element) {
            tracing::debug!("{} already has {}", element, handle);
            return handle;
        }

        let handle = facility.set_interval(period);
        self.by_element.insert(element.clone(), handle);
        self.by_handle.insert(handle, element.clone());
        tracing::debug!("Started {} for {}", handle, element);
        handle
    }

    /// Cancel and forget the timer for `element`, if any
    pub fn stop<T: TimerFacility>(
        &mut self,
        facility: &mut T,
        element: &ElementId,
    ) -> Option<TimerHandle> {
        let Some(handle) = self.by_element.remove(element) else {
            tracing::debug!("No timer to stop for {}", element);
            return None;
        };
        self.by_handle.remove(&handle);
        facility.clear_interval(handle);
        tracing::debug!("Stopped {} for {}", handle, element);
        Some(handle)
    }

    pub fn handle_for(&self, element: &ElementId) -> Option<TimerHandle> {
        self.by_element.get(element).copied()
    }

    /// Element a firing belongs to; `None` for stale handles
    pub fn element_for(&self, handle: TimerHandle) -> Option<&ElementId> {
        self.by_handle.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.by_element.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_element.is_empty()
    }
}
