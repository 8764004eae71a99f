//! Document Visibility
//!
//! Foreground/background state of the hosting document and the set of
//! elements whose accounting is frozen while it is backgrounded.

use std::time::Duration;

use crate::clock::Timestamp;
use crate::element::{ElementId, VisibilitySet};

/// Document visibility state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentState {
    #[default]
    Foreground,
    Background,
}

/// Suspend/resume bookkeeping for the whole page.
///
/// The caller flushes and stops timers for the ids returned by
/// [`suspend`](Self::suspend) and restarts them for the ids returned by
/// [`resume`](Self::resume).
#[derive(Debug, Default)]
pub struct DocumentVisibilityCoordinator {
    state: DocumentState,
    /// Elements visible when the document was backgrounded
    suspended: VisibilitySet,
    last_change: Option<Timestamp>,
    hidden_duration: Duration,
    suspensions: u64,
}

impl DocumentVisibilityCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current state
    pub fn state(&self) -> DocumentState {
        self.state
    }

    pub fn is_background(&self) -> bool {
        self.state == DocumentState::Background
    }

    /// Elements waiting for the document to come back
    pub fn suspended(&self) -> &VisibilitySet {
        &self.suspended
    }

    /// Foreground → Background.
    ///
    /// Moves `visible` into the suspended set and returns the moved ids.
    /// Returns `None` (and touches nothing) if already backgrounded.
    pub fn suspend(
        &mut self,
        visible: &mut VisibilitySet,
        now: Timestamp,
    ) -> Option<Vec<ElementId>> {
        if self.is_background() {
            tracing::debug!("Document already hidden, keeping {} suspended", self.suspended.len());
            return None;
        }

        self.suspended = visible.take();
        self.state = DocumentState::Background;
        self.last_change = Some(now);
        self.suspensions += 1;

        Some(self.suspended.iter().cloned().collect())
    }

    /// Background → Foreground.
    ///
    /// Moves the suspended set back into `visible` and returns the ids
    /// whose timers must restart. Returns `None` if already foregrounded.
    pub fn resume(
        &mut self,
        visible: &mut VisibilitySet,
        now: Timestamp,
    ) -> Option<Vec<ElementId>> {
        if !self.is_background() {
            tracing::debug!("Document already visible");
            return None;
        }

        if let Some(last) = self.last_change {
            self.hidden_duration += now.saturating_duration_since(last);
        }
        let restored: Vec<ElementId> = self.suspended.iter().cloned().collect();
        for id in &restored {
            visible.insert(id.clone());
        }
        self.suspended = VisibilitySet::new();
        self.state = DocumentState::Foreground;
        self.last_change = Some(now);

        Some(restored)
    }

    /// Record a full-enter that happened while hidden
    pub fn defer_enter(&mut self, id: ElementId) -> bool {
        self.suspended.insert(id)
    }

    /// Record a full-exit that happened while hidden
    pub fn defer_exit(&mut self, id: &ElementId) -> bool {
        self.suspended.remove(id)
    }

    /// Total time spent backgrounded, including the current stretch
    pub fn hidden_duration(&self, now: Timestamp) -> Duration {
        let mut duration = self.hidden_duration;
        if self.is_background() {
            if let Some(last) = self.last_change {
                duration += now.saturating_duration_since(last);
            }
        }
        duration
    }

    /// Number of foreground → background transitions
    pub fn suspensions(&self) -> u64 {
        self.suspensions
    }

    pub fn last_change(&self) -> Option<Timestamp> {
        self.last_change
    }
}
