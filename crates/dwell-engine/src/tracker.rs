//! Viewability Tracker
//!
//! Single-threaded event processor tying the observer transitions, the
//! per-element timers and the document visibility state together. Every
//! [`PageEvent`] is applied to completion before the next one is looked
//! at, so the invariants below hold between events:
//!
//! - foregrounded: live timers == visible elements, one timer per element
//! - backgrounded: no live timers, visible set empty
//! - an element's total never decreases

use std::time::Duration;

use crate::accumulator;
use crate::clock::{Clock, ManualClock, Timestamp};
use crate::config::TrackerConfig;
use crate::coordinator::{DocumentState, DocumentVisibilityCoordinator};
use crate::element::{ElementId, ElementStore, TrackedElement, VisibilitySet};
use crate::event_loop::EventLoop;
use crate::observer::{IntersectionEntry, Transition};
use crate::report::{NullSink, Report, ReportSink, ReportStore};
use crate::timers::{TimerFacility, TimerHandle, TimerRegistry};
use crate::EngineError;

/// Signal delivered by the host page
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// Batch of intersection changes from the viewport source
    Intersection(Vec<IntersectionEntry>),
    /// A periodic accumulation timer fired
    TimerFired(TimerHandle),
    /// The document was hidden or shown
    VisibilityChange { hidden: bool },
}

/// Viewability accounting for a fixed set of elements
pub struct ViewabilityTracker<C: Clock, T: TimerFacility> {
    config: TrackerConfig,
    clock: C,
    timers: T,
    elements: ElementStore,
    visible: VisibilitySet,
    coordinator: DocumentVisibilityCoordinator,
    registry: TimerRegistry,
    report: ReportStore,
    sink: Box<dyn ReportSink>,
}

impl<C: Clock, T: TimerFacility> ViewabilityTracker<C, T> {
    /// Register `elements` with zero totals and no timers
    pub fn new<I>(
        elements: I,
        clock: C,
        timers: T,
        config: TrackerConfig,
    ) -> Result<Self, EngineError>
    where
        I: IntoIterator,
        I::Item: Into<ElementId>,
    {
        config.validate()?;

        let mut store = ElementStore::new();
        for id in elements {
            store.insert(id.into())?;
        }
        tracing::info!("Tracking {} elements", store.len());

        Ok(Self {
            config,
            clock,
            timers,
            elements: store,
            visible: VisibilitySet::new(),
            coordinator: DocumentVisibilityCoordinator::new(),
            registry: TimerRegistry::new(),
            report: ReportStore::new(),
            sink: Box::new(NullSink),
        })
    }

    /// Send labels and snapshots to `sink`
    pub fn with_sink(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Process one event to completion
    pub fn dispatch(&mut self, event: PageEvent) {
        match event {
            PageEvent::Intersection(entries) => self.on_intersection(&entries),
            PageEvent::TimerFired(handle) => self.on_timer_fired(handle),
            PageEvent::VisibilityChange { hidden } => self.on_visibility_change(hidden),
        }
    }

    /// Apply a batch of intersection entries in order
    pub fn on_intersection(&mut self, entries: &[IntersectionEntry]) {
        for entry in entries {
            if !self.elements.contains(&entry.target) {
                tracing::warn!("Intersection for untracked element {}", entry.target);
                continue;
            }
            match entry.transition() {
                Some(Transition::FullyEntered { target, time }) => self.enter(target, time),
                Some(Transition::FullyExited { target, .. }) => self.exit(target),
                None => {}
            }
        }
    }

    pub fn on_timer_fired(&mut self, handle: TimerHandle) {
        let Some(id) = self.registry.element_for(handle).cloned() else {
            tracing::debug!("Ignoring stale firing of {}", handle);
            return;
        };
        self.flush(&id);
    }

    pub fn on_visibility_change(&mut self, hidden: bool) {
        let now = self.clock.now();

        if hidden {
            if let Some(frozen) = self.coordinator.suspend(&mut self.visible, now) {
                for id in &frozen {
                    self.flush(id);
                    self.stop_timer(id);
                }
                tracing::info!("Document hidden, suspended {} elements", frozen.len());
            }
            self.sink.publish_snapshot(&self.report.snapshot());
        } else if let Some(restored) = self.coordinator.resume(&mut self.visible, now) {
            for id in &restored {
                if let Some(element) = self.elements.get_mut(id) {
                    element.last_view_started = Some(now);
                }
                self.start_timer(id);
            }
            tracing::info!("Document visible, resumed {} elements", restored.len());
        }
    }

    /// Accumulate in-flight time for every visible element.
    ///
    /// Timers keep running; only the checkpoints move.
    pub fn flush_visible(&mut self) {
        let ids: Vec<ElementId> = self.visible.iter().cloned().collect();
        for id in &ids {
            self.flush(id);
        }
    }

    fn enter(&mut self, id: ElementId, time: Timestamp) {
        if self.coordinator.is_background() {
            tracing::debug!("{} fully entered while hidden, deferring", id);
            self.coordinator.defer_enter(id);
            return;
        }
        if self.visible.contains(&id) {
            tracing::debug!("{} already fully visible", id);
            return;
        }

        if let Some(element) = self.elements.get_mut(&id) {
            element.last_view_started = Some(time);
        }
        self.visible.insert(id.clone());
        self.start_timer(&id);
    }

    fn exit(&mut self, id: ElementId) {
        if self.coordinator.is_background() {
            self.coordinator.defer_exit(&id);
            return;
        }
        if !self.visible.remove(&id) {
            return;
        }

        self.flush(&id);
        self.stop_timer(&id);
    }

    fn flush(&mut self, id: &ElementId) {
        let now = self.clock.now();
        let Some(element) = self.elements.get_mut(id) else {
            return;
        };
        let outcome = accumulator::tick(element, now);
        if let Some(text) = outcome.formatted {
            self.report.upsert(id, &text);
            let label = format!("{}{}", self.config.label_prefix, text);
            self.sink.render_label(id, &label);
        }
    }

    fn start_timer(&mut self, id: &ElementId) {
        let handle = self.registry.start(&mut self.timers, id, self.config.tick_interval());
        if let Some(element) = self.elements.get_mut(id) {
            element.timer = Some(handle);
        }
    }

    fn stop_timer(&mut self, id: &ElementId) {
        self.registry.stop(&mut self.timers, id);
        if let Some(element) = self.elements.get_mut(id) {
            element.timer = None;
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn element(&self, id: &ElementId) -> Option<&TrackedElement> {
        self.elements.get(id)
    }

    pub fn elements(&self) -> impl Iterator<Item = &TrackedElement> {
        self.elements.iter()
    }

    pub fn total_view_time(&self, id: &ElementId) -> Option<Duration> {
        self.elements.get(id).map(|e| e.total_view_time)
    }

    /// Elements currently accumulating
    pub fn visible(&self) -> &VisibilitySet {
        &self.visible
    }

    /// Elements frozen while the document is hidden
    pub fn suspended(&self) -> &VisibilitySet {
        self.coordinator.suspended()
    }

    pub fn document_state(&self) -> DocumentState {
        self.coordinator.state()
    }

    pub fn hidden_duration(&self) -> Duration {
        self.coordinator.hidden_duration(self.clock.now())
    }

    pub fn live_timers(&self) -> usize {
        self.registry.len()
    }

    pub fn report(&self) -> Report {
        self.report.snapshot()
    }
}

impl ViewabilityTracker<ManualClock, EventLoop> {
    /// Tracker on a fresh virtual-time event loop
    pub fn simulated<I>(elements: I, config: TrackerConfig) -> Result<Self, EngineError>
    where
        I: IntoIterator,
        I::Item: Into<ElementId>,
    {
        let clock = ManualClock::new();
        let event_loop = EventLoop::new(clock.clone());
        Self::new(elements, clock, event_loop, config)
    }

    /// Deliver every timer firing due up to `until`, then move the clock there
    pub fn run_until(&mut self, until: Timestamp) {
        while let Some(handle) = self.timers.pop_due(until) {
            self.on_timer_fired(handle);
        }
        self.timers.advance_to(until);
    }

    pub fn run_for(&mut self, delta: Duration) {
        let until = self.clock.now().checked_add(delta).unwrap_or_else(|| self.clock.now());
        self.run_until(until);
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(ids: &[&str]) -> ViewabilityTracker<ManualClock, EventLoop> {
        ViewabilityTracker::simulated(ids.iter().copied(), TrackerConfig::default()).unwrap()
    }

    fn entry(
        tracker: &ViewabilityTracker<ManualClock, EventLoop>,
        id: &str,
        ratio: f32,
    ) -> PageEvent {
        PageEvent::Intersection(vec![IntersectionEntry::new(id, ratio, tracker.now())])
    }

    #[test]
    fn test_enter_starts_single_timer() {
        let mut t = tracker(&["a"]);
        t.dispatch(entry(&t, "a", 1.0));
        t.dispatch(entry(&t, "a", 1.0));

        assert_eq!(t.live_timers(), 1);
        assert_eq!(t.timers().live_timers(), 1);
        assert!(t.element(&"a".into()).unwrap().is_tracking());
    }

    #[test]
    fn test_partial_ratio_ignored() {
        let mut t = tracker(&["a"]);
        t.dispatch(entry(&t, "a", 0.75));
        assert!(t.visible().is_empty());
        assert_eq!(t.live_timers(), 0);
    }

    #[test]
    fn test_exit_without_enter_is_noop() {
        let mut t = tracker(&["a"]);
        t.dispatch(entry(&t, "a", 0.0));
        assert_eq!(t.total_view_time(&"a".into()), Some(Duration::ZERO));
        assert!(t.report().is_empty());
    }

    #[test]
    fn test_untracked_entry_skipped() {
        let mut t = tracker(&["a"]);
        t.dispatch(entry(&t, "ghost", 1.0));
        assert!(t.visible().is_empty());
        assert_eq!(t.live_timers(), 0);
    }

    #[test]
    fn test_duplicate_elements_rejected() {
        let result = ViewabilityTracker::simulated(["a", "a"], TrackerConfig::default());
        assert!(matches!(result, Err(EngineError::DuplicateElement(_))));
    }

    #[test]
    fn test_stale_firing_ignored() {
        let mut t = tracker(&["a"]);
        t.dispatch(entry(&t, "a", 1.0));
        let handle = t.element(&"a".into()).unwrap().timer.unwrap();

        t.run_for(Duration::from_millis(500));
        t.dispatch(entry(&t, "a", 0.0));
        let total = t.total_view_time(&"a".into()).unwrap();

        t.run_for(Duration::from_secs(2));
        t.dispatch(PageEvent::TimerFired(handle));
        assert_eq!(t.total_view_time(&"a".into()), Some(total));
    }

    #[test]
    fn test_flush_visible_keeps_timers() {
        let mut t = tracker(&["a"]);
        t.dispatch(entry(&t, "a", 1.0));
        t.run_for(Duration::from_millis(1500));
        t.flush_visible();

        assert_eq!(t.total_view_time(&"a".into()), Some(Duration::from_millis(1500)));
        assert_eq!(t.live_timers(), 1);
    }

    #[test]
    fn test_enter_while_hidden_starts_on_resume() {
        let mut t = tracker(&["a"]);
        t.dispatch(PageEvent::VisibilityChange { hidden: true });
        t.dispatch(entry(&t, "a", 1.0));
        assert_eq!(t.live_timers(), 0);
        assert!(t.suspended().contains(&"a".into()));

        t.run_for(Duration::from_secs(3));
        t.dispatch(PageEvent::VisibilityChange { hidden: false });
        t.run_for(Duration::from_secs(2));
        t.dispatch(entry(&t, "a", 0.0));

        assert_eq!(t.total_view_time(&"a".into()), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_exit_while_hidden_is_not_resumed() {
        let mut t = tracker(&["a"]);
        t.dispatch(entry(&t, "a", 1.0));
        t.run_for(Duration::from_secs(1));
        t.dispatch(PageEvent::VisibilityChange { hidden: true });
        t.dispatch(entry(&t, "a", 0.0));
        t.dispatch(PageEvent::VisibilityChange { hidden: false });

        assert!(t.visible().is_empty());
        assert_eq!(t.live_timers(), 0);
        assert_eq!(t.total_view_time(&"a".into()), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_custom_tick_interval() {
        let config = TrackerConfig {
            tick_interval_ms: 250,
            ..TrackerConfig::default()
        };
        let mut t = ViewabilityTracker::simulated(["a"], config).unwrap();
        assert_eq!(t.config().tick_interval(), Duration::from_millis(250));

        t.dispatch(entry(&t, "a", 1.0));
        t.run_for(Duration::from_secs(1));

        assert_eq!(t.timers().fired(), 4);
        assert_eq!(t.total_view_time(&"a".into()), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_hidden_duration_tracked() {
        let mut t = tracker(&["a"]);
        t.run_for(Duration::from_secs(1));
        t.dispatch(PageEvent::VisibilityChange { hidden: true });
        t.run_for(Duration::from_secs(4));
        t.dispatch(PageEvent::VisibilityChange { hidden: false });
        t.run_for(Duration::from_secs(1));

        assert_eq!(t.hidden_duration(), Duration::from_secs(4));
    }
}
