//! Page Sessions
//!
//! Scripted user sessions: scrolling, switching tabs and idling on a page.
//! Sessions replay on the virtual-time event loop, so an hour of browsing
//! finishes instantly and always yields the same report.

use std::path::Path;
use std::time::Duration;

use dwell_engine::{
    Clock, ElementId, PageEvent, Report, ReportSink, TimerFacility, TrackerConfig,
    ViewabilityTracker,
};
use serde::Deserialize;

use crate::page::{Page, PageLayout};
use crate::SessionError;

/// One user action
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Scroll the window to page offset `y`
    Scroll { y: f32 },
    /// Switch away from the tab
    Hide,
    /// Come back to the tab
    Show,
    /// Do nothing for `ms` milliseconds
    Wait { ms: u64 },
}

/// Page plus the actions performed on it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionScript {
    pub page: PageLayout,
    pub steps: Vec<Step>,
}

impl SessionScript {
    pub fn from_json(source: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }
}

/// Outcome of a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub report: Report,
    /// Exact totals in page order
    pub totals: Vec<(ElementId, Duration)>,
    pub hidden: Duration,
    pub elapsed: Duration,
}

impl SessionSummary {
    pub fn total(&self, id: &str) -> Option<Duration> {
        self.totals
            .iter()
            .find(|(element, _)| element.as_str() == id)
            .map(|(_, total)| *total)
    }

    pub(crate) fn collect<C: Clock, T: TimerFacility>(
        tracker: &mut ViewabilityTracker<C, T>,
    ) -> Self {
        tracker.flush_visible();
        Self {
            report: tracker.report(),
            totals: tracker
                .elements()
                .map(|e| (e.id.clone(), e.total_view_time))
                .collect(),
            hidden: tracker.hidden_duration(),
            elapsed: tracker.clock().now().since_origin(),
        }
    }
}

/// Replay `script` on the virtual-time event loop
pub fn run_simulated(
    script: &SessionScript,
    config: TrackerConfig,
    sink: impl ReportSink + 'static,
) -> Result<SessionSummary, SessionError> {
    let mut page = Page::new(script.page.clone(), config.observer_options())?;
    let mut tracker =
        ViewabilityTracker::simulated(page.campaign_ids().cloned(), config)?.with_sink(sink);

    let entries = page.observe(tracker.now());
    tracker.dispatch(PageEvent::Intersection(entries));

    for step in &script.steps {
        log::debug!("{} {:?}", tracker.now(), step);
        match *step {
            Step::Scroll { y } => {
                page.scroll_to(y);
                let entries = page.observe(tracker.now());
                tracker.dispatch(PageEvent::Intersection(entries));
            }
            Step::Hide => tracker.dispatch(PageEvent::VisibilityChange { hidden: true }),
            Step::Show => tracker.dispatch(PageEvent::VisibilityChange { hidden: false }),
            Step::Wait { ms } => tracker.run_for(Duration::from_millis(ms)),
        }
    }

    Ok(SessionSummary::collect(&mut tracker))
}
