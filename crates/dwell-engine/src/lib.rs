//! dwell Engine - Viewability Time Accounting
//!
//! Tracks how long campaign elements stay fully inside the viewport while
//! the document is in the foreground, and keeps a per-element report of
//! the accumulated time.
//!
//! # Pipeline
//! - [`VisibilityObserver`] turns intersection ratios into full-enter and
//!   full-exit transitions
//! - [`TimerRegistry`] keeps at most one periodic timer per element
//! - [`accumulator`] checkpoints elapsed time on every tick
//! - [`DocumentVisibilityCoordinator`] suspends and resumes everything when
//!   the tab is backgrounded
//! - [`ReportStore`] holds the latest formatted total per element
//!
//! [`ViewabilityTracker`] composes the pieces and processes one
//! [`PageEvent`] at a time.

pub mod accumulator;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod element;
pub mod event_loop;
pub mod geometry;
pub mod observer;
pub mod report;
pub mod timers;
pub mod tracker;

pub use clock::{Clock, ManualClock, MonotonicClock, Timestamp};
pub use config::TrackerConfig;
pub use coordinator::{DocumentState, DocumentVisibilityCoordinator};
pub use element::{ElementId, ElementStore, TrackedElement, VisibilitySet};
pub use event_loop::EventLoop;
pub use geometry::Rect;
pub use observer::{IntersectionEntry, ObserverOptions, Transition, VisibilityObserver};
pub use report::{NullSink, Report, ReportEntry, ReportSink, ReportStore};
pub use timers::{TimerFacility, TimerHandle, TimerRegistry};
pub use tracker::{PageEvent, ViewabilityTracker};

/// Engine error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Element already tracked: {0}")]
    DuplicateElement(ElementId),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
