//! dwell Browser - Campaign Viewability Host
//!
//! Hosts a page of campaign boxes and feeds scroll, tab-visibility and
//! timer signals into the dwell engine.
//!
//! # Features
//! - Page layouts with scrollable campaign boxes
//! - Scripted sessions replayed in virtual time or in real time
//! - Labels and backgrounding snapshots written to the log

pub mod cli;
pub mod page;
pub mod runtime;
pub mod session;
pub mod sink;

pub use cli::CliArgs;
pub use page::{Campaign, Page, PageLayout, Size};
pub use runtime::run_realtime;
pub use session::{run_simulated, SessionScript, SessionSummary, Step};
pub use sink::LogSink;

use dwell_engine::EngineError;

/// Session error
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid session file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("{0}\n{usage}", usage = cli::USAGE)]
    Usage(String),
}
