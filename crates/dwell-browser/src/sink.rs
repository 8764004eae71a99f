//! Report Output
//!
//! Per-campaign labels and report snapshots, written to the log.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use dwell_engine::{ElementId, Report, ReportSink};

/// Latest label per campaign, shared with the caller
pub type Labels = Rc<RefCell<BTreeMap<ElementId, String>>>;

/// Logs every label change and each backgrounding snapshot
#[derive(Debug, Default, Clone)]
pub struct LogSink {
    labels: Labels,
    snapshots: Rc<RefCell<Vec<Report>>>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the labels; stays valid after the sink is moved
    pub fn labels(&self) -> Labels {
        self.labels.clone()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.borrow().len()
    }

    pub fn last_snapshot(&self) -> Option<Report> {
        self.snapshots.borrow().last().cloned()
    }
}

impl ReportSink for LogSink {
    fn render_label(&mut self, element: &ElementId, label: &str) {
        log::debug!("#{} {}", element, label);
        self.labels.borrow_mut().insert(element.clone(), label.to_string());
    }

    fn publish_snapshot(&mut self, report: &Report) {
        log::info!("Report: {}", report.to_json());
        self.snapshots.borrow_mut().push(report.clone());
    }
}
