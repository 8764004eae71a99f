//! View-Time Report
//!
//! Latest formatted total per element, in first-seen order.

use serde::Serialize;

use crate::element::ElementId;

/// Report line for one element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub campaign: ElementId,
    pub total_view_time: String,
}

/// Point-in-time copy of the report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
}

impl Report {
    pub fn get(&self, id: &ElementId) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| &e.campaign == id)
            .map(|e| e.total_view_time.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON array of `{ "campaign", "totalViewTime" }` objects
    pub fn to_json(&self) -> String {
        // A Vec of plain string fields always serializes
        serde_json::to_string(self).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Upsert-only store behind the report
#[derive(Debug, Default)]
pub struct ReportStore {
    entries: Vec<ReportEntry>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `id`
    pub fn upsert(&mut self, id: &ElementId, formatted: &str) {
        match self.entries.iter_mut().find(|e| &e.campaign == id) {
            Some(entry) => entry.total_view_time = formatted.to_string(),
            None => self.entries.push(ReportEntry {
                campaign: id.clone(),
                total_view_time: formatted.to_string(),
            }),
        }
    }

    pub fn get(&self, id: &ElementId) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| &e.campaign == id)
            .map(|e| e.total_view_time.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Report {
        Report { entries: self.entries.clone() }
    }
}

/// Where report output goes
pub trait ReportSink {
    /// Update the visible label of one element
    fn render_label(&mut self, element: &ElementId, label: &str);

    /// Receive the full report when the document is backgrounded
    fn publish_snapshot(&mut self, report: &Report);
}

/// Discards all output
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn render_label(&mut self, _element: &ElementId, _label: &str) {}

    fn publish_snapshot(&mut self, _report: &Report) {}
}
