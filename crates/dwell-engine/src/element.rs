//! Tracked Elements
//!
//! Per-element accounting records and the set of fully visible elements.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::timers::TimerHandle;
use crate::EngineError;

/// Stable element identity (the campaign's DOM id)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Accounting state of one observed element
#[derive(Debug, Clone)]
pub struct TrackedElement {
    pub id: ElementId,
    /// Time spent fully visible in a foreground document
    pub total_view_time: Duration,
    /// Last full-enter or accumulation checkpoint
    pub last_view_started: Option<Timestamp>,
    /// Active accumulation timer
    pub timer: Option<TimerHandle>,
    /// Last value written to the report
    pub last_formatted: Option<String>,
}

impl TrackedElement {
    pub fn new(id: ElementId) -> Self {
        Self {
            id,
            total_view_time: Duration::ZERO,
            last_view_started: None,
            timer: None,
            last_formatted: None,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.timer.is_some()
    }
}

/// Owner of every tracked element, keyed by id
#[derive(Debug, Default)]
pub struct ElementStore {
    elements: HashMap<ElementId, TrackedElement>,
    order: Vec<ElementId>,
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element with a zero total
    pub fn insert(&mut self, id: ElementId) -> Result<(), EngineError> {
        if self.elements.contains_key(&id) {
            return Err(EngineError::DuplicateElement(id));
        }
        self.order.push(id.clone());
        self.elements.insert(id.clone(), TrackedElement::new(id));
        Ok(())
    }

    pub fn get(&self, id: &ElementId) -> Option<&TrackedElement> {
        self.elements.get(id)
    }

    pub fn get_mut(&mut self, id: &ElementId) -> Option<&mut TrackedElement> {
        self.elements.get_mut(id)
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Elements in registration order
    pub fn iter(&self) -> impl Iterator<Item = &TrackedElement> {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }
}

/// Ids of elements currently fully in the viewport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilitySet {
    members: BTreeSet<ElementId>,
}

impl VisibilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if already present
    pub fn insert(&mut self, id: ElementId) -> bool {
        self.members.insert(id)
    }

    /// Returns false if absent
    pub fn remove(&mut self, id: &ElementId) -> bool {
        self.members.remove(id)
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementId> {
        self.members.iter()
    }

    /// Move all members out, leaving the set empty
    pub fn take(&mut self) -> VisibilitySet {
        std::mem::take(self)
    }
}

impl FromIterator<ElementId> for VisibilitySet {
    fn from_iter<I: IntoIterator<Item = ElementId>>(iter: I) -> Self {
        Self { members: iter.into_iter().collect() }
    }
}
