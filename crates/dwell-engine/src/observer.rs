//! Visibility Observer
//!
//! Watches campaign elements against the viewport and reports when they
//! become fully visible or fully hidden. Partial visibility is ignored.

use std::collections::{BTreeMap, HashMap};

use crate::clock::Timestamp;
use crate::element::ElementId;
use crate::geometry::Rect;
use crate::EngineError;

/// Intersection observer options
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOptions {
    /// Root margin in pixels (root is always the viewport)
    pub root_margin: f32,
    /// Thresholds to trigger entries
    pub thresholds: Vec<f32>,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            root_margin: 0.0,
            thresholds: vec![0.0, 1.0],
        }
    }
}

impl ObserverOptions {
    pub fn validate(&self) -> Result<(), EngineError> {
        if let Some(bad) = self.thresholds.iter().find(|t| !(0.0..=1.0).contains(*t)) {
            return Err(EngineError::Setup(format!("threshold {bad} outside [0, 1]")));
        }
        if !self.thresholds.contains(&0.0) || !self.thresholds.contains(&1.0) {
            return Err(EngineError::Setup(
                "thresholds must include 0 and 1 to detect full transitions".into(),
            ));
        }
        Ok(())
    }

    /// Index of the threshold band `ratio` falls into
    fn band(&self, ratio: f32) -> usize {
        if ratio <= 0.0 {
            return 0;
        }
        self.thresholds.iter().filter(|&&t| t <= ratio).count()
    }
}

/// Intersection change delivered by the viewport source
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub target: ElementId,
    pub intersection_ratio: f32,
    pub time: Timestamp,
}

impl IntersectionEntry {
    pub fn new(target: impl Into<ElementId>, intersection_ratio: f32, time: Timestamp) -> Self {
        Self {
            target: target.into(),
            intersection_ratio,
            time,
        }
    }

    /// Full-enter / full-exit this entry represents, if any
    pub fn transition(&self) -> Option<Transition> {
        classify(self)
    }
}

/// Full visibility transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    FullyEntered { target: ElementId, time: Timestamp },
    FullyExited { target: ElementId, time: Timestamp },
}

impl Transition {
    pub fn target(&self) -> &ElementId {
        match self {
            Transition::FullyEntered { target, .. } | Transition::FullyExited { target, .. } => {
                target
            }
        }
    }
}

/// Map an entry to a transition. Only ratios of exactly 1 and 0 count.
pub fn classify(entry: &IntersectionEntry) -> Option<Transition> {
    if entry.intersection_ratio == 1.0 {
        Some(Transition::FullyEntered {
            target: entry.target.clone(),
            time: entry.time,
        })
    } else if entry.intersection_ratio == 0.0 {
        Some(Transition::FullyExited {
            target: entry.target.clone(),
            time: entry.time,
        })
    } else {
        None
    }
}

/// Viewport intersection observer over a fixed set of elements
#[derive(Debug)]
pub struct VisibilityObserver {
    options: ObserverOptions,
    observed: BTreeMap<ElementId, Option<usize>>, // Last threshold band
    pending_entries: Vec<IntersectionEntry>,
}

impl VisibilityObserver {
    pub fn new(options: ObserverOptions) -> Result<Self, EngineError> {
        options.validate()?;
        Ok(Self {
            options,
            observed: BTreeMap::new(),
            pending_entries: Vec::new(),
        })
    }

    pub fn options(&self) -> &ObserverOptions {
        &self.options
    }

    /// Observe an element
    pub fn observe(&mut self, target: ElementId) -> Result<(), EngineError> {
        if self.observed.contains_key(&target) {
            return Err(EngineError::DuplicateElement(target));
        }
        self.observed.insert(target, None);
        Ok(())
    }

    /// Stop observing
    pub fn unobserve(&mut self, target: &ElementId) {
        self.observed.remove(target);
        self.pending_entries.retain(|e| &e.target != target);
    }

    /// Disconnect all
    pub fn disconnect(&mut self) {
        self.observed.clear();
        self.pending_entries.clear();
    }

    pub fn is_observing(&self, target: &ElementId) -> bool {
        self.observed.contains_key(target)
    }

    pub fn observed(&self) -> impl Iterator<Item = &ElementId> {
        self.observed.keys()
    }

    /// Check intersections for every observed element with a known rect.
    ///
    /// An entry is queued the first time an element is evaluated and
    /// afterwards whenever its ratio crosses a threshold.
    pub fn check_intersections(
        &mut self,
        viewport: Rect,
        element_rects: &HashMap<ElementId, Rect>,
        time: Timestamp,
    ) {
        let root = viewport.expand(self.options.root_margin);

        for (target, last_band) in &mut self.observed {
            let Some(rect) = element_rects.get(target) else {
                continue;
            };
            let ratio = rect.intersection_ratio(&root);
            let band = self.options.band(ratio);

            if *last_band != Some(band) {
                *last_band = Some(band);
                tracing::trace!("{} crossed into band {} (ratio {:.3})", target, band, ratio);
                self.pending_entries.push(IntersectionEntry {
                    target: target.clone(),
                    intersection_ratio: ratio,
                    time,
                });
            }
        }
    }

    /// Take pending entries
    pub fn take_entries(&mut self) -> Vec<IntersectionEntry> {
        std::mem::take(&mut self.pending_entries)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::new(0.0, 0.0, 800.0, 600.0)
    }

    fn observer_with(id: &str) -> VisibilityObserver {
        let mut observer = VisibilityObserver::new(ObserverOptions::default()).unwrap();
        observer.observe(id.into()).unwrap();
        observer
    }

    #[test]
    fn test_classify() {
        let t = Timestamp::from_millis(10);
        assert!(matches!(
            IntersectionEntry::new("a", 1.0, t).transition(),
            Some(Transition::FullyEntered { .. })
        ));
        assert!(matches!(
            IntersectionEntry::new("a", 0.0, t).transition(),
            Some(Transition::FullyExited { .. })
        ));
        let exit = IntersectionEntry::new("b", 0.0, t).transition().unwrap();
        assert_eq!(exit.target(), &ElementId::from("b"));
        assert_eq!(IntersectionEntry::new("a", 0.99, t).transition(), None);
        assert_eq!(IntersectionEntry::new("a", 0.01, t).transition(), None);
    }

    #[test]
    fn test_initial_evaluation_always_reports() {
        let mut observer = observer_with("a");
        let mut rects = HashMap::new();
        rects.insert(ElementId::from("a"), Rect::new(0.0, 2000.0, 100.0, 100.0));

        observer.check_intersections(viewport(), &rects, Timestamp::ZERO);
        let entries = observer.take_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].intersection_ratio, 0.0);
    }

    #[test]
    fn test_scroll_through_reports_each_band_once() {
        let mut observer = observer_with("a");
        let mut rects = HashMap::new();
        let id = ElementId::from("a");

        // Out, partial, full, full again, partial, out
        let positions = [700.0, 550.0, 100.0, 120.0, -50.0, -200.0];
        let mut ratios = Vec::new();
        for (i, y) in positions.into_iter().enumerate() {
            rects.insert(id.clone(), Rect::new(0.0, y, 100.0, 100.0));
            observer.check_intersections(viewport(), &rects, Timestamp::from_millis(i as u64));
            ratios.extend(observer.take_entries().into_iter().map(|e| e.intersection_ratio));
        }

        assert_eq!(ratios, vec![0.0, 0.5, 1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_root_margin_extends_viewport() {
        let options = ObserverOptions { root_margin: 50.0, ..Default::default() };
        let mut observer = VisibilityObserver::new(options).unwrap();
        observer.observe("a".into()).unwrap();

        let mut rects = HashMap::new();
        rects.insert(ElementId::from("a"), Rect::new(0.0, 560.0, 100.0, 80.0));
        observer.check_intersections(viewport(), &rects, Timestamp::ZERO);

        assert_eq!(observer.take_entries()[0].intersection_ratio, 1.0);
    }

    #[test]
    fn test_duplicate_observe_fails() {
        let mut observer = observer_with("a");
        assert!(matches!(
            observer.observe("a".into()),
            Err(EngineError::DuplicateElement(_))
        ));
    }

    #[test]
    fn test_invalid_thresholds() {
        let options = ObserverOptions { thresholds: vec![0.0, 1.5], ..Default::default() };
        assert!(VisibilityObserver::new(options).is_err());

        let options = ObserverOptions { thresholds: vec![1.0], ..Default::default() };
        assert!(VisibilityObserver::new(options).is_err());
    }

    #[test]
    fn test_unobserve_drops_pending() {
        let mut observer = observer_with("a");
        let mut rects = HashMap::new();
        rects.insert(ElementId::from("a"), Rect::new(0.0, 0.0, 10.0, 10.0));
        observer.check_intersections(viewport(), &rects, Timestamp::ZERO);
        assert!(observer.has_pending());

        observer.unobserve(&"a".into());
        assert!(!observer.has_pending());
        assert!(!observer.is_observing(&"a".into()));
    }
}
