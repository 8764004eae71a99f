//! Page Model
//!
//! A scrollable page holding campaign boxes, observed against the window.

use std::collections::HashMap;

use dwell_engine::{
    ElementId, EngineError, IntersectionEntry, ObserverOptions, Rect, Timestamp, VisibilityObserver,
};
use serde::Deserialize;

/// Window size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Campaign box in page coordinates
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Campaign {
    pub id: ElementId,
    pub rect: Rect,
}

/// Static page layout
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageLayout {
    pub viewport: Size,
    pub campaigns: Vec<Campaign>,
}

/// Page with a scroll position and an observer over its campaigns
#[derive(Debug)]
pub struct Page {
    layout: PageLayout,
    scroll_y: f32,
    rects: HashMap<ElementId, Rect>,
    observer: VisibilityObserver,
}

impl Page {
    pub fn new(layout: PageLayout, options: ObserverOptions) -> Result<Self, EngineError> {
        if layout.viewport.width <= 0.0 || layout.viewport.height <= 0.0 {
            return Err(EngineError::Setup("viewport has no area".into()));
        }

        let mut observer = VisibilityObserver::new(options)?;
        for campaign in &layout.campaigns {
            observer.observe(campaign.id.clone())?;
        }

        let mut page = Self {
            layout,
            scroll_y: 0.0,
            rects: HashMap::new(),
            observer,
        };
        page.layout_rects();
        Ok(page)
    }

    pub fn campaign_ids(&self) -> impl Iterator<Item = &ElementId> {
        self.layout.campaigns.iter().map(|c| &c.id)
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    /// Scroll so that page offset `y` is at the top of the window
    pub fn scroll_to(&mut self, y: f32) {
        self.scroll_y = y.max(0.0);
        self.layout_rects();
    }

    /// Window rect in viewport coordinates
    pub fn viewport(&self) -> Rect {
        Rect::new(0.0, 0.0, self.layout.viewport.width, self.layout.viewport.height)
    }

    /// Evaluate intersections at the current scroll position
    pub fn observe(&mut self, time: Timestamp) -> Vec<IntersectionEntry> {
        let viewport = self.viewport();
        self.observer.check_intersections(viewport, &self.rects, time);
        self.observer.take_entries()
    }

    fn layout_rects(&mut self) {
        self.rects = self
            .layout
            .campaigns
            .iter()
            .map(|c| (c.id.clone(), c.rect.translate(0.0, -self.scroll_y)))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> PageLayout {
        PageLayout {
            viewport: Size { width: 800.0, height: 600.0 },
            campaigns: vec![
                Campaign { id: "top".into(), rect: Rect::new(0.0, 100.0, 300.0, 200.0) },
                Campaign { id: "bottom".into(), rect: Rect::new(0.0, 1500.0, 300.0, 200.0) },
            ],
        }
    }

    #[test]
    fn test_initial_observation_reports_every_campaign() {
        let mut page = Page::new(layout(), ObserverOptions::default()).unwrap();
        let entries = page.observe(Timestamp::ZERO);

        let ratios: HashMap<_, _> = entries
            .into_iter()
            .map(|e| (e.target.as_str().to_string(), e.intersection_ratio))
            .collect();
        assert_eq!(ratios["top"], 1.0);
        assert_eq!(ratios["bottom"], 0.0);
    }

    #[test]
    fn test_scroll_swaps_visibility() {
        let mut page = Page::new(layout(), ObserverOptions::default()).unwrap();
        page.observe(Timestamp::ZERO);

        page.scroll_to(1200.0);
        let entries = page.observe(Timestamp::from_millis(10));

        assert_eq!(entries.len(), 2);
        for entry in entries {
            match entry.target.as_str() {
                "top" => assert_eq!(entry.intersection_ratio, 0.0),
                "bottom" => assert_eq!(entry.intersection_ratio, 1.0),
                other => panic!("unexpected entry for {other}"),
            }
        }
    }

    #[test]
    fn test_negative_scroll_clamped() {
        let mut page = Page::new(layout(), ObserverOptions::default()).unwrap();
        page.scroll_to(-50.0);
        assert_eq!(page.scroll_y(), 0.0);
    }

    #[test]
    fn test_empty_viewport_rejected() {
        let mut bad = layout();
        bad.viewport.height = 0.0;
        assert!(matches!(
            Page::new(bad, ObserverOptions::default()),
            Err(EngineError::Setup(_))
        ));
    }

    #[test]
    fn test_duplicate_campaign_rejected() {
        let mut bad = layout();
        bad.campaigns[1].id = "top".into();
        assert!(matches!(
            Page::new(bad, ObserverOptions::default()),
            Err(EngineError::DuplicateElement(_))
        ));
    }
}
