//! Connector cache with a single invalidation entry point.
//!
//! Endpoint positions come from rendered layout, which can shift for
//! reasons nobody reports (font loading, animation, unrelated reflow).
//! Every trigger (item moved, timeline scrolled, resize, content change,
//! subtree change, fallback tick) funnels into [`ConnectorRenderer::invalidate`];
//! the next [`ConnectorRenderer::recompute`] rebuilds all connectors once.

use crate::connector::{Connector, build_connector};
use smallvec::{SmallVec, smallvec};
use tb_core::{Bounds, ConnectorConfig, Item, ItemId, Timeline};

/// Why a redraw was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawReason {
    ItemMoved(ItemId),
    ContentChanged(ItemId),
    ItemMounted(ItemId),
    ItemRemoved(ItemId),
    TimelineScrolled,
    Resized,
    Structural,
    FallbackTick,
}

pub struct ConnectorRenderer {
    config: ConnectorConfig,
    connectors: Vec<Connector>,
    /// Reasons accumulated since the last recompute.
    pending: SmallVec<[RedrawReason; 4]>,
    last_tick_ms: Option<f64>,
}

impl ConnectorRenderer {
    pub fn new(config: ConnectorConfig) -> Self {
        Self {
            config,
            connectors: Vec::new(),
            // Nothing drawn yet, so the first pass is due.
            pending: smallvec![RedrawReason::Structural],
            last_tick_ms: None,
        }
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn invalidate(&mut self, reason: RedrawReason) {
        if !self.pending.contains(&reason) {
            log::trace!("connectors invalidated: {reason:?}");
            self.pending.push(reason);
        }
    }

    pub fn needs_redraw(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_reasons(&self) -> &[RedrawReason] {
        &self.pending
    }

    /// Low-frequency fallback timer. Returns whether a redraw is due.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let due = match self.last_tick_ms {
            Some(last) => now_ms - last >= self.config.fallback_interval_ms,
            None => true,
        };
        if due {
            self.last_tick_ms = Some(now_ms);
            self.invalidate(RedrawReason::FallbackTick);
        }
        self.needs_redraw()
    }

    /// Rebuild every connector.
    ///
    /// `bounds_of` measures an item's rendered box; `None` means the item is
    /// not mounted yet and its connector is skipped for this pass. Items
    /// whose bound day has no marker in `timeline` are skipped as well.
    pub fn recompute<'a, I, F>(
        &mut self,
        items: I,
        bounds_of: F,
        timeline: &Timeline,
    ) -> &[Connector]
    where
        I: IntoIterator<Item = &'a Item>,
        F: Fn(&Item) -> Option<Bounds>,
    {
        self.connectors.clear();
        for item in items {
            let Some(bounds) = bounds_of(item) else {
                log::debug!("connector skipped: item {} not mounted", item.id());
                continue;
            };
            let Some(marker) = timeline.marker_for(item.bound_date) else {
                log::debug!(
                    "connector skipped: no marker for {} (item {})",
                    item.bound_date,
                    item.id()
                );
                continue;
            };
            self.connectors
                .push(build_connector(item, &bounds, &marker, &self.config));
        }
        log::trace!(
            "recomputed {} connector(s) after {:?}",
            self.connectors.len(),
            self.pending
        );
        self.pending.clear();
        &self.connectors
    }

    /// Connectors from the last recompute.
    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn connector_for(&self, id: ItemId) -> Option<&Connector> {
        self.connectors.iter().find(|c| c.item == id)
    }

    /// Drop the connector of a removed item right away.
    pub fn forget(&mut self, id: ItemId) {
        self.connectors.retain(|c| c.item != id);
        self.invalidate(RedrawReason::ItemRemoved(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tb_core::{ItemContent, ItemKind, NaiveDate, Point, Size, TimelineConfig};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn item(name: &str, date: NaiveDate) -> Item {
        Item::new(
            ItemId::intern(name),
            ItemContent::default_for(ItemKind::Text),
            Point::new(50.0, 300.0),
            date,
        )
    }

    fn sized(item: &Item) -> Option<Bounds> {
        Some(Bounds::from_origin_size(item.position, Size::new(180.0, 60.0)))
    }

    #[test]
    fn fresh_renderer_needs_a_first_pass() {
        let r = ConnectorRenderer::new(ConnectorConfig::default());
        assert!(r.needs_redraw());
    }

    #[test]
    fn recompute_clears_pending_and_skips_unmeasurable() {
        let timeline = Timeline::centered_on(today(), TimelineConfig::default());
        let mounted = item("r-mounted", today());
        let unmounted = item("r-unmounted", today());
        let off_window = item("r-far", NaiveDate::from_ymd_opt(1999, 1, 1).unwrap());

        let mut r = ConnectorRenderer::new(ConnectorConfig::default());
        r.invalidate(RedrawReason::TimelineScrolled);
        let items = [mounted.clone(), unmounted.clone(), off_window];
        let out = r.recompute(
            &items,
            |i| if i.id() == unmounted.id() { None } else { sized(i) },
            &timeline,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].item, mounted.id());
        assert!(!r.needs_redraw());
    }

    #[test]
    fn duplicate_reasons_collapse() {
        let mut r = ConnectorRenderer::new(ConnectorConfig::default());
        let timeline = Timeline::centered_on(today(), TimelineConfig::default());
        r.recompute(std::iter::empty(), sized, &timeline);
        r.invalidate(RedrawReason::Resized);
        r.invalidate(RedrawReason::Resized);
        r.invalidate(RedrawReason::TimelineScrolled);
        assert_eq!(
            r.pending_reasons(),
            &[RedrawReason::Resized, RedrawReason::TimelineScrolled]
        );
    }

    #[test]
    fn fallback_tick_fires_once_per_interval() {
        let mut r = ConnectorRenderer::new(ConnectorConfig::default());
        let timeline = Timeline::centered_on(today(), TimelineConfig::default());
        r.recompute(std::iter::empty(), sized, &timeline);

        assert!(r.tick(0.0));
        r.recompute(std::iter::empty(), sized, &timeline);
        assert!(!r.tick(400.0));
        assert!(!r.tick(999.0));
        assert!(r.tick(1000.0));
    }

    #[test]
    fn forget_drops_connector_immediately() {
        let timeline = Timeline::centered_on(today(), TimelineConfig::default());
        let a = item("r-forget", today());
        let mut r = ConnectorRenderer::new(ConnectorConfig::default());
        r.recompute(std::slice::from_ref(&a), sized, &timeline);
        assert!(r.connector_for(a.id()).is_some());
        r.forget(a.id());
        assert!(r.connector_for(a.id()).is_none());
        assert_eq!(r.pending_reasons(), &[RedrawReason::ItemRemoved(a.id())]);
    }
}
