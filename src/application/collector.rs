//! Scroll-driven collection over a virtualized message list.
//!
//! Virtualized lists drop off-screen nodes, so no single snapshot holds the
//! whole conversation. The collector sweeps the list to the top (where older
//! history gets loaded), then back to the bottom, scanning after each scroll
//! and merging every pass into one identity-keyed [`Accumulator`].

use std::fmt::Display;

use chrono::{Local, TimeZone};
use tokio::time::sleep;

use crate::domain::{
    AppError, CollectionReport, CollectorConfig, MessageRecord, Result, ScrollSurface,
};

use super::accumulator::Accumulator;
use super::extractor::MessageExtractor;

/// Offsets closer than this are the same position.
const OFFSET_EPSILON: f64 = 0.5;

/// Transcript and statistics of a finished run.
#[derive(Debug, Clone)]
pub struct Collection {
    pub records: Vec<MessageRecord>,
    pub report: CollectionReport,
}

/// Drives a [`ScrollSurface`] through its full scroll range.
#[derive(Debug, Clone)]
pub struct ScrollCollector<Tz: TimeZone = Local> {
    config: CollectorConfig,
    extractor: MessageExtractor<Tz>,
}

impl<Tz> ScrollCollector<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    #[must_use]
    pub const fn new(config: CollectorConfig, extractor: MessageExtractor<Tz>) -> Self {
        Self { config, extractor }
    }

    pub const fn extractor(&self) -> &MessageExtractor<Tz> {
        &self.extractor
    }

    /// Finds the scrollable message list.
    ///
    /// Known container markers are tried in order; otherwise the first element
    /// that scrolls vertically and holds message-like descendants is used.
    ///
    /// # Errors
    /// Returns `ContainerNotFound` if nothing qualifies.
    pub fn locate_container<S: ScrollSurface + ?Sized>(&self, surface: &S) -> Result<S::Node> {
        let markers = self.extractor.markers();

        for selector in &markers.containers {
            if let Some(found) = surface.query(selector) {
                tracing::debug!(%selector, "Found scroll container");
                return Ok(found);
            }
        }

        let mut stack = vec![surface.root()];
        while let Some(node) = stack.pop() {
            if surface.is_vertically_scrollable(node)
                && surface.contains_match(node, &markers.message_hint)
            {
                tracing::debug!(?node, "Found scroll container by probing");
                return Ok(node);
            }
            stack.extend(surface.children(node).into_iter().rev());
        }

        Err(AppError::ContainerNotFound)
    }

    /// Collects every message reachable by scrolling.
    ///
    /// The surface is borrowed for the whole run, so passes never overlap.
    /// Dropping the returned future abandons the run; nothing partial escapes.
    ///
    /// # Errors
    /// Returns `ContainerNotFound` if no message list can be located.
    pub async fn collect<S: ScrollSurface>(&self, surface: &mut S) -> Result<Collection> {
        let container = self.locate_container(&*surface)?;
        let mut acc = Accumulator::new();

        self.pass(&*surface, &mut acc);
        if acc.is_empty() {
            tracing::debug!("No messages rendered before scrolling");
        }
        tracing::info!(initial = acc.len(), "Starting history collection");

        let (top_iterations, reached_top) = self.sweep_to_top(surface, container, &mut acc).await;
        let (bottom_iterations, reached_bottom) =
            self.sweep_to_bottom(surface, container, &mut acc).await;

        let records = acc.finalize();
        let report = CollectionReport {
            message_count: records.len(),
            top_iterations,
            bottom_iterations,
            reached_top,
            reached_bottom,
        };

        tracing::info!(
            messages = report.message_count,
            top_iterations,
            bottom_iterations,
            "History collection finished"
        );

        Ok(Collection { records, report })
    }

    /// Scrolls to the top until the offset stops moving.
    async fn sweep_to_top<S: ScrollSurface>(
        &self,
        surface: &mut S,
        container: S::Node,
        acc: &mut Accumulator,
    ) -> (usize, bool) {
        let mut last = surface.scroll_top(container);
        let mut unchanged = 0;

        for i in 1..=self.config.max_top_iterations {
            surface.set_scroll_top(container, 0.0);
            sleep(self.config.top_settle()).await;
            self.pass(&*surface, acc);

            let now = surface.scroll_top(container);
            if (now - last).abs() < OFFSET_EPSILON {
                unchanged += 1;
                if unchanged >= self.config.stable_top_checks {
                    tracing::debug!(iterations = i, "Top reached");
                    return (i, true);
                }
            } else {
                unchanged = 0;
            }
            last = now;
        }

        tracing::warn!(
            max = self.config.max_top_iterations,
            "Top sweep hit its iteration bound"
        );
        (self.config.max_top_iterations, false)
    }

    /// Scrolls back down, picking up whatever the top sweep skipped.
    async fn sweep_to_bottom<S: ScrollSurface>(
        &self,
        surface: &mut S,
        container: S::Node,
        acc: &mut Accumulator,
    ) -> (usize, bool) {
        sleep(self.config.bottom_pause()).await;

        for i in 1..=self.config.max_bottom_iterations {
            let extent = surface.scroll_height(container);
            surface.set_scroll_top(container, extent);
            sleep(self.config.bottom_settle()).await;
            self.pass(&*surface, acc);

            let reached = surface.scroll_top(container) + surface.client_height(container)
                >= surface.scroll_height(container) - self.config.bottom_tolerance_px;
            if reached {
                tracing::debug!(iterations = i, "Bottom reached");
                return (i, true);
            }
        }

        tracing::warn!(
            max = self.config.max_bottom_iterations,
            "Bottom sweep hit its iteration bound"
        );
        (self.config.max_bottom_iterations, false)
    }

    fn pass<S: ScrollSurface + ?Sized>(&self, surface: &S, acc: &mut Accumulator) {
        let added = acc.merge(self.extractor.scan(surface));
        tracing::debug!(added, total = acc.len(), "Merged scan");
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{DomTree, ExtractorConfig, MarkerConfig};
    use crate::infrastructure::{Document, NodeId};

    const HEIGHT: f64 = 5000.0;
    const CLIENT: f64 = 500.0;

    /// Surface whose offset keeps moving for the first `moving_for`
    /// scroll-to-top requests and then stays put. Content grows by
    /// `growth_per_bottom` after every scroll-to-bottom.
    struct ScriptedSurface {
        doc: Document,
        container: NodeId,
        offset: f64,
        top_requests: usize,
        moving_for: usize,
        bottom_requests: usize,
        growth_per_bottom: f64,
        grown: f64,
        scrollable: bool,
    }

    impl ScriptedSurface {
        fn new(moving_for: usize, container_attrs: &[(&str, &str)]) -> Self {
            let mut doc = Document::new("body");
            let root = doc.root_id();
            let container = doc.append(root, "div", container_attrs, None);
            let row = doc.append(container, "div", &[], None);
            doc.append(row, "span", &[("data-tid", "message-author-name")], Some("Ana"));
            doc.append(row, "time", &[("datetime", "2025-01-01T10:00:00Z")], None);
            doc.append(row, "div", &[("data-tid", "chat-pane-message")], Some("hi"));
            Self {
                doc,
                container,
                offset: HEIGHT - CLIENT,
                top_requests: 0,
                moving_for,
                bottom_requests: 0,
                growth_per_bottom: 0.0,
                grown: 0.0,
                scrollable: true,
            }
        }

        fn listed(moving_for: usize) -> Self {
            Self::new(moving_for, &[("data-tid", "message-pane-list-container")])
        }
    }

    impl DomTree for ScriptedSurface {
        type Node = NodeId;

        fn root(&self) -> NodeId {
            self.doc.root()
        }
        fn parent(&self, node: NodeId) -> Option<NodeId> {
            self.doc.parent(node)
        }
        fn children(&self, node: NodeId) -> Vec<NodeId> {
            self.doc.children(node)
        }
        fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
            self.doc.previous_sibling(node)
        }
        fn tag(&self, node: NodeId) -> &str {
            self.doc.tag(node)
        }
        fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
            self.doc.attr(node, name)
        }
        fn rendered_text(&self, node: NodeId) -> String {
            self.doc.rendered_text(node)
        }
    }

    impl ScrollSurface for ScriptedSurface {
        fn scroll_top(&self, _node: NodeId) -> f64 {
            self.offset
        }

        fn set_scroll_top(&mut self, _node: NodeId, offset: f64) {
            if offset <= 0.0 {
                self.top_requests += 1;
                #[allow(clippy::cast_precision_loss)]
                let step = self.top_requests.min(self.moving_for) as f64;
                self.offset = step;
            } else {
                self.bottom_requests += 1;
                self.offset = HEIGHT + self.grown - CLIENT;
                self.grown += self.growth_per_bottom;
            }
        }

        fn scroll_height(&self, _node: NodeId) -> f64 {
            HEIGHT + self.grown
        }

        fn client_height(&self, _node: NodeId) -> f64 {
            CLIENT
        }

        fn overflows_y(&self, node: NodeId) -> bool {
            self.scrollable && node == self.container
        }
    }

    fn collector(config: CollectorConfig) -> ScrollCollector<Utc> {
        let extractor =
            MessageExtractor::with_timezone(MarkerConfig::default(), ExtractorConfig::default(), Utc);
        ScrollCollector::new(config, extractor)
    }

    #[tokio::test(start_paused = true)]
    async fn test_top_sweep_stops_after_three_unchanged_offsets() {
        for moving_for in [1, 5, 40] {
            let mut surface = ScriptedSurface::listed(moving_for);
            let collection = collector(CollectorConfig::default())
                .collect(&mut surface)
                .await
                .unwrap();

            assert!(collection.report.reached_top);
            assert_eq!(collection.report.top_iterations, moving_for + 3);
            assert_eq!(surface.top_requests, moving_for + 3);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_top_sweep_is_bounded() {
        let mut surface = ScriptedSurface::listed(usize::MAX);
        let collection = collector(CollectorConfig::default())
            .collect(&mut surface)
            .await
            .unwrap();

        assert!(!collection.report.reached_top);
        assert_eq!(surface.top_requests, 300);
        assert_eq!(collection.report.message_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bottom_sweep_stops_at_end() {
        let mut surface = ScriptedSurface::listed(2);
        let collection = collector(CollectorConfig::default())
            .collect(&mut surface)
            .await
            .unwrap();

        assert!(collection.report.reached_bottom);
        assert_eq!(collection.report.bottom_iterations, 1);
        assert_eq!(surface.bottom_requests, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bottom_sweep_is_bounded() {
        let mut surface = ScriptedSurface::listed(1);
        surface.growth_per_bottom = 800.0;

        let collection = collector(CollectorConfig::default())
            .collect(&mut surface)
            .await
            .unwrap();

        assert_eq!(surface.bottom_requests, 50);
        assert_eq!(collection.report.bottom_iterations, 50);
        assert!(!collection.report.reached_bottom);
        assert!(collection.report.reached_top);
        assert_eq!(collection.report.message_count, 1);
        assert_eq!(collection.records[0].content, "hi");
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delays_are_waited() {
        let start = tokio::time::Instant::now();
        let mut surface = ScriptedSurface::listed(1);
        collector(CollectorConfig::default())
            .collect(&mut surface)
            .await
            .unwrap();

        // 4 top passes, the pause, 1 bottom pass.
        let expected = std::time::Duration::from_millis(4 * 350 + 500 + 300);
        assert_eq!(start.elapsed(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_message_in_every_pass_is_kept_once() {
        let mut surface = ScriptedSurface::listed(3);
        let collection = collector(CollectorConfig::default())
            .collect(&mut surface)
            .await
            .unwrap();

        assert_eq!(collection.records.len(), 1);
        assert_eq!(collection.records[0].sender, "Ana");
        assert_eq!(collection.records[0].timestamp, "01/01/2025 10:00");
    }

    #[test]
    fn test_locate_by_probing() {
        let surface = ScriptedSurface::new(1, &[("class", "virtual-scroller")]);
        let found = collector(CollectorConfig::default())
            .locate_container(&surface)
            .unwrap();
        assert_eq!(found, surface.container);
    }

    #[tokio::test]
    async fn test_container_not_found() {
        let mut surface = ScriptedSurface::new(1, &[]);
        surface.scrollable = false;

        let result = collector(CollectorConfig::default()).collect(&mut surface).await;
        assert!(matches!(result, Err(AppError::ContainerNotFound)));
        assert_eq!(surface.top_requests, 0);
    }
}
