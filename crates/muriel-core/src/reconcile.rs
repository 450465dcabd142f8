//! Incremental sync of surface drawables against the element list.

use crate::catalog::Catalog;
use crate::element::Element;
use crate::materialize::{MaterializeOutcome, MaterializeRequest, placement_for};
use crate::surface::{DrawableHandle, Surface};
use std::collections::{HashMap, HashSet};

/// Keeps one drawable per element on a [`Surface`].
///
/// New elements are materialized out of band: [`Reconciler::reconcile`]
/// hands back requests stamped with the current generation, and
/// [`Reconciler::apply`] only accepts outcomes from that same generation.
/// Any element-list change bumps the generation, so results computed for an
/// older list are dropped instead of resurrecting removed elements.
#[derive(Debug, Default)]
pub struct Reconciler {
    /// Element id to the drawable currently on the surface.
    index: HashMap<String, DrawableHandle>,
    /// Element id to the generation its materialization was dispatched in.
    pending: HashMap<String, u64>,
    generation: u64,
    disposed: bool,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current reconciliation generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Handle of an element's drawable, if materialized.
    pub fn handle(&self, element_id: &str) -> Option<DrawableHandle> {
        self.index.get(element_id).copied()
    }

    /// Number of materialized elements.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether a materialization for `element_id` is in flight.
    pub fn is_pending(&self, element_id: &str) -> bool {
        self.pending.contains_key(element_id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Diff `elements` against the surface: drop drawables of removed
    /// elements, update survivors in place, and return materialization
    /// requests for elements that have no drawable yet.
    pub fn reconcile(
        &mut self,
        elements: &[Element],
        catalog: &Catalog,
        surface: &mut dyn Surface,
    ) -> Vec<MaterializeRequest> {
        if self.disposed {
            return Vec::new();
        }
        self.generation += 1;

        let target: HashSet<&str> = elements.iter().map(|e| e.id.as_str()).collect();

        let gone: Vec<String> = self
            .index
            .keys()
            .filter(|id| !target.contains(id.as_str()))
            .cloned()
            .collect();
        for id in gone {
            if let Some(handle) = self.index.remove(&id) {
                surface.remove(handle);
            }
        }
        self.pending.retain(|id, _| target.contains(id.as_str()));

        let mut requests = Vec::new();
        for element in elements {
            let Some(symbol) = catalog.get(&element.symbol_id) else {
                log::warn!(
                    "Element {} references unknown symbol {}; skipping",
                    element.id,
                    element.symbol_id
                );
                if let Some(handle) = self.index.remove(&element.id) {
                    surface.remove(handle);
                }
                self.pending.remove(&element.id);
                continue;
            };

            let placement = placement_for(element, symbol);
            match self.index.get(&element.id) {
                Some(&handle) => {
                    surface.update(handle, placement);
                }
                None => {
                    self.pending.insert(element.id.clone(), self.generation);
                    requests.push(MaterializeRequest {
                        generation: self.generation,
                        element_id: element.id.clone(),
                        symbol: symbol.clone(),
                        placement,
                    });
                }
            }
        }
        requests
    }

    /// Accept a finished materialization. Returns false when the outcome
    /// is stale or the reconciler has been disposed.
    pub fn apply(&mut self, outcome: MaterializeOutcome, surface: &mut dyn Surface) -> bool {
        if self.disposed {
            log::debug!(
                "Ignoring materialization of {} after teardown",
                outcome.element_id
            );
            return false;
        }
        let expected = self.pending.get(&outcome.element_id).copied();
        if outcome.generation != self.generation || expected != Some(outcome.generation) {
            log::debug!(
                "Discarding stale materialization of {} (generation {}, current {})",
                outcome.element_id,
                outcome.generation,
                self.generation
            );
            return false;
        }

        self.pending.remove(&outcome.element_id);
        if let Some(old) = self.index.remove(&outcome.element_id) {
            surface.remove(old);
        }
        let handle = surface.insert(outcome.drawable);
        self.index.insert(outcome.element_id, handle);
        true
    }

    /// Remove every element drawable so the next reconcile rebuilds them,
    /// e.g. after the catalog changed.
    pub fn invalidate(&mut self, surface: &mut dyn Surface) {
        for (_, handle) in self.index.drain() {
            surface.remove(handle);
        }
        self.pending.clear();
    }

    /// Tear down: dispose every drawable and ignore all later outcomes.
    pub fn dispose(&mut self, surface: &mut dyn Surface) {
        self.invalidate(surface);
        self.generation += 1;
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::SAMPLE;
    use crate::surface::SceneSurface;
    use kurbo::Point;

    fn element(id: &str, x: f64) -> Element {
        Element::new(id, "outlet-single", Point::new(x, 100.0))
    }

    fn flush(
        reconciler: &mut Reconciler,
        requests: Vec<MaterializeRequest>,
        surface: &mut SceneSurface,
    ) {
        for request in requests {
            assert!(reconciler.apply(request.resolve(), surface));
        }
    }

    #[test]
    fn test_creation_is_deferred() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let mut surface = SceneSurface::new();
        let mut reconciler = Reconciler::new();
        let elements = vec![element("a", 10.0), element("b", 50.0)];

        let requests = reconciler.reconcile(&elements, &catalog, &mut surface);
        assert_eq!(requests.len(), 2);
        assert!(surface.is_empty());
        assert!(reconciler.is_pending("a"));

        flush(&mut reconciler, requests, &mut surface);
        assert_eq!(surface.len(), 2);
        assert_eq!(reconciler.pending_len(), 0);
        let a = reconciler.handle("a").unwrap();
        assert_eq!(surface.get(a).unwrap().element_id, "a");
    }

    #[test]
    fn test_add_one_leaves_others_untouched() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let mut surface = SceneSurface::new();
        let mut reconciler = Reconciler::new();
        let mut elements = vec![element("a", 10.0), element("b", 50.0), element("c", 90.0)];
        let requests = reconciler.reconcile(&elements, &catalog, &mut surface);
        flush(&mut reconciler, requests, &mut surface);
        let before: Vec<_> = ["a", "b", "c"].iter().map(|id| reconciler.handle(id)).collect();
        let inserted = surface.stats().inserted;

        elements.push(element("d", 130.0));
        let requests = reconciler.reconcile(&elements, &catalog, &mut surface);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].element_id, "d");
        flush(&mut reconciler, requests, &mut surface);

        let after: Vec<_> = ["a", "b", "c"].iter().map(|id| reconciler.handle(id)).collect();
        assert_eq!(before, after);
        assert_eq!(surface.stats().inserted, inserted + 1);
        assert_eq!(surface.stats().updated, 0);
    }

    #[test]
    fn test_remove_one() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let mut surface = SceneSurface::new();
        let mut reconciler = Reconciler::new();
        let elements = vec![element("a", 10.0), element("b", 50.0)];
        let requests = reconciler.reconcile(&elements, &catalog, &mut surface);
        flush(&mut reconciler, requests, &mut surface);
        let kept = reconciler.handle("b");

        let requests = reconciler.reconcile(&elements[1..], &catalog, &mut surface);
        assert!(requests.is_empty());
        assert_eq!(surface.len(), 1);
        assert_eq!(surface.stats().removed, 1);
        assert!(reconciler.handle("a").is_none());
        assert_eq!(reconciler.handle("b"), kept);
    }

    #[test]
    fn test_update_in_place() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let mut surface = SceneSurface::new();
        let mut reconciler = Reconciler::new();
        let elements = vec![element("a", 10.0)];
        let requests = reconciler.reconcile(&elements, &catalog, &mut surface);
        flush(&mut reconciler, requests, &mut surface);
        let handle = reconciler.handle("a").unwrap();

        let moved = vec![elements[0].with_position(Point::new(200.0, 200.0)).with_rotation(90.0)];
        let requests = reconciler.reconcile(&moved, &catalog, &mut surface);
        assert!(requests.is_empty());
        assert_eq!(reconciler.handle("a"), Some(handle));
        let drawable = surface.get(handle).unwrap();
        assert_eq!(drawable.placement.center, Point::new(200.0, 200.0));
        assert!((drawable.placement.rotation - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_orphan_is_skipped() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let mut surface = SceneSurface::new();
        let mut reconciler = Reconciler::new();
        let elements = vec![
            Element::new("x", "no-such-symbol", Point::ZERO),
            element("a", 10.0),
        ];
        let requests = reconciler.reconcile(&elements, &catalog, &mut surface);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].element_id, "a");
    }

    #[test]
    fn test_stale_outcome_discarded() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let mut surface = SceneSurface::new();
        let mut reconciler = Reconciler::new();
        let elements = vec![element("a", 10.0)];
        let stale = reconciler.reconcile(&elements, &catalog, &mut surface);

        // The element is deleted before its drawable arrives.
        let requests = reconciler.reconcile(&[], &catalog, &mut surface);
        assert!(requests.is_empty());
        for request in stale {
            assert!(!reconciler.apply(request.resolve(), &mut surface));
        }
        assert!(surface.is_empty());
        assert!(reconciler.handle("a").is_none());
    }

    #[test]
    fn test_in_flight_redispatched_on_new_generation() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let mut surface = SceneSurface::new();
        let mut reconciler = Reconciler::new();
        let first = reconciler.reconcile(&[element("a", 10.0)], &catalog, &mut surface);
        let second = reconciler.reconcile(
            &[element("a", 10.0), element("b", 50.0)],
            &catalog,
            &mut surface,
        );
        assert_eq!(second.len(), 2);
        for request in first {
            assert!(!reconciler.apply(request.resolve(), &mut surface));
        }
        flush(&mut reconciler, second, &mut surface);
        assert_eq!(surface.len(), 2);
    }

    #[test]
    fn test_dispose_ignores_later_outcomes() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let mut surface = SceneSurface::new();
        let mut reconciler = Reconciler::new();
        let done = reconciler.reconcile(&[element("a", 10.0)], &catalog, &mut surface);
        flush(&mut reconciler, done, &mut surface);
        let in_flight = reconciler.reconcile(
            &[element("a", 10.0), element("b", 50.0)],
            &catalog,
            &mut surface,
        );

        reconciler.dispose(&mut surface);
        assert!(surface.is_empty());
        for request in in_flight {
            assert!(!reconciler.apply(request.resolve(), &mut surface));
        }
        assert!(surface.is_empty());
        assert!(
            reconciler
                .reconcile(&[element("c", 1.0)], &catalog, &mut surface)
                .is_empty()
        );
    }
}
