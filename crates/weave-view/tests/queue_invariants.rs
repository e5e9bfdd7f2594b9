//! Property tests for render queue deduplication over random view trees.

use proptest::prelude::*;
use weave_store::{ElementRef, ModelStore};
use weave_view::{
    EnqueueOutcome, Markup, RenderScheduler, SchedulerConfig, Surface, SurfaceError, ViewId,
    ViewNode,
};
use web_time::Instant;

/// Every anchor resolves.
struct Everywhere;

impl Surface for Everywhere {
    fn resolves(&self, _anchor: &str) -> bool {
        true
    }

    fn patch(&mut self, _anchor: &str, _markup: &Markup) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn element(&self, _anchor: &str) -> Option<ElementRef> {
        None
    }
}

/// `parents[i]` is the parent index of view `i + 1`; view 0 is the root.
fn tree_strategy() -> impl Strategy<Value = Vec<usize>> {
    (1usize..24).prop_flat_map(|n| {
        (0..n)
            .map(|i| 0..=i)
            .collect::<Vec<_>>()
    })
}

fn build(parents: &[usize]) -> (RenderScheduler, Vec<ViewId>) {
    let mut scheduler = RenderScheduler::new(ModelStore::new(), SchedulerConfig::default());
    let ids: Vec<ViewId> = (0..=parents.len())
        .map(|i| ViewId::new(format!("v{i}")).unwrap())
        .collect();
    let mut anchors = vec![String::from("app")];
    scheduler
        .register(ViewNode::new(ids[0].clone(), "app", |_| Markup::default()))
        .unwrap();
    for (i, &p) in parents.iter().enumerate() {
        let anchor = format!("{}/v{}", anchors[p], i + 1);
        scheduler
            .register(
                ViewNode::new(ids[i + 1].clone(), anchor.clone(), |_| Markup::default())
                    .with_parent(ids[p].clone()),
            )
            .unwrap();
        anchors.push(anchor);
    }
    let report = scheduler.flush(&mut Everywhere, Instant::now());
    assert_eq!(report.rendered.len(), ids.len());
    assert!(scheduler.queued().is_empty());
    (scheduler, ids)
}

proptest! {
    #[test]
    fn queue_never_holds_ancestor_and_descendant(
        parents in tree_strategy(),
        picks in proptest::collection::vec(any::<prop::sample::Index>(), 0..40),
    ) {
        let (mut scheduler, ids) = build(&parents);
        for pick in picks {
            let id = pick.get(&ids);
            let outcome = scheduler.enqueue(id);
            prop_assert_ne!(outcome, EnqueueOutcome::Ignored);
            prop_assert_ne!(outcome, EnqueueOutcome::Deferred);

            let queued = scheduler.queued();
            for (i, a) in queued.iter().enumerate() {
                for b in &queued[i + 1..] {
                    prop_assert_ne!(a, b);
                    prop_assert!(!scheduler.is_ancestor(a, b));
                    prop_assert!(!scheduler.is_ancestor(b, a));
                }
            }
            let covered = queued.iter().any(|q| q == id || scheduler.is_ancestor(q, id));
            prop_assert!(covered, "every request is covered by the queue");
        }
    }
}

#[test]
fn chain_collapses_to_root() {
    let (mut scheduler, ids) = build(&[0, 1, 2]);
    for id in ids.iter().rev() {
        scheduler.enqueue(id);
    }
    assert_eq!(scheduler.queued(), [ids[0].clone()]);
}
