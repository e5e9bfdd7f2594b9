#![forbid(unsafe_code)]

//! Render scheduling over a live view tree.

use std::cell::RefCell;
use std::time::Duration;

use weave_core::{ChangeOrigin, Clock, EventEmitter, ManualClock, Value};
use weave_harness::{Chain, MemorySurface, RecordingElement, labelled, view_id};
use weave_runtime::{App, AppError, RuntimeConfig};
use weave_view::{EnqueueOutcome, Lifecycle, RenderState, SurfaceError, ViewNode};

// ============================================================================
// Queue deduplication
// ============================================================================

#[test]
fn descendant_then_root_renders_each_view_once() {
    let mut chain = Chain::build(&["a", "b", "c"]);
    let (a, c) = (chain.id("a"), chain.id("c"));

    assert_eq!(
        chain.scheduler.enqueue(&c),
        EnqueueOutcome::Queued { superseded: 0 }
    );
    assert_eq!(
        chain.scheduler.enqueue(&a),
        EnqueueOutcome::Queued { superseded: 1 }
    );
    assert_eq!(chain.scheduler.queued(), [a]);

    let report = chain.flush();
    assert_eq!(report.rendered, [view_id("a"), view_id("b"), view_id("c")]);
    assert_eq!(chain.surface.patch_count("app"), 1);
    for name in ["a", "b", "c"] {
        assert_eq!(chain.render_count(name), 2, "{name}");
    }
}

#[test]
fn queued_parent_covers_its_child() {
    let mut chain = Chain::build(&["a", "b", "c"]);
    let (b, c) = (chain.id("b"), chain.id("c"));

    chain.scheduler.enqueue(&b);
    assert_eq!(chain.scheduler.enqueue(&c), EnqueueOutcome::AncestorQueued);
    assert_eq!(chain.scheduler.enqueue(&b), EnqueueOutcome::AlreadyQueued);

    let report = chain.flush();
    assert_eq!(report.rendered, [view_id("b"), view_id("c")]);
    assert_eq!(chain.render_count("a"), 1);
    assert_eq!(chain.render_count("b"), 2);
    assert_eq!(chain.render_count("c"), 2);
    assert_eq!(chain.surface.patch_count("app/b/c"), 1);
}

// ============================================================================
// Debounce
// ============================================================================

#[test]
fn five_quick_requests_render_once() {
    let mut chain = Chain::build(&["a", "b"]);
    let b = chain.id("b");

    for _ in 0..5 {
        let now = chain.clock.now();
        assert!(chain.scheduler.request_render(&b, now));
        chain.clock.advance(Duration::from_millis(5));
        assert_eq!(chain.pump(), 0);
    }
    assert!(chain.scheduler.queued().is_empty());

    chain.clock.advance(Duration::from_millis(18));
    assert_eq!(chain.pump(), 1);
    let report = chain.flush();
    assert_eq!(report.rendered, [b]);
    assert_eq!(chain.render_count("b"), 2);
    assert_eq!(chain.pump(), 0);
}

#[test]
fn state_write_rerenders_after_the_window() {
    let mut chain = Chain::build(&["a", "b", "c"]);
    chain.scheduler.store().set("view:c.n", 3.into()).unwrap();
    assert!(chain.scheduler.has_changes());

    assert_eq!(chain.pump(), 0);
    chain.clock.advance(Duration::from_millis(18));
    assert_eq!(chain.pump(), 1);
    chain.flush();
    assert_eq!(chain.surface.text("app/b/c").as_deref(), Some("c n=3"));
    assert_eq!(chain.render_count("b"), 1);
}

#[test]
fn watched_record_rerenders_view() {
    let mut chain = Chain::build(&["a", "b"]);
    let b = chain.id("b");
    chain.scheduler.store().set("cart", Value::list()).unwrap();
    chain.scheduler.watch(&b, "cart").unwrap();

    chain
        .scheduler
        .store()
        .set("cart", Value::List(vec!["pen".into()]))
        .unwrap();
    chain.pump();
    chain.clock.advance(Duration::from_millis(20));
    chain.pump();
    assert_eq!(chain.flush().rendered, [b]);
}

// ============================================================================
// Failures and reentrancy
// ============================================================================

#[test]
fn failed_render_drops_the_subtree() {
    let mut chain = Chain::build(&["a", "b", "c"]);
    let b = chain.id("b");
    chain.surface.remove("app/b");

    chain.scheduler.enqueue(&b);
    let report = chain.flush();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, b);
    assert_eq!(
        report.failed[0].error,
        SurfaceError::AnchorNotFound("app/b".into())
    );
    assert!(!chain.scheduler.contains("b"));
    assert!(!chain.scheduler.contains("c"));
    assert!(!chain.scheduler.store().contains("view:c"));
    assert!(chain.scheduler.node("a").unwrap().children().is_empty());
}

#[test]
fn requests_during_a_flush_run_in_the_next_one() {
    let mut chain = Chain::build(&["a", "b", "c"]);
    let c = chain.id("c");
    chain
        .scheduler
        .node_mut("b")
        .unwrap()
        .on(Lifecycle::Rendered, move |cx| cx.request_render(c.clone()));

    chain.scheduler.enqueue(&chain.id("b"));
    let report = chain.flush();
    assert_eq!(report.rendered, [view_id("b"), view_id("c")]);
    assert!(chain.scheduler.flush_pending());
    assert_eq!(chain.scheduler.queued(), [view_id("c")]);
}

#[test]
fn lifecycle_registration_adds_children_without_queueing_them() {
    let mut chain = Chain::build(&["a"]);
    chain.scheduler.unregister(&view_id("a"));

    let child = RefCell::new(Some(labelled("late", "app/late", &[])));
    let slot = ["app/late".to_owned()];
    let shell = labelled("shell", "app", &slot).with_lifecycle(Lifecycle::Registered, move |cx| {
        if let Some(node) = child.borrow_mut().take() {
            cx.register(node.with_parent(cx.id().clone()));
        }
    });
    chain.scheduler.register(shell).unwrap();

    assert!(chain.scheduler.contains("late"));
    assert_eq!(chain.scheduler.queued(), [view_id("shell")]);
    let report = chain.flush();
    assert_eq!(report.rendered, [view_id("shell"), view_id("late")]);
}

// ============================================================================
// Application context
// ============================================================================

fn app_with(surface: &MemorySurface, clock: &ManualClock) -> App {
    App::new(RuntimeConfig::default(), surface.clone(), clock.clone())
}

#[test]
fn app_binds_surface_elements() {
    let surface = MemorySurface::with_roots(["app", "status"]);
    let status = RecordingElement::new();
    surface.attach("status", status.clone());
    let app = app_with(&surface, &ManualClock::new());

    app.store()
        .set("user", Value::from_pairs([("name", "Ada")]))
        .unwrap();
    assert_eq!(app.bind("user.name", "status"), Ok(true));
    assert_eq!(
        status.received(),
        [(Value::from("Ada"), ChangeOrigin::ProgrammaticSet)]
    );
    assert_eq!(
        app.bind("user.name", "nowhere"),
        Err(AppError::NoElement("nowhere".into()))
    );
}

#[test]
fn transient_view_expires_once_its_anchor_is_gone() {
    let surface = MemorySurface::with_roots(["app", "popup"]);
    let clock = ManualClock::new();
    let mut app = app_with(&surface, &clock);
    app.register(labelled("popup", "popup", &[]).transient())
        .unwrap();
    app.register(labelled("page", "app", &[]).transient())
        .unwrap();
    app.tick();
    let popup = view_id("popup");
    assert_eq!(app.render_state(&popup), RenderState::Rendered);

    surface.remove("popup");
    clock.advance(Duration::from_secs(601));
    app.tick();
    assert_eq!(app.render_state(&popup), RenderState::Unregistered);
    assert!(!app.store().contains("view:popup"));

    let page = app.scheduler().node("page").map(ViewNode::deadline);
    assert_eq!(
        page,
        Some(Some(clock.now() + Duration::from_secs(600))),
        "still-resolving view is re-armed"
    );
}

#[test]
fn tracing_subscriber_sees_flush_spans() {
    let subscriber = tracing_subscriber::registry();
    tracing::subscriber::with_default(subscriber, || {
        let mut chain = Chain::build(&["a", "b"]);
        chain.scheduler.enqueue(&chain.id("a"));
        assert_eq!(chain.flush().rendered.len(), 2);
    });
}
