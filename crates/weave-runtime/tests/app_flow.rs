//! End-to-end behavior of the application context.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use futures::executor::block_on;
use weave_core::bus::AUTH_LOGOUT;
use weave_core::{ManualClock, Value};
use weave_runtime::{
    App, AppError, AuthEvent, MemoryStorage, Remote, Route, RouteTable, RuntimeConfig,
    SessionStorage, TransportError, load_into,
};
use weave_store::{ElementRef, ModelStore};
use weave_view::{Markup, RenderState, Surface, SurfaceError, ViewId, ViewNode};

/// Surface whose anchors are listed up front; records the last markup per
/// anchor.
#[derive(Clone, Default)]
struct Page {
    content: Rc<RefCell<BTreeMap<String, String>>>,
}

impl Page {
    fn with(anchors: &[&str]) -> Self {
        let page = Self::default();
        for anchor in anchors {
            page.content
                .borrow_mut()
                .insert((*anchor).to_owned(), String::new());
        }
        page
    }

    fn text(&self, anchor: &str) -> Option<String> {
        self.content.borrow().get(anchor).cloned()
    }
}

impl Surface for Page {
    fn resolves(&self, anchor: &str) -> bool {
        self.content.borrow().contains_key(anchor)
    }

    fn patch(&mut self, anchor: &str, markup: &Markup) -> Result<(), SurfaceError> {
        let mut content = self.content.borrow_mut();
        let slot = content
            .get_mut(anchor)
            .ok_or_else(|| SurfaceError::AnchorNotFound(anchor.to_owned()))?;
        markup.content().clone_into(slot);
        Ok(())
    }

    fn element(&self, _anchor: &str) -> Option<ElementRef> {
        None
    }
}

fn vid(id: &str) -> ViewId {
    ViewId::new(id).unwrap()
}

fn counter() -> ViewNode {
    ViewNode::new(vid("counter"), "app", |scope| {
        Markup::new(format!(
            "count={}",
            scope.state().property("count").cloned().unwrap_or_default()
        ))
    })
    .with_state(Value::from_pairs([("count", 0)]))
}

#[test]
fn registration_renders_root_on_first_tick() {
    let page = Page::with(&["app"]);
    let clock = ManualClock::new();
    let mut app = App::new(RuntimeConfig::default(), page.clone(), clock.clone());
    app.register(counter()).unwrap();
    assert_eq!(app.render_state(&vid("counter")), RenderState::Registered);

    let report = app.tick();
    assert!(report.rendered("counter"));
    assert_eq!(page.text("app").as_deref(), Some("count=0"));
    assert_eq!(app.render_state(&vid("counter")), RenderState::Rendered);
}

#[test]
fn burst_of_state_writes_renders_once() {
    let page = Page::with(&["app"]);
    let clock = ManualClock::new();
    let mut app = App::new(RuntimeConfig::default(), page.clone(), clock.clone());
    app.register(counter()).unwrap();
    app.tick();

    for n in 1..=5 {
        app.set_state(&vid("counter"), "count", n.into()).unwrap();
        clock.advance(Duration::from_millis(3));
        assert!(app.tick().is_empty(), "window keeps resetting");
    }
    clock.advance(Duration::from_millis(18));
    let report = app.tick();
    assert_eq!(report.rendered, [vid("counter")]);
    assert_eq!(page.text("app").as_deref(), Some("count=5"));
    assert!(app.tick().is_empty());
    assert_eq!(
        app.scheduler().node("counter").map(ViewNode::render_count),
        Some(2)
    );
}

#[test]
fn set_state_errors() {
    let mut app = App::new(RuntimeConfig::default(), Page::with(&["app"]), ManualClock::new());
    app.register(counter()).unwrap();
    assert!(matches!(
        app.set_state(&vid("counter"), "missing", 1.into()),
        Err(AppError::Store(_))
    ));
    assert!(matches!(
        app.set_state(&vid("ghost"), "count", 1.into()),
        Err(AppError::View(_))
    ));
    assert_eq!(app.state(&vid("counter"), "count"), Some(Value::Int(0)));
}

#[test]
fn undo_of_view_state_rerenders() {
    let page = Page::with(&["app"]);
    let clock = ManualClock::new();
    let mut app = App::new(RuntimeConfig::default(), page.clone(), clock.clone());
    app.register(counter()).unwrap();
    app.set_state(&vid("counter"), "count", 9.into()).unwrap();
    app.tick();
    assert_eq!(page.text("app").as_deref(), Some("count=9"));
    clock.advance(Duration::from_millis(20));
    app.tick();

    assert!(app.store().undo("view:counter"));
    app.tick();
    assert_eq!(page.text("app").as_deref(), Some("count=9"), "still debouncing");
    clock.advance(Duration::from_millis(20));
    app.tick();
    assert_eq!(page.text("app").as_deref(), Some("count=0"));
}

// -- collaborators ----------------------------------------------------------

struct Backend {
    store: ModelStore,
    drop_target: bool,
}

impl Remote for Backend {
    async fn invoke(&self, action: &str, params: Value) -> Result<Value, TransportError> {
        if self.drop_target {
            self.store.destroy("orders");
        }
        match action {
            "orders.list" => Ok(Value::List(vec![params])),
            _ => Err(TransportError::Status {
                code: 404,
                message: format!("no action {action}"),
            }),
        }
    }
}

#[test]
fn load_into_writes_result() {
    let store = ModelStore::new();
    store.set("orders", Value::list()).unwrap();
    let backend = Backend {
        store: store.clone(),
        drop_target: false,
    };
    let stored = block_on(load_into(&backend, &store, "orders", "orders.list", 7.into())).unwrap();
    assert!(stored);
    assert_eq!(store.get("orders"), Some(Value::List(vec![Value::Int(7)])));
}

#[test]
fn load_into_discards_when_record_destroyed_in_flight() {
    let store = ModelStore::new();
    store.set("orders", Value::list()).unwrap();
    let backend = Backend {
        store: store.clone(),
        drop_target: true,
    };
    let stored = block_on(load_into(&backend, &store, "orders", "orders.list", 7.into())).unwrap();
    assert!(!stored);
    assert!(!store.contains("orders"));
}

#[test]
fn load_into_surfaces_transport_errors() {
    let store = ModelStore::new();
    store.set("orders", Value::list()).unwrap();
    let backend = Backend {
        store: store.clone(),
        drop_target: false,
    };
    let err = block_on(load_into(&backend, &store, "orders", "nope", Value::Null)).unwrap_err();
    assert!(matches!(
        err,
        AppError::Transport(TransportError::Status { code: 404, .. })
    ));
    assert_eq!(store.history_len("orders"), Some(1));
}

#[test]
fn navigate_runs_handler_or_publishes() {
    let visits = Rc::new(Cell::new(0));
    let v = Rc::clone(&visits);
    let app = App::new(RuntimeConfig::default(), Page::default(), ManualClock::new()).with_router(
        RouteTable::new()
            .route("/home", Route::handler(move |_| v.set(v.get() + 1)))
            .route("/orders/*", Route::topic("nav.orders")),
    );
    let published = Rc::new(RefCell::new(Vec::new()));
    let p = Rc::clone(&published);
    let _handle = app
        .bus()
        .subscribe("nav.orders", move |params| p.borrow_mut().push(params.clone()));

    app.navigate("/home", &Value::Null).unwrap();
    app.navigate("/orders/3", &Value::from("3")).unwrap();
    assert_eq!(visits.get(), 1);
    assert_eq!(*published.borrow(), [Value::from("3")]);
    assert_eq!(
        app.navigate("/elsewhere", &Value::Null),
        Err(AppError::NoRoute("/elsewhere".into()))
    );
}

#[test]
fn session_seeds_and_clears_on_logout() {
    let mut storage = MemoryStorage::new();
    storage.set("token", r#""t-1""#.into());
    let mut app = App::new(RuntimeConfig::default(), Page::default(), ManualClock::new());
    assert_eq!(app.attach_session(storage.clone()), 1);
    assert_eq!(app.store().get("token"), Some(Value::from("t-1")));

    app.store()
        .set("user", Value::from_pairs([("name", "Ada")]))
        .unwrap();
    assert_eq!(storage.len(), 2);

    assert_eq!(AuthEvent::Logout.topic(), AUTH_LOGOUT);
    AuthEvent::Logout.announce(app.bus(), &Value::Null);
    assert!(storage.is_empty());
    assert!(!app.store().contains("user"));
    assert!(!app.store().contains("token"));
}
