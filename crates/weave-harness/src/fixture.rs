#![forbid(unsafe_code)]

//! Reference view trees.

use weave_core::{Clock, ManualClock, Value};
use weave_store::ModelStore;
use weave_view::{FlushReport, Markup, RenderScheduler, SchedulerConfig, ViewId, ViewNode};

use crate::surface::MemorySurface;

/// Build a view id, panicking on an invalid one.
#[track_caller]
#[must_use]
pub fn view_id(id: &str) -> ViewId {
    match ViewId::new(id) {
        Ok(id) => id,
        Err(err) => panic!("invalid view id {id:?}: {err}"),
    }
}

/// View that renders `"<id> n=<state.n>"` and declares `slots`.
#[must_use]
pub fn labelled(id: &str, anchor: &str, slots: &[String]) -> ViewNode {
    let slots = slots.to_vec();
    ViewNode::new(view_id(id), anchor, move |scope| {
        let n = scope.state().property("n").cloned().unwrap_or_default();
        slots
            .iter()
            .fold(Markup::new(format!("{} n={n}", scope.id())), |m, slot| {
                m.with_slot(slot.clone())
            })
    })
    .with_state(Value::from_pairs([("n", 0)]))
}

/// A linear view tree: the first name is the root at anchor `app`, and each
/// following view lives in a slot of the one before it.
///
/// [`Chain::build`] flushes once, so every view starts rendered and the
/// queue starts empty.
#[derive(Debug)]
pub struct Chain {
    pub scheduler: RenderScheduler,
    pub surface: MemorySurface,
    pub clock: ManualClock,
    pub ids: Vec<ViewId>,
    pub anchors: Vec<String>,
}

impl Chain {
    pub const ROOT_ANCHOR: &'static str = "app";

    #[must_use]
    pub fn build(names: &[&str]) -> Self {
        Self::build_in(ModelStore::new(), names)
    }

    #[must_use]
    pub fn build_in(store: ModelStore, names: &[&str]) -> Self {
        let mut anchors = Vec::with_capacity(names.len());
        let mut anchor = Self::ROOT_ANCHOR.to_owned();
        for name in names {
            if !anchors.is_empty() {
                anchor = format!("{anchor}/{name}");
            }
            anchors.push(anchor.clone());
        }

        let mut scheduler = RenderScheduler::new(store, SchedulerConfig::default());
        let mut ids = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let slots: Vec<String> = anchors.get(i + 1).cloned().into_iter().collect();
            let mut node = labelled(name, &anchors[i], &slots);
            if let Some(parent) = ids.last() {
                node = node.with_parent(ViewId::clone(parent));
            }
            if let Err(err) = scheduler.register(node) {
                panic!("chain registration of {name:?} failed: {err}");
            }
            ids.push(view_id(name));
        }

        let mut chain = Self {
            scheduler,
            surface: MemorySurface::with_roots([Self::ROOT_ANCHOR]),
            clock: ManualClock::new(),
            ids,
            anchors,
        };
        chain.flush();
        chain.surface.clear_patches();
        chain
    }

    pub fn flush(&mut self) -> FlushReport {
        let now = self.clock.now();
        let mut surface = self.surface.clone();
        self.scheduler.flush(&mut surface, now)
    }

    /// Pump debounced requests at the current clock time.
    pub fn pump(&mut self) -> usize {
        let now = self.clock.now();
        self.scheduler.pump(now)
    }

    #[must_use]
    pub fn id(&self, name: &str) -> ViewId {
        match self.ids.iter().find(|id| id.as_str() == name) {
            Some(id) => id.clone(),
            None => panic!("no view {name:?} in chain"),
        }
    }

    #[must_use]
    pub fn render_count(&self, name: &str) -> u64 {
        self.scheduler
            .node(name)
            .map_or(0, ViewNode::render_count)
    }
}
