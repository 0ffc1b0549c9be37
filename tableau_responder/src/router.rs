// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The event router: handler tables, dispatch and the pointer pipeline.

use core::fmt;

use hashbrown::HashMap;
use kurbo::Point;
use smallvec::{SmallVec, smallvec};
use tableau_scene::{NodeChain, NodeId, Stage, Surface};
use tableau_surface::RasterSurface;

use crate::dispatcher;
use crate::types::{Event, EventType, Outcome};

/// A registered handler. It may mutate the stage; it cannot reach the router.
pub type Callback<S> = Box<dyn FnMut(&mut Event, &mut Stage<S>)>;

/// Handle for one [`Router::on`] registration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Router tunables.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RouterConfig {
    /// Longest gap between two clicks (or taps) on one shape that still counts
    /// as a double click, in milliseconds.
    pub double_click_window: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            double_click_window: 400.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Binding {
    kind: EventType,
    namespace: Option<String>,
}

impl Binding {
    fn parse(token: &str) -> Option<Self> {
        let (kind, namespace) = match token.split_once('.') {
            Some((kind, ns)) => (kind, Some(ns).filter(|ns| !ns.is_empty())),
            None => (token, None),
        };
        if kind.is_empty() {
            tracing::debug!(token, "listener binding without an event type ignored");
            return None;
        }
        Some(Self {
            kind: EventType::parse(kind),
            namespace: namespace.map(Into::into),
        })
    }
}

/// A removal pattern: `type`, `.namespace` or `type.namespace`.
#[derive(Debug)]
struct Pattern<'a> {
    kind: Option<EventType>,
    namespace: Option<&'a str>,
}

impl<'a> Pattern<'a> {
    fn parse(token: &'a str) -> Option<Self> {
        let (kind, namespace) = token.split_once('.').unwrap_or((token, ""));
        let pattern = Self {
            kind: (!kind.is_empty()).then(|| EventType::parse(kind)),
            namespace: (!namespace.is_empty()).then_some(namespace),
        };
        (pattern.kind.is_some() || pattern.namespace.is_some()).then_some(pattern)
    }

    fn matches(&self, binding: &Binding) -> bool {
        self.kind.as_ref().is_none_or(|k| *k == binding.kind)
            && self
                .namespace
                .is_none_or(|ns| binding.namespace.as_deref() == Some(ns))
    }
}

struct Listener<S> {
    id: ListenerId,
    bindings: SmallVec<[Binding; 2]>,
    callback: Callback<S>,
}

impl<S> Listener<S> {
    fn listens_to(&self, kind: &EventType) -> bool {
        self.bindings.iter().any(|b| b.kind == *kind)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum PointerKind {
    Mouse,
    Touch,
}

impl PointerKind {
    fn down(self) -> EventType {
        match self {
            Self::Mouse => EventType::MouseDown,
            Self::Touch => EventType::TouchStart,
        }
    }

    fn moved(self) -> EventType {
        match self {
            Self::Mouse => EventType::MouseMove,
            Self::Touch => EventType::TouchMove,
        }
    }

    fn up(self) -> EventType {
        match self {
            Self::Mouse => EventType::MouseUp,
            Self::Touch => EventType::TouchEnd,
        }
    }

    fn click(self) -> EventType {
        match self {
            Self::Mouse => EventType::Click,
            Self::Touch => EventType::Tap,
        }
    }

    fn double(self) -> EventType {
        match self {
            Self::Mouse => EventType::DblClick,
            Self::Touch => EventType::DblTap,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct PointerState {
    pressed: Option<NodeId>,
    last_click: Option<(NodeId, f64)>,
}

/// Routes input to handlers registered on stage nodes.
///
/// Positional input is resolved with [`Stage::intersection`]; key input goes
/// to the focused node. Events without a target are dropped.
pub struct Router<S = RasterSurface> {
    config: RouterConfig,
    listeners: HashMap<NodeId, Vec<Listener<S>>>,
    next_listener: u64,
    mouse: PointerState,
    touch: PointerState,
    hovered: Option<NodeId>,
    focus: Option<NodeId>,
}

impl<S> fmt::Debug for Router<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("config", &self.config)
            .field("nodes_with_listeners", &self.listeners.len())
            .field("hovered", &self.hovered)
            .field("focus", &self.focus)
            .finish_non_exhaustive()
    }
}

impl<S: Surface> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Surface> Router<S> {
    /// A router with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// A router with the given configuration.
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            config,
            listeners: HashMap::new(),
            next_listener: 0,
            mouse: PointerState::default(),
            touch: PointerState::default(),
            hovered: None,
            focus: None,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> RouterConfig {
        self.config
    }

    // --- handler tables ---------------------------------------------------

    /// Register `callback` on `node` for one or more whitespace-separated event
    /// names, each optionally namespaced: `"click.toolbar dblclick"`.
    ///
    /// Handlers on one node run in registration order.
    pub fn on(
        &mut self,
        node: NodeId,
        events: &str,
        callback: impl FnMut(&mut Event, &mut Stage<S>) + 'static,
    ) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        let bindings: SmallVec<[Binding; 2]> =
            events.split_whitespace().filter_map(Binding::parse).collect();
        if bindings.is_empty() {
            tracing::debug!(node = ?node, events, "no event types to listen for");
            return id;
        }
        self.listeners.entry(node).or_default().push(Listener {
            id,
            bindings,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove bindings from `node` matching any of the whitespace-separated
    /// patterns: `"click"` (all namespaces), `".toolbar"` (all types) or
    /// `"click.toolbar"`. Returns the number of bindings removed.
    pub fn off(&mut self, node: NodeId, events: &str) -> usize {
        let patterns: SmallVec<[Pattern<'_>; 2]> =
            events.split_whitespace().filter_map(Pattern::parse).collect();
        let Some(list) = self.listeners.get_mut(&node) else {
            return 0;
        };
        let mut removed = 0;
        for listener in list.iter_mut() {
            let before = listener.bindings.len();
            listener
                .bindings
                .retain(|b| !patterns.iter().any(|p| p.matches(b)));
            removed += before - listener.bindings.len();
        }
        list.retain(|l| !l.bindings.is_empty());
        if list.is_empty() {
            self.listeners.remove(&node);
        }
        removed
    }

    /// Remove one registration. Returns whether it existed.
    pub fn off_listener(&mut self, id: ListenerId) -> bool {
        let mut found = None;
        for (node, list) in &mut self.listeners {
            if let Some(i) = list.iter().position(|l| l.id == id) {
                list.remove(i);
                found = Some(*node);
                break;
            }
        }
        if let Some(node) = found
            && self.listeners.get(&node).is_some_and(Vec::is_empty)
        {
            self.listeners.remove(&node);
        }
        found.is_some()
    }

    /// Remove every handler on `node`.
    pub fn off_all(&mut self, node: NodeId) {
        self.listeners.remove(&node);
    }

    /// Number of registrations on `node`.
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.listeners.get(&node).map_or(0, Vec::len)
    }

    /// Whether `node` has a handler for `kind`.
    pub fn has_listener(&self, node: NodeId, kind: &EventType) -> bool {
        self.listeners
            .get(&node)
            .is_some_and(|list| list.iter().any(|l| l.listens_to(kind)))
    }

    /// Drop handler tables of nodes that no longer exist.
    ///
    /// [`Router::dispatch`] already forgets dead nodes it meets on a path;
    /// this sweeps the rest.
    pub fn prune(&mut self, stage: &Stage<S>) {
        self.listeners.retain(|node, _| stage.contains(*node));
        if self.focus.is_some_and(|n| !stage.contains(n)) {
            self.focus = None;
        }
    }

    // --- dispatch ---------------------------------------------------------

    /// Dispatch `event` to its target and, for bubbling types, every ancestor
    /// up to the stage. Returns the event as the last handler left it.
    ///
    /// Events aimed at nodes that do not exist are dropped.
    pub fn dispatch(&mut self, stage: &mut Stage<S>, mut event: Event) -> Event {
        let path: NodeChain = if event.kind.bubbles() {
            stage.path_to_root(event.target)
        } else if stage.contains(event.target) {
            smallvec![event.target]
        } else {
            NodeChain::new()
        };
        if path.is_empty() {
            tracing::debug!(
                node = ?event.target,
                kind = %event.kind,
                "event dropped: no such node"
            );
            self.forget(event.target);
            return event;
        }
        tracing::trace!(node = ?event.target, kind = %event.kind, depth = path.len(), "dispatch");

        let seq = dispatcher::bubble_path(&path);
        let listeners = &mut self.listeners;
        dispatcher::run(&seq, &mut event, |d, event| {
            // An earlier handler may have destroyed this node.
            if !stage.contains(d.node) {
                listeners.remove(&d.node);
                return Outcome::Continue;
            }
            event.current_target = d.node;
            event.phase = d.phase;
            if let Some(list) = listeners.get_mut(&d.node) {
                for listener in list.iter_mut() {
                    if listener.listens_to(&event.kind) {
                        (listener.callback)(event, stage);
                    }
                }
            }
            if event.is_propagation_stopped() {
                Outcome::Stop
            } else {
                Outcome::Continue
            }
        });
        for node in &path {
            if !stage.contains(*node) {
                self.forget(*node);
            }
        }
        event
    }

    /// Drop the handler table of a node that no longer exists.
    fn forget(&mut self, node: NodeId) {
        if self.listeners.remove(&node).is_some() {
            tracing::trace!(node = ?node, "listeners of destroyed node dropped");
        }
        if self.focus == Some(node) {
            self.focus = None;
        }
    }

    /// Dispatch a synthetic event of `kind` on `node`.
    pub fn fire(
        &mut self,
        stage: &mut Stage<S>,
        node: NodeId,
        kind: impl Into<EventType>,
    ) -> Event {
        self.dispatch(stage, Event::new(kind, node))
    }

    // --- pointer pipeline -------------------------------------------------

    /// Mouse button pressed at `point` (stage pixels). Returns the hit shape.
    pub fn pointer_down(
        &mut self,
        stage: &mut Stage<S>,
        point: Point,
        time: f64,
    ) -> Option<NodeId> {
        self.press(stage, PointerKind::Mouse, point, time)
    }

    /// Mouse moved to `point`. Emits `mouseout`/`mouseleave` and
    /// `mouseover`/`mouseenter` when the hovered shape changes, then `mousemove`.
    pub fn pointer_move(
        &mut self,
        stage: &mut Stage<S>,
        point: Point,
        time: f64,
    ) -> Option<NodeId> {
        let target = stage.intersection(point);
        self.update_hover(stage, target, point, time);
        if let Some(t) = target {
            self.dispatch(
                stage,
                Event::new(EventType::MouseMove, t).at(point).with_time(time),
            );
        }
        target
    }

    /// Mouse button released at `point`. Emits `mouseup`, then `click` when the
    /// press hit the same shape, then `dblclick` for a second click on that shape
    /// within the double-click window.
    pub fn pointer_up(&mut self, stage: &mut Stage<S>, point: Point, time: f64) -> Option<NodeId> {
        self.release(stage, PointerKind::Mouse, point, time)
    }

    /// Touch began at `point`.
    pub fn touch_start(&mut self, stage: &mut Stage<S>, point: Point, time: f64) -> Option<NodeId> {
        self.press(stage, PointerKind::Touch, point, time)
    }

    /// Touch moved to `point`.
    pub fn touch_move(&mut self, stage: &mut Stage<S>, point: Point, time: f64) -> Option<NodeId> {
        let target = stage.intersection(point);
        if let Some(t) = target {
            self.dispatch(
                stage,
                Event::new(PointerKind::Touch.moved(), t).at(point).with_time(time),
            );
        }
        target
    }

    /// Touch ended at `point`. Emits `touchend`, `tap` and `dbltap` the way
    /// [`Router::pointer_up`] emits the click family.
    pub fn touch_end(&mut self, stage: &mut Stage<S>, point: Point, time: f64) -> Option<NodeId> {
        self.release(stage, PointerKind::Touch, point, time)
    }

    /// The shape under the mouse after the last [`Router::pointer_move`].
    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    fn state_mut(&mut self, kind: PointerKind) -> &mut PointerState {
        match kind {
            PointerKind::Mouse => &mut self.mouse,
            PointerKind::Touch => &mut self.touch,
        }
    }

    fn press(
        &mut self,
        stage: &mut Stage<S>,
        kind: PointerKind,
        point: Point,
        time: f64,
    ) -> Option<NodeId> {
        let target = stage.intersection(point);
        self.state_mut(kind).pressed = target;
        match target {
            Some(t) => {
                self.dispatch(stage, Event::new(kind.down(), t).at(point).with_time(time));
            }
            None => tracing::trace!(?point, "press on background"),
        }
        target
    }

    fn release(
        &mut self,
        stage: &mut Stage<S>,
        kind: PointerKind,
        point: Point,
        time: f64,
    ) -> Option<NodeId> {
        let target = stage.intersection(point);
        let pressed = self.state_mut(kind).pressed.take();
        let t = target?;
        self.dispatch(stage, Event::new(kind.up(), t).at(point).with_time(time));
        if pressed != Some(t) {
            return target;
        }
        self.dispatch(stage, Event::new(kind.click(), t).at(point).with_time(time));

        let window = self.config.double_click_window;
        let state = self.state_mut(kind);
        let double = state
            .last_click
            .is_some_and(|(node, at)| node == t && time - at <= window);
        state.last_click = if double { None } else { Some((t, time)) };
        if double {
            self.dispatch(stage, Event::new(kind.double(), t).at(point).with_time(time));
        }
        target
    }

    fn update_hover(
        &mut self,
        stage: &mut Stage<S>,
        target: Option<NodeId>,
        point: Point,
        time: f64,
    ) {
        let previous = self.hovered;
        if previous == target {
            return;
        }
        self.hovered = target;
        if let Some(old) = previous
            && stage.contains(old)
        {
            for kind in [EventType::MouseOut, EventType::MouseLeave] {
                self.dispatch(stage, Event::new(kind, old).at(point).with_time(time));
            }
        }
        if let Some(new) = target {
            for kind in [EventType::MouseOver, EventType::MouseEnter] {
                self.dispatch(stage, Event::new(kind, new).at(point).with_time(time));
            }
        }
    }

    // --- keyboard ---------------------------------------------------------

    /// The node receiving key events.
    pub fn focus(&self) -> Option<NodeId> {
        self.focus
    }

    /// Move key focus. Returns the previously focused node.
    pub fn set_focus(&mut self, node: Option<NodeId>) -> Option<NodeId> {
        core::mem::replace(&mut self.focus, node)
    }

    /// Dispatch `keydown` to the focused node. Returns `None` when the event
    /// was dropped for lack of focus.
    pub fn key_down(&mut self, stage: &mut Stage<S>, key: &str, time: f64) -> Option<Event> {
        self.key(stage, EventType::KeyDown, key, time)
    }

    /// Dispatch `keyup` to the focused node.
    pub fn key_up(&mut self, stage: &mut Stage<S>, key: &str, time: f64) -> Option<Event> {
        self.key(stage, EventType::KeyUp, key, time)
    }

    fn key(
        &mut self,
        stage: &mut Stage<S>,
        kind: EventType,
        key: &str,
        time: f64,
    ) -> Option<Event> {
        let Some(focus) = self.focus.filter(|n| stage.contains(*n)) else {
            tracing::debug!(kind = %kind, key, "key event dropped: nothing focused");
            return None;
        };
        Some(self.dispatch(stage, Event::new(kind, focus).with_key(key).with_time(time)))
    }
}
