// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event types, dispatch entries and the event payload.

use core::fmt;

use kurbo::Point;
use tableau_scene::NodeId;

/// The kinds of event a handler can listen for.
///
/// Names follow the DOM spelling (`"mousedown"`, `"dbltap"`, `"dragmove"`);
/// anything else is a [`EventType::Custom`] type that only reaches its target.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    /// `mousedown`
    MouseDown,
    /// `mouseup`
    MouseUp,
    /// `mousemove`
    MouseMove,
    /// `mouseover`
    MouseOver,
    /// `mouseout`
    MouseOut,
    /// `mouseenter`
    MouseEnter,
    /// `mouseleave`
    MouseLeave,
    /// `click`
    Click,
    /// `dblclick`
    DblClick,
    /// `touchstart`
    TouchStart,
    /// `touchmove`
    TouchMove,
    /// `touchend`
    TouchEnd,
    /// `tap`
    Tap,
    /// `dbltap`
    DblTap,
    /// `dragstart`
    DragStart,
    /// `dragmove`
    DragMove,
    /// `dragend`
    DragEnd,
    /// `keydown`
    KeyDown,
    /// `keyup`
    KeyUp,
    /// Any other name.
    Custom(String),
}

impl EventType {
    const NAMED: [Self; 19] = [
        Self::MouseDown,
        Self::MouseUp,
        Self::MouseMove,
        Self::MouseOver,
        Self::MouseOut,
        Self::MouseEnter,
        Self::MouseLeave,
        Self::Click,
        Self::DblClick,
        Self::TouchStart,
        Self::TouchMove,
        Self::TouchEnd,
        Self::Tap,
        Self::DblTap,
        Self::DragStart,
        Self::DragMove,
        Self::DragEnd,
        Self::KeyDown,
        Self::KeyUp,
    ];

    /// Event type for a name. Never fails: unknown names become `Custom`.
    pub fn parse(name: &str) -> Self {
        Self::NAMED
            .iter()
            .find(|t| t.as_str() == name)
            .cloned()
            .unwrap_or_else(|| Self::Custom(name.into()))
    }

    /// The event name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::MouseMove => "mousemove",
            Self::MouseOver => "mouseover",
            Self::MouseOut => "mouseout",
            Self::MouseEnter => "mouseenter",
            Self::MouseLeave => "mouseleave",
            Self::Click => "click",
            Self::DblClick => "dblclick",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::TouchEnd => "touchend",
            Self::Tap => "tap",
            Self::DblTap => "dbltap",
            Self::DragStart => "dragstart",
            Self::DragMove => "dragmove",
            Self::DragEnd => "dragend",
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::Custom(name) => name,
        }
    }

    /// Whether the event continues from its target up to the stage.
    ///
    /// The pointer, touch, click/tap and drag families bubble. Enter/leave,
    /// key and custom events stay on their target.
    pub fn bubbles(&self) -> bool {
        !matches!(
            self,
            Self::MouseEnter | Self::MouseLeave | Self::KeyDown | Self::KeyUp | Self::Custom(_)
        )
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a dispatch entry sits relative to the event target.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// The target node itself.
    Target,
    /// An ancestor of the target, nearest first.
    Bubble,
}

/// A handler's verdict on further propagation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Keep going.
    Continue,
    /// Skip the remaining entries.
    Stop,
}

/// One step of a dispatch sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dispatch {
    /// Phase of this step.
    pub phase: Phase,
    /// Node whose handlers run at this step.
    pub node: NodeId,
}

impl Dispatch {
    /// A target-phase entry.
    pub fn target(node: NodeId) -> Self {
        Self {
            phase: Phase::Target,
            node,
        }
    }

    /// A bubble-phase entry.
    pub fn bubble(node: NodeId) -> Self {
        Self {
            phase: Phase::Bubble,
            node,
        }
    }
}

/// The payload handed to every handler of one dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// The event type.
    pub kind: EventType,
    /// The node the event was dispatched to.
    pub target: NodeId,
    /// The node whose handlers are running.
    pub current_target: NodeId,
    /// Phase of the current handler.
    pub phase: Phase,
    /// Pointer position in stage pixels, for positional events.
    pub position: Option<Point>,
    /// Key name, for key events.
    pub key: Option<String>,
    /// Caller-supplied timestamp in milliseconds.
    pub timestamp: f64,
    stopped: bool,
}

impl Event {
    /// An event of `kind` aimed at `target`.
    pub fn new(kind: impl Into<EventType>, target: NodeId) -> Self {
        Self {
            kind: kind.into(),
            target,
            current_target: target,
            phase: Phase::Target,
            position: None,
            key: None,
            timestamp: 0.0,
            stopped: false,
        }
    }

    /// Set the pointer position.
    pub fn at(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the timestamp.
    pub fn with_time(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the key name.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Stop the event from reaching further ancestors.
    ///
    /// Remaining handlers on the current node still run.
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    /// Whether a handler has stopped propagation.
    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped
    }
}
