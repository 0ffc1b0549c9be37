// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node attributes and the configuration surface nodes are built from.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

use crate::types::{DragBounds, DragConstraint, NodeFlags};

/// Geometric and behavioral attributes shared by every node.
///
/// Identity (user id and name) is not part of this struct because changing it
/// has to keep the stage registries in sync; use
/// [`Stage::set_user_id`](crate::Stage::set_user_id) and
/// [`Stage::set_name`](crate::Stage::set_name) for those.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeAttrs {
    /// Position relative to the parent.
    pub position: Point,
    /// Scale factors.
    pub scale: Vec2,
    /// Rotation in radians.
    pub rotation: f64,
    /// Pivot for rotation and scale, in local coordinates.
    pub offset: Vec2,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Visibility, listening and draggable flags.
    pub flags: NodeFlags,
    /// Axis restriction while dragging.
    pub drag_constraint: DragConstraint,
    /// Clamp rectangle for the absolute position while dragging.
    pub drag_bounds: Option<DragBounds>,
}

impl Default for NodeAttrs {
    fn default() -> Self {
        Self {
            position: Point::ORIGIN,
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
            offset: Vec2::ZERO,
            opacity: 1.0,
            flags: NodeFlags::default(),
            drag_constraint: DragConstraint::None,
            drag_bounds: None,
        }
    }
}

impl NodeAttrs {
    /// The local transform: `T(position) · T(offset) · R(rotation) · S(scale) · T(−offset)`.
    pub fn local_transform(&self) -> Affine {
        let mut xf = Affine::IDENTITY;
        if self.position != Point::ORIGIN {
            xf = xf * Affine::translate(self.position.to_vec2());
        }
        if self.offset != Vec2::ZERO {
            xf = xf * Affine::translate(self.offset);
        }
        if self.rotation != 0.0 {
            xf = xf * Affine::rotate(self.rotation);
        }
        if self.scale != Vec2::new(1.0, 1.0) {
            xf = xf * Affine::scale_non_uniform(self.scale.x, self.scale.y);
        }
        if self.offset != Vec2::ZERO {
            xf = xf * Affine::translate(-self.offset);
        }
        xf
    }

    /// Whether the node itself is visible (ancestors are not consulted).
    pub fn visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }

    /// Whether the node itself listens for input (ancestors are not consulted).
    pub fn listening(&self) -> bool {
        self.flags.contains(NodeFlags::LISTENING)
    }

    /// Whether the node can be dragged.
    pub fn draggable(&self) -> bool {
        self.flags.contains(NodeFlags::DRAGGABLE)
    }

    /// Set the visibility flag.
    pub fn set_visible(&mut self, visible: bool) {
        self.flags.set(NodeFlags::VISIBLE, visible);
    }

    /// Set the listening flag.
    pub fn set_listening(&mut self, listening: bool) {
        self.flags.set(NodeFlags::LISTENING, listening);
    }

    /// Set the draggable flag.
    pub fn set_draggable(&mut self, draggable: bool) {
        self.flags.set(NodeFlags::DRAGGABLE, draggable);
    }

    /// Set the opacity, clamped into `[0, 1]`.
    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = if opacity.is_nan() {
            1.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
    }

    /// Rotation in degrees.
    pub fn rotation_deg(&self) -> f64 {
        self.rotation.to_degrees()
    }

    /// Set the rotation in degrees.
    pub fn set_rotation_deg(&mut self, degrees: f64) {
        self.rotation = degrees.to_radians();
    }

    /// Add to the rotation, in radians.
    pub fn rotate(&mut self, radians: f64) {
        self.rotation += radians;
    }

    /// Shift the position.
    pub fn move_by(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Apply the non-identity parts of a configuration.
    pub fn apply(&mut self, config: &NodeConfig) {
        if let Some(x) = config.x {
            self.position.x = x;
        }
        if let Some(y) = config.y {
            self.position.y = y;
        }
        if let Some(scale) = config.scale {
            self.scale = scale.merge(self.scale);
        }
        if let Some(rotation) = config.rotation {
            self.rotation = rotation;
        }
        if let Some(degrees) = config.rotation_deg {
            self.set_rotation_deg(degrees);
        }
        if let Some(offset) = config.offset {
            self.offset = offset.merge(self.offset);
        }
        if let Some(opacity) = config.opacity {
            self.set_opacity(opacity);
        }
        if let Some(visible) = config.visible {
            self.set_visible(visible);
        }
        if let Some(listening) = config.listening {
            self.set_listening(listening);
        }
        if let Some(draggable) = config.draggable {
            self.set_draggable(draggable);
        }
        if let Some(constraint) = config.drag_constraint {
            self.drag_constraint = constraint;
        }
        if let Some(bounds) = config.drag_bounds {
            self.drag_bounds = Some(bounds);
        }
    }
}

/// A partially specified pair, as in `scale: { x: 2 }`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialXY {
    /// X component.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Y component.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl PartialXY {
    /// Both components set.
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }

    fn merge(self, base: Vec2) -> Vec2 {
        Vec2::new(self.x.unwrap_or(base.x), self.y.unwrap_or(base.y))
    }
}

/// Construction-time configuration recognized by every node.
///
/// Deserializes from the usual camel-cased object, e.g.
/// `{"x": 10, "rotationDeg": 45, "dragBounds": {"left": 0}}`. Unknown keys are
/// ignored. Only keys that are present are applied.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeConfig {
    /// Position x.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Position y.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Scale factors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<PartialXY>,
    /// Rotation in radians.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// Rotation in degrees; wins over `rotation` when both are present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_deg: Option<f64>,
    /// Pivot offset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<PartialXY>,
    /// Visibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    /// Input listening.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listening: Option<bool>,
    /// User id, unique within a stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// User name, not required to be unique.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Opacity in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// Draggable flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draggable: Option<bool>,
    /// Drag axis restriction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drag_constraint: Option<DragConstraint>,
    /// Drag clamp rectangle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drag_bounds: Option<DragBounds>,
}

impl NodeConfig {
    /// Parse a configuration from a JSON value.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, crate::SceneError> {
        Ok(Self::deserialize(value)?)
    }

    /// Configuration positioned at `(x, y)`.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Builder-style user id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder-style name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Capture the non-default attributes of a node, for serialization.
    pub(crate) fn capture(attrs: &NodeAttrs, id: Option<&str>, name: Option<&str>) -> Self {
        let defaults = NodeAttrs::default();
        let some_if = |v: f64, d: f64| (v != d).then_some(v);
        let xy_if = |v: Vec2, d: Vec2| (v != d).then_some(PartialXY::new(v.x, v.y));
        Self {
            x: some_if(attrs.position.x, 0.0),
            y: some_if(attrs.position.y, 0.0),
            scale: xy_if(attrs.scale, defaults.scale),
            rotation: some_if(attrs.rotation, 0.0),
            rotation_deg: None,
            offset: xy_if(attrs.offset, defaults.offset),
            visible: (!attrs.visible()).then_some(false),
            listening: (!attrs.listening()).then_some(false),
            id: id.map(str::to_owned),
            name: name.map(str::to_owned),
            opacity: some_if(attrs.opacity, 1.0),
            draggable: attrs.draggable().then_some(true),
            drag_constraint: (attrs.drag_constraint != DragConstraint::None)
                .then_some(attrs.drag_constraint),
            drag_bounds: attrs.drag_bounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn local_transform_pivots_around_offset() {
        let attrs = NodeAttrs {
            position: Point::new(100.0, 100.0),
            offset: Vec2::new(10.0, 10.0),
            rotation: core::f64::consts::FRAC_PI_2,
            ..NodeAttrs::default()
        };
        // The pivot itself maps to position + offset.
        let p = attrs.local_transform() * Point::new(10.0, 10.0);
        assert!((p.x - 110.0).abs() < 1e-9);
        assert!((p.y - 110.0).abs() < 1e-9);
    }

    #[test]
    fn identity_attrs_give_identity_transform() {
        assert_eq!(NodeAttrs::default().local_transform(), Affine::IDENTITY);
    }

    #[test]
    fn config_parses_camel_case_and_ignores_unknown_keys() {
        let config = NodeConfig::from_json(&json!({
            "x": 5,
            "rotationDeg": 90,
            "scale": {"x": 2},
            "dragConstraint": "vertical",
            "dragBounds": {"left": 0, "right": 100},
            "somethingElse": [1, 2, 3]
        }))
        .unwrap();

        let mut attrs = NodeAttrs::default();
        attrs.apply(&config);
        assert_eq!(attrs.position, Point::new(5.0, 0.0));
        assert_eq!(attrs.scale, Vec2::new(2.0, 1.0));
        assert!((attrs.rotation_deg() - 90.0).abs() < 1e-9);
        assert_eq!(attrs.drag_constraint, DragConstraint::Vertical);
        assert_eq!(attrs.drag_bounds.and_then(|b| b.right), Some(100.0));
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(NodeConfig::from_json(&json!({"x": "left"})).is_err());
    }

    #[test]
    fn opacity_is_clamped() {
        let mut attrs = NodeAttrs::default();
        attrs.apply(&NodeConfig {
            opacity: Some(4.0),
            ..NodeConfig::default()
        });
        assert_eq!(attrs.opacity, 1.0);
    }

    #[test]
    fn capture_skips_defaults() {
        let mut attrs = NodeAttrs::default();
        attrs.position.x = 3.0;
        let config = NodeConfig::capture(&attrs, None, Some("n"));
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({"x": 3.0, "name": "n"})
        );
    }
}
