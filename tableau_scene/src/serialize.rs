// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plain-data copies of subtrees.
//!
//! A node serializes to an object with a `nodeType` tag, a `shapeType` tag for
//! shapes, the non-default `attrs` in configuration form and, for containers,
//! a `children` array:
//!
//! ```json
//! {"nodeType": "Group", "attrs": {"x": 10}, "children": [
//!   {"nodeType": "Shape", "shapeType": "Circle", "attrs": {"radius": 4, "fill": "#ff0000"}}
//! ]}
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};
use tableau_surface::Surface;

use crate::attrs::NodeConfig;
use crate::node::NodeKind;
use crate::shape::ShapeConfig;
use crate::{NodeId, SceneError, Stage};

impl<S: Surface> Stage<S> {
    /// Copy a node and its subtree into plain data.
    pub fn to_object(&self, id: NodeId) -> Result<Value, SceneError> {
        let node = self.node_ref(id)?;
        let config = NodeConfig::capture(&node.attrs, node.user_id(), node.name());
        let mut obj = Map::new();
        obj.insert("nodeType".into(), node.node_type().as_str().into());
        let attrs = match &node.kind {
            NodeKind::Shape(shape) => {
                obj.insert("shapeType".into(), shape.kind.type_name().into());
                serde_json::to_value(shape.capture(config))?
            }
            _ => serde_json::to_value(config)?,
        };
        obj.insert("attrs".into(), attrs);
        if node.node_type().is_container() {
            let children = node
                .children
                .iter()
                .map(|c| self.to_object(*c))
                .collect::<Result<Vec<_>, _>>()?;
            obj.insert("children".into(), Value::Array(children));
        }
        Ok(Value::Object(obj))
    }

    /// Build nodes from data produced by [`Stage::to_object`].
    ///
    /// Layers, groups and shapes come back as a new staged subtree. A `Stage`
    /// object applies its attributes to this stage's root and attaches its layers.
    /// On error, nothing built by this call is left behind.
    pub fn from_object(&mut self, value: &Value) -> Result<NodeId, SceneError> {
        let obj = value
            .as_object()
            .ok_or(SceneError::MalformedObject("expected an object"))?;
        let node_type = obj
            .get("nodeType")
            .and_then(Value::as_str)
            .ok_or(SceneError::MalformedObject("missing nodeType"))?;
        let config = match obj.get("attrs") {
            Some(attrs) => ShapeConfig::deserialize(attrs)?,
            None => ShapeConfig::default(),
        };

        let id = match node_type {
            "Stage" => {
                self.set_attrs(self.root, &config.node)?;
                self.root
            }
            "Layer" => self.create_layer(&config.node),
            "Group" => self.create_group(&config.node),
            "Shape" => {
                let shape_type = obj
                    .get("shapeType")
                    .and_then(Value::as_str)
                    .ok_or(SceneError::MalformedObject("missing shapeType"))?;
                self.create_shape_from_config(shape_type, &config)?
            }
            other => return Err(SceneError::UnknownNodeType(other.to_owned())),
        };

        if let Err(err) = self.build_children(id, obj.get("children")) {
            if id != self.root {
                self.roll_back(id);
            }
            return Err(err);
        }
        Ok(id)
    }

    fn build_children(
        &mut self,
        parent: NodeId,
        children: Option<&Value>,
    ) -> Result<(), SceneError> {
        let Some(children) = children else {
            return Ok(());
        };
        let children = children
            .as_array()
            .ok_or(SceneError::MalformedObject("children must be an array"))?;
        let mut built = Vec::with_capacity(children.len());
        for child in children {
            let result = self
                .from_object(child)
                .and_then(|c| match self.add(parent, c) {
                    Ok(()) => Ok(c),
                    Err(err) => {
                        self.roll_back(c);
                        Err(err)
                    }
                });
            match result {
                Ok(c) => built.push(c),
                Err(err) => {
                    for c in built {
                        self.roll_back(c);
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Roll back a partially built node.
    fn roll_back(&mut self, id: NodeId) {
        if let Err(err) = self.destroy(id) {
            tracing::warn!(node = ?id, error = %err, "rollback of a partially built node failed");
        }
    }
}
