// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape kinds, paint style and the draw capability.

use core::f64::consts::TAU;
use core::fmt;
use std::sync::Arc;

use kurbo::{Ellipse, PathEl, Point, Rect, RoundedRect, Shape as _};
use peniko::color::{Srgb, parse_color};
use peniko::{Brush, Color};
use serde::{Deserialize, Serialize};
use tableau_surface::Surface;

use crate::attrs::NodeConfig;
use crate::{DrawError, SceneError};

/// Stroke width used when a stroke color is set without a width.
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

const PATH_TOLERANCE: f64 = 0.1;

/// Which of the two layer surfaces a draw targets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DrawPass {
    /// The visible surface, painted with the real style.
    Scene,
    /// The hit surface, painted with the shape's id color.
    Hit,
}

/// A drawing procedure for shapes outside the built-in set.
///
/// Implementations build a path on the context's surface in local coordinates and
/// call [`ShapeContext::fill_stroke`] (or paint directly). The compositor has
/// already applied the node's absolute transform and opacity.
///
/// Custom paints must be chosen through [`ShapeContext::set_fill_brush`] and
/// [`ShapeContext::set_stroke_brush`], which substitute the hit color on the hit
/// pass. A brush set on the raw surface is painted into the hit surface as is.
pub trait DrawShape: fmt::Debug {
    /// Type tag used by selectors and serialization.
    fn type_name(&self) -> &str;

    /// Draw on the scene surface.
    fn draw(&self, ctx: &mut ShapeContext<'_>) -> Result<(), DrawError>;

    /// Draw on the hit surface. Defaults to [`DrawShape::draw`], which paints
    /// with the hit color as long as it picks its brushes through the context.
    fn draw_hit(&self, ctx: &mut ShapeContext<'_>) -> Result<(), DrawError> {
        self.draw(ctx)
    }
}

/// The closed set of shape geometries.
#[derive(Clone, Debug)]
pub enum ShapeKind {
    /// Axis-aligned rectangle with its top-left corner at the local origin.
    Rect {
        /// Width.
        width: f64,
        /// Height.
        height: f64,
        /// Corner radius; zero for sharp corners.
        corner_radius: f64,
    },
    /// Circle centered on the local origin.
    Circle {
        /// Radius.
        radius: f64,
    },
    /// Ellipse centered on the local origin.
    Ellipse {
        /// Horizontal radius.
        radius_x: f64,
        /// Vertical radius.
        radius_y: f64,
    },
    /// Polyline through local points; filled only when closed.
    Line {
        /// Vertices.
        points: Vec<Point>,
        /// Whether the last point connects back to the first.
        closed: bool,
    },
    /// A plugin shape.
    Custom(Arc<dyn DrawShape>),
}

impl ShapeKind {
    /// A sharp-cornered rectangle.
    pub const fn rect(width: f64, height: f64) -> Self {
        Self::Rect {
            width,
            height,
            corner_radius: 0.0,
        }
    }

    /// A circle.
    pub const fn circle(radius: f64) -> Self {
        Self::Circle { radius }
    }

    /// An ellipse.
    pub const fn ellipse(radius_x: f64, radius_y: f64) -> Self {
        Self::Ellipse { radius_x, radius_y }
    }

    /// An open polyline.
    pub fn line(points: impl Into<Vec<Point>>) -> Self {
        Self::Line {
            points: points.into(),
            closed: false,
        }
    }

    /// Type tag: `Rect`, `Circle`, `Ellipse`, `Line`, or the plugin's name.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Rect { .. } => "Rect",
            Self::Circle { .. } => "Circle",
            Self::Ellipse { .. } => "Ellipse",
            Self::Line { .. } => "Line",
            Self::Custom(custom) => custom.type_name(),
        }
    }
}

/// Paint style of a shape.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeStyle {
    /// Fill brush; no fill when `None`.
    pub fill: Option<Brush>,
    /// Stroke color.
    pub stroke: Option<Color>,
    /// Stroke width.
    pub stroke_width: Option<f64>,
}

impl ShapeStyle {
    /// A style with only a solid fill.
    pub fn filled(color: Color) -> Self {
        Self {
            fill: Some(Brush::Solid(color)),
            ..Self::default()
        }
    }

    /// The stroke actually painted, if any.
    ///
    /// A color without a width strokes at [`DEFAULT_STROKE_WIDTH`]; a width without
    /// a color strokes in black.
    pub fn effective_stroke(&self) -> Option<(Color, f64)> {
        match (self.stroke, self.stroke_width) {
            (Some(color), Some(width)) => Some((color, width)),
            (Some(color), None) => Some((color, DEFAULT_STROKE_WIDTH)),
            (None, Some(width)) => Some((Color::BLACK, width)),
            (None, None) => None,
        }
    }
}

/// Drawing context handed to shape draw procedures.
pub struct ShapeContext<'a> {
    surface: &'a mut dyn Surface,
    style: &'a ShapeStyle,
    pass: DrawPass,
    hit_color: Color,
}

impl fmt::Debug for ShapeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeContext")
            .field("style", &self.style)
            .field("pass", &self.pass)
            .field("hit_color", &self.hit_color)
            .finish_non_exhaustive()
    }
}

impl<'a> ShapeContext<'a> {
    /// Create a context for one draw invocation.
    pub fn new(
        surface: &'a mut dyn Surface,
        style: &'a ShapeStyle,
        pass: DrawPass,
        hit_color: Color,
    ) -> Self {
        Self {
            surface,
            style,
            pass,
            hit_color,
        }
    }

    /// The underlying surface, already transformed into the shape's local space.
    ///
    /// On the hit pass both brushes are set to the hit color before the surface
    /// is handed out.
    pub fn surface(&mut self) -> &mut dyn Surface {
        if self.pass == DrawPass::Hit {
            let hit = self.hit_brush();
            self.surface.set_fill_brush(&hit);
            self.surface.set_stroke_brush(&hit);
        }
        &mut *self.surface
    }

    /// Set the fill brush; the hit pass keeps the hit color instead.
    pub fn set_fill_brush(&mut self, brush: &Brush) {
        match self.pass {
            DrawPass::Scene => self.surface.set_fill_brush(brush),
            DrawPass::Hit => self.surface.set_fill_brush(&self.hit_brush()),
        }
    }

    /// Set the stroke brush; the hit pass keeps the hit color instead.
    pub fn set_stroke_brush(&mut self, brush: &Brush) {
        match self.pass {
            DrawPass::Scene => self.surface.set_stroke_brush(brush),
            DrawPass::Hit => self.surface.set_stroke_brush(&self.hit_brush()),
        }
    }

    fn hit_brush(&self) -> Brush {
        Brush::Solid(self.hit_color)
    }

    /// The shape's style.
    pub fn style(&self) -> &ShapeStyle {
        self.style
    }

    /// The pass being drawn.
    pub fn pass(&self) -> DrawPass {
        self.pass
    }

    /// Append kurbo path elements to the current path.
    pub fn append(&mut self, elements: impl IntoIterator<Item = PathEl>) {
        for el in elements {
            match el {
                PathEl::MoveTo(p) => self.surface.move_to(p),
                PathEl::LineTo(p) => self.surface.line_to(p),
                PathEl::QuadTo(p1, p) => self.surface.quad_to(p1, p),
                PathEl::CurveTo(p1, p2, p) => self.surface.curve_to(p1, p2, p),
                PathEl::ClosePath => self.surface.close_path(),
            }
        }
    }

    /// Fill, then stroke, the current path according to the style.
    ///
    /// On the hit pass both use the hit color; the stroke keeps its width so the
    /// hit region matches what is visible.
    pub fn fill_stroke(&mut self) {
        self.paint(true);
    }

    /// Stroke the current path according to the style, without filling.
    pub fn stroke_only(&mut self) {
        self.paint(false);
    }

    fn paint(&mut self, with_fill: bool) {
        let style = self.style;
        if with_fill && let Some(fill) = &style.fill {
            self.set_fill_brush(fill);
            self.surface.fill();
        }
        if let Some((color, width)) = style.effective_stroke() {
            self.set_stroke_brush(&Brush::Solid(color));
            self.surface.set_line_width(width);
            self.surface.stroke();
        }
    }
}

/// Kind and style of a shape node.
#[derive(Clone, Debug)]
pub struct ShapeNode {
    /// Geometry.
    pub kind: ShapeKind,
    /// Paint.
    pub style: ShapeStyle,
}

impl ShapeNode {
    /// A shape with the given geometry and style.
    pub fn new(kind: ShapeKind, style: ShapeStyle) -> Self {
        Self { kind, style }
    }

    /// Run the draw procedure for `pass`.
    pub fn draw(
        &self,
        surface: &mut dyn Surface,
        pass: DrawPass,
        hit_color: Color,
    ) -> Result<(), DrawError> {
        let mut ctx = ShapeContext::new(surface, &self.style, pass, hit_color);
        ctx.surface.begin_path();
        match &self.kind {
            ShapeKind::Rect {
                width,
                height,
                corner_radius,
            } => {
                let rect = Rect::new(0.0, 0.0, width.max(0.0), height.max(0.0));
                if *corner_radius > 0.0 {
                    let rounded = RoundedRect::from_rect(rect, *corner_radius);
                    ctx.append(rounded.path_elements(PATH_TOLERANCE));
                } else {
                    ctx.surface.rect(rect);
                }
                ctx.fill_stroke();
            }
            ShapeKind::Circle { radius } => {
                ctx.surface
                    .arc(Point::ORIGIN, radius.max(0.0), 0.0, TAU, false);
                ctx.surface.close_path();
                ctx.fill_stroke();
            }
            ShapeKind::Ellipse { radius_x, radius_y } => {
                let ellipse =
                    Ellipse::new(Point::ORIGIN, (radius_x.max(0.0), radius_y.max(0.0)), 0.0);
                ctx.append(ellipse.path_elements(PATH_TOLERANCE));
                ctx.fill_stroke();
            }
            ShapeKind::Line { points, closed } => {
                let [first, rest @ ..] = points.as_slice() else {
                    return Err(DrawError::MissingGeometry);
                };
                if rest.is_empty() {
                    return Err(DrawError::MissingGeometry);
                }
                ctx.surface.move_to(*first);
                for p in rest {
                    ctx.surface.line_to(*p);
                }
                if *closed {
                    ctx.surface.close_path();
                    ctx.fill_stroke();
                } else {
                    ctx.stroke_only();
                }
            }
            ShapeKind::Custom(custom) => match pass {
                DrawPass::Scene => custom.draw(&mut ctx)?,
                DrawPass::Hit => custom.draw_hit(&mut ctx)?,
            },
        }
        Ok(())
    }

    /// Build a shape from its type tag and configuration.
    pub fn from_config(type_name: &str, config: &ShapeConfig) -> Result<Self, SceneError> {
        let kind = match type_name {
            "Rect" => ShapeKind::Rect {
                width: config.width.unwrap_or(0.0),
                height: config.height.unwrap_or(0.0),
                corner_radius: config.corner_radius.unwrap_or(0.0),
            },
            "Circle" => ShapeKind::Circle {
                radius: config.radius.unwrap_or(0.0),
            },
            "Ellipse" => ShapeKind::Ellipse {
                radius_x: config.radius_x.unwrap_or(0.0),
                radius_y: config.radius_y.unwrap_or(0.0),
            },
            "Line" => ShapeKind::Line {
                points: config
                    .points
                    .as_deref()
                    .unwrap_or_default()
                    .chunks_exact(2)
                    .map(|xy| Point::new(xy[0], xy[1]))
                    .collect(),
                closed: config.closed.unwrap_or(false),
            },
            other => return Err(SceneError::UnknownNodeType(other.to_owned())),
        };
        let mut shape = Self::new(kind, ShapeStyle::default());
        shape.apply(config)?;
        Ok(shape)
    }

    /// Apply the style and geometry keys present in `config`.
    ///
    /// Geometry keys that do not belong to this shape's kind are ignored.
    pub fn apply(&mut self, config: &ShapeConfig) -> Result<(), SceneError> {
        if let Some(fill) = &config.fill {
            self.style.fill = Some(Brush::Solid(parse_css_color(fill)?));
        }
        if let Some(stroke) = &config.stroke {
            self.style.stroke = Some(parse_css_color(stroke)?);
        }
        if let Some(width) = config.stroke_width {
            self.style.stroke_width = Some(width);
        }
        match &mut self.kind {
            ShapeKind::Rect {
                width,
                height,
                corner_radius,
            } => {
                set_if(width, config.width);
                set_if(height, config.height);
                set_if(corner_radius, config.corner_radius);
            }
            ShapeKind::Circle { radius } => set_if(radius, config.radius),
            ShapeKind::Ellipse { radius_x, radius_y } => {
                set_if(radius_x, config.radius_x);
                set_if(radius_y, config.radius_y);
            }
            ShapeKind::Line { points, closed } => {
                if let Some(flat) = &config.points {
                    *points = flat
                        .chunks_exact(2)
                        .map(|xy| Point::new(xy[0], xy[1]))
                        .collect();
                }
                if let Some(c) = config.closed {
                    *closed = c;
                }
            }
            ShapeKind::Custom(_) => {}
        }
        Ok(())
    }

    /// Capture geometry and style as configuration.
    pub(crate) fn capture(&self, node: NodeConfig) -> ShapeConfig {
        let mut config = ShapeConfig {
            node,
            ..ShapeConfig::default()
        };
        match &self.style.fill {
            Some(Brush::Solid(color)) => config.fill = Some(css_color(*color)),
            Some(_) => tracing::debug!("non-solid fill is not serialized"),
            None => {}
        }
        config.stroke = self.style.stroke.map(css_color);
        config.stroke_width = self.style.stroke_width;
        match &self.kind {
            ShapeKind::Rect {
                width,
                height,
                corner_radius,
            } => {
                config.width = Some(*width);
                config.height = Some(*height);
                config.corner_radius = (*corner_radius != 0.0).then_some(*corner_radius);
            }
            ShapeKind::Circle { radius } => config.radius = Some(*radius),
            ShapeKind::Ellipse { radius_x, radius_y } => {
                config.radius_x = Some(*radius_x);
                config.radius_y = Some(*radius_y);
            }
            ShapeKind::Line { points, closed } => {
                config.points = Some(points.iter().flat_map(|p| [p.x, p.y]).collect());
                config.closed = closed.then_some(true);
            }
            ShapeKind::Custom(_) => {}
        }
        config
    }
}

fn set_if(slot: &mut f64, value: Option<f64>) {
    if let Some(v) = value {
        *slot = v;
    }
}

/// Parse a CSS color string such as `"red"`, `"#00ff00"` or `"rgb(0 0 255 / 50%)"`.
pub fn parse_css_color(s: &str) -> Result<Color, SceneError> {
    parse_color(s)
        .map(|c| c.to_alpha_color::<Srgb>())
        .map_err(|_| SceneError::InvalidColor(s.to_owned()))
}

/// Format a color as `#rrggbb`, or `#rrggbbaa` when it is not opaque.
pub fn css_color(color: Color) -> String {
    let c = color.to_rgba8();
    if c.a == 255 {
        format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
    } else {
        format!("#{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a)
    }
}

/// Configuration accepted by shapes: every node key plus style and geometry keys.
///
/// `points` is a flat list `[x0, y0, x1, y1, ...]`; a trailing odd value is ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeConfig {
    /// Node keys.
    #[serde(flatten)]
    pub node: NodeConfig,
    /// Fill color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    /// Stroke color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    /// Stroke width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    /// Rectangle width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Rectangle height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Rectangle corner radius.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
    /// Circle radius.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    /// Ellipse horizontal radius.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_x: Option<f64>,
    /// Ellipse vertical radius.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_y: Option<f64>,
    /// Line vertices, flattened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<f64>>,
    /// Whether a line is closed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed: Option<bool>,
}

impl ShapeConfig {
    /// Parse a configuration from a JSON value.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, SceneError> {
        Ok(Self::deserialize(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tableau_surface::{RecordingSurface, SurfaceOp};

    #[test]
    fn stroke_defaults() {
        let red = Color::from_rgba8(255, 0, 0, 255);
        let color_only = ShapeStyle {
            stroke: Some(red),
            ..ShapeStyle::default()
        };
        assert_eq!(color_only.effective_stroke(), Some((red, 2.0)));

        let width_only = ShapeStyle {
            stroke_width: Some(5.0),
            ..ShapeStyle::default()
        };
        assert_eq!(width_only.effective_stroke(), Some((Color::BLACK, 5.0)));
        assert_eq!(ShapeStyle::default().effective_stroke(), None);
    }

    #[test]
    fn hit_pass_substitutes_the_hit_color() {
        let shape = ShapeNode::new(
            ShapeKind::rect(10.0, 10.0),
            ShapeStyle {
                fill: Some(Brush::Solid(Color::from_rgba8(1, 2, 3, 128))),
                stroke: Some(Color::WHITE),
                stroke_width: Some(4.0),
            },
        );
        let hit = Color::from_rgba8(0, 0, 7, 255);
        let mut surface = RecordingSurface::with_size(20, 20);
        shape.draw(&mut surface, DrawPass::Hit, hit).unwrap();

        let brushes: Vec<_> = surface
            .events()
            .iter()
            .filter_map(|e| match &e.op {
                SurfaceOp::SetFill(b) | SurfaceOp::SetStroke(b) => Some(b.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(brushes, vec![Brush::Solid(hit), Brush::Solid(hit)]);
        assert!(
            surface
                .events()
                .iter()
                .any(|e| e.op == SurfaceOp::SetLineWidth(4.0))
        );
    }

    #[test]
    fn open_line_is_only_stroked() {
        let shape = ShapeNode::new(
            ShapeKind::line([Point::new(0.0, 0.0), Point::new(5.0, 5.0)]),
            ShapeStyle {
                fill: Some(Brush::Solid(Color::WHITE)),
                stroke: Some(Color::BLACK),
                stroke_width: None,
            },
        );
        let mut surface = RecordingSurface::with_size(10, 10);
        shape
            .draw(&mut surface, DrawPass::Scene, Color::TRANSPARENT)
            .unwrap();
        assert_eq!(surface.count(|op| *op == SurfaceOp::Fill), 0);
        assert_eq!(surface.count(|op| *op == SurfaceOp::Stroke), 1);
    }

    #[test]
    fn degenerate_line_reports_missing_geometry() {
        let shape = ShapeNode::new(
            ShapeKind::line([Point::new(1.0, 1.0)]),
            ShapeStyle::filled(Color::BLACK),
        );
        let mut surface = RecordingSurface::with_size(10, 10);
        assert_eq!(
            shape.draw(&mut surface, DrawPass::Scene, Color::TRANSPARENT),
            Err(DrawError::MissingGeometry)
        );
    }

    #[test]
    fn config_builds_shapes() {
        let config = ShapeConfig::from_json(&json!({
            "x": 4,
            "radius": 12,
            "fill": "red",
            "stroke": "#0000ff",
        }))
        .unwrap();
        assert_eq!(config.node.x, Some(4.0));
        let shape = ShapeNode::from_config("Circle", &config).unwrap();
        assert!(matches!(shape.kind, ShapeKind::Circle { radius } if radius == 12.0));
        assert_eq!(
            shape.style.fill,
            Some(Brush::Solid(Color::from_rgba8(255, 0, 0, 255)))
        );
        assert_eq!(shape.style.effective_stroke().map(|(_, w)| w), Some(2.0));
    }

    #[test]
    fn unknown_shape_type_is_rejected() {
        let err = ShapeNode::from_config("Star", &ShapeConfig::default()).unwrap_err();
        assert!(matches!(err, SceneError::UnknownNodeType(t) if t == "Star"));
    }

    #[test]
    fn bad_color_is_rejected() {
        let config = ShapeConfig {
            fill: Some("not-a-color".into()),
            ..ShapeConfig::default()
        };
        assert!(matches!(
            ShapeNode::from_config("Rect", &config),
            Err(SceneError::InvalidColor(_))
        ));
    }

    #[test]
    fn css_color_formats() {
        assert_eq!(css_color(Color::from_rgba8(255, 0, 16, 255)), "#ff0010");
        assert_eq!(css_color(Color::from_rgba8(0, 0, 0, 0)), "#00000000");
    }

    #[derive(Debug)]
    struct Star;

    impl DrawShape for Star {
        fn type_name(&self) -> &str {
            "Star"
        }

        fn draw(&self, ctx: &mut ShapeContext<'_>) -> Result<(), DrawError> {
            ctx.surface().move_to(Point::new(0.0, -5.0));
            ctx.surface().line_to(Point::new(4.0, 5.0));
            ctx.surface().line_to(Point::new(-4.0, 5.0));
            ctx.surface().close_path();
            ctx.fill_stroke();
            Ok(())
        }
    }

    #[test]
    fn custom_shapes_draw_through_the_trait() {
        let shape = ShapeNode::new(
            ShapeKind::Custom(Arc::new(Star)),
            ShapeStyle::filled(Color::WHITE),
        );
        assert_eq!(shape.kind.type_name(), "Star");
        let mut surface = RecordingSurface::with_size(10, 10);
        shape
            .draw(&mut surface, DrawPass::Scene, Color::TRANSPARENT)
            .unwrap();
        assert_eq!(surface.count(|op| *op == SurfaceOp::Fill), 1);
    }
}
