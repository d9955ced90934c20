//! Artists: adapters from geometry values to `Canvas` calls.

use crate::domain::{FitResult, Point, PointCloud};
use crate::draw::canvas::{Canvas, Handle, PointStyle, Rgb};

pub const DEFAULT_POINT_COLOR: Rgb = Rgb(0, 0, 0);

/// Per-artist settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistSettings {
    /// Target layer; `None` draws into the canvas's current layer.
    pub layer: Option<String>,
    pub point_color: Rgb,
}

impl ArtistSettings {
    fn with_layer(layer: Option<&str>) -> Self {
        Self {
            layer: layer.map(str::to_string),
            point_color: DEFAULT_POINT_COLOR,
        }
    }
}

/// Colour specification for a collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ColorSpec {
    /// Every item gets the default point colour.
    #[default]
    Default,
    /// One colour for every item.
    Single(Rgb),
    /// One colour per item. Missing entries fall back to the default colour;
    /// extra entries are ignored.
    PerItem(Vec<Rgb>),
}

impl ColorSpec {
    pub fn resolve(&self, n: usize, fallback: Rgb) -> Vec<Rgb> {
        match self {
            ColorSpec::Default => vec![fallback; n],
            ColorSpec::Single(c) => vec![*c; n],
            ColorSpec::PerItem(colors) => (0..n).map(|i| colors.get(i).copied().unwrap_or(fallback)).collect(),
        }
    }
}

/// Options for `PointArtist::draw_collection`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectionOptions {
    pub color: ColorSpec,
    pub layer: Option<String>,
    /// Clear the target layer before drawing.
    pub clear: bool,
    pub group: bool,
    /// Group name; the canvas picks one when `None`.
    pub group_name: Option<String>,
}

/// What `draw_collection` hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutput {
    /// Ungrouped: one handle per point, in input order.
    Objects(Vec<Handle>),
    /// Grouped: the group name, or `None` if the canvas refused the group.
    Group(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointArtist {
    point: Point,
    pub settings: ArtistSettings,
}

impl PointArtist {
    pub fn new(point: Point, layer: Option<&str>) -> Self {
        Self {
            point,
            settings: ArtistSettings::with_layer(layer),
        }
    }

    /// Draw the point. Never clears the layer.
    pub fn draw(&self, canvas: &mut dyn Canvas) -> Vec<Handle> {
        let style = PointStyle {
            pos: self.point,
            color: self.settings.point_color,
        };
        canvas.draw_points(&[style], self.settings.layer.as_deref())
    }

    /// Draw many points at once, optionally clearing the layer first and
    /// collecting the result into a group.
    pub fn draw_collection(canvas: &mut dyn Canvas, points: &[Point], options: &CollectionOptions) -> DrawOutput {
        let layer = options.layer.as_deref();
        let colors = options.color.resolve(points.len(), DEFAULT_POINT_COLOR);
        let styles: Vec<PointStyle> = points
            .iter()
            .zip(colors)
            .map(|(&pos, color)| PointStyle { pos, color })
            .collect();

        if options.clear {
            canvas.clear_layer(layer);
        }
        let handles = canvas.draw_points(&styles, layer);
        if !options.group {
            return DrawOutput::Objects(handles);
        }

        let group = canvas.add_group(options.group_name.as_deref());
        if let Some(name) = &group {
            canvas.add_to_group(&handles, name);
        } else {
            tracing::warn!(name = ?options.group_name, "canvas refused group; points left ungrouped");
        }
        DrawOutput::Group(group)
    }

    /// Convenience: draw every point of a cloud.
    pub fn draw_cloud(canvas: &mut dyn Canvas, cloud: &PointCloud, options: &CollectionOptions) -> DrawOutput {
        Self::draw_collection(canvas, cloud.points(), options)
    }
}

/// Draws a fitted primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct FitArtist<'a> {
    fit: &'a FitResult,
    pub layer: Option<String>,
    pub color: Rgb,
}

impl<'a> FitArtist<'a> {
    pub fn new(fit: &'a FitResult, layer: Option<&str>) -> Self {
        Self {
            fit,
            layer: layer.map(str::to_string),
            color: DEFAULT_POINT_COLOR,
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn draw(&self, canvas: &mut dyn Canvas) -> Handle {
        canvas.draw_primitive(&self.fit.primitive, self.color, self.layer.as_deref())
    }
}
