//! Drawing collaborator interface and a recording implementation.
//!
//! `Canvas` is what artists draw into. `SceneCanvas` keeps every call as a
//! serializable scene (objects per layer plus named groups), which is what the
//! `draw` command writes to JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Point, Primitive};
use crate::error::AppError;

pub const DEFAULT_LAYER: &str = "Default";

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.0, self.1, self.2)
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Parses `r,g,b` with each channel in `0..=255`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [r, g, b] = parts.as_slice() else {
            return Err(format!("Expected a colour as r,g,b, got '{s}'"));
        };
        let channel = |c: &str| c.parse::<u8>().map_err(|_| format!("Invalid colour channel '{c}' in '{s}'"));
        Ok(Rgb(channel(*r)?, channel(*g)?, channel(*b)?))
    }
}

/// Opaque identifier of a drawn object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(Uuid);

impl Handle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One point to draw, with its colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointStyle {
    pub pos: Point,
    pub color: Rgb,
}

/// External drawing target.
///
/// `layer: None` means the canvas's current layer.
pub trait Canvas {
    fn draw_points(&mut self, points: &[PointStyle], layer: Option<&str>) -> Vec<Handle>;

    fn draw_primitive(&mut self, primitive: &Primitive, color: Rgb, layer: Option<&str>) -> Handle;

    fn clear_layer(&mut self, layer: Option<&str>);

    /// Create a group. `None` lets the canvas pick a name. Returns the group
    /// name, or `None` if the group could not be created.
    fn add_group(&mut self, name: Option<&str>) -> Option<String>;

    /// Returns `false` if the group does not exist.
    fn add_to_group(&mut self, handles: &[Handle], group: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Point { pos: Point },
    Primitive { primitive: Primitive },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub handle: Handle,
    pub layer: String,
    pub color: Rgb,
    pub shape: Shape,
}

/// A canvas that records everything drawn into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneCanvas {
    pub current_layer: String,
    pub objects: Vec<SceneObject>,
    pub groups: BTreeMap<String, Vec<Handle>>,
}

impl Default for SceneCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneCanvas {
    pub fn new() -> Self {
        Self {
            current_layer: DEFAULT_LAYER.to_string(),
            objects: Vec::new(),
            groups: BTreeMap::new(),
        }
    }

    pub fn with_current_layer(layer: impl Into<String>) -> Self {
        Self {
            current_layer: layer.into(),
            ..Self::new()
        }
    }

    pub fn objects_on<'a>(&'a self, layer: &'a str) -> impl Iterator<Item = &'a SceneObject> + 'a {
        self.objects.iter().filter(move |o| o.layer == layer)
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        serde_json::to_string_pretty(self).map_err(|e| AppError::new(2, format!("Failed to encode scene: {e}")))
    }

    pub fn write(&self, path: &Path) -> Result<(), AppError> {
        let json = self.to_json()?;
        std::fs::write(path, json)
            .map_err(|e| AppError::new(2, format!("Failed to write scene JSON '{}': {e}", path.display())))
    }

    fn layer_name(&self, layer: Option<&str>) -> String {
        layer.unwrap_or(&self.current_layer).to_string()
    }

    fn push(&mut self, layer: String, color: Rgb, shape: Shape) -> Handle {
        let handle = Handle::new();
        self.objects.push(SceneObject {
            handle,
            layer,
            color,
            shape,
        });
        handle
    }
}

impl Canvas for SceneCanvas {
    fn draw_points(&mut self, points: &[PointStyle], layer: Option<&str>) -> Vec<Handle> {
        let layer = self.layer_name(layer);
        points
            .iter()
            .map(|p| self.push(layer.clone(), p.color, Shape::Point { pos: p.pos }))
            .collect()
    }

    fn draw_primitive(&mut self, primitive: &Primitive, color: Rgb, layer: Option<&str>) -> Handle {
        let layer = self.layer_name(layer);
        self.push(layer, color, Shape::Primitive { primitive: *primitive })
    }

    fn clear_layer(&mut self, layer: Option<&str>) {
        let layer = self.layer_name(layer);
        let removed: Vec<Handle> = self.objects_on(&layer).map(|o| o.handle).collect();
        self.objects.retain(|o| o.layer != layer);
        for members in self.groups.values_mut() {
            members.retain(|h| !removed.contains(h));
        }
        tracing::debug!(layer = %layer, removed = removed.len(), "cleared layer");
    }

    fn add_group(&mut self, name: Option<&str>) -> Option<String> {
        let name = match name {
            Some(n) if self.groups.contains_key(n) => return None,
            Some(n) => n.to_string(),
            None => (1..)
                .map(|i| format!("group_{i}"))
                .find(|n| !self.groups.contains_key(n))?,
        };
        self.groups.insert(name.clone(), Vec::new());
        Some(name)
    }

    fn add_to_group(&mut self, handles: &[Handle], group: &str) -> bool {
        match self.groups.get_mut(group) {
            Some(members) => {
                members.extend_from_slice(handles);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Sphere, Vector};

    fn black(p: Point) -> PointStyle {
        PointStyle {
            pos: p,
            color: Rgb(0, 0, 0),
        }
    }

    #[test]
    fn parses_colours() {
        assert_eq!("255, 128,0".parse::<Rgb>(), Ok(Rgb(255, 128, 0)));
        assert!("256,0,0".parse::<Rgb>().is_err());
        assert!("1,2".parse::<Rgb>().is_err());
        assert_eq!(Rgb(1, 2, 3).to_string(), "1,2,3");
    }

    #[test]
    fn points_go_to_current_layer_by_default() {
        let mut canvas = SceneCanvas::with_current_layer("work");
        let handles = canvas.draw_points(&[black(Point::origin()), black(Point::new(1.0, 0.0, 0.0))], None);
        canvas.draw_points(&[black(Point::origin())], Some("other"));

        assert_eq!(handles.len(), 2);
        assert_ne!(handles[0], handles[1]);
        assert_eq!(canvas.objects_on("work").count(), 2);
        assert_eq!(canvas.objects_on("other").count(), 1);
    }

    #[test]
    fn clearing_a_layer_drops_group_members() {
        let mut canvas = SceneCanvas::new();
        let handles = canvas.draw_points(&[black(Point::origin())], Some("a"));
        canvas.draw_points(&[black(Point::origin())], Some("b"));
        let group = canvas.add_group(Some("g")).unwrap();
        assert!(canvas.add_to_group(&handles, &group));

        canvas.clear_layer(Some("a"));

        assert_eq!(canvas.objects.len(), 1);
        assert!(canvas.groups["g"].is_empty());
    }

    #[test]
    fn groups_are_auto_named_and_unique() {
        let mut canvas = SceneCanvas::new();
        assert_eq!(canvas.add_group(None).as_deref(), Some("group_1"));
        assert_eq!(canvas.add_group(Some("group_2")).as_deref(), Some("group_2"));
        assert_eq!(canvas.add_group(None).as_deref(), Some("group_3"));
        assert_eq!(canvas.add_group(Some("group_1")), None);
        assert!(!canvas.add_to_group(&[Handle::new()], "missing"));
    }

    #[test]
    fn scene_serializes_shapes_by_type() {
        let mut canvas = SceneCanvas::new();
        canvas.draw_primitive(
            &Primitive::Sphere(Sphere {
                center: Point::origin() + Vector::x_axis(),
                radius: 2.0,
            }),
            Rgb(255, 0, 0),
            None,
        );
        let json: serde_json::Value = serde_json::from_str(&canvas.to_json().unwrap()).unwrap();
        let obj = &json["objects"][0];
        assert_eq!(obj["layer"], DEFAULT_LAYER);
        assert_eq!(obj["shape"]["type"], "primitive");
        assert_eq!(obj["shape"]["primitive"]["kind"], "sphere");
    }
}
