//! Core data types for the map annotator.
//!
//! This module defines the geometry model (coordinates and drawn shapes) and the
//! ordered registry that owns every shape drawn during a session.

use serde::{Deserialize, Serialize};

use crate::measure::MeasureError;

/// A geographic position in decimal degrees.
///
/// Latitude comes first, matching the way the map and the tabular export present
/// coordinates. KML output swaps the order on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees, expected in -90..=90
    pub lat: f64,
    /// Longitude in degrees, expected in -180..=180
    pub lon: f64,
}

impl LatLon {
    /// Creates a new coordinate pair.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns `true` when both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl From<(f64, f64)> for LatLon {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

/// The three kinds of shape the user can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    /// A single placed marker
    Marker,
    /// An open path of two or more vertices
    Polyline,
    /// A closed ring of three or more vertices
    Polygon,
}

impl ShapeKind {
    /// Display label used in exports, popups and the toolbar.
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Marker => "Marcador",
            ShapeKind::Polyline => "Polilínea",
            ShapeKind::Polygon => "Polígono",
        }
    }

    /// Minimum number of vertices a shape of this kind needs.
    pub fn min_vertices(&self) -> usize {
        match self {
            ShapeKind::Marker => 1,
            ShapeKind::Polyline => 2,
            ShapeKind::Polygon => 3,
        }
    }
}

/// A drawn shape.
///
/// Polygon rings are stored open: the closing edge from the last vertex back to
/// the first is implied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Shape {
    /// A marker at a single position
    Point(LatLon),
    /// An ordered path
    Line(Vec<LatLon>),
    /// An implicitly closed ring
    Polygon(Vec<LatLon>),
}

impl Shape {
    /// Creates a marker.
    pub fn point(position: LatLon) -> Self {
        Shape::Point(position)
    }

    /// Creates a line, rejecting paths with fewer than two vertices.
    pub fn line(vertices: Vec<LatLon>) -> Result<Self, MeasureError> {
        check_vertex_count(ShapeKind::Polyline, vertices.len())?;
        Ok(Shape::Line(vertices))
    }

    /// Creates a polygon, rejecting rings with fewer than three distinct positions.
    ///
    /// A ring that repeats its first vertex at the end is stored without the
    /// duplicate.
    pub fn polygon(mut ring: Vec<LatLon>) -> Result<Self, MeasureError> {
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        check_vertex_count(ShapeKind::Polygon, ring.len())?;
        Ok(Shape::Polygon(ring))
    }

    /// The kind tag of this shape.
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Point(_) => ShapeKind::Marker,
            Shape::Line(_) => ShapeKind::Polyline,
            Shape::Polygon(_) => ShapeKind::Polygon,
        }
    }

    /// All vertices of the shape, in drawing order.
    pub fn vertices(&self) -> &[LatLon] {
        match self {
            Shape::Point(p) => std::slice::from_ref(p),
            Shape::Line(v) | Shape::Polygon(v) => v,
        }
    }
}

fn check_vertex_count(kind: ShapeKind, got: usize) -> Result<(), MeasureError> {
    let needed = kind.min_vertices();
    if got < needed {
        return Err(MeasureError::InvalidInput { needed, got });
    }
    Ok(())
}

/// Ordered collection of every shape drawn in the current session.
///
/// Shapes keep their insertion order and have no identity beyond their
/// position. Exporters only ever borrow the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeRegistry {
    shapes: Vec<Shape>,
}

impl ShapeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a shape to the end of the registry.
    pub fn add(&mut self, shape: Shape) {
        log::debug!(
            "registry: added {} #{} ({} vertices)",
            shape.kind().label(),
            self.shapes.len(),
            shape.vertices().len()
        );
        self.shapes.push(shape);
    }

    /// Visits every shape in insertion order.
    pub fn for_each<F>(&self, visitor: F)
    where
        F: FnMut(&Shape),
    {
        self.shapes.iter().for_each(visitor);
    }

    /// Borrowing iterator over the shapes in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Shape> {
        self.shapes.iter()
    }

    /// Returns the shape at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Shape> {
        self.shapes.get(index)
    }

    /// Number of shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether no shapes have been drawn.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Drops every shape. Used when the session is reset.
    pub fn clear(&mut self) {
        log::debug!("registry: cleared {} shapes", self.shapes.len());
        self.shapes.clear();
    }
}

impl<'a> IntoIterator for &'a ShapeRegistry {
    type Item = &'a Shape;
    type IntoIter = std::slice::Iter<'a, Shape>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Shape> for ShapeRegistry {
    fn from_iter<I: IntoIterator<Item = Shape>>(iter: I) -> Self {
        Self {
            shapes: iter.into_iter().collect(),
        }
    }
}
