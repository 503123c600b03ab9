//! Shared application-wide constants.
//! Centralizes tweakable values used by measurement, export and the map canvas.

// Measurement
/// Radius of the sphere used for distances and areas, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// Export
/// Download name for the tabular export.
pub const CSV_FILE_NAME: &str = "coordenadas.csv";
/// Download name for the KML export.
pub const KML_FILE_NAME: &str = "coordenadas.kml";
/// MIME type of the tabular export.
pub const CSV_MIME_TYPE: &str = "text/csv;charset=utf-8";
/// MIME type of the KML export.
pub const KML_MIME_TYPE: &str = "application/vnd.google-earth.kml+xml";
/// XML namespace of KML 2.2 documents.
pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
/// Placeholder for fields that do not apply to a row.
pub const NOT_APPLICABLE: &str = "N/A";

// Map view
/// Initial map center (Madrid), latitude then longitude.
pub const DEFAULT_CENTER: (f64, f64) = (40.4165, -3.7026);
/// Initial zoom level, in the same units as web map zoom levels.
pub const DEFAULT_ZOOM: f32 = 5.0;
/// Most zoomed-out level allowed.
pub const MIN_ZOOM: f32 = 1.0;
/// Most zoomed-in level allowed.
pub const MAX_ZOOM: f32 = 18.0;
/// Zoom change per scroll notch.
pub const ZOOM_STEP: f32 = 0.25;
/// Screen pixels per degree at zoom level 0.
pub const PIXELS_PER_DEGREE_AT_ZOOM_0: f32 = 256.0 / 360.0;

// Drawing
/// Radius of a marker on screen, in pixels.
pub const MARKER_RADIUS: f32 = 6.0;
/// Radius of an in-progress vertex handle, in pixels.
pub const VERTEX_RADIUS: f32 = 3.5;
/// Stroke width for lines and polygon outlines, in pixels.
pub const SHAPE_STROKE_WIDTH: f32 = 2.5;
