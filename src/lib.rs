//! # Map Annotator
//!
//! A map annotation tool: draw markers, polylines and polygons on a map, read
//! their coordinates, geodesic length or area, and export everything as a CSV
//! table or a KML document.
//!
//! The crate is split into a UI-free core and an egui front end:
//! - [`types`]: the shape model and the session's [`ShapeRegistry`]
//! - [`measure`]: geodesic path length and ring area
//! - [`export`]: CSV and KML serializers
//!
//! ## Features
//! - Marker, polyline and polygon drawing with a single active draw mode
//! - Measurement popup for every completed shape
//! - Table preview of the export and CSV/KML downloads
//! - Runs natively and in the browser (wasm32)

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod export;
pub mod measure;
pub mod types;
mod ui;

// Re-export the core types and operations
pub use export::{popup_text, to_csv, to_kml, to_rows, ExportError, ExportFormat, Row};
pub use measure::{distance, path_length, ring_area, MeasureError};
pub use types::*;
use ui::MapAnnotatorApp;

/// Runs the map annotator as a native desktop application.
///
/// This function initializes the egui application window and starts the main event loop.
///
/// # Returns
///
/// Returns `Ok(())` if the application runs successfully, or an `eframe::Error` if
/// initialization fails.
///
/// # Example
///
/// ```no_run
/// use map_annotator::run_app;
///
/// fn main() -> Result<(), eframe::Error> {
///     run_app()
/// }
/// ```
#[cfg(not(target_arch = "wasm32"))]
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Map Annotator",
        options,
        Box::new(|_cc| Ok(Box::new(MapAnnotatorApp::default()))),
    )
}

/// Starts the map annotator inside the given browser canvas.
///
/// Logging goes to the browser console.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub async fn start(canvas: web_sys::HtmlCanvasElement) -> Result<(), wasm_bindgen::JsValue> {
    let _ = eframe::WebLogger::init(log::LevelFilter::Debug);
    eframe::WebRunner::new()
        .start(
            canvas,
            eframe::WebOptions::default(),
            Box::new(|_cc| Ok(Box::new(MapAnnotatorApp::default()))),
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_to_exports() {
        let mut registry = ShapeRegistry::new();
        registry.add(Shape::point(LatLon::new(40.4165, -3.7026)));
        registry.add(Shape::line(vec![LatLon::new(0.0, 0.0), LatLon::new(0.0, 1.0)]).unwrap());

        let csv = to_csv(&registry).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.contains("Marcador,40.416500,-3.702600,N/A,N/A,N/A"));

        let kml = to_kml(&registry);
        assert_eq!(kml.matches("<Placemark>").count(), 2);
        assert!(kml.contains("<coordinates>0,0,0 1,0,0</coordinates>"));
    }

    #[test]
    fn test_measure_error_message() {
        let err = path_length(&[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid input: at least 2 vertices required, got 0"
        );
    }
}
