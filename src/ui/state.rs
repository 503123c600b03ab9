//! Application state management structures.
//!
//! This module contains the state structures that track the map view, the shape
//! currently being drawn, the export dialog and pending downloads.

use crate::constants::{DEFAULT_CENTER, DEFAULT_ZOOM};
use crate::export::Row;
use crate::types::*;
use eframe::egui;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Which kind of shape a click on the map produces.
///
/// Exactly one mode is active at a time, and one completion handler dispatches on
/// it, so switching modes never stacks handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    /// Clicks do nothing; primary drag pans the map
    #[default]
    None,
    /// Each click drops a marker
    Marker,
    /// Clicks append vertices to an open path
    Polyline,
    /// Clicks append vertices to a ring
    Polygon,
}

impl DrawMode {
    /// The shape kind this mode produces, if any.
    pub fn shape_kind(&self) -> Option<ShapeKind> {
        match self {
            DrawMode::None => None,
            DrawMode::Marker => Some(ShapeKind::Marker),
            DrawMode::Polyline => Some(ShapeKind::Polyline),
            DrawMode::Polygon => Some(ShapeKind::Polygon),
        }
    }
}

/// Map navigation state.
///
/// The map is an equirectangular lat/lon plane: a degree of longitude and a
/// degree of latitude cover the same number of pixels at a given zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    /// Geographic position shown at the center of the canvas
    pub center: LatLon,
    /// Web-map style zoom level; each step doubles the scale
    pub zoom: f32,
    /// Whether the graticule should be drawn
    pub show_graticule: bool,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: LatLon::new(DEFAULT_CENTER.0, DEFAULT_CENTER.1),
            zoom: DEFAULT_ZOOM,
            show_graticule: true,
        }
    }
}

/// The shape currently under construction.
#[derive(Debug, Clone, Default)]
pub struct DrawState {
    /// Active draw mode
    pub mode: DrawMode,
    /// Vertices placed so far for a line or polygon
    pub in_progress: Vec<LatLon>,
    /// Map position under the cursor, for the rubber-band segment and status bar
    pub hover: Option<LatLon>,
    /// Whether the user is dragging the map
    pub is_panning: bool,
    /// Last pointer position while panning
    pub last_pan_pos: Option<egui::Pos2>,
}

/// Measurement popup shown after a shape is completed.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    /// Map position the popup points at
    pub anchor: LatLon,
    /// Text to display
    pub text: String,
}

/// State of the export dialog.
#[derive(Debug, Clone, Default)]
pub struct ExportDialogState {
    /// Whether the dialog is visible
    pub open: bool,
    /// Table rows captured when the dialog was opened
    pub rows: Vec<Row>,
}

/// Messages sent from download tasks back to the main app.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadResult {
    /// The file was written or handed to the browser under the given name
    Completed(String),
    /// The user dismissed the save dialog
    Cancelled,
    /// The download failed with the given message
    Failed(String),
}

/// State related to downloads.
pub struct FileState {
    /// Channel for receiving download results from async contexts
    pub download_sender: Sender<DownloadResult>,
    /// Receiving end drained once per frame
    pub download_receiver: Receiver<DownloadResult>,
    /// Last outcome, shown in the status bar
    pub last_status: Option<String>,
}

impl Default for FileState {
    fn default() -> Self {
        let (download_sender, download_receiver) = channel();
        Self {
            download_sender,
            download_receiver,
            last_status: None,
        }
    }
}

/// The main application structure containing UI state and the drawn shapes.
///
/// This struct implements the `eframe::App` trait and owns the session's
/// [`ShapeRegistry`].
pub struct MapAnnotatorApp {
    /// Every shape drawn this session
    pub registry: ShapeRegistry,
    /// Map navigation state
    pub map: MapView,
    /// Shape under construction and pointer tracking
    pub draw: DrawState,
    /// Popup for the most recently completed shape
    pub popup: Option<Popup>,
    /// Export dialog state
    pub export_dialog: ExportDialogState,
    /// Download state
    pub file: FileState,
    /// Screen rectangle of the map canvas in the last frame
    pub canvas_rect: egui::Rect,
}

impl Default for MapAnnotatorApp {
    fn default() -> Self {
        Self {
            registry: ShapeRegistry::new(),
            map: MapView::default(),
            draw: DrawState::default(),
            popup: None,
            export_dialog: ExportDialogState::default(),
            file: FileState::default(),
            canvas_rect: egui::Rect::NOTHING,
        }
    }
}

impl MapAnnotatorApp {
    /// Resets the session: drops every shape and any drawing in progress.
    ///
    /// The map position is kept.
    pub fn new_session(&mut self) {
        log::info!("starting a new session, discarding {} shapes", self.registry.len());
        self.registry.clear();
        self.draw.in_progress.clear();
        self.popup = None;
        self.export_dialog = ExportDialogState::default();
    }
}
