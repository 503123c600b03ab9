//! Map canvas interaction and navigation functionality.
//!
//! This module handles panning, zooming, the coordinate transformations between
//! screen and map space, and turning clicks into shapes according to the active
//! draw mode.

use super::state::{DrawMode, MapAnnotatorApp, MapView, Popup};
use crate::constants::{MAX_ZOOM, MIN_ZOOM, PIXELS_PER_DEGREE_AT_ZOOM_0, ZOOM_STEP};
use crate::export::popup_text;
use crate::measure::{distance, path_length, MeasureError};
use crate::types::*;
use eframe::egui;

impl MapView {
    /// Screen pixels covered by one degree at the current zoom.
    pub fn pixels_per_degree(&self) -> f32 {
        PIXELS_PER_DEGREE_AT_ZOOM_0 * 2f32.powf(self.zoom)
    }

    /// Converts a map position to screen coordinates inside `rect`.
    pub fn geo_to_screen(&self, rect: egui::Rect, position: LatLon) -> egui::Pos2 {
        let scale = self.pixels_per_degree() as f64;
        let c = rect.center();
        egui::pos2(
            c.x + ((position.lon - self.center.lon) * scale) as f32,
            c.y - ((position.lat - self.center.lat) * scale) as f32,
        )
    }

    /// Converts a screen position inside `rect` to a map position.
    ///
    /// The result is clamped to valid latitude and longitude ranges.
    pub fn screen_to_geo(&self, rect: egui::Rect, pos: egui::Pos2) -> LatLon {
        let unclamped = self.screen_to_geo_unclamped(rect, pos);
        clamp_lat_lon(unclamped)
    }

    fn screen_to_geo_unclamped(&self, rect: egui::Rect, pos: egui::Pos2) -> LatLon {
        let scale = self.pixels_per_degree() as f64;
        let c = rect.center();
        LatLon::new(
            self.center.lat - (pos.y - c.y) as f64 / scale,
            self.center.lon + (pos.x - c.x) as f64 / scale,
        )
    }

    /// Moves the map so that content follows a pointer drag of `delta` pixels.
    pub fn pan_by(&mut self, delta: egui::Vec2) {
        let scale = self.pixels_per_degree() as f64;
        self.center = clamp_lat_lon(LatLon::new(
            self.center.lat + delta.y as f64 / scale,
            self.center.lon - delta.x as f64 / scale,
        ));
    }

    /// Changes the zoom by `delta` levels while keeping the map position under
    /// `anchor` fixed on screen.
    pub fn zoom_at(&mut self, rect: egui::Rect, anchor: egui::Pos2, delta: f32) {
        let old_zoom = self.zoom;
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        if (self.zoom - old_zoom).abs() <= f32::EPSILON {
            return;
        }

        // Position under the cursor before the zoom changed
        let mut before = *self;
        before.zoom = old_zoom;
        let fixed = before.screen_to_geo_unclamped(rect, anchor);

        let scale = self.pixels_per_degree() as f64;
        let c = rect.center();
        self.center = clamp_lat_lon(LatLon::new(
            fixed.lat + (anchor.y - c.y) as f64 / scale,
            fixed.lon - (anchor.x - c.x) as f64 / scale,
        ));
    }
}

fn clamp_lat_lon(p: LatLon) -> LatLon {
    LatLon::new(p.lat.clamp(-90.0, 90.0), p.lon.clamp(-180.0, 180.0))
}

impl MapAnnotatorApp {
    /// Draws the map canvas and processes all pointer and keyboard input on it.
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        self.canvas_rect = response.rect;

        self.handle_map_panning(ui, &response);
        self.handle_map_zoom(ui, &response);
        self.handle_drawing_input(ui, &response);

        self.render_map(&painter, response.rect);
        self.draw_popup(ui, response.rect);
    }

    /// Handles map panning.
    ///
    /// Middle drag or Cmd/Ctrl+left drag always pans; a plain left drag pans
    /// when no draw mode is active.
    pub fn handle_map_panning(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let idle = self.draw.mode == DrawMode::None;
        let should_pan = ui.input(|i| {
            i.pointer.middle_down()
                || (i.pointer.primary_down() && (i.modifiers.command || idle))
        });

        if should_pan && response.dragged() {
            if let Some(current_pos) = response.interact_pointer_pos() {
                if !self.draw.is_panning {
                    self.draw.is_panning = true;
                    self.draw.last_pan_pos = Some(current_pos);
                } else if let Some(last_pos) = self.draw.last_pan_pos {
                    self.map.pan_by(current_pos - last_pos);
                    self.draw.last_pan_pos = Some(current_pos);
                }
            }
        } else {
            self.draw.is_panning = false;
            self.draw.last_pan_pos = None;
        }
    }

    /// Handles scroll wheel zooming around the cursor.
    pub fn handle_map_zoom(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll_delta == 0.0 {
            return;
        }

        let mouse_pos = ui
            .input(|i| i.pointer.hover_pos())
            .or_else(|| response.interact_pointer_pos());

        if let Some(mouse_pos) = mouse_pos {
            if !response.rect.contains(mouse_pos) {
                return;
            }
            let step = if scroll_delta > 0.0 { ZOOM_STEP } else { -ZOOM_STEP };
            self.map.zoom_at(response.rect, mouse_pos, step);
        }
    }

    /// Translates clicks and keys on the canvas into drawing actions.
    ///
    /// A double click or Enter finishes a line or polygon, Escape discards it.
    /// A double click that cannot finish anything counts as an ordinary click,
    /// so quick successive clicks still place markers and vertices.
    fn handle_drawing_input(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        self.draw.hover = response
            .hover_pos()
            .map(|pos| self.map.screen_to_geo(response.rect, pos));

        let clicked = response.clicked() || response.double_clicked();
        if clicked && !ui.input(|i| i.modifiers.command) {
            if let Some(pos) = response.interact_pointer_pos() {
                let position = self.map.screen_to_geo(response.rect, pos);
                if !(response.double_clicked() && self.finish_drawing()) {
                    self.handle_map_click(position);
                }
            }
        }

        let (enter, escape) =
            ui.input(|i| (i.key_pressed(egui::Key::Enter), i.key_pressed(egui::Key::Escape)));
        if enter {
            self.finish_drawing();
        }
        if escape {
            self.cancel_drawing();
        }
    }

    /// Switches the draw mode, discarding any unfinished shape.
    pub fn set_draw_mode(&mut self, mode: DrawMode) {
        if self.draw.mode != mode {
            if !self.draw.in_progress.is_empty() {
                log::debug!(
                    "discarding {} unfinished vertices on mode change",
                    self.draw.in_progress.len()
                );
            }
            self.draw.in_progress.clear();
            self.draw.mode = mode;
        }
    }

    /// Handles a click at `position` according to the active draw mode.
    pub fn handle_map_click(&mut self, position: LatLon) {
        match self.draw.mode {
            DrawMode::None => {}
            DrawMode::Marker => self.complete_shape(Shape::point(position)),
            DrawMode::Polyline | DrawMode::Polygon => {
                self.popup = None;
                self.draw.in_progress.push(position);
            }
        }
    }

    /// Finishes the line or polygon under construction.
    ///
    /// Returns `true` if a shape was added. A shape with too few vertices stays
    /// in progress so the user can keep clicking.
    pub fn finish_drawing(&mut self) -> bool {
        let vertices = self.draw.in_progress.clone();
        let shape = match self.draw.mode {
            DrawMode::Polyline => Shape::line(vertices),
            DrawMode::Polygon => Shape::polygon(vertices),
            DrawMode::None | DrawMode::Marker => return false,
        };

        match shape {
            Ok(shape) => {
                self.draw.in_progress.clear();
                self.complete_shape(shape);
                true
            }
            Err(MeasureError::InvalidInput { needed, got }) => {
                log::debug!("cannot finish shape yet: {got} of {needed} vertices");
                false
            }
            Err(err) => {
                log::warn!("cannot finish shape: {err}");
                false
            }
        }
    }

    /// Length in meters of the line or polygon outline being drawn, including
    /// the pending segment from the last vertex to the cursor.
    ///
    /// Returns `None` when no line or polygon is in progress.
    pub fn draft_length(&self) -> Option<f64> {
        if !matches!(self.draw.mode, DrawMode::Polyline | DrawMode::Polygon) {
            return None;
        }
        let last = *self.draw.in_progress.last()?;
        let placed = if self.draw.in_progress.len() >= 2 {
            path_length(&self.draw.in_progress).ok()?
        } else {
            0.0
        };
        let pending = self.draw.hover.map_or(0.0, |hover| distance(last, hover));
        Some(placed + pending)
    }

    /// Discards the unfinished shape, if any.
    pub fn cancel_drawing(&mut self) {
        self.draw.in_progress.clear();
    }

    /// Adds a completed shape to the registry and opens its measurement popup.
    fn complete_shape(&mut self, shape: Shape) {
        let anchor = match shape.vertices().last() {
            Some(v) => *v,
            None => return,
        };
        match popup_text(&shape) {
            Ok(text) => {
                log::info!("{} drawn: {text}", shape.kind().label());
                self.popup = Some(Popup { anchor, text });
            }
            Err(err) => {
                log::warn!("{} drawn but could not be measured: {err}", shape.kind().label());
                self.popup = None;
            }
        }
        self.registry.add(shape);
    }
}
