//! Map rendering functionality for the graticule, drawn shapes and popups.
//!
//! This module handles all drawing operations on the map canvas. Shapes are drawn
//! in registry order so later shapes appear on top.

use super::state::{DrawMode, MapAnnotatorApp};
use crate::constants::{MARKER_RADIUS, SHAPE_STROKE_WIDTH, VERTEX_RADIUS};
use crate::types::*;
use eframe::egui;

/// Graticule spacings in degrees, coarsest first.
const GRATICULE_STEPS: [f64; 10] = [30.0, 10.0, 5.0, 2.0, 1.0, 0.5, 0.25, 0.1, 0.05, 0.01];
/// Minimum on-screen distance between graticule lines, in pixels.
const MIN_GRATICULE_SPACING: f64 = 60.0;

const MARKER_COLOR: egui::Color32 = egui::Color32::from_rgb(40, 110, 220);
const LINE_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 60, 60);
const POLYGON_COLOR: egui::Color32 = egui::Color32::from_rgb(60, 160, 80);
const DRAFT_COLOR: egui::Color32 = egui::Color32::from_rgb(240, 160, 30);

/// Picks the finest graticule step that keeps lines at least
/// [`MIN_GRATICULE_SPACING`] pixels apart.
pub fn graticule_step(pixels_per_degree: f64) -> f64 {
    GRATICULE_STEPS
        .iter()
        .copied()
        .filter(|step| step * pixels_per_degree >= MIN_GRATICULE_SPACING)
        .last()
        .unwrap_or(GRATICULE_STEPS[0])
}

impl MapAnnotatorApp {
    /// Renders the map background, graticule, every shape and the shape being drawn.
    pub fn render_map(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_rgb(214, 228, 238));

        if self.map.show_graticule {
            self.draw_graticule(painter, canvas_rect);
        }

        for shape in &self.registry {
            self.draw_shape(painter, canvas_rect, shape);
        }

        self.draw_in_progress(painter, canvas_rect);
    }

    /// Draws meridians and parallels with degree labels.
    ///
    /// Only the part of the graticule inside the world bounds and the canvas is drawn.
    pub fn draw_graticule(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let ppd = self.map.pixels_per_degree() as f64;
        let step = graticule_step(ppd);
        let stroke = egui::Stroke::new(1.0, egui::Color32::from_rgba_unmultiplied(90, 90, 90, 60));
        let equator_stroke =
            egui::Stroke::new(1.5, egui::Color32::from_rgba_unmultiplied(90, 90, 90, 120));
        let label_color = egui::Color32::from_gray(70);
        let font = egui::FontId::proportional(10.0);

        let top_left = self.map.screen_to_geo(canvas_rect, canvas_rect.min);
        let bottom_right = self.map.screen_to_geo(canvas_rect, canvas_rect.max);

        // Meridians
        let mut lon = (top_left.lon / step).floor() * step;
        while lon <= bottom_right.lon {
            let x = self.map.geo_to_screen(canvas_rect, LatLon::new(0.0, lon)).x;
            if x >= canvas_rect.min.x && x <= canvas_rect.max.x {
                let s = if lon.abs() < 1e-9 { equator_stroke } else { stroke };
                painter.line_segment(
                    [egui::pos2(x, canvas_rect.min.y), egui::pos2(x, canvas_rect.max.y)],
                    s,
                );
                painter.text(
                    egui::pos2(x + 2.0, canvas_rect.max.y - 2.0),
                    egui::Align2::LEFT_BOTTOM,
                    format_degrees(lon, step),
                    font.clone(),
                    label_color,
                );
            }
            lon += step;
        }

        // Parallels
        let mut lat = (bottom_right.lat / step).floor() * step;
        while lat <= top_left.lat {
            let y = self.map.geo_to_screen(canvas_rect, LatLon::new(lat, 0.0)).y;
            if y >= canvas_rect.min.y && y <= canvas_rect.max.y {
                let s = if lat.abs() < 1e-9 { equator_stroke } else { stroke };
                painter.line_segment(
                    [egui::pos2(canvas_rect.min.x, y), egui::pos2(canvas_rect.max.x, y)],
                    s,
                );
                painter.text(
                    egui::pos2(canvas_rect.min.x + 2.0, y - 2.0),
                    egui::Align2::LEFT_BOTTOM,
                    format_degrees(lat, step),
                    font.clone(),
                    label_color,
                );
            }
            lat += step;
        }
    }

    /// Draws a completed shape.
    pub fn draw_shape(&self, painter: &egui::Painter, canvas_rect: egui::Rect, shape: &Shape) {
        let points: Vec<egui::Pos2> = shape
            .vertices()
            .iter()
            .map(|v| self.map.geo_to_screen(canvas_rect, *v))
            .collect();

        match shape {
            Shape::Point(_) => {
                painter.circle_filled(points[0], MARKER_RADIUS, MARKER_COLOR);
                painter.circle_stroke(
                    points[0],
                    MARKER_RADIUS,
                    egui::Stroke::new(1.5, egui::Color32::WHITE),
                );
            }
            Shape::Line(_) => {
                painter.add(egui::Shape::line(
                    points,
                    egui::Stroke::new(SHAPE_STROKE_WIDTH, LINE_COLOR),
                ));
            }
            Shape::Polygon(_) => {
                // Outline only: egui fills are exact for convex rings alone.
                painter.add(egui::Shape::closed_line(
                    points.clone(),
                    egui::Stroke::new(SHAPE_STROKE_WIDTH, POLYGON_COLOR),
                ));
                for p in points {
                    painter.circle_filled(p, VERTEX_RADIUS * 0.75, POLYGON_COLOR);
                }
            }
        }
    }

    /// Draws the unfinished line or polygon, including the segment to the cursor.
    fn draw_in_progress(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        if self.draw.in_progress.is_empty() {
            return;
        }
        let mut points: Vec<egui::Pos2> = self
            .draw
            .in_progress
            .iter()
            .map(|v| self.map.geo_to_screen(canvas_rect, *v))
            .collect();
        let placed = points.len();

        if let Some(hover) = self.draw.hover {
            points.push(self.map.geo_to_screen(canvas_rect, hover));
        }
        let stroke = egui::Stroke::new(SHAPE_STROKE_WIDTH, DRAFT_COLOR);
        if self.draw.mode == DrawMode::Polygon && points.len() >= 3 {
            painter.add(egui::Shape::closed_line(points.clone(), stroke));
        } else if points.len() >= 2 {
            painter.add(egui::Shape::line(points.clone(), stroke));
        }

        for p in points.iter().take(placed) {
            painter.circle_filled(*p, VERTEX_RADIUS, DRAFT_COLOR);
        }
    }

    /// Shows the measurement popup of the last completed shape.
    pub fn draw_popup(&mut self, ui: &mut egui::Ui, canvas_rect: egui::Rect) {
        let Some(popup) = &self.popup else {
            return;
        };
        let anchor = self.map.geo_to_screen(canvas_rect, popup.anchor);
        if !canvas_rect.contains(anchor) {
            return;
        }

        let text = popup.text.clone();
        let mut close = false;
        egui::Area::new(egui::Id::new("measure_popup"))
            .fixed_pos(anchor + egui::vec2(10.0, -34.0))
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(text);
                        if ui.small_button("✕").clicked() {
                            close = true;
                        }
                    });
                });
            });

        if close {
            self.popup = None;
        }
    }
}

/// Formats a graticule value with only as many decimals as the step needs.
fn format_degrees(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 {
        0
    } else if step >= 0.1 {
        1
    } else {
        2
    };
    format!("{:.*}°", decimals, value)
}
