//! User interface components and rendering logic for the map annotator.
//!
//! This module contains the main application struct, the toolbar, the map
//! canvas and the export dialog.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main MapAnnotatorApp
//! - `canvas` - Map navigation, projection and draw-mode input handling
//! - `rendering` - Drawing the graticule, shapes and popups
//! - `export` - The export dialog
//! - `file_ops` - Downloads for native and WASM

mod canvas;
mod export;
mod file_ops;
mod rendering;
mod state;

pub use state::{DrawMode, MapAnnotatorApp};

use eframe::egui;

impl eframe::App for MapAnnotatorApp {
    /// Main update function called by egui for each frame.
    ///
    /// Lays out the toolbar, the status bar and the map canvas, then the export
    /// dialog on top.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_pending_operations();

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.draw_status_bar(ui);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.draw_canvas(ui);
            });

        self.draw_export_dialog(ctx);
    }
}

impl MapAnnotatorApp {
    /// Draws the toolbar: session, draw modes, shortcuts and export.
    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            if ui.button("Nuevo").clicked() {
                self.new_session();
            }

            ui.separator();

            for (mode, label) in [
                (DrawMode::None, "Mover"),
                (DrawMode::Marker, "Marcador"),
                (DrawMode::Polyline, "Polilínea"),
                (DrawMode::Polygon, "Polígono"),
            ] {
                if ui.selectable_label(self.draw.mode == mode, label).clicked() {
                    self.set_draw_mode(mode);
                }
            }

            ui.separator();

            // Shortcuts that start a measurement by switching the draw mode
            if ui.button("Calcular coordenadas").clicked() {
                self.set_draw_mode(DrawMode::Marker);
            }
            if ui.button("Calcular distancia").clicked() {
                self.set_draw_mode(DrawMode::Polyline);
            }
            if ui.button("Calcular área").clicked() {
                self.set_draw_mode(DrawMode::Polygon);
            }

            ui.separator();

            let drawing = !self.draw.in_progress.is_empty();
            ui.add_enabled_ui(drawing, |ui| {
                if ui.button("Terminar").clicked() {
                    self.finish_drawing();
                }
                if ui.button("Cancelar").clicked() {
                    self.cancel_drawing();
                }
            });

            ui.separator();

            ui.checkbox(&mut self.map.show_graticule, "Cuadrícula");

            if ui.button("Exportar").clicked() {
                self.open_export_dialog();
            }
        });
    }

    /// Draws the status bar: cursor position, shape count and last download outcome.
    fn draw_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            match self.draw.hover {
                Some(p) => ui.monospace(format!("{:.6}, {:.6}", p.lat, p.lon)),
                None => ui.monospace("--"),
            };
            ui.separator();
            ui.label(format!("Elementos: {}", self.registry.len()));
            ui.label(format!("Zoom: {:.2}", self.map.zoom));
            if let Some(kind) = self.draw.mode.shape_kind() {
                ui.separator();
                ui.label(format!(
                    "Dibujando {} ({} vértices)",
                    kind.label(),
                    self.draw.in_progress.len()
                ));
            }
            if let Some(length) = self.draft_length() {
                ui.label(format!("Longitud: {length:.2} m"));
            }
            if let Some(status) = &self.file.last_status {
                ui.separator();
                ui.label(status);
            }
        });
    }
}
