//! Export dialog: a table preview of the rows and the download buttons.

use super::state::MapAnnotatorApp;
use crate::export::{to_rows, ExportFormat, Row};
use eframe::egui;

impl MapAnnotatorApp {
    /// Opens the export dialog with a fresh snapshot of the table rows.
    pub fn open_export_dialog(&mut self) {
        self.export_dialog.rows = to_rows(&self.registry);
        self.export_dialog.open = true;
    }

    /// Shows the export dialog when it is open.
    pub fn draw_export_dialog(&mut self, ctx: &egui::Context) {
        if !self.export_dialog.open {
            return;
        }

        let mut requested: Option<ExportFormat> = None;
        let mut close = false;

        egui::Window::new("Coordenadas")
            .collapsible(false)
            .resizable(true)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                if self.export_dialog.rows.is_empty() {
                    ui.label("No hay elementos dibujados.");
                } else {
                    egui::ScrollArea::vertical().max_height(320.0).show(ui, |ui| {
                        egui::Grid::new("coordinates_table")
                            .striped(true)
                            .num_columns(6)
                            .show(ui, |ui| {
                                for title in Row::header() {
                                    ui.strong(title);
                                }
                                ui.end_row();
                                for row in &self.export_dialog.rows {
                                    for field in row.fields() {
                                        ui.label(field);
                                    }
                                    ui.end_row();
                                }
                            });
                    });
                }

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Descargar CSV").clicked() {
                        requested = Some(ExportFormat::Csv);
                    }
                    if ui.button("Descargar KML").clicked() {
                        requested = Some(ExportFormat::Kml);
                    }
                    if ui.button("Cerrar").clicked() {
                        close = true;
                    }
                });
            });

        if let Some(format) = requested {
            self.download(ctx, format);
        }
        if close {
            self.export_dialog.open = false;
        }
    }
}
