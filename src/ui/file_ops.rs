//! File operations for downloading exports.
//!
//! This module hands rendered documents to the user: a native save dialog on
//! desktop and a browser download on the web.

use super::state::{DownloadResult, MapAnnotatorApp};
use crate::export::ExportFormat;
use eframe::egui;

impl MapAnnotatorApp {
    /// Processes results sent back by finished downloads.
    pub fn handle_pending_operations(&mut self) {
        while let Ok(result) = self.file.download_receiver.try_recv() {
            let status = match result {
                DownloadResult::Completed(name) => {
                    log::info!("export saved as {name}");
                    format!("Guardado: {name}")
                }
                DownloadResult::Cancelled => {
                    log::debug!("export dialog dismissed");
                    "Descarga cancelada".to_string()
                }
                DownloadResult::Failed(err) => {
                    log::error!("export failed: {err}");
                    format!("Error: {err}")
                }
            };
            self.file.last_status = Some(status);
        }
    }

    /// Renders the registry in `format` and starts the download.
    ///
    /// `ctx` is repainted once the result is available so the status bar
    /// picks it up without waiting for input.
    pub fn download(&mut self, ctx: &egui::Context, format: ExportFormat) {
        let content = match format.render(&self.registry) {
            Ok(content) => content,
            Err(err) => {
                let _ = self
                    .file
                    .download_sender
                    .send(DownloadResult::Failed(err.to_string()));
                ctx.request_repaint();
                return;
            }
        };
        log::info!(
            "exporting {} shapes as {} ({} bytes)",
            self.registry.len(),
            format.file_name(),
            content.len()
        );

        #[cfg(target_arch = "wasm32")]
        {
            let result =
                match Self::trigger_download(format.file_name(), format.mime_type(), &content) {
                    Ok(()) => DownloadResult::Completed(format.file_name().to_string()),
                    Err(e) => DownloadResult::Failed(e),
                };
            let _ = self.file.download_sender.send(result);
            ctx.request_repaint();
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let sender = self.file.download_sender.clone();
            let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                let _ = sender.send(DownloadResult::Failed(
                    "no async runtime available for the save dialog".to_string(),
                ));
                ctx.request_repaint();
                return;
            };

            let ctx = ctx.clone();
            runtime.spawn(async move {
                let result = match rfd::AsyncFileDialog::new()
                    .add_filter(format.extension().to_uppercase(), &[format.extension()])
                    .set_file_name(format.file_name())
                    .save_file()
                    .await
                {
                    Some(handle) => {
                        let path = handle.path().to_path_buf();
                        match std::fs::write(&path, content.as_bytes()) {
                            Ok(_) => DownloadResult::Completed(path.display().to_string()),
                            Err(e) => DownloadResult::Failed(format!(
                                "Failed to save {}: {}",
                                path.display(),
                                e
                            )),
                        }
                    }
                    None => DownloadResult::Cancelled,
                };
                let _ = sender.send(result);
                ctx.request_repaint();
            });
        }
    }

    /// Triggers a file download in the browser (WASM only).
    ///
    /// Creates a temporary anchor element with a blob URL and clicks it.
    #[cfg(target_arch = "wasm32")]
    fn trigger_download(filename: &str, mime_type: &str, content: &str) -> Result<(), String> {
        use wasm_bindgen::JsCast;

        let window = web_sys::window().ok_or("No window found")?;
        let document = window.document().ok_or("No document found")?;

        let blob_parts = js_sys::Array::new();
        blob_parts.push(&wasm_bindgen::JsValue::from_str(content));

        let blob_options = web_sys::BlobPropertyBag::new();
        blob_options.set_type(mime_type);

        let blob = web_sys::Blob::new_with_str_sequence_and_options(&blob_parts, &blob_options)
            .map_err(|_| "Failed to create blob")?;

        let url = web_sys::Url::create_object_url_with_blob(&blob)
            .map_err(|_| "Failed to create object URL")?;

        let anchor = document
            .create_element("a")
            .map_err(|_| "Failed to create anchor element")?
            .dyn_into::<web_sys::HtmlAnchorElement>()
            .map_err(|_| "Failed to cast to anchor element")?;

        anchor.set_href(&url);
        anchor.set_download(filename);
        anchor.style().set_property("display", "none").ok();

        let body = document.body().ok_or("No body found")?;
        body.append_child(&anchor)
            .map_err(|_| "Failed to append anchor")?;
        anchor.click();
        body.remove_child(&anchor)
            .map_err(|_| "Failed to remove anchor")?;

        web_sys::Url::revoke_object_url(&url).map_err(|_| "Failed to revoke object URL")?;

        Ok(())
    }
}
