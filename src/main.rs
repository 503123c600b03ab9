#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    // Log level is taken from RUST_LOG, e.g. RUST_LOG=map_annotator=debug
    env_logger::init();

    // The save dialog runs on the tokio runtime while eframe owns this thread
    map_annotator::run_app()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
