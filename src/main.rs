mod ui;

use printmaster::config::{WINDOW_HEIGHT, WINDOW_WIDTH};

fn main() {
    env_logger::init();

    // AI calls run here; the UI thread only polls them.
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(rt) => Some(rt),
        Err(e) => {
            log::error!("Failed to start async runtime, AI features disabled: {}", e);
            None
        }
    };
    let handle = runtime.as_ref().map(|rt| rt.handle().clone());

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
            .with_min_inner_size([800.0, 600.0])
            .with_title("PrintMaster"),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "PrintMaster",
        options,
        Box::new(move |cc| Ok(Box::new(ui::PrintMasterApp::new(cc, handle)))),
    ) {
        log::error!("Failed to start application: {}", e);
    }

    drop(runtime);
}
