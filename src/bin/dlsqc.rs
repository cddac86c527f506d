use dlsqc::{about, app::WorkbenchApp};
use eframe::{egui, NativeOptions};
use std::env;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return Ok(());
    }
    // An optional session-snapshot file restores the previous state.
    let snapshot_path = args.iter().find(|a| !a.starts_with('-')).cloned();

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 780.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        about::APP_NAME,
        options,
        Box::new(move |_cc| Ok(Box::new(WorkbenchApp::new(snapshot_path.as_deref())))),
    )
}
