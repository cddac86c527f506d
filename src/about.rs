pub const APP_NAME: &str = "DLS Outlier Workbench";

pub fn version_cli_text() -> String {
    format!(
        "{} {}\nDesktop client for DLS particle-size outlier analysis",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    )
}
