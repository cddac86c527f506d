use crate::api_client::ApiClient;
use crate::dataset_panel::DatasetPanel;
use crate::group_panel::GroupPanel;
use crate::notifications::NoticeLevel;
use crate::protocol::{SessionSnapshot, IQR_RANGE, MAD_RANGE, THRESHOLD_STEP, ZSCORE_RANGE};
use crate::results_panel::ResultsPanel;
use crate::session::AppSession;
use crate::table_panel::TablePanel;
use crate::trend_panel::TrendPanel;
use crate::TRANSLATIONS;
use anyhow::{Context, Result};
use eframe::egui::{self, menu, Color32, Ui};
use std::fs;

pub struct WorkbenchApp {
    session: AppSession,
    table_panel: TablePanel,
    results_panel: ResultsPanel,
    group_panel: GroupPanel,
    dataset_panel: DatasetPanel,
    trend_panel: TrendPanel,
    datasets_loaded: bool,
}

impl Default for WorkbenchApp {
    fn default() -> Self {
        Self::new(None)
    }
}

impl WorkbenchApp {
    /// Builds the session against the configured server and, when a
    /// snapshot path was given, restores the prior session through the
    /// live render paths.
    pub fn new(snapshot_path: Option<&str>) -> Self {
        let mut session = AppSession::new(ApiClient::from_env());
        if let Some(path) = snapshot_path {
            match Self::load_snapshot_file(path) {
                Ok(snapshot) => session.restore_snapshot(snapshot),
                Err(err) => {
                    log::warn!("{err:#}");
                    session
                        .notifications
                        .error(TRANSLATIONS.get("err_snapshot"));
                }
            }
        }
        Self {
            session,
            table_panel: TablePanel::default(),
            results_panel: ResultsPanel::default(),
            group_panel: GroupPanel::default(),
            dataset_panel: DatasetPanel::default(),
            trend_panel: TrendPanel::default(),
            datasets_loaded: false,
        }
    }

    fn load_snapshot_file(path: &str) -> Result<SessionSnapshot> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("could not read session snapshot '{path}'"))?;
        serde_json::from_str(&text)
            .with_context(|| format!("could not parse session snapshot '{path}'"))
    }

    pub fn render_menu_bar(&mut self, ctx: &egui::Context, ui: &mut Ui) {
        menu::bar(ui, |ui| {
            ui.menu_button(TRANSLATIONS.get("m_file"), |ui| {
                if ui.button(TRANSLATIONS.get("b_upload")).clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Spreadsheets", &["csv", "xlsx", "xls"])
                        .pick_file()
                    {
                        self.session.upload_file(&path);
                    }
                }
                if ui.button(TRANSLATIONS.get("b_download_table")).clicked() {
                    self.session.download_table(false);
                }
                if ui.button(TRANSLATIONS.get("b_download_data_only")).clicked() {
                    self.session.download_table(true);
                }
                ui.separator();
                if ui.button(TRANSLATIONS.get("m_quit")).clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
            ui.separator();
            ui.label(format!(
                "{}: {}",
                TRANSLATIONS.get("l_server"),
                self.session.server_url()
            ));
        });
    }

    fn render_thresholds(&mut self, ui: &mut Ui) {
        ui.heading(TRANSLATIONS.get("h_thresholds"));
        let thresholds = &mut self.session.thresholds;
        ui.add(
            egui::Slider::new(&mut thresholds.zscore, ZSCORE_RANGE)
                .step_by(THRESHOLD_STEP)
                .text("Z-Score"),
        );
        ui.add(
            egui::Slider::new(&mut thresholds.iqr, IQR_RANGE)
                .step_by(THRESHOLD_STEP)
                .text("IQR"),
        );
        ui.add(
            egui::Slider::new(&mut thresholds.mad, MAD_RANGE)
                .step_by(THRESHOLD_STEP)
                .text("MAD"),
        );
        if ui.button(TRANSLATIONS.get("b_calculate")).clicked() {
            self.session.run_detection();
        }
    }

    fn render_notifications(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.strong(TRANSLATIONS.get("h_notifications"));
            if ui.small_button(TRANSLATIONS.get("b_clear")).clicked() {
                self.session.notifications.clear();
            }
        });
        for notice in self.session.notifications.entries().iter().rev().take(3) {
            let color = match notice.level {
                NoticeLevel::Info => Color32::GRAY,
                NoticeLevel::Success => Color32::DARK_GREEN,
                NoticeLevel::Error => Color32::DARK_RED,
            };
            ui.colored_label(color, &notice.message);
        }
    }
}

impl eframe::App for WorkbenchApp {
    fn ui(&mut self, ui: &mut egui::Ui, _frame: &mut eframe::Frame) {
        let ctx = ui.ctx();
        if !self.datasets_loaded {
            self.session.refresh_datasets();
            self.datasets_loaded = true;
        }

        // Ctrl+Enter runs detection from anywhere.
        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::Enter)) {
            self.session.run_detection();
        }

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            self.render_menu_bar(ctx, ui);
        });

        egui::TopBottomPanel::bottom("notifications").show(ctx, |ui| {
            self.render_notifications(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.table_panel.render(&mut self.session, ui);
                ui.separator();
                self.render_thresholds(ui);
                ui.separator();
                self.results_panel.render(&mut self.session, ui);
                ui.separator();
                self.group_panel.render(&mut self.session, ui);
                ui.separator();
                self.dataset_panel.render(&mut self.session, ui);
                ui.separator();
                self.trend_panel.render(&mut self.session, ui);
            });
        });
    }
}
