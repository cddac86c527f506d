//! Detection-result rendering: summary tiles, one card per removal
//! method, the scatter-chart frame and the follow-up actions a cached
//! result unlocks.

use crate::chart_view::{render_chart_frame, ChartSpec};
use crate::protocol::{GroupKind, MethodSummary, RemovalMethod};
use crate::session::AppSession;
use crate::TRANSLATIONS;
use eframe::egui;

#[derive(Debug, Default)]
pub struct ResultsPanel {}

impl ResultsPanel {
    pub fn render(&mut self, session: &mut AppSession, ui: &mut egui::Ui) {
        let mut download_combined: Option<bool> = None;
        let mut add_to_group: Option<GroupKind> = None;

        {
            let Some(calculation) = &session.last_calculation else {
                return;
            };
            ui.heading(TRANSLATIONS.get("h_results"));
            ui.horizontal_wrapped(|ui| {
                stat_tile(
                    ui,
                    &TRANSLATIONS.get("s_total_count"),
                    &calculation.original_count.to_string(),
                );
                stat_tile(ui, &TRANSLATIONS.get("s_sample"), &calculation.sample_name);
                stat_tile(
                    ui,
                    &TRANSLATIONS.get("s_date"),
                    &calculation.production_date,
                );
                stat_tile(
                    ui,
                    &TRANSLATIONS.get("s_pass"),
                    &calculation.pass_count.to_string(),
                );
            });
            ui.add_space(4.0);
            ui.horizontal_wrapped(|ui| {
                method_card(ui, RemovalMethod::ZScore, &calculation.zscore);
                method_card(ui, RemovalMethod::Iqr, &calculation.iqr);
                method_card(ui, RemovalMethod::Mad, &calculation.mad);
            });

            let scatter = calculation.scatter_plot.as_deref().map(ChartSpec::new);
            render_chart_frame(ui, &TRANSLATIONS.get("c_scatter"), scatter.as_ref());

            ui.horizontal_wrapped(|ui| {
                if ui.button(TRANSLATIONS.get("b_download_results")).clicked() {
                    download_combined = Some(false);
                }
                if ui.button(TRANSLATIONS.get("b_download_combined")).clicked() {
                    download_combined = Some(true);
                }
                ui.label(TRANSLATIONS.get("b_add_from_result"));
                if ui.button(TRANSLATIONS.get("l_group_experimental")).clicked() {
                    add_to_group = Some(GroupKind::Experimental);
                }
                if ui.button(TRANSLATIONS.get("l_group_control")).clicked() {
                    add_to_group = Some(GroupKind::Control);
                }
            });
        }

        if let Some(combined) = download_combined {
            session.download_results(combined);
        }
        if let Some(group) = add_to_group {
            session.add_from_result(group);
        }
    }
}

fn stat_tile(ui: &mut egui::Ui, label: &str, value: &str) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.vertical(|ui| {
            ui.strong(value);
            ui.small(label);
        });
    });
}

fn method_card(ui: &mut egui::Ui, method: RemovalMethod, summary: &MethodSummary) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.vertical(|ui| {
            ui.strong(method.as_str());
            ui.label(format!(
                "{}: {}",
                TRANSLATIONS.get("s_threshold"),
                summary.threshold
            ));
            ui.label(format!("{}: {}", TRANSLATIONS.get("s_kept"), summary.count));
            ui.label(format!(
                "{}: {}",
                TRANSLATIONS.get("s_outliers"),
                summary.outliers_count
            ));
            ui.separator();
            ui.label(format!(
                "{}: {:.3}",
                TRANSLATIONS.get("s_size_mean"),
                summary.size_mean
            ));
            ui.label(format!(
                "{}: {:.3}",
                TRANSLATIONS.get("s_size_std"),
                summary.size_std
            ));
            ui.label(format!(
                "{}: {:.3}",
                TRANSLATIONS.get("s_pi_mean"),
                summary.pi_mean
            ));
            ui.label(format!(
                "{}: {:.3}",
                TRANSLATIONS.get("s_pi_std"),
                summary.pi_std
            ));
        });
    });
}
