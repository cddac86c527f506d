//! Trend and correlation section: pass-trend statistics with their chart
//! frames, and the custom-field correlation summary.

use crate::chart_view::{render_chart_frame, ChartSpec};
use crate::session::AppSession;
use crate::TRANSLATIONS;
use eframe::egui;

#[derive(Debug, Default)]
pub struct TrendPanel {}

impl TrendPanel {
    pub fn render(&mut self, session: &mut AppSession, ui: &mut egui::Ui) {
        ui.heading(TRANSLATIONS.get("h_trend"));
        let correlation_label = if session.custom_field_name.trim().is_empty() {
            TRANSLATIONS.get("b_correlation")
        } else {
            format!(
                "{} {}",
                session.custom_field_name.trim(),
                TRANSLATIONS.get("b_correlation")
            )
        };
        ui.horizontal(|ui| {
            if ui.button(TRANSLATIONS.get("b_trend")).clicked() {
                session.show_trend();
            }
            if ui.button(correlation_label).clicked() {
                session.show_custom_correlation();
            }
        });

        if let Some(trend) = &session.trend {
            ui.add_space(6.0);
            ui.horizontal_wrapped(|ui| {
                stat_tile(
                    ui,
                    &TRANSLATIONS.get("s_pass_count"),
                    &trend.statistics.pass_count.to_string(),
                );
                stat_tile(
                    ui,
                    &TRANSLATIONS.get("s_correlation"),
                    &format!("{:.3}", trend.statistics.correlation),
                );
                stat_tile(
                    ui,
                    &TRANSLATIONS.get("s_size_cv"),
                    &format!("{:.1}%", trend.statistics.size_cv),
                );
                stat_tile(
                    ui,
                    &TRANSLATIONS.get("s_pi_cv"),
                    &format!("{:.1}%", trend.statistics.pi_cv),
                );
            });
            let size_chart = trend.size_trend_chart.as_deref().map(ChartSpec::new);
            render_chart_frame(ui, &TRANSLATIONS.get("c_size_trend"), size_chart.as_ref());
            let pi_chart = trend.pi_trend_chart.as_deref().map(ChartSpec::new);
            render_chart_frame(ui, &TRANSLATIONS.get("c_pi_trend"), pi_chart.as_ref());
            let correlation_chart = trend.correlation_chart.as_deref().map(ChartSpec::new);
            render_chart_frame(
                ui,
                &TRANSLATIONS.get("c_correlation"),
                correlation_chart.as_ref(),
            );
        }

        if let Some(correlation) = &session.custom_correlation {
            ui.add_space(6.0);
            let field = correlation
                .custom_field_name
                .clone()
                .unwrap_or_else(|| TRANSLATIONS.get("l_custom_value"));
            ui.strong(format!("{field} / Size(nm)"));
            let stats = &correlation.statistics;
            ui.horizontal_wrapped(|ui| {
                if let Some(count) = stats.experimental_count {
                    stat_tile(ui, &TRANSLATIONS.get("s_exp_count"), &count.to_string());
                }
                if let Some(count) = stats.control_count {
                    stat_tile(ui, &TRANSLATIONS.get("s_ctrl_count"), &count.to_string());
                }
                if let Some(count) = stats.total_count {
                    stat_tile(ui, &TRANSLATIONS.get("s_total"), &count.to_string());
                }
                if let Some(count) = stats.data_count {
                    stat_tile(ui, &TRANSLATIONS.get("s_data_count"), &count.to_string());
                }
                stat_tile(
                    ui,
                    &TRANSLATIONS.get("s_correlation"),
                    &format!("{:.3}", stats.correlation),
                );
                if let Some(mean) = stats.custom_mean {
                    stat_tile(ui, &TRANSLATIONS.get("s_custom_mean"), &format!("{mean:.1}"));
                }
                if let Some(mean) = stats.size_mean {
                    stat_tile(ui, &TRANSLATIONS.get("s_size_mean"), &format!("{mean:.1}"));
                }
            });
            let chart = correlation
                .custom_correlation_chart
                .as_deref()
                .map(ChartSpec::new);
            render_chart_frame(
                ui,
                &TRANSLATIONS.get("c_custom_correlation"),
                chart.as_ref(),
            );
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
