//! Saved-dataset section: save/load/delete named datasets and compare a
//! selection of them.

use crate::chart_view::{render_chart_frame, ChartSpec};
use crate::session::AppSession;
use crate::TRANSLATIONS;
use eframe::egui;
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct DatasetPanel {
    selected: Option<String>,
    compare_selection: BTreeSet<String>,
    save_dialog: Option<String>,
    confirm_delete: bool,
}

impl DatasetPanel {
    pub fn render(&mut self, session: &mut AppSession, ui: &mut egui::Ui) {
        ui.heading(format!(
            "{} ({})",
            TRANSLATIONS.get("h_datasets"),
            session.datasets.len()
        ));

        // The catalog can shrink behind our back; drop stale selections.
        let known: BTreeSet<String> = session.datasets.iter().map(|d| d.name.clone()).collect();
        self.compare_selection.retain(|name| known.contains(name));
        if self
            .selected
            .as_ref()
            .is_some_and(|name| !known.contains(name))
        {
            self.selected = None;
        }

        for dataset in &session.datasets {
            ui.horizontal(|ui| {
                let mut checked = self.compare_selection.contains(&dataset.name);
                if ui.checkbox(&mut checked, "").changed() {
                    if checked {
                        self.compare_selection.insert(dataset.name.clone());
                    } else {
                        self.compare_selection.remove(&dataset.name);
                    }
                }
                let selected = self.selected.as_deref() == Some(dataset.name.as_str());
                if ui
                    .selectable_label(
                        selected,
                        format!(
                            "{} ({} {})",
                            dataset.name,
                            dataset.data_count,
                            TRANSLATIONS.get("l_rows")
                        ),
                    )
                    .clicked()
                {
                    self.selected = Some(dataset.name.clone());
                }
            });
        }

        ui.horizontal_wrapped(|ui| {
            if ui.button(TRANSLATIONS.get("b_refresh")).clicked() {
                session.refresh_datasets();
            }
            if ui.button(TRANSLATIONS.get("b_save_dataset")).clicked() {
                self.save_dialog = Some(String::new());
            }
            if ui.button(TRANSLATIONS.get("b_load_dataset")).clicked() {
                match self.selected.clone() {
                    Some(name) => session.load_dataset(&name),
                    None => session
                        .notifications
                        .info(TRANSLATIONS.get("err_dataset_selection_required")),
                }
            }
            if ui.button(TRANSLATIONS.get("b_delete_dataset")).clicked() {
                if self.selected.is_some() {
                    self.confirm_delete = true;
                } else {
                    session
                        .notifications
                        .info(TRANSLATIONS.get("err_dataset_selection_required"));
                }
            }
            if ui.button(TRANSLATIONS.get("b_compare")).clicked() {
                let names: Vec<String> = self.compare_selection.iter().cloned().collect();
                session.compare_datasets(&names);
            }
        });

        self.render_comparison(session, ui);
        self.render_dialogs(session, ui);
    }

    fn render_comparison(&mut self, session: &AppSession, ui: &mut egui::Ui) {
        let Some(comparison) = &session.comparison else {
            return;
        };
        ui.add_space(6.0);
        egui::Grid::new("dataset_comparison")
            .striped(true)
            .num_columns(6)
            .show(ui, |ui| {
                ui.strong(TRANSLATIONS.get("l_sample_name"));
                ui.strong(TRANSLATIONS.get("s_count"));
                ui.strong(TRANSLATIONS.get("s_size_mean"));
                ui.strong(TRANSLATIONS.get("s_size_std"));
                ui.strong(TRANSLATIONS.get("s_pi_mean"));
                ui.strong(TRANSLATIONS.get("s_pi_std"));
                ui.end_row();
                for (name, stats) in &comparison.stats_summary {
                    ui.label(name);
                    ui.label(stats.count.to_string());
                    ui.label(format!("{:.3}", stats.size_mean));
                    ui.label(format!("{:.3}", stats.size_std));
                    ui.label(format!("{:.3}", stats.pi_mean));
                    ui.label(format!("{:.3}", stats.pi_std));
                    ui.end_row();
                }
            });
        let chart = comparison.comparison_plot.as_deref().map(ChartSpec::new);
        render_chart_frame(ui, &TRANSLATIONS.get("c_comparison"), chart.as_ref());
    }

    fn render_dialogs(&mut self, session: &mut AppSession, ui: &mut egui::Ui) {
        if let Some(mut name) = self.save_dialog.take() {
            let mut keep_open = true;
            egui::Window::new(TRANSLATIONS.get("q_dataset_name"))
                .collapsible(false)
                .resizable(false)
                .show(ui.ctx(), |ui| {
                    ui.text_edit_singleline(&mut name);
                    ui.horizontal(|ui| {
                        if ui.button(TRANSLATIONS.get("b_confirm")).clicked() {
                            session.save_dataset(&name);
                            keep_open = false;
                        }
                        if ui.button(TRANSLATIONS.get("b_cancel")).clicked() {
                            keep_open = false;
                        }
                    });
                });
            if keep_open {
                self.save_dialog = Some(name);
            }
        }

        if self.confirm_delete {
            let mut keep_open = true;
            egui::Window::new(TRANSLATIONS.get("confirm_delete_dataset"))
                .collapsible(false)
                .resizable(false)
                .show(ui.ctx(), |ui| {
                    if let Some(name) = &self.selected {
                        ui.label(name);
                    }
                    ui.horizontal(|ui| {
                        if ui.button(TRANSLATIONS.get("b_confirm")).clicked() {
                            if let Some(name) = self.selected.clone() {
                                session.delete_dataset(&name);
                                self.selected = None;
                            }
                            keep_open = false;
                        }
                        if ui.button(TRANSLATIONS.get("b_cancel")).clicked() {
                            keep_open = false;
                        }
                    });
                });
            self.confirm_delete = keep_open;
        }
    }
}
