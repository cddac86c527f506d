//! Group-average section: the combined entry form and one table per
//! group, each fully replaced from the server after every mutation.

use crate::protocol::{GroupKind, SampleRecord};
use crate::session::AppSession;
use crate::TRANSLATIONS;
use eframe::egui;
use egui_extras::{Column, TableBuilder};

#[derive(Debug, Default)]
pub struct GroupPanel {
    pending_delete: Option<(GroupKind, String)>,
}

impl GroupPanel {
    pub fn render(&mut self, session: &mut AppSession, ui: &mut egui::Ui) {
        ui.heading(TRANSLATIONS.get("h_groups"));
        self.render_entry_form(session, ui);
        ui.add_space(8.0);

        let mut delete_requested: Option<(GroupKind, String)> = None;
        for group in [GroupKind::Experimental, GroupKind::Control] {
            let label = match group {
                GroupKind::Experimental => TRANSLATIONS.get("l_group_experimental"),
                GroupKind::Control => TRANSLATIONS.get("l_group_control"),
            };
            ui.strong(&label);
            ui.push_id(group.as_str(), |ui| {
                if let Some(request) =
                    render_group_table(ui, session.groups.records(group), &session.custom_field_name)
                {
                    delete_requested = Some((group, request));
                }
            });
            ui.add_space(6.0);
        }
        if let Some((group, sample_name)) = delete_requested {
            self.pending_delete = Some((group, sample_name));
        }
        self.render_confirm_dialog(session, ui);
    }

    fn render_entry_form(&mut self, session: &mut AppSession, ui: &mut egui::Ui) {
        let custom_label = if session.custom_field_name.trim().is_empty() {
            TRANSLATIONS.get("l_custom_value")
        } else {
            session.custom_field_name.trim().to_string()
        };
        egui::Grid::new("group_entry_form")
            .num_columns(4)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label(TRANSLATIONS.get("l_sample_name"));
                ui.add(
                    egui::TextEdit::singleline(&mut session.group_form.sample_name)
                        .desired_width(120.0),
                );
                ui.end_row();

                ui.label(TRANSLATIONS.get("l_group_experimental"));
                ui.add(
                    egui::TextEdit::singleline(&mut session.group_form.exp_size)
                        .hint_text(TRANSLATIONS.get("l_size_avg"))
                        .desired_width(90.0),
                );
                ui.add(
                    egui::TextEdit::singleline(&mut session.group_form.exp_pi)
                        .hint_text(TRANSLATIONS.get("l_pi_avg"))
                        .desired_width(90.0),
                );
                ui.add(
                    egui::TextEdit::singleline(&mut session.group_form.exp_custom)
                        .hint_text(&custom_label)
                        .desired_width(90.0),
                );
                ui.end_row();

                ui.label(TRANSLATIONS.get("l_group_control"));
                ui.add(
                    egui::TextEdit::singleline(&mut session.group_form.ctrl_size)
                        .hint_text(TRANSLATIONS.get("l_size_avg"))
                        .desired_width(90.0),
                );
                ui.add(
                    egui::TextEdit::singleline(&mut session.group_form.ctrl_pi)
                        .hint_text(TRANSLATIONS.get("l_pi_avg"))
                        .desired_width(90.0),
                );
                ui.add(
                    egui::TextEdit::singleline(&mut session.group_form.ctrl_custom)
                        .hint_text(&custom_label)
                        .desired_width(90.0),
                );
                ui.end_row();
            });
        if ui.button(TRANSLATIONS.get("b_add_both")).clicked() {
            session.add_both_groups();
        }
    }

    fn render_confirm_dialog(&mut self, session: &mut AppSession, ui: &mut egui::Ui) {
        if let Some((group, sample_name)) = self.pending_delete.clone() {
            let mut keep_open = true;
            egui::Window::new(TRANSLATIONS.get("confirm_delete_entry"))
                .collapsible(false)
                .resizable(false)
                .show(ui.ctx(), |ui| {
                    ui.label(&sample_name);
                    ui.horizontal(|ui| {
                        if ui.button(TRANSLATIONS.get("b_confirm")).clicked() {
                            session.delete_group_entry(group, &sample_name);
                            keep_open = false;
                        }
                        if ui.button(TRANSLATIONS.get("b_cancel")).clicked() {
                            keep_open = false;
                        }
                    });
                });
            if !keep_open {
                self.pending_delete = None;
            }
        }
    }
}

/// One group table; returns the sample name whose delete button was
/// clicked, if any.
fn render_group_table(
    ui: &mut egui::Ui,
    records: &[SampleRecord],
    custom_field_name: &str,
) -> Option<String> {
    if records.is_empty() {
        ui.label(TRANSLATIONS.get("l_empty_group"));
        return None;
    }
    let custom_header = if custom_field_name.trim().is_empty() {
        TRANSLATIONS.get("l_custom_value")
    } else {
        custom_field_name.trim().to_string()
    };
    let mut delete_requested = None;
    TableBuilder::new(ui)
        .striped(true)
        .columns(Column::auto().at_least(70.0), 6)
        .column(Column::auto().at_least(60.0))
        .header(22.0, |mut header| {
            for title in [
                TRANSLATIONS.get("l_sample_name"),
                TRANSLATIONS.get("l_size_avg"),
                TRANSLATIONS.get("l_pi_avg"),
                custom_header,
                TRANSLATIONS.get("l_removal_method"),
                TRANSLATIONS.get("l_timestamp"),
                TRANSLATIONS.get("l_actions"),
            ] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for record in records {
                body.row(22.0, |mut row| {
                    row.col(|ui| {
                        ui.label(&record.sample_name);
                    });
                    row.col(|ui| {
                        ui.label(format!("{:.3}", record.size_avg));
                    });
                    row.col(|ui| {
                        ui.label(format!("{:.3}", record.pi_avg));
                    });
                    row.col(|ui| {
                        ui.label(
                            record
                                .custom_data_value
                                .map(|v| format!("{v:.1}"))
                                .unwrap_or_else(|| "-".to_string()),
                        );
                    });
                    row.col(|ui| {
                        let mut tag = record.removal_method.to_string();
                        if record.threshold_used != "N/A" {
                            tag.push_str(&format!(" ({})", record.threshold_used));
                        }
                        ui.label(tag);
                    });
                    row.col(|ui| {
                        ui.label(&record.timestamp);
                    });
                    row.col(|ui| {
                        if ui.button(TRANSLATIONS.get("b_delete")).clicked() {
                            delete_requested = Some(record.sample_name.clone());
                        }
                    });
                });
            }
        });
    delete_requested
}
