//! Measurement-table section: metadata fields, the editable grid and the
//! table-level actions (add row/column, reset, upload, download).

use crate::session::AppSession;
use crate::table_data::COLUMN_NO;
use crate::TRANSLATIONS;
use eframe::egui;
use egui_extras::{Column, TableBuilder};

#[derive(Debug, Default)]
pub struct TablePanel {
    cells_dirty: bool,
    metadata_dirty: bool,
    pending_delete: Option<usize>,
    column_dialog: Option<String>,
    confirm_reset: bool,
}

impl TablePanel {
    pub fn render(&mut self, session: &mut AppSession, ui: &mut egui::Ui) {
        self.render_metadata(session, ui);
        ui.add_space(6.0);
        ui.heading(TRANSLATIONS.get("h_table"));
        self.render_actions(session, ui);
        ui.add_space(6.0);
        self.render_grid(session, ui);
        self.render_dialogs(session, ui);
    }

    fn render_metadata(&mut self, session: &mut AppSession, ui: &mut egui::Ui) {
        ui.heading(TRANSLATIONS.get("h_sample_info"));
        ui.horizontal(|ui| {
            ui.label(TRANSLATIONS.get("l_sample_name"));
            // The sample name synchronizes on every keystroke; the other
            // metadata fields only once editing is done.
            let response = ui.add(
                egui::TextEdit::singleline(&mut session.sample_name).desired_width(160.0),
            );
            if response.changed() {
                session.sync_table();
            }

            let mut released = false;

            ui.label(TRANSLATIONS.get("l_production_date"));
            let response = ui.add(
                egui::TextEdit::singleline(&mut session.production_date)
                    .hint_text("YYYY-MM-DD")
                    .desired_width(100.0),
            );
            self.metadata_dirty |= response.changed();
            released |= response.lost_focus();

            ui.label(TRANSLATIONS.get("l_pass_count"));
            let response = ui.add(
                egui::TextEdit::singleline(&mut session.pass_count_input).desired_width(40.0),
            );
            self.metadata_dirty |= response.changed();
            released |= response.lost_focus();

            ui.label(TRANSLATIONS.get("l_custom_field"));
            ui.add(
                egui::TextEdit::singleline(&mut session.custom_field_name).desired_width(120.0),
            );

            // Date and pass fields synchronize once editing is done.
            if self.metadata_dirty && released {
                session.sync_table();
                self.metadata_dirty = false;
            }
        });
    }

    fn render_actions(&mut self, session: &mut AppSession, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            if ui.button(TRANSLATIONS.get("b_add_row")).clicked() {
                session.add_row();
            }
            if ui.button(TRANSLATIONS.get("b_add_column")).clicked() {
                self.column_dialog = Some(String::new());
            }
            if ui.button(TRANSLATIONS.get("b_upload")).clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Spreadsheets", &["csv", "xlsx", "xls"])
                    .pick_file()
                {
                    session.upload_file(&path);
                }
            }
            if ui.button(TRANSLATIONS.get("b_download_table")).clicked() {
                session.download_table(false);
            }
            if ui.button(TRANSLATIONS.get("b_download_data_only")).clicked() {
                session.download_table(true);
            }
            if ui.button(TRANSLATIONS.get("b_reset")).clicked() {
                self.confirm_reset = true;
            }
        });
    }

    fn render_grid(&mut self, session: &mut AppSession, ui: &mut egui::Ui) {
        let mut delete_requested: Option<usize> = None;
        let mut edited_cell_released = false;

        let headers = session.table.headers.clone();
        let data_column_count = headers.len();
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(36.0))
            .columns(Column::auto().at_least(80.0), data_column_count)
            .column(Column::auto().at_least(60.0))
            .header(22.0, |mut header| {
                header.col(|ui| {
                    ui.strong(COLUMN_NO);
                });
                for title in &headers {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
                header.col(|ui| {
                    ui.strong(TRANSLATIONS.get("l_actions"));
                });
            })
            .body(|mut body| {
                for (row_index, row) in session.table.rows.iter_mut().enumerate() {
                    body.row(24.0, |mut table_row| {
                        table_row.col(|ui| {
                            ui.label((row_index + 1).to_string());
                        });
                        for cell in row.cells.iter_mut() {
                            table_row.col(|ui| {
                                let response = ui.add(
                                    egui::TextEdit::singleline(&mut cell.buffer)
                                        .desired_width(f32::INFINITY),
                                );
                                if response.changed() {
                                    self.cells_dirty = true;
                                }
                                if response.lost_focus() {
                                    edited_cell_released = true;
                                }
                            });
                        }
                        table_row.col(|ui| {
                            if ui.button(TRANSLATIONS.get("b_delete")).clicked() {
                                delete_requested = Some(row_index);
                            }
                        });
                    });
                }
            });

        // Field-level change semantics: push the dataset once an edited
        // cell loses focus, not on every keystroke.
        if self.cells_dirty && edited_cell_released {
            session.sync_table();
            self.cells_dirty = false;
        }
        if let Some(index) = delete_requested {
            self.pending_delete = Some(index);
        }
    }

    fn render_dialogs(&mut self, session: &mut AppSession, ui: &mut egui::Ui) {
        if let Some(index) = self.pending_delete {
            let mut keep_open = true;
            egui::Window::new(TRANSLATIONS.get("confirm_delete_row"))
                .collapsible(false)
                .resizable(false)
                .show(ui.ctx(), |ui| {
                    ui.horizontal(|ui| {
                        if ui.button(TRANSLATIONS.get("b_confirm")).clicked() {
                            session.delete_row(index);
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

        if self.confirm_reset {
            let mut keep_open = true;
            egui::Window::new(TRANSLATIONS.get("confirm_reset"))
                .collapsible(false)
                .resizable(false)
                .show(ui.ctx(), |ui| {
                    ui.horizontal(|ui| {
                        if ui.button(TRANSLATIONS.get("b_confirm")).clicked() {
                            session.reset_data();
                            keep_open = false;
                        }
                        if ui.button(TRANSLATIONS.get("b_cancel")).clicked() {
                            keep_open = false;
                        }
                    });
                });
            self.confirm_reset = keep_open;
        }

        if let Some(mut name) = self.column_dialog.take() {
            let mut keep_open = true;
            egui::Window::new(TRANSLATIONS.get("q_column_name"))
                .collapsible(false)
                .resizable(false)
                .show(ui.ctx(), |ui| {
                    ui.text_edit_singleline(&mut name);
                    ui.horizontal(|ui| {
                        if ui.button(TRANSLATIONS.get("b_confirm")).clicked() {
                            session.add_column(&name);
                            keep_open = false;
                        }
                        if ui.button(TRANSLATIONS.get("b_cancel")).clicked() {
                            keep_open = false;
                        }
                    });
                });
            if keep_open {
                self.column_dialog = Some(name);
            }
        }
    }
}
