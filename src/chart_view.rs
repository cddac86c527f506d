//! Opaque chart descriptions and their placeholder rendering.
//!
//! The server ships serialized plot specifications meant for an external
//! charting library. The client passes them through unmodified and only
//! surfaces a shallow summary (title, trace and point counts) so the user
//! can see that a drawable description arrived.

use eframe::egui;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    raw: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSummary {
    pub title: Option<String>,
    pub trace_count: usize,
    pub point_count: usize,
}

impl ChartSpec {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The untouched serialized specification.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Shallow look into the spec; `None` when it is not valid JSON of
    /// the expected `{data, layout}` shape.
    pub fn summary(&self) -> Option<ChartSummary> {
        let value: Value = serde_json::from_str(&self.raw).ok()?;
        let traces = value.get("data")?.as_array()?;
        let point_count = traces
            .iter()
            .filter_map(|trace| trace.get("x").and_then(Value::as_array))
            .map(|points| points.len())
            .sum();
        let title = value
            .get("layout")
            .and_then(|layout| layout.get("title"))
            .and_then(|title| {
                title
                    .as_str()
                    .map(str::to_string)
                    .or_else(|| title.get("text").and_then(Value::as_str).map(str::to_string))
            });
        Some(ChartSummary {
            title,
            trace_count: traces.len(),
            point_count,
        })
    }
}

/// Placeholder frame for a chart description; a missing description is a
/// no-op, like a missing container in the original UI.
pub fn render_chart_frame(ui: &mut egui::Ui, heading: &str, spec: Option<&ChartSpec>) {
    let Some(spec) = spec else {
        return;
    };
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.label(egui::RichText::new(heading).strong());
        match spec.summary() {
            Some(summary) => {
                let title = summary.title.unwrap_or_else(|| heading.to_string());
                ui.label(format!(
                    "{title} — {} traces, {} points",
                    summary.trace_count, summary.point_count
                ));
            }
            None => {
                ui.label(crate::TRANSLATIONS.get("chart_unreadable"));
            }
        }
    });
}
