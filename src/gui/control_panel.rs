//! Control Panel Widget
//! Left side panel with data source, date range filter and export controls.

use crate::data::DateRange;
use chrono::{Duration, NaiveDate};
use egui::{Color32, RichText};
use std::path::PathBuf;

/// Action requested by the user in the control panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPanelAction {
    None,
    BrowseFile,
    FilterChanged,
    ExportCsv,
    ExportReport,
}

/// Left side control panel with file selection, filters and exports.
pub struct ControlPanel {
    pub file_path: Option<PathBuf>,
    /// Full date span of the loaded table; `None` without a date column.
    pub bounds: Option<DateRange>,
    /// Selected range as day offsets from `bounds.start`.
    pub start_offset: i64,
    pub end_offset: i64,
    pub open_after_export: bool,
    pub export_enabled: bool,
    pub status: String,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            file_path: None,
            bounds: None,
            start_offset: 0,
            end_offset: 0,
            open_after_export: false,
            export_enabled: false,
            status: "Ready".to_string(),
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the filter to the full span of a newly loaded table.
    pub fn set_bounds(&mut self, bounds: Option<DateRange>) {
        self.bounds = bounds;
        self.start_offset = 0;
        self.end_offset = bounds.map(|b| b.span_days()).unwrap_or(0);
    }

    /// Currently selected date range, if the data has dates.
    pub fn selected_range(&self) -> Option<DateRange> {
        let bounds = self.bounds?;
        Some(DateRange::new(
            bounds.start + Duration::days(self.start_offset),
            bounds.start + Duration::days(self.end_offset),
        ))
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    fn date_slider<'a>(value: &'a mut i64, start: NaiveDate, span: i64) -> egui::Slider<'a> {
        egui::Slider::new(value, 0..=span)
            .custom_formatter(move |v, _| {
                (start + Duration::days(v as i64))
                    .format("%Y-%m-%d")
                    .to_string()
            })
            .custom_parser(move |s| {
                NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .ok()
                    .map(|d| (d - start).num_days() as f64)
            })
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🚗 Showroom Dashboard")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Walk-ins & Test Drives")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .file_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.file_path.is_some() {
                            ui.visuals().strong_text_color()
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseFile;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filter Section =====
        ui.label(RichText::new("🗓 Filters").size(14.0).strong());
        ui.add_space(5.0);

        match self.bounds {
            Some(bounds) => {
                let span = bounds.span_days();
                ui.label("Select date range");
                ui.horizontal(|ui| {
                    ui.label("From");
                    if ui
                        .add(Self::date_slider(&mut self.start_offset, bounds.start, span))
                        .changed()
                    {
                        action = ControlPanelAction::FilterChanged;
                    }
                });
                ui.horizontal(|ui| {
                    ui.label("To   ");
                    if ui
                        .add(Self::date_slider(&mut self.end_offset, bounds.start, span))
                        .changed()
                    {
                        action = ControlPanelAction::FilterChanged;
                    }
                });
                if ui.button("↺ Full range").clicked() {
                    self.set_bounds(Some(bounds));
                    action = ControlPanelAction::FilterChanged;
                }
            }
            None => {
                ui.label(
                    RichText::new("No date column; showing all rows")
                        .size(12.0)
                        .color(Color32::GRAY),
                );
            }
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export Section =====
        ui.label(RichText::new("💾 Export").size(14.0).strong());
        ui.add_space(5.0);

        ui.add_enabled_ui(self.export_enabled, |ui| {
            if ui.button("Download filtered data as CSV").clicked() {
                action = ControlPanelAction::ExportCsv;
            }
            if ui.button("Save chart report (SVG)").clicked() {
                action = ControlPanelAction::ExportReport;
            }
        });
        ui.checkbox(&mut self.open_after_export, "Open file after export");

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Status =====
        ui.label(RichText::new(&self.status).size(12.0).color(Color32::GRAY));

        action
    }
}
