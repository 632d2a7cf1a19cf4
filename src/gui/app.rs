//! Showroom Dashboard Main Application
//! Main window with control panel and dashboard viewer.

use crate::charts::StaticChartRenderer;
use crate::config::{search_dirs, AppConfig};
use crate::data::{DashboardTable, DataLoader, LoadedData};
use crate::export::{open_with_default_app, write_file, CsvExporter};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction, ViewerAction};
use crate::stats::DashboardSummary;
use egui::{Color32, RichText, SidePanel};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

const REPORT_WIDTH: u32 = 1200;

/// What the central panel should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// The last load failed; nothing else is rendered.
    Error(String),
    NoFile,
    /// Nothing to chart, with the reason shown to the user.
    Empty(&'static str),
    Ready,
}

/// Decide the central panel state from the load outcome and filtered rows.
pub fn view_state(
    load_error: Option<&str>,
    loaded: Option<&LoadedData>,
    filtered: &DashboardTable,
) -> ViewState {
    if let Some(message) = load_error {
        return ViewState::Error(message.to_string());
    }
    let Some(loaded) = loaded else {
        return ViewState::NoFile;
    };
    if loaded.table.is_empty() || loaded.table.columns().is_empty() {
        return ViewState::Empty("No valid data found in the file.");
    }
    if filtered.is_empty() {
        return ViewState::Empty("No data in the selected date range.");
    }
    ViewState::Ready
}

/// Main application window.
pub struct DashboardApp {
    config: AppConfig,
    loader: DataLoader,
    loaded: Option<Arc<LoadedData>>,
    load_error: Option<String>,
    filtered: DashboardTable,
    summary: DashboardSummary,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let mut app = Self::with_config(config);
        match app.config.resolve_data_file(&search_dirs()) {
            Some(path) => app.load_path(&path),
            None => {
                if let Some(configured) = &app.config.data_file {
                    warn!(path = %configured.display(), "startup data file not found");
                }
            }
        }
        app
    }

    fn with_config(config: AppConfig) -> Self {
        let mut control_panel = ControlPanel::new();
        control_panel.open_after_export = config.open_after_export;
        Self {
            config,
            loader: DataLoader::new(),
            loaded: None,
            load_error: None,
            filtered: DashboardTable::default(),
            summary: DashboardSummary::compute(&DashboardTable::default()),
            control_panel,
            chart_viewer: ChartViewer::new(),
        }
    }

    /// Load a sheet and reset the filter to its full date span.
    fn load_path(&mut self, path: &Path) {
        self.control_panel.file_path = Some(path.to_path_buf());

        match self.loader.load_file(path) {
            Ok(loaded) => {
                self.control_panel.set_bounds(loaded.table.date_bounds());
                self.control_panel.set_status(loaded.summary.to_string());
                self.load_error = None;
                self.loaded = Some(loaded);
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "load failed");
                self.control_panel.set_bounds(None);
                self.control_panel.set_status("Load failed");
                self.load_error = Some(format!("Error loading data file: {}", e));
                self.loaded = None;
            }
        }

        self.refresh_view();
    }

    /// Re-apply the date filter and recompute all aggregates.
    fn refresh_view(&mut self) {
        self.filtered = match (&self.loaded, self.control_panel.selected_range()) {
            (Some(loaded), Some(range)) => loaded.table.filter_by_date(range),
            (Some(loaded), None) => loaded.table.clone(),
            (None, _) => DashboardTable::default(),
        };
        self.summary = DashboardSummary::compute(&self.filtered);
        self.control_panel.export_enabled = !self.filtered.is_empty();
    }

    fn handle_browse_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Spreadsheets", &["xlsx", "xlsm", "xls", "ods", "csv"])
            .add_filter("Excel Workbooks", &["xlsx", "xlsm", "xls"])
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.load_path(&path);
        }
    }

    fn save_dialog(&self, filter: &str, extension: &str, file_name: &str) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new()
            .add_filter(filter, &[extension])
            .set_file_name(file_name);
        if let Some(dir) = self.loader.get_file_path().and_then(|p| p.parent()) {
            dialog = dialog.set_directory(dir);
        }
        dialog.save_file()
    }

    fn after_export(&mut self, path: &Path, what: &str) {
        self.control_panel
            .set_status(format!("{} saved to {}", what, path.display()));
        if self.control_panel.open_after_export {
            open_with_default_app(path);
        }
    }

    fn handle_export_csv(&mut self) {
        if self.filtered.is_empty() {
            self.control_panel.set_status("Nothing to export");
            return;
        }
        let Some(path) = self.save_dialog("CSV Files", "csv", &self.config.export_file_name)
        else {
            return;
        };

        match CsvExporter::write_csv(&self.filtered, &path) {
            Ok(()) => self.after_export(&path, "CSV"),
            Err(e) => {
                error!(error = %e, "CSV export failed");
                self.control_panel.set_status(format!("Export error: {}", e));
            }
        }
    }

    fn handle_export_report(&mut self) {
        if self.filtered.is_empty() {
            self.control_panel.set_status("Nothing to export");
            return;
        }
        let Some(path) = self.save_dialog("SVG Image", "svg", &self.config.report_file_name)
        else {
            return;
        };

        let result = StaticChartRenderer::render_report_svg(&self.summary, REPORT_WIDTH)
            .map_err(|e| e.to_string())
            .and_then(|svg| write_file(&path, svg.as_bytes()).map_err(|e| e.to_string()));

        match result {
            Ok(()) => {
                info!(path = %path.display(), "saved chart report");
                self.after_export(&path, "Report");
            }
            Err(e) => {
                error!(error = %e, "report export failed");
                self.control_panel.set_status(format!("Report error: {}", e));
            }
        }
    }

    fn draw_message(ui: &mut egui::Ui, text: &str, color: Color32) {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 3.0);
            ui.label(RichText::new(text).size(18.0).color(color));
        });
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::BrowseFile => self.handle_browse_file(),
                        ControlPanelAction::FilterChanged => self.refresh_view(),
                        ControlPanelAction::ExportCsv => self.handle_export_csv(),
                        ControlPanelAction::ExportReport => self.handle_export_report(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Dashboard
        egui::CentralPanel::default().show(ctx, |ui| {
            let state = view_state(
                self.load_error.as_deref(),
                self.loaded.as_deref(),
                &self.filtered,
            );

            match state {
                ViewState::Error(message) => {
                    Self::draw_message(ui, &message, Color32::from_rgb(220, 80, 80))
                }
                ViewState::NoFile => Self::draw_message(
                    ui,
                    "📂 Select a spreadsheet (xlsx or CSV) to build the dashboard",
                    Color32::GRAY,
                ),
                ViewState::Empty(reason) => {
                    Self::draw_message(ui, reason, Color32::from_rgb(230, 160, 60))
                }
                ViewState::Ready => {
                    let action = self.chart_viewer.show(ui, &self.filtered, &self.summary);
                    if action == ViewerAction::DownloadCsv {
                        self.handle_export_csv();
                    }
                }
            }
        });
    }
}
