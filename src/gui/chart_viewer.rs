//! Chart Viewer Widget
//! Central panel: KPI row plus tabbed trend, weekday, conversion,
//! cumulative/distribution and raw data views.

use crate::charts::ChartPlotter;
use crate::data::{DashboardTable, Record};
use crate::stats::{DashboardSummary, Kpis};
use egui::{Color32, RichText, ScrollArea};

const KPI_CARD_HEIGHT: f32 = 70.0;
const SECTION_SPACING: f32 = 12.0;

/// Dashboard tabs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DashboardTab {
    #[default]
    DailyTrend,
    Weekday,
    Conversion,
    CumulativeDistribution,
    RawData,
}

impl DashboardTab {
    pub const ALL: [DashboardTab; 5] = [
        DashboardTab::DailyTrend,
        DashboardTab::Weekday,
        DashboardTab::Conversion,
        DashboardTab::CumulativeDistribution,
        DashboardTab::RawData,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            DashboardTab::DailyTrend => "📈 Daily Trend",
            DashboardTab::Weekday => "📊 Weekday Performance",
            DashboardTab::Conversion => "📉 Conversion Analysis",
            DashboardTab::CumulativeDistribution => "📚 Cumulative & Distribution",
            DashboardTab::RawData => "📋 Raw Data",
        }
    }
}

/// Action requested from inside the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerAction {
    None,
    DownloadCsv,
}

/// KPI cards as (title, formatted value).
pub fn format_kpis(kpis: &Kpis) -> [(&'static str, String); 4] {
    [
        ("Total Walk-in Customers", kpis.total_walk_ins.to_string()),
        ("Total Test Drives", kpis.total_test_drives.to_string()),
        (
            "Overall Conversion Rate",
            format!("{:.1}%", kpis.overall_conversion_rate),
        ),
        (
            "Average Walk-ins per Day",
            format!("{:.1}", kpis.avg_walk_ins_per_day),
        ),
    ]
}

/// Header row of the raw data table for the columns present.
pub fn raw_headers(table: &DashboardTable) -> Vec<&'static str> {
    let columns = table.columns();
    let mut headers = Vec::new();
    if columns.date {
        headers.push("Date");
    }
    if columns.walk_ins {
        headers.push("Walk-in Customer");
    }
    if columns.test_drives {
        headers.push("Test Drive");
    }
    if columns.has_conversion_rate() {
        headers.push("Conversion Rate");
    }
    headers
}

/// Display cells of one record; conversion rate with one decimal.
pub fn raw_cells(record: &Record) -> Vec<String> {
    let mut cells = Vec::new();
    if let Some(date) = record.date {
        cells.push(date.format("%Y-%m-%d").to_string());
    }
    if let Some(w) = record.walk_ins {
        cells.push(w.to_string());
    }
    if let Some(t) = record.test_drives {
        cells.push(t.to_string());
    }
    if let Some(rate) = record.conversion_rate() {
        cells.push(format!("{:.1}", rate));
    }
    cells
}

/// Tabbed dashboard view over the filtered table.
#[derive(Default)]
pub struct ChartViewer {
    pub tab: DashboardTab,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw KPIs and the active tab
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        table: &DashboardTable,
        summary: &DashboardSummary,
    ) -> ViewerAction {
        let mut action = ViewerAction::None;

        ui.heading("Customer Walk-in & Test Drive Dashboard");
        ui.label(
            RichText::new(
                "Monitor daily showroom performance, test drive conversions, \
                 and overall customer funnel quality.",
            )
            .color(Color32::GRAY),
        );
        ui.add_space(SECTION_SPACING);

        Self::draw_kpis(ui, &summary.kpis);

        ui.add_space(SECTION_SPACING);
        ui.separator();

        ui.horizontal(|ui| {
            for tab in DashboardTab::ALL {
                ui.selectable_value(&mut self.tab, tab, tab.title());
            }
        });
        ui.separator();

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| match self.tab {
                DashboardTab::DailyTrend => Self::draw_daily_tab(ui, summary),
                DashboardTab::Weekday => Self::draw_weekday_tab(ui, summary),
                DashboardTab::Conversion => Self::draw_conversion_tab(ui, summary),
                DashboardTab::CumulativeDistribution => {
                    Self::draw_cumulative_tab(ui, summary)
                }
                DashboardTab::RawData => {
                    if Self::draw_raw_tab(ui, table) {
                        action = ViewerAction::DownloadCsv;
                    }
                }
            });

        action
    }

    fn draw_kpis(ui: &mut egui::Ui, kpis: &Kpis) {
        let cards = format_kpis(kpis);
        ui.columns(cards.len(), |columns| {
            for (ui, (title, value)) in columns.iter_mut().zip(cards.iter()) {
                egui::Frame::none()
                    .fill(ui.visuals().widgets.noninteractive.bg_fill)
                    .rounding(8.0)
                    .inner_margin(10.0)
                    .show(ui, |ui| {
                        ui.set_min_height(KPI_CARD_HEIGHT);
                        ui.label(RichText::new(*title).size(12.0).color(Color32::GRAY));
                        ui.label(RichText::new(value).size(24.0).strong());
                    });
            }
        });
    }

    fn skipped(ui: &mut egui::Ui, what: &str) {
        ui.label(
            RichText::new(format!("{} is not available: required column missing.", what))
                .color(Color32::GRAY),
        );
    }

    fn draw_daily_tab(ui: &mut egui::Ui, summary: &DashboardSummary) {
        ui.label(RichText::new("Daily Walk-ins and Test Drives").size(16.0).strong());
        let Some(daily) = summary.daily.as_deref() else {
            Self::skipped(ui, "Daily trend");
            return;
        };

        ui.label(RichText::new("Line view (trend over time)").strong());
        ChartPlotter::draw_daily_lines(ui, daily);
        ui.add_space(SECTION_SPACING);
        ui.label(RichText::new("Bar view (day-wise volume)").strong());
        ChartPlotter::draw_daily_bars(ui, daily);
    }

    fn draw_weekday_tab(ui: &mut egui::Ui, summary: &DashboardSummary) {
        ui.label(RichText::new("Performance by Day of Week").size(16.0).strong());
        let Some(weekdays) = summary.weekdays.as_deref() else {
            Self::skipped(ui, "Weekday performance");
            return;
        };

        ui.label(RichText::new("Total Walk-ins vs Test Drives by Weekday").strong());
        ChartPlotter::draw_weekday_totals(ui, weekdays);

        if summary.columns.has_conversion_rate() {
            ui.add_space(SECTION_SPACING);
            ui.label(RichText::new("Average Conversion Rate by Weekday (%)").strong());
            ChartPlotter::draw_weekday_conversion(ui, weekdays);
        }
    }

    fn draw_conversion_tab(ui: &mut egui::Ui, summary: &DashboardSummary) {
        ui.label(RichText::new("Daily Conversion Rate (%)").size(16.0).strong());
        match summary.daily.as_deref() {
            Some(daily) if summary.columns.has_conversion_rate() => {
                ChartPlotter::draw_conversion_line(ui, daily);
                ui.label(
                    RichText::new(
                        "Conversion Rate = (Test Drives ÷ Walk-in Customers) × 100. \
                         Days with zero walk-ins are treated as 0% to avoid division errors.",
                    )
                    .size(11.0)
                    .color(Color32::GRAY),
                );
            }
            _ => Self::skipped(ui, "Daily conversion rate"),
        }
    }

    fn draw_cumulative_tab(ui: &mut egui::Ui, summary: &DashboardSummary) {
        ui.label(RichText::new("Cumulative & Distribution Views").size(16.0).strong());

        if let Some(cumulative) = summary.cumulative.as_deref() {
            ui.label(RichText::new("Cumulative Walk-ins vs Test Drives").strong());
            ChartPlotter::draw_cumulative(
                ui,
                cumulative,
                summary.columns.walk_ins,
                summary.columns.test_drives,
            );
            ui.add_space(SECTION_SPACING);
        }

        if let Some(bands) = summary.bands.as_deref() {
            ui.label(RichText::new("Distribution of Conversion Rate (Daily)").strong());
            ChartPlotter::draw_band_distribution(ui, bands);
        }

        if summary.cumulative.is_none() && summary.bands.is_none() {
            Self::skipped(ui, "Cumulative and distribution views");
        }
    }

    /// Returns true when the download button was clicked.
    fn draw_raw_tab(ui: &mut egui::Ui, table: &DashboardTable) -> bool {
        ui.label(RichText::new("Raw Data").size(16.0).strong());
        let download = ui.button("Download filtered data as CSV").clicked();
        ui.add_space(6.0);

        egui::Grid::new("raw_data_table")
            .striped(true)
            .min_col_width(90.0)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                for header in raw_headers(table) {
                    ui.label(RichText::new(header).strong());
                }
                ui.end_row();

                for record in table.rows() {
                    for cell in raw_cells(record) {
                        ui.label(cell);
                    }
                    ui.end_row();
                }
            });

        download
    }
}
