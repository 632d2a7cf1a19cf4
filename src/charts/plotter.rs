//! Chart Plotter Module
//! Creates interactive dashboard charts using egui_plot.

use crate::stats::{BandCount, CumulativePoint, DailyPoint, WeekdayStats};
use chrono::{Datelike, NaiveDate};
use egui::Color32;
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

/// Series colors
pub const WALK_IN_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue
pub const TEST_DRIVE_COLOR: Color32 = Color32::from_rgb(231, 76, 60); // Red
pub const CONVERSION_COLOR: Color32 = Color32::from_rgb(46, 204, 113); // Green
pub const BAND_COLOR: Color32 = Color32::from_rgb(155, 89, 182); // Purple

const CHART_HEIGHT: f32 = 260.0;

/// X coordinate of a date: days since the common era.
pub fn date_to_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Axis label for a date coordinate; blank between whole days.
pub fn format_date_mark(value: f64) -> String {
    if value.fract() != 0.0 {
        return String::new();
    }
    NaiveDate::from_num_days_from_ce_opt(value as i32)
        .map(|d| d.format("%b %d").to_string())
        .unwrap_or_default()
}

/// Axis label for a category index; blank off the integer positions.
pub fn format_category_mark(value: f64, labels: &[&str]) -> String {
    if value.fract() != 0.0 || value < 0.0 {
        return String::new();
    }
    labels
        .get(value as usize)
        .map(|s| s.to_string())
        .unwrap_or_default()
}

/// Draws the dashboard's charts with egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    fn series(daily: &[DailyPoint], value: impl Fn(&DailyPoint) -> Option<f64>) -> Vec<[f64; 2]> {
        daily
            .iter()
            .filter_map(|p| Some([date_to_x(p.date), value(p)?]))
            .collect()
    }

    /// Walk-ins and test drives over time.
    pub fn draw_daily_lines(ui: &mut egui::Ui, daily: &[DailyPoint]) {
        let walk_ins = Self::series(daily, |p| p.walk_ins.map(|v| v as f64));
        let test_drives = Self::series(daily, |p| p.test_drives.map(|v| v as f64));

        Plot::new("daily_lines")
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label("Date")
            .y_axis_label("Count")
            .x_axis_formatter(|mark, _range| format_date_mark(mark.value))
            .show(ui, |plot_ui| {
                if !walk_ins.is_empty() {
                    plot_ui.line(
                        Line::new(PlotPoints::from(walk_ins.clone()))
                            .color(WALK_IN_COLOR)
                            .width(2.0)
                            .name("Walk-in Customer"),
                    );
                    plot_ui.points(
                        Points::new(PlotPoints::from(walk_ins))
                            .radius(2.5)
                            .color(WALK_IN_COLOR),
                    );
                }
                if !test_drives.is_empty() {
                    plot_ui.line(
                        Line::new(PlotPoints::from(test_drives.clone()))
                            .color(TEST_DRIVE_COLOR)
                            .width(2.0)
                            .name("Test Drive"),
                    );
                    plot_ui.points(
                        Points::new(PlotPoints::from(test_drives))
                            .radius(2.5)
                            .color(TEST_DRIVE_COLOR),
                    );
                }
            });
    }

    /// Day-wise volume, walk-ins and test drives side by side.
    pub fn draw_daily_bars(ui: &mut egui::Ui, daily: &[DailyPoint]) {
        let walk_in_bars: Vec<Bar> = daily
            .iter()
            .filter_map(|p| {
                let v = p.walk_ins?;
                Some(Bar::new(date_to_x(p.date) - 0.2, v as f64).width(0.4))
            })
            .collect();
        let test_drive_bars: Vec<Bar> = daily
            .iter()
            .filter_map(|p| {
                let v = p.test_drives?;
                Some(Bar::new(date_to_x(p.date) + 0.2, v as f64).width(0.4))
            })
            .collect();

        Plot::new("daily_bars")
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label("Date")
            .y_axis_label("Count")
            .x_axis_formatter(|mark, _range| format_date_mark(mark.value))
            .show(ui, |plot_ui| {
                if !walk_in_bars.is_empty() {
                    plot_ui.bar_chart(
                        BarChart::new(walk_in_bars)
                            .color(WALK_IN_COLOR)
                            .name("Walk-in Customer"),
                    );
                }
                if !test_drive_bars.is_empty() {
                    plot_ui.bar_chart(
                        BarChart::new(test_drive_bars)
                            .color(TEST_DRIVE_COLOR)
                            .name("Test Drive"),
                    );
                }
            });
    }

    /// Daily conversion rate in percent.
    pub fn draw_conversion_line(ui: &mut egui::Ui, daily: &[DailyPoint]) {
        let rates = Self::series(daily, |p| p.conversion_rate);

        Plot::new("conversion_line")
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label("Date")
            .y_axis_label("Conversion Rate (%)")
            .x_axis_formatter(|mark, _range| format_date_mark(mark.value))
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from(rates.clone()))
                        .color(CONVERSION_COLOR)
                        .width(2.0)
                        .name("Conversion Rate"),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(rates))
                        .radius(2.5)
                        .color(CONVERSION_COLOR),
                );
            });
    }

    /// Running totals over time.
    pub fn draw_cumulative(
        ui: &mut egui::Ui,
        cumulative: &[CumulativePoint],
        show_walk_ins: bool,
        show_test_drives: bool,
    ) {
        let walk_ins: PlotPoints = cumulative
            .iter()
            .map(|p| [date_to_x(p.date), p.walk_ins as f64])
            .collect();
        let test_drives: PlotPoints = cumulative
            .iter()
            .map(|p| [date_to_x(p.date), p.test_drives as f64])
            .collect();

        Plot::new("cumulative")
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label("Date")
            .y_axis_label("Cumulative Count")
            .x_axis_formatter(|mark, _range| format_date_mark(mark.value))
            .show(ui, |plot_ui| {
                if show_walk_ins {
                    plot_ui.line(
                        Line::new(walk_ins)
                            .color(WALK_IN_COLOR)
                            .width(2.0)
                            .name("Cumulative Walk-ins"),
                    );
                }
                if show_test_drives {
                    plot_ui.line(
                        Line::new(test_drives)
                            .color(TEST_DRIVE_COLOR)
                            .width(2.0)
                            .name("Cumulative Test Drives"),
                    );
                }
            });
    }

    /// Total walk-ins vs test drives per weekday.
    pub fn draw_weekday_totals(ui: &mut egui::Ui, weekdays: &[WeekdayStats]) {
        let labels: Vec<&'static str> = weekdays.iter().map(|w| w.name()).collect();
        let walk_in_bars: Vec<Bar> = weekdays
            .iter()
            .enumerate()
            .map(|(i, w)| Bar::new(i as f64 - 0.2, w.walk_ins as f64).width(0.4).name(w.name()))
            .collect();
        let test_drive_bars: Vec<Bar> = weekdays
            .iter()
            .enumerate()
            .map(|(i, w)| Bar::new(i as f64 + 0.2, w.test_drives as f64).width(0.4).name(w.name()))
            .collect();

        Plot::new("weekday_totals")
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .allow_drag(false)
            .allow_zoom(false)
            .y_axis_label("Count")
            .x_axis_formatter(move |mark, _range| format_category_mark(mark.value, &labels))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(
                    BarChart::new(walk_in_bars)
                        .color(WALK_IN_COLOR)
                        .name("Walk-ins"),
                );
                plot_ui.bar_chart(
                    BarChart::new(test_drive_bars)
                        .color(TEST_DRIVE_COLOR)
                        .name("Test Drives"),
                );
            });
    }

    /// Average conversion rate per weekday.
    pub fn draw_weekday_conversion(ui: &mut egui::Ui, weekdays: &[WeekdayStats]) {
        let labels: Vec<&'static str> = weekdays.iter().map(|w| w.name()).collect();
        let bars: Vec<Bar> = weekdays
            .iter()
            .enumerate()
            .filter_map(|(i, w)| {
                let rate = w.avg_conversion_rate?;
                Some(Bar::new(i as f64, rate).width(0.6).name(w.name()))
            })
            .collect();

        Plot::new("weekday_conversion")
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .allow_drag(false)
            .allow_zoom(false)
            .y_axis_label("Avg Conversion (%)")
            .x_axis_formatter(move |mark, _range| format_category_mark(mark.value, &labels))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .color(CONVERSION_COLOR)
                        .name("Avg Conversion"),
                );
            });
    }

    /// Number of days per conversion band.
    pub fn draw_band_distribution(ui: &mut egui::Ui, bands: &[BandCount]) {
        let labels: Vec<&'static str> = bands.iter().map(|b| b.band.label()).collect();
        let bars: Vec<Bar> = bands
            .iter()
            .enumerate()
            .map(|(i, b)| Bar::new(i as f64, b.days as f64).width(0.6).name(b.band.label()))
            .collect();

        Plot::new("band_distribution")
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .allow_drag(false)
            .allow_zoom(false)
            .y_axis_label("Days")
            .x_axis_formatter(move |mark, _range| format_category_mark(mark.value, &labels))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(BAND_COLOR).name("Days"));
            });
    }
}
