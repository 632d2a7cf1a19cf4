//! Static Chart Renderer
//! Renders the dashboard's charts into a single SVG report with plotters.
//!
//! Layout (top to bottom):
//! 1. Daily walk-ins and test drives
//! 2. Walk-ins vs test drives by weekday
//! 3. Cumulative walk-ins vs test drives
//! 4. Distribution of daily conversion rate

use crate::stats::{BandCount, CumulativePoint, DailyPoint, DashboardSummary, WeekdayStats};
use chrono::{Duration, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use thiserror::Error;

const WALK_IN: RGBColor = RGBColor(52, 152, 219);
const TEST_DRIVE: RGBColor = RGBColor(231, 76, 60);
const BAND: RGBColor = RGBColor(155, 89, 182);
const MUTED: RGBColor = RGBColor(120, 120, 120);

const PANEL_HEIGHT: u32 = 320;
const PANEL_COUNT: u32 = 4;
const CAPTION_FONT: (&str, u32) = ("sans-serif", 20);

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Chart rendering failed: {0}")]
    Draw(String),
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

type Panel<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// Renders a [`DashboardSummary`] as a static SVG document.
pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render all report panels. Views missing from the summary are drawn as
    /// a "not available" note.
    pub fn render_report_svg(summary: &DashboardSummary, width: u32) -> Result<String, RenderError> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (width, PANEL_HEIGHT * PANEL_COUNT))
                .into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let panels = root.split_evenly((PANEL_COUNT as usize, 1));

            match summary.daily.as_deref() {
                Some(daily) if !daily.is_empty() => Self::draw_daily(&panels[0], daily)?,
                _ => Self::draw_unavailable(&panels[0], "Daily Walk-ins and Test Drives")?,
            }
            match summary.weekdays.as_deref() {
                Some(weekdays) if !weekdays.is_empty() => {
                    Self::draw_weekdays(&panels[1], weekdays)?
                }
                _ => Self::draw_unavailable(&panels[1], "Performance by Day of Week")?,
            }
            match summary.cumulative.as_deref() {
                Some(cumulative) if !cumulative.is_empty() => Self::draw_cumulative(
                    &panels[2],
                    cumulative,
                    summary.columns.walk_ins,
                    summary.columns.test_drives,
                )?,
                _ => Self::draw_unavailable(&panels[2], "Cumulative Walk-ins vs Test Drives")?,
            }
            match summary.bands.as_deref() {
                Some(bands) => Self::draw_bands(&panels[3], bands)?,
                None => Self::draw_unavailable(&panels[3], "Distribution of Conversion Rate")?,
            }

            root.present().map_err(draw_err)?;
        }
        Ok(svg)
    }

    fn draw_unavailable(area: &Panel<'_>, title: &str) -> Result<(), RenderError> {
        let (w, h) = area.dim_in_pixel();
        area.draw(&Text::new(
            format!("{}: not available for this data", title),
            (20, (h / 2) as i32),
            ("sans-serif", 18.0).into_font().color(&MUTED),
        ))
        .map_err(draw_err)?;
        area.draw(&PathElement::new(
            vec![(0, h as i32 - 1), (w as i32, h as i32 - 1)],
            MUTED.mix(0.3),
        ))
        .map_err(draw_err)?;
        Ok(())
    }

    /// X axis runs over day offsets from the first date.
    fn day_offset(first: NaiveDate, date: NaiveDate) -> i64 {
        (date - first).num_days()
    }

    fn draw_daily(area: &Panel<'_>, daily: &[DailyPoint]) -> Result<(), RenderError> {
        let first = daily[0].date;
        let span = Self::day_offset(first, daily[daily.len() - 1].date).max(1);
        let y_max = daily
            .iter()
            .flat_map(|p| [p.walk_ins.unwrap_or(0), p.test_drives.unwrap_or(0)])
            .max()
            .unwrap_or(0)
            .max(1);

        let mut chart = ChartBuilder::on(area)
            .caption("Daily Walk-ins and Test Drives", CAPTION_FONT)
            .margin(12)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(0i64..span, 0f64..Self::headroom(y_max))
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_labels(8)
            .x_label_formatter(&|offset: &i64| (first + Duration::days(*offset)).format("%b %d").to_string())
            .y_desc("Count")
            .draw()
            .map_err(draw_err)?;

        let walk_ins: Vec<(i64, f64)> = daily
            .iter()
            .filter_map(|p| Some((Self::day_offset(first, p.date), p.walk_ins? as f64)))
            .collect();
        let test_drives: Vec<(i64, f64)> = daily
            .iter()
            .filter_map(|p| Some((Self::day_offset(first, p.date), p.test_drives? as f64)))
            .collect();

        if !walk_ins.is_empty() {
            chart
                .draw_series(LineSeries::new(walk_ins, WALK_IN.stroke_width(2)))
                .map_err(draw_err)?
                .label("Walk-in Customer")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], WALK_IN.stroke_width(2)));
        }
        if !test_drives.is_empty() {
            chart
                .draw_series(LineSeries::new(test_drives, TEST_DRIVE.stroke_width(2)))
                .map_err(draw_err)?
                .label("Test Drive")
                .legend(|(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], TEST_DRIVE.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;
        Ok(())
    }

    fn draw_cumulative(
        area: &Panel<'_>,
        cumulative: &[CumulativePoint],
        show_walk_ins: bool,
        show_test_drives: bool,
    ) -> Result<(), RenderError> {
        let first = cumulative[0].date;
        let last = cumulative[cumulative.len() - 1];
        let span = Self::day_offset(first, last.date).max(1);
        let y_max = last.walk_ins.max(last.test_drives).max(1);

        let mut chart = ChartBuilder::on(area)
            .caption("Cumulative Walk-ins vs Test Drives", CAPTION_FONT)
            .margin(12)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(0i64..span, 0f64..Self::headroom(y_max))
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_labels(8)
            .x_label_formatter(&|offset: &i64| (first + Duration::days(*offset)).format("%b %d").to_string())
            .y_desc("Cumulative Count")
            .draw()
            .map_err(draw_err)?;

        if show_walk_ins {
            chart
                .draw_series(LineSeries::new(
                    cumulative
                        .iter()
                        .map(|p| (Self::day_offset(first, p.date), p.walk_ins as f64)),
                    WALK_IN.stroke_width(2),
                ))
                .map_err(draw_err)?
                .label("Cumulative Walk-ins")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], WALK_IN.stroke_width(2)));
        }
        if show_test_drives {
            chart
                .draw_series(LineSeries::new(
                    cumulative
                        .iter()
                        .map(|p| (Self::day_offset(first, p.date), p.test_drives as f64)),
                    TEST_DRIVE.stroke_width(2),
                ))
                .map_err(draw_err)?
                .label("Cumulative Test Drives")
                .legend(|(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], TEST_DRIVE.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;
        Ok(())
    }

    fn draw_weekdays(area: &Panel<'_>, weekdays: &[WeekdayStats]) -> Result<(), RenderError> {
        let labels: Vec<&str> = weekdays.iter().map(|w| w.name()).collect();
        let y_max = weekdays
            .iter()
            .map(|w| w.walk_ins.max(w.test_drives))
            .max()
            .unwrap_or(0)
            .max(1) as f64;

        let mut chart = ChartBuilder::on(area)
            .caption("Total Walk-ins vs Test Drives by Weekday", CAPTION_FONT)
            .margin(12)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5f64..(weekdays.len() as f64 - 0.5), 0f64..y_max * 1.1)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(weekdays.len())
            .x_label_formatter(&|x: &f64| Self::category_label(*x, &labels))
            .y_desc("Count")
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(weekdays.iter().enumerate().map(|(i, w)| {
                let x = i as f64;
                Rectangle::new([(x - 0.38, 0.0), (x - 0.02, w.walk_ins as f64)], WALK_IN.filled())
            }))
            .map_err(draw_err)?
            .label("Walk-ins")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], WALK_IN.filled()));
        chart
            .draw_series(weekdays.iter().enumerate().map(|(i, w)| {
                let x = i as f64;
                Rectangle::new(
                    [(x + 0.02, 0.0), (x + 0.38, w.test_drives as f64)],
                    TEST_DRIVE.filled(),
                )
            }))
            .map_err(draw_err)?
            .label("Test Drives")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], TEST_DRIVE.filled()));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;
        Ok(())
    }

    fn draw_bands(area: &Panel<'_>, bands: &[BandCount]) -> Result<(), RenderError> {
        let labels: Vec<&str> = bands.iter().map(|b| b.band.label()).collect();
        let y_max = bands.iter().map(|b| b.days).max().unwrap_or(0).max(1) as f64;

        let mut chart = ChartBuilder::on(area)
            .caption("Distribution of Conversion Rate (Daily)", CAPTION_FONT)
            .margin(12)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5f64..(bands.len() as f64 - 0.5), 0f64..y_max * 1.1)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bands.len())
            .x_label_formatter(&|x: &f64| Self::category_label(*x, &labels))
            .y_desc("Days")
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(bands.iter().enumerate().map(|(i, b)| {
                let x = i as f64;
                Rectangle::new([(x - 0.3, 0.0), (x + 0.3, b.days as f64)], BAND.filled())
            }))
            .map_err(draw_err)?;
        Ok(())
    }

    /// Upper bound of a count axis with ~10% room above the largest value.
    fn headroom(y_max: i64) -> f64 {
        y_max as f64 * 1.1 + 1.0
    }

    /// Label for an integer category position, blank elsewhere.
    fn category_label(x: f64, labels: &[&str]) -> String {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels
            .get(idx as usize)
            .map(|s| s.to_string())
            .unwrap_or_default()
    }
}
