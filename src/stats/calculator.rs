//! Statistics Calculator Module
//! KPIs, weekday performance, conversion bands and cumulative series over a
//! cleaned (and usually date-filtered) table.

use crate::data::{ColumnSet, DashboardTable};
use chrono::{Datelike, NaiveDate, Weekday};
use statrs::statistics::Statistics;
use std::collections::HashSet;

/// Weekdays in display order.
pub const WEEKDAY_ORDER: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Full English weekday name.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Headline figures for the current view.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Kpis {
    pub total_walk_ins: i64,
    pub total_test_drives: i64,
    /// Ratio of totals in percent, not the mean of daily rates.
    pub overall_conversion_rate: f64,
    pub avg_walk_ins_per_day: f64,
    /// Distinct dates, or row count when the table has no date column.
    pub day_count: usize,
}

/// Aggregates for one weekday.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekdayStats {
    pub weekday: Weekday,
    pub days: usize,
    pub walk_ins: i64,
    pub test_drives: i64,
    pub avg_conversion_rate: Option<f64>,
}

impl WeekdayStats {
    pub fn name(&self) -> &'static str {
        weekday_name(self.weekday)
    }
}

/// Fixed conversion-rate bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionBand {
    Zero,
    UpTo10,
    UpTo20,
    UpTo30,
    UpTo40,
    Above40,
}

impl ConversionBand {
    pub const ALL: [ConversionBand; 6] = [
        ConversionBand::Zero,
        ConversionBand::UpTo10,
        ConversionBand::UpTo20,
        ConversionBand::UpTo30,
        ConversionBand::UpTo40,
        ConversionBand::Above40,
    ];

    /// Band for a rate; bands are closed on the right. Negative rates fall
    /// in no band.
    pub fn from_rate(rate: f64) -> Option<Self> {
        if rate.is_nan() || rate < 0.0 {
            None
        } else if rate == 0.0 {
            Some(ConversionBand::Zero)
        } else if rate <= 10.0 {
            Some(ConversionBand::UpTo10)
        } else if rate <= 20.0 {
            Some(ConversionBand::UpTo20)
        } else if rate <= 30.0 {
            Some(ConversionBand::UpTo30)
        } else if rate <= 40.0 {
            Some(ConversionBand::UpTo40)
        } else {
            Some(ConversionBand::Above40)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConversionBand::Zero => "0%",
            ConversionBand::UpTo10 => "0–10%",
            ConversionBand::UpTo20 => "10–20%",
            ConversionBand::UpTo30 => "20–30%",
            ConversionBand::UpTo40 => "30–40%",
            ConversionBand::Above40 => "40%+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandCount {
    pub band: ConversionBand,
    pub days: usize,
}

/// One day of the trend charts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub walk_ins: Option<i64>,
    pub test_drives: Option<i64>,
    pub conversion_rate: Option<f64>,
}

/// Running totals up to and including `date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CumulativePoint {
    pub date: NaiveDate,
    pub walk_ins: i64,
    pub test_drives: i64,
}

/// Everything the dashboard shows for one filtered view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    pub columns: ColumnSet,
    pub kpis: Kpis,
    pub daily: Option<Vec<DailyPoint>>,
    pub weekdays: Option<Vec<WeekdayStats>>,
    pub bands: Option<Vec<BandCount>>,
    pub cumulative: Option<Vec<CumulativePoint>>,
}

impl DashboardSummary {
    pub fn compute(table: &DashboardTable) -> Self {
        Self {
            columns: table.columns(),
            kpis: StatsCalculator::compute_kpis(table),
            daily: StatsCalculator::daily_series(table),
            weekdays: StatsCalculator::weekday_performance(table),
            bands: StatsCalculator::conversion_distribution(table),
            cumulative: StatsCalculator::cumulative_series(table),
        }
    }
}

/// Sum that clamps at the `i64` bounds instead of overflowing.
fn saturating_sum(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0i64, i64::saturating_add)
}

#[derive(Default)]
struct WeekdayAccumulator {
    days: usize,
    walk_ins: i64,
    test_drives: i64,
    rates: Vec<f64>,
}

/// Aggregations consumed by the chart viewer and the report renderer.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Totals, overall conversion and average walk-ins per day.
    pub fn compute_kpis(table: &DashboardTable) -> Kpis {
        let rows = table.rows();
        let total_walk_ins = saturating_sum(rows.iter().filter_map(|r| r.walk_ins));
        let total_test_drives = saturating_sum(rows.iter().filter_map(|r| r.test_drives));

        let day_count = if table.columns().date {
            rows.iter()
                .filter_map(|r| r.date)
                .collect::<HashSet<_>>()
                .len()
        } else {
            rows.len()
        };

        let avg_walk_ins_per_day = if day_count > 0 {
            total_walk_ins as f64 / day_count as f64
        } else {
            0.0
        };

        Kpis {
            total_walk_ins,
            total_test_drives,
            overall_conversion_rate: crate::data::conversion_rate(
                total_walk_ins,
                total_test_drives,
            ),
            avg_walk_ins_per_day,
            day_count,
        }
    }

    /// Per-row series sorted by date. `None` without a date column.
    pub fn daily_series(table: &DashboardTable) -> Option<Vec<DailyPoint>> {
        if !table.columns().date {
            return None;
        }

        let mut points: Vec<DailyPoint> = table
            .rows()
            .iter()
            .filter_map(|r| {
                Some(DailyPoint {
                    date: r.date?,
                    walk_ins: r.walk_ins,
                    test_drives: r.test_drives,
                    conversion_rate: r.conversion_rate(),
                })
            })
            .collect();
        points.sort_by_key(|p| p.date);
        Some(points)
    }

    /// Sums and mean conversion per weekday, Monday first, absent weekdays
    /// omitted. `None` without a date column.
    pub fn weekday_performance(table: &DashboardTable) -> Option<Vec<WeekdayStats>> {
        if !table.columns().date {
            return None;
        }

        let mut acc: [WeekdayAccumulator; 7] = Default::default();
        for row in table.rows() {
            let Some(date) = row.date else {
                continue;
            };
            let slot = &mut acc[date.weekday().num_days_from_monday() as usize];
            slot.days += 1;
            slot.walk_ins = slot.walk_ins.saturating_add(row.walk_ins.unwrap_or(0));
            slot.test_drives = slot.test_drives.saturating_add(row.test_drives.unwrap_or(0));
            if let Some(rate) = row.conversion_rate() {
                slot.rates.push(rate);
            }
        }

        let stats = WEEKDAY_ORDER
            .iter()
            .zip(acc.iter())
            .filter(|(_, a)| a.days > 0)
            .map(|(&weekday, a)| WeekdayStats {
                weekday,
                days: a.days,
                walk_ins: a.walk_ins,
                test_drives: a.test_drives,
                avg_conversion_rate: (!a.rates.is_empty()).then(|| a.rates.iter().mean()),
            })
            .collect();

        Some(stats)
    }

    /// Days per conversion band, all bands in fixed order. `None` when the
    /// table has no conversion rate.
    pub fn conversion_distribution(table: &DashboardTable) -> Option<Vec<BandCount>> {
        if !table.columns().has_conversion_rate() {
            return None;
        }

        let mut counts = [0usize; 6];
        for rate in table.rows().iter().filter_map(|r| r.conversion_rate()) {
            if let Some(band) = ConversionBand::from_rate(rate) {
                counts[band as usize] += 1;
            }
        }

        Some(
            ConversionBand::ALL
                .iter()
                .zip(counts)
                .map(|(&band, days)| BandCount { band, days })
                .collect(),
        )
    }

    /// Running totals in date order. `None` without a date column.
    pub fn cumulative_series(table: &DashboardTable) -> Option<Vec<CumulativePoint>> {
        let daily = Self::daily_series(table)?;

        let mut walk_ins = 0i64;
        let mut test_drives = 0i64;
        Some(
            daily
                .into_iter()
                .map(|p| {
                    walk_ins = walk_ins.saturating_add(p.walk_ins.unwrap_or(0));
                    test_drives = test_drives.saturating_add(p.test_drives.unwrap_or(0));
                    CumulativePoint {
                        date: p.date,
                        walk_ins,
                        test_drives,
                    }
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DateRange, Record};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn full_columns() -> ColumnSet {
        ColumnSet {
            date: true,
            walk_ins: true,
            test_drives: true,
        }
    }

    fn table(rows: &[(NaiveDate, i64, i64)]) -> DashboardTable {
        DashboardTable::new(
            full_columns(),
            rows.iter()
                .map(|&(d, w, t)| Record {
                    date: Some(d),
                    walk_ins: Some(w),
                    test_drives: Some(t),
                })
                .collect(),
        )
    }

    fn scenario() -> DashboardTable {
        table(&[
            (date(2024, 1, 1), 10, 2),
            (date(2024, 1, 2), 0, 5),
            (date(2024, 1, 2), 5, 0),
        ])
    }

    #[test]
    fn test_kpis_use_ratio_of_totals_and_distinct_days() {
        let kpis = StatsCalculator::compute_kpis(&scenario());
        assert_eq!(kpis.total_walk_ins, 15);
        assert_eq!(kpis.total_test_drives, 7);
        assert!((kpis.overall_conversion_rate - 7.0 / 15.0 * 100.0).abs() < 1e-9);
        assert_eq!(kpis.day_count, 2);
        assert_eq!(kpis.avg_walk_ins_per_day, 7.5);
    }

    #[test]
    fn test_kpis_fall_back_to_row_count_without_dates() {
        let t = DashboardTable::new(
            ColumnSet {
                date: false,
                walk_ins: true,
                test_drives: false,
            },
            vec![
                Record {
                    date: None,
                    walk_ins: Some(4),
                    test_drives: None,
                };
                4
            ],
        );
        let kpis = StatsCalculator::compute_kpis(&t);
        assert_eq!(kpis.day_count, 4);
        assert_eq!(kpis.avg_walk_ins_per_day, 4.0);
        assert_eq!(kpis.total_test_drives, 0);
        assert_eq!(kpis.overall_conversion_rate, 0.0);

        assert!(StatsCalculator::weekday_performance(&t).is_none());
        assert!(StatsCalculator::cumulative_series(&t).is_none());
        assert!(StatsCalculator::conversion_distribution(&t).is_none());
    }

    #[test]
    fn test_kpis_of_empty_table() {
        let kpis = StatsCalculator::compute_kpis(&DashboardTable::new(full_columns(), Vec::new()));
        assert_eq!(kpis, Kpis::default());
    }

    #[test]
    fn test_weekday_order_and_omission() {
        // 2024-01-07 is a Sunday, 2024-01-01 a Monday, 2024-01-03 a Wednesday
        let t = table(&[
            (date(2024, 1, 7), 4, 1),
            (date(2024, 1, 3), 10, 5),
            (date(2024, 1, 1), 10, 2),
            (date(2024, 1, 8), 10, 4),
        ]);
        let stats = StatsCalculator::weekday_performance(&t).unwrap();
        let names: Vec<&str> = stats.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Monday", "Wednesday", "Sunday"]);

        let monday = &stats[0];
        assert_eq!(monday.days, 2);
        assert_eq!(monday.walk_ins, 20);
        assert_eq!(monday.test_drives, 6);
        assert!((monday.avg_conversion_rate.unwrap() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(ConversionBand::from_rate(0.0), Some(ConversionBand::Zero));
        assert_eq!(ConversionBand::from_rate(0.01), Some(ConversionBand::UpTo10));
        assert_eq!(ConversionBand::from_rate(10.0), Some(ConversionBand::UpTo10));
        assert_eq!(ConversionBand::from_rate(10.5), Some(ConversionBand::UpTo20));
        assert_eq!(ConversionBand::from_rate(40.0), Some(ConversionBand::UpTo40));
        assert_eq!(ConversionBand::from_rate(40.1), Some(ConversionBand::Above40));
        assert_eq!(ConversionBand::from_rate(250.0), Some(ConversionBand::Above40));
        assert_eq!(ConversionBand::from_rate(-5.0), None);
    }

    #[test]
    fn test_distribution_keeps_fixed_order_with_zero_counts() {
        let t = table(&[
            (date(2024, 1, 1), 10, 5),
            (date(2024, 1, 2), 0, 5),
            (date(2024, 1, 3), 10, 1),
            (date(2024, 1, 4), 10, 5),
        ]);
        let bands = StatsCalculator::conversion_distribution(&t).unwrap();
        let labels: Vec<&str> = bands.iter().map(|b| b.band.label()).collect();
        assert_eq!(labels, vec!["0%", "0–10%", "10–20%", "20–30%", "30–40%", "40%+"]);
        let days: Vec<usize> = bands.iter().map(|b| b.days).collect();
        assert_eq!(days, vec![1, 1, 0, 0, 0, 2]);
    }

    #[test]
    fn test_cumulative_is_sorted_and_non_decreasing() {
        let t = table(&[
            (date(2024, 1, 3), 3, 1),
            (date(2024, 1, 1), 10, 2),
            (date(2024, 1, 2), 0, 0),
        ]);
        let series = StatsCalculator::cumulative_series(&t).unwrap();
        let dates: Vec<NaiveDate> = series.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]);
        assert!(series.windows(2).all(|w| w[0].walk_ins <= w[1].walk_ins
            && w[0].test_drives <= w[1].test_drives));
        assert_eq!(series.last().map(|p| (p.walk_ins, p.test_drives)), Some((13, 3)));
    }

    #[test]
    fn test_summary_over_filtered_view() {
        let day = date(2024, 1, 2);
        let filtered = scenario().filter_by_date(DateRange::new(day, day));
        let summary = DashboardSummary::compute(&filtered);
        assert_eq!(summary.kpis.total_walk_ins, 5);
        assert_eq!(summary.kpis.day_count, 1);
        assert_eq!(summary.daily.as_ref().map(Vec::len), Some(2));
        assert_eq!(summary.weekdays.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_huge_counts_saturate_instead_of_overflowing() {
        let mut loader = crate::data::DataLoader::new();
        let loaded = loader
            .load_bytes(b"Date,Walk-ins,Test Drive\n2024-01-01,9e18,1\n2024-01-08,9e18,1\n")
            .unwrap();
        let t = &loaded.table;

        let kpis = StatsCalculator::compute_kpis(t);
        assert_eq!(kpis.total_walk_ins, i64::MAX);
        assert_eq!(kpis.total_test_drives, 2);

        // both dates are Mondays
        let weekdays = StatsCalculator::weekday_performance(t).unwrap();
        assert_eq!(weekdays.len(), 1);
        assert_eq!(weekdays[0].walk_ins, i64::MAX);

        let cumulative = StatsCalculator::cumulative_series(t).unwrap();
        assert_eq!(cumulative.last().map(|p| p.walk_ins), Some(i64::MAX));
    }
}
