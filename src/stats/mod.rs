//! Stats module - KPI and chart aggregations

mod calculator;

pub use calculator::{
    weekday_name, BandCount, ConversionBand, CumulativePoint, DailyPoint, DashboardSummary,
    Kpis, StatsCalculator, WeekdayStats, WEEKDAY_ORDER,
};
