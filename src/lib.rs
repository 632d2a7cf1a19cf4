//! Showroom Dashboard - walk-in and test drive analytics
//!
//! Loads a daily showroom sheet, cleans it, and exposes the KPI and chart
//! aggregations behind the desktop dashboard.

pub mod charts;
pub mod config;
pub mod data;
pub mod export;
pub mod gui;
pub mod stats;
